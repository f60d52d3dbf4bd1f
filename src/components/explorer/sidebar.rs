//! Sidebar: node-kind filters, node picker and the selected node's details.

use leptos::prelude::*;

use super::adapter::RenderGraph;
use super::search::{NodeDetails, search_nodes};
use super::state::SidebarFilters;

#[component]
fn FilterToggle(
	label: &'static str,
	#[prop(into)] checked: Signal<bool>,
	on_toggle: Callback<bool>,
) -> impl IntoView {
	view! {
		<label class="explorer-filter">
			<input
				type="checkbox"
				prop:checked=move || checked.get()
				on:change=move |ev| on_toggle.run(event_target_checked(&ev))
			/>
			<span>{label}</span>
		</label>
	}
}

/// Explorer sidebar.
///
/// The filter checkboxes are only shown when `show_filters` is set; entity
/// graphs are scoped by the backend and ignore them.
#[component]
pub fn Sidebar(
	#[prop(into)] filters: Signal<SidebarFilters>,
	on_filters_change: Callback<SidebarFilters>,
	#[prop(into)] graph: Signal<RenderGraph>,
	#[prop(into)] details: Signal<Option<NodeDetails>>,
	on_select: Callback<String>,
	#[prop(default = true)] show_filters: bool,
) -> impl IntoView {
	let (query, set_query) = signal(String::new());

	let toggle = move |update: fn(&mut SidebarFilters, bool)| {
		Callback::new(move |checked: bool| {
			let mut next = filters.get_untracked();
			update(&mut next, checked);
			on_filters_change.run(next);
		})
	};

	let hits = move || graph.with(|g| search_nodes(&g.nodes, &query.get()));

	view! {
		<aside class="explorer-sidebar">
			<Show when=move || show_filters>
				<fieldset class="explorer-filters">
					<legend>"Show"</legend>
					<FilterToggle
						label="Domains"
						checked=Signal::derive(move || filters.get().domains_enabled)
						on_toggle=toggle(|f, v| f.domains_enabled = v)
					/>
					<FilterToggle
						label="Data Products"
						checked=Signal::derive(move || filters.get().data_products_enabled)
						on_toggle=toggle(|f, v| f.data_products_enabled = v)
					/>
					<FilterToggle
						label="Datasets"
						checked=Signal::derive(move || filters.get().datasets_enabled)
						on_toggle=toggle(|f, v| f.datasets_enabled = v)
					/>
					<FilterToggle
						label="Data Outputs"
						checked=Signal::derive(move || filters.get().data_outputs_enabled)
						on_toggle=toggle(|f, v| f.data_outputs_enabled = v)
					/>
				</fieldset>
			</Show>

			<div class="explorer-search">
				<input
					type="search"
					placeholder="Find a node"
					prop:value=move || query.get()
					on:input=move |ev| set_query.set(event_target_value(&ev))
				/>
				<ul class="explorer-search-results">
					<For
						each=hits
						key=|hit| hit.id.clone()
						children=move |hit| {
							let id = hit.id.clone();
							view! {
								<li on:click=move |_| on_select.run(id.clone())>
									<span class="name">{hit.name}</span>
									<span class="kind">{hit.kind_label}</span>
									{hit.domain.map(|domain| view! { <span class="domain">{domain}</span> })}
								</li>
							}
						}
					/>
				</ul>
			</div>

			{move || {
				details
					.get()
					.map(|details| {
						let NodeDetails { name, kind_label, domain, description, members, link } = details;
						view! {
							<section class="explorer-details">
								<h2>{name}</h2>
								<p class="kind">{kind_label}</p>
								{domain.map(|domain| view! { <p class="domain">"Domain: " {domain}</p> })}
								{description.map(|text| view! { <p class="description">{text}</p> })}
								{(!members.is_empty())
									.then(|| {
										view! {
											<ul class="members">
												{members
													.into_iter()
													.map(|member| view! { <li>{member}</li> })
													.collect_view()}
											</ul>
										}
									})}
								{link.map(|(href, label)| view! { <a class="explorer-link" href=href>{label}</a> })}
							</section>
						}
					})
			}}
		</aside>
	}
}
