//! Top-level explorer component wiring data loading, state, sidebar and canvas.

use leptos::prelude::*;
use leptos::task::spawn_local;

use super::component::ExplorerCanvas;
use super::layout::ForceLayout;
use super::search::NodeDetails;
use super::sidebar::Sidebar;
use super::source::{GraphSource, load_graph};
use super::state::{ExplorerState, GraphRequest, LoadStatus, SidebarFilters};
use super::theme::Theme;
use crate::config::ExplorerConfig;

/// Everything a fetch needs once the request is issued.
#[derive(Clone)]
struct FetchContext {
	source: GraphSource,
	api_base: String,
	level: Option<u32>,
	layout: ForceLayout,
	theme: Theme,
}

/// The lineage explorer: sidebar plus graph canvas.
///
/// Loads the graph described by `config`, refetching whenever the sidebar
/// filters change. The canvas stays mounted throughout: a loading indicator
/// covers it while a fetch is in flight, an error banner when one failed.
#[component]
pub fn GraphExplorer(
	/// Settings for this explorer instance.
	config: ExplorerConfig,
) -> impl IntoView {
	let theme = config.theme();
	let ExplorerConfig {
		api_base,
		app_base,
		source,
		level,
		filters,
		layout,
		fullscreen,
		..
	} = config;
	let show_filters = source.is_filterable();

	let fetch_context = StoredValue::new(FetchContext {
		source,
		api_base,
		level,
		layout: ForceLayout::new(layout),
		theme: theme.clone(),
	});

	let mut initial = ExplorerState::new(filters);
	let first_request = initial.begin_fetch();
	let state = RwSignal::new(initial);

	let fetch = move |request: GraphRequest| {
		let ctx = fetch_context.get_value();
		spawn_local(async move {
			let result = load_graph(&ctx.source, &ctx.api_base, &request.query, ctx.level).await;
			state.try_update(|s| {
				s.finish_fetch(request.generation, result, &ctx.layout, &ctx.theme);
			});
		});
	};
	fetch(first_request);

	let on_filters_change = Callback::new(move |next: SidebarFilters| {
		if let Some(request) = state.try_update(|s| s.set_filters(next)) {
			fetch(request);
		}
	});
	let on_select = Callback::new(move |id: String| {
		state.update(|s| {
			s.select(&id);
		});
	});
	let on_clear = Callback::new(move |_: ()| state.update(ExplorerState::clear_selection));

	let graph = Memo::new(move |_| state.with(|s| s.graph().clone()));
	let view_command = Memo::new(move |_| state.with(|s| s.view_command().cloned()));
	let selected = Memo::new(move |_| state.with(|s| s.selection().node_id().map(str::to_owned)));
	let filters = Memo::new(move |_| state.with(ExplorerState::filters));
	let loading = Memo::new(move |_| state.with(ExplorerState::is_loading));
	let error = Memo::new(move |_| match state.with(|s| s.status().clone()) {
		LoadStatus::Failed(message) => Some(message),
		_ => None,
	});
	let empty = Memo::new(move |_| {
		state.with(|s| s.status() == &LoadStatus::Ready && s.graph().is_empty())
	});

	let details_base = app_base.clone();
	let details = Memo::new(move |_| {
		state.with(|s| s.selected_node().map(|n| NodeDetails::of(n, &details_base)))
	});

	view! {
		<div class="graph-explorer" class:fullscreen=fullscreen>
			<Sidebar
				filters=filters
				on_filters_change=on_filters_change
				graph=graph
				details=details
				on_select=on_select
				show_filters=show_filters
			/>
			<div class="explorer-main">
				<ExplorerCanvas
					graph=graph
					view=view_command
					selected=selected
					on_node_click=on_select
					on_background_click=on_clear
					app_base=app_base.clone()
					theme=theme
					fullscreen=fullscreen
				/>
				{move || {
					error
						.get()
						.map(|message| {
							view! {
								<div class="explorer-error" role="alert">
									"Could not load the graph: " {message}
								</div>
							}
						})
				}}
				<Show when=move || empty.get()>
					<div class="explorer-empty">"Nothing to show for the current filters."</div>
				</Show>
				<Show when=move || loading.get()>
					<div class="explorer-loading">"Loading graph…"</div>
				</Show>
			</div>
		</div>
	}
}
