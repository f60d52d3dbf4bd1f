//! Explorer state machine.
//!
//! Owns the sidebar filters, the current selection and the committed render
//! graph. Every fetch is tagged with a generation number so a response that
//! arrives after the filters changed again is dropped instead of replacing
//! the newer graph.
//!
//! ```text
//! Idle ──select(id)──▶ Selected(id) ──select(other)──▶ Selected(other)
//!  ▲                        │
//!  └── clear_selection / applied fetch
//! ```

use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashSet;

use super::adapter::{RenderGraph, adapt_graph};
use super::highlight::{connected_ids, highlight};
use super::layout::LayoutEngine;
use super::source::GraphQuery;
use super::theme::Theme;
use super::types::GraphData;
use super::view::{DEFAULT_FIT_PADDING, NEIGHBORHOOD_FIT_PADDING};
use crate::error::GraphError;

/// Which node kinds the sidebar currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SidebarFilters {
	/// Show data products.
	pub data_products_enabled: bool,
	/// Show datasets.
	pub datasets_enabled: bool,
	/// Show data outputs.
	pub data_outputs_enabled: bool,
	/// Also turns domain grouping on or off.
	pub domains_enabled: bool,
}

impl Default for SidebarFilters {
	fn default() -> Self {
		Self {
			data_products_enabled: true,
			datasets_enabled: true,
			data_outputs_enabled: true,
			domains_enabled: true,
		}
	}
}

impl From<SidebarFilters> for GraphQuery {
	fn from(filters: SidebarFilters) -> Self {
		GraphQuery {
			include_data_products: filters.data_products_enabled,
			include_datasets: filters.datasets_enabled,
			include_data_outputs: filters.data_outputs_enabled,
			include_domains: filters.domains_enabled,
		}
	}
}

/// Current selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	Idle,
	Selected(String),
}

impl Selection {
	pub fn node_id(&self) -> Option<&str> {
		match self {
			Selection::Idle => None,
			Selection::Selected(id) => Some(id),
		}
	}
}

/// What the canvas should bring into view.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewRequest {
	FitAll { padding: f64 },
	FitNodes { ids: Vec<String>, padding: f64 },
}

/// A view request with a sequence number; the canvas applies each number once.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewCommand {
	pub seq: u64,
	pub request: ViewRequest,
}

/// A fetch the caller must perform and report back via [`ExplorerState::finish_fetch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphRequest {
	pub generation: u64,
	pub query: GraphQuery,
}

/// Fetch status.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoadStatus {
	#[default]
	Loading,
	Ready,
	Failed(String),
}

/// Adapt, highlight (nothing selected) and lay out a fresh snapshot.
pub fn run_pipeline(
	data: &GraphData,
	domains_enabled: bool,
	layout: &dyn LayoutEngine,
	theme: &Theme,
) -> Result<RenderGraph, GraphError> {
	let ids: HashSet<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
	let dangling = data
		.edges
		.iter()
		.filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
		.count();
	if dangling > 0 {
		warn!(
			"catalog-explorer: {} edges reference nodes missing from the snapshot",
			dangling
		);
	}

	let adapted = adapt_graph(&data.nodes, &data.edges, domains_enabled, theme);
	let RenderGraph { nodes, edges } = highlight(adapted, None);
	let nodes = layout.apply(nodes, &edges, domains_enabled)?;
	Ok(RenderGraph { nodes, edges })
}

/// State owned by one explorer instance.
#[derive(Clone, Debug, Default)]
pub struct ExplorerState {
	filters: SidebarFilters,
	selection: Selection,
	generation: u64,
	status: LoadStatus,
	graph: RenderGraph,
	view: Option<ViewCommand>,
}

impl ExplorerState {
	pub fn new(filters: SidebarFilters) -> Self {
		Self {
			filters,
			..Self::default()
		}
	}

	pub fn filters(&self) -> SidebarFilters {
		self.filters
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn status(&self) -> &LoadStatus {
		&self.status
	}

	pub fn is_loading(&self) -> bool {
		self.status == LoadStatus::Loading
	}

	/// The committed graph with highlight applied.
	pub fn graph(&self) -> &RenderGraph {
		&self.graph
	}

	/// Latest view command, if any was issued.
	pub fn view_command(&self) -> Option<&ViewCommand> {
		self.view.as_ref()
	}

	pub fn selected_node(&self) -> Option<&super::adapter::RenderNode> {
		self.selection.node_id().and_then(|id| self.graph.node(id))
	}

	/// Start a fetch with the current filters.
	pub fn begin_fetch(&mut self) -> GraphRequest {
		self.generation += 1;
		self.status = LoadStatus::Loading;
		self.selection = Selection::Idle;
		debug!("catalog-explorer: fetch generation {}", self.generation);
		GraphRequest {
			generation: self.generation,
			query: self.filters.into(),
		}
	}

	/// Replace the filters; always triggers a fresh fetch.
	pub fn set_filters(&mut self, filters: SidebarFilters) -> GraphRequest {
		self.filters = filters;
		self.begin_fetch()
	}

	/// Commit a fetch result. Returns false when the response was stale.
	///
	/// A successful snapshot is run through the full pipeline, resets the
	/// selection and fits the whole graph. A failure clears the graph so no
	/// partial state is shown.
	pub fn finish_fetch(
		&mut self,
		generation: u64,
		result: Result<GraphData, GraphError>,
		layout: &dyn LayoutEngine,
		theme: &Theme,
	) -> bool {
		if generation != self.generation {
			warn!(
				"catalog-explorer: dropping stale graph response (generation {}, current {})",
				generation, self.generation
			);
			return false;
		}

		let domains = self.filters.domains_enabled;
		match result.and_then(|data| run_pipeline(&data, domains, layout, theme)) {
			Ok(graph) => {
				info!(
					"catalog-explorer: graph ready with {} nodes, {} edges",
					graph.nodes.len(),
					graph.edges.len()
				);
				self.graph = graph;
				self.selection = Selection::Idle;
				self.status = LoadStatus::Ready;
				self.issue(ViewRequest::FitAll {
					padding: DEFAULT_FIT_PADDING,
				});
			}
			Err(err) => {
				warn!("catalog-explorer: {}", err);
				self.graph = RenderGraph::default();
				self.selection = Selection::Idle;
				self.status = LoadStatus::Failed(err.to_string());
			}
		}
		true
	}

	/// Select a node from the canvas or the sidebar picker.
	///
	/// Unknown ids are ignored. Returns whether the selection changed.
	pub fn select(&mut self, id: &str) -> bool {
		if self.graph.node(id).is_none() {
			debug!("catalog-explorer: ignoring selection of unknown node {}", id);
			return false;
		}
		self.selection = Selection::Selected(id.to_owned());
		self.rehighlight();

		let neighborhood = connected_ids(&self.graph.edges, id);
		let ids = self
			.graph
			.nodes
			.iter()
			.filter(|n| neighborhood.contains(n.id.as_str()))
			.map(|n| n.id.clone())
			.collect();
		debug!("catalog-explorer: selected {}", id);
		self.issue(ViewRequest::FitNodes {
			ids,
			padding: NEIGHBORHOOD_FIT_PADDING,
		});
		true
	}

	/// Background click: back to idle and show everything.
	pub fn clear_selection(&mut self) {
		self.selection = Selection::Idle;
		self.rehighlight();
		self.issue(ViewRequest::FitAll {
			padding: DEFAULT_FIT_PADDING,
		});
	}

	fn rehighlight(&mut self) {
		let graph = std::mem::take(&mut self.graph);
		self.graph = highlight(graph, self.selection.node_id());
	}

	fn issue(&mut self, request: ViewRequest) {
		let seq = self.view.as_ref().map_or(1, |v| v.seq + 1);
		self.view = Some(ViewCommand { seq, request });
	}
}
