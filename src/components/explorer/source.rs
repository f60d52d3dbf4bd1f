//! Where graph snapshots come from: the portal REST API or a JSON snapshot
//! embedded in the page.

use std::collections::HashSet;

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlScriptElement, Request, RequestInit, RequestMode, Response, Window};

use super::types::{GraphData, NodeType};
use crate::error::GraphError;

/// Which node kinds a graph request includes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphQuery {
	pub include_data_products: bool,
	pub include_datasets: bool,
	pub include_data_outputs: bool,
	pub include_domains: bool,
}

impl Default for GraphQuery {
	fn default() -> Self {
		Self {
			include_data_products: true,
			include_datasets: true,
			include_data_outputs: true,
			include_domains: true,
		}
	}
}

impl GraphQuery {
	pub fn includes(&self, kind: NodeType) -> bool {
		match kind {
			NodeType::DataProduct => self.include_data_products,
			NodeType::Dataset => self.include_datasets,
			NodeType::DataOutput => self.include_data_outputs,
			NodeType::Domain => self.include_domains,
		}
	}

	/// Query string in the backend's parameter names.
	pub fn to_query_string(&self) -> String {
		format!(
			"includeDataProducts={}&includeDatasets={}&includeDataOutputs={}&includeDomains={}",
			self.include_data_products,
			self.include_datasets,
			self.include_data_outputs,
			self.include_domains
		)
	}

	/// Apply the filter client-side: drop excluded node kinds and every edge
	/// touching a dropped node.
	pub fn apply(&self, data: GraphData) -> GraphData {
		let nodes: Vec<_> = data
			.nodes
			.into_iter()
			.filter(|n| self.includes(n.node_type))
			.collect();
		let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		let edges = data
			.edges
			.into_iter()
			.filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
			.collect();
		GraphData { nodes, edges }
	}
}

/// The graph an explorer instance shows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphSource {
	/// The whole catalog, filterable by node kind.
	#[default]
	Global,
	/// Neighborhood of one data product.
	DataProduct {
		/// Entity id.
		id: String,
	},
	/// Neighborhood of one dataset.
	Dataset {
		/// Entity id.
		id: String,
	},
	/// Neighborhood of one data output.
	DataOutput {
		/// Entity id.
		id: String,
	},
	/// Snapshot embedded in the page as `<script id="graph-data">`.
	Embedded,
}

impl GraphSource {
	/// Request URL, or `None` for sources that are not fetched.
	///
	/// Node-kind filters only apply to the global graph; entity graphs are
	/// scoped by `level` instead. Entity ids are percent-encoded.
	pub(crate) fn url(
		&self,
		api_base: &str,
		query: &GraphQuery,
		level: Option<u32>,
	) -> Option<String> {
		let base = api_base.trim_end_matches('/');
		let level = level.map(|l| format!("?level={l}")).unwrap_or_default();
		let entity = |collection: &str, id: &str| {
			Some(format!("{base}/{collection}/{}/graph{level}", urlencoding::encode(id)))
		};
		match self {
			GraphSource::Global => Some(format!("{base}/graph?{}", query.to_query_string())),
			GraphSource::DataProduct { id } => entity("v2/data_products", id),
			GraphSource::Dataset { id } => entity("datasets", id),
			GraphSource::DataOutput { id } => entity("data_outputs", id),
			GraphSource::Embedded => None,
		}
	}

	/// Whether the sidebar's type filters affect this source.
	pub(crate) fn is_filterable(&self) -> bool {
		matches!(self, GraphSource::Global | GraphSource::Embedded)
	}
}

/// GET a graph document from the backend.
pub async fn fetch_graph(url: &str) -> Result<GraphData, GraphError> {
	let window: Window = web_sys::window().ok_or_else(|| GraphError::Request("no window".into()))?;

	let init = RequestInit::new();
	init.set_method("GET");
	init.set_mode(RequestMode::SameOrigin);
	let request = Request::new_with_str_and_init(url, &init).map_err(GraphError::from_js)?;
	request
		.headers()
		.set("Accept", "application/json")
		.map_err(GraphError::from_js)?;

	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(GraphError::from_js)?
		.dyn_into()
		.map_err(GraphError::from_js)?;
	if !response.ok() {
		return Err(GraphError::Status(response.status()));
	}

	let text = JsFuture::from(response.text().map_err(GraphError::from_js)?)
		.await
		.map_err(GraphError::from_js)?
		.as_string()
		.unwrap_or_default();
	let data = GraphData::from_json(&text)?;
	info!(
		"catalog-explorer: fetched {} nodes, {} edges",
		data.nodes.len(),
		data.edges.len()
	);
	Ok(data)
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], edges: [...] }
pub fn load_embedded_graph() -> Result<GraphData, GraphError> {
	let text = script_text("graph-data").ok_or(GraphError::MissingGraphData)?;
	let data = GraphData::from_json(&text)?;
	info!(
		"catalog-explorer: loaded {} nodes, {} edges from page",
		data.nodes.len(),
		data.edges.len()
	);
	Ok(data)
}

/// Text of a `<script>` element, if the page has one with this id.
pub(crate) fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = match element.dyn_into() {
		Ok(script) => script,
		Err(_) => {
			warn!("catalog-explorer: #{} is not a script element", id);
			return None;
		}
	};
	script.text().ok()
}

/// Resolve a snapshot for `source`, fetching when needed.
pub async fn load_graph(
	source: &GraphSource,
	api_base: &str,
	query: &GraphQuery,
	level: Option<u32>,
) -> Result<GraphData, GraphError> {
	match source.url(api_base, query, level) {
		Some(url) => fetch_graph(&url).await,
		None => load_embedded_graph().map(|data| query.apply(data)),
	}
}
