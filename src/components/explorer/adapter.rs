//! Conversion of backend graph records into renderable nodes and edges.
//!
//! Handle placement differs per node kind so that the fixed edge anchors
//! (`right_s` → `left_t`) line up with the sides a card exposes. Domains are
//! turned into group nodes that contain their children.

use std::collections::{HashMap, HashSet};

use log::warn;

use super::theme::{Color, Theme};
use super::types::{GraphEdge, GraphNode, NodeType, RoleAssignment};

/// Handle id every edge attaches to on its target node.
pub const TARGET_HANDLE_ID: &str = "left_t";
/// Handle id every edge leaves from on its source node.
pub const SOURCE_HANDLE_ID: &str = "right_s";

/// Card width in graph units.
pub const NODE_WIDTH: f64 = 180.0;
/// Card height in graph units.
pub const NODE_HEIGHT: f64 = 56.0;

const DOMAIN_MIN_WIDTH: f64 = 200.0;
const DOMAIN_WIDTH_PER_CHILD: f64 = 120.0;
const DOMAIN_ASPECT: f64 = 0.6;

/// Side of a card a handle sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlePosition {
	Left,
	Right,
}

/// Connection point of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle {
	pub position: HandlePosition,
	pub id: &'static str,
}

impl Handle {
	const fn source(position: HandlePosition) -> Self {
		Self {
			position,
			id: SOURCE_HANDLE_ID,
		}
	}

	const fn target(position: HandlePosition) -> Self {
		Self {
			position,
			id: TARGET_HANDLE_ID,
		}
	}
}

/// Navigation offered on a node's toolbar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
	ViewDataProduct { id: String },
	ViewDataset { id: String },
	ViewDataOutput { id: String, product_id: String },
}

impl ToolbarAction {
	/// Button caption.
	pub fn label(&self) -> &'static str {
		match self {
			ToolbarAction::ViewDataProduct { .. } => "View data product",
			ToolbarAction::ViewDataset { .. } => "View dataset",
			ToolbarAction::ViewDataOutput { .. } => "View data output",
		}
	}

	/// Detail page of the entity, opened on its explorer tab.
	pub fn href(&self, app_base: &str) -> String {
		let base = app_base.trim_end_matches('/');
		match self {
			ToolbarAction::ViewDataProduct { id } => {
				format!("{base}/data-products/{id}?tab=explorer")
			}
			ToolbarAction::ViewDataset { id } => format!("{base}/datasets/{id}?tab=explorer"),
			ToolbarAction::ViewDataOutput { id, product_id } => {
				format!("{base}/data-products/{product_id}/data-outputs/{id}?tab=explorer")
			}
		}
	}
}

/// A point in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// Width and height in graph units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

/// Highlight-derived appearance of a node or edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualState {
	pub dimmed: bool,
	pub opacity: f64,
	pub z_index: i32,
}

impl Default for VisualState {
	fn default() -> Self {
		Self {
			dimmed: false,
			opacity: 1.0,
			z_index: 1,
		}
	}
}

/// A node ready for layout and drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
	pub id: String,
	pub kind: NodeType,
	pub name: String,
	/// Data product type icon drawn as the card badge.
	pub icon_key: Option<String>,
	pub is_main: bool,
	pub is_active: bool,
	pub domain: Option<String>,
	pub description: Option<String>,
	pub assignments: Vec<RoleAssignment>,
	pub source_handle: Handle,
	pub target_handle: Handle,
	pub toolbar: Option<ToolbarAction>,
	/// Owning domain group, set only when domain grouping is on.
	pub parent: Option<String>,
	/// Top-left corner.
	pub position: Position,
	pub size: Size,
	pub visual: VisualState,
}

impl RenderNode {
	pub fn is_group(&self) -> bool {
		self.kind == NodeType::Domain
	}

	/// Center of the card in graph space.
	pub fn center(&self) -> Position {
		Position {
			x: self.position.x + self.size.width / 2.0,
			y: self.position.y + self.size.height / 2.0,
		}
	}

	/// The handle with the given id, if the card exposes one.
	pub fn handle(&self, id: &str) -> Option<Handle> {
		[self.source_handle, self.target_handle]
			.into_iter()
			.find(|h| h.id == id)
	}

	/// Where an edge attaches for a given handle.
	pub fn anchor(&self, handle: Handle) -> Position {
		let y = self.position.y + self.size.height / 2.0;
		match handle.position {
			HandlePosition::Left => Position {
				x: self.position.x,
				y,
			},
			HandlePosition::Right => Position {
				x: self.position.x + self.size.width,
				y,
			},
		}
	}
}

/// Stroke appearance of an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub color: Color,
	/// Dash pattern (dash, gap) in screen pixels.
	pub dash: (f64, f64),
}

/// An edge ready for drawing. Edges are read-only: the canvas offers no way
/// to edit them.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	/// Handle id on the source card.
	pub source_handle: &'static str,
	/// Handle id on the target card.
	pub target_handle: &'static str,
	pub animated: bool,
	pub style: EdgeStyle,
	pub visual: VisualState,
}

/// The unit passed between the adapt, highlight and layout stages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderGraph {
	pub nodes: Vec<RenderNode>,
	pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
	pub fn node(&self, id: &str) -> Option<&RenderNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

fn base_node(node: &GraphNode) -> RenderNode {
	RenderNode {
		id: node.id.clone(),
		kind: node.node_type,
		name: node.data.name.clone(),
		icon_key: node.data.icon_key.clone(),
		is_main: node.is_main,
		is_active: false,
		domain: node.data.domain.clone(),
		description: node.data.description.clone(),
		assignments: Vec::new(),
		source_handle: Handle::source(HandlePosition::Right),
		target_handle: Handle::target(HandlePosition::Left),
		toolbar: None,
		parent: None,
		position: Position::default(),
		size: Size {
			width: NODE_WIDTH,
			height: NODE_HEIGHT,
		},
		visual: VisualState::default(),
	}
}

/// Size of a domain group before layout, estimated from its child count.
pub fn domain_size(child_count: usize) -> Size {
	let width = DOMAIN_MIN_WIDTH.max(child_count as f64 * DOMAIN_WIDTH_PER_CHILD);
	Size {
		width,
		height: width * DOMAIN_ASPECT,
	}
}

/// Adapt a domain into a group node.
pub fn adapt_domain(node: &GraphNode, child_count: usize) -> RenderNode {
	RenderNode {
		size: domain_size(child_count),
		..base_node(node)
	}
}

/// Adapt a single backend node.
///
/// `domains_enabled` decides whether the node is attached to its domain group.
/// The parent may still be dropped later by [`build_render_nodes`] if that
/// group ends up hidden.
pub fn adapt_node(node: &GraphNode, domains_enabled: bool) -> RenderNode {
	let mut out = base_node(node);
	let toolbar = |action: ToolbarAction| (!node.is_main).then_some(action);

	match node.node_type {
		NodeType::DataProduct => {
			out.target_handle = Handle::target(HandlePosition::Left);
			out.toolbar = toolbar(ToolbarAction::ViewDataProduct {
				id: node.data.id.clone(),
			});
			out.assignments = node.data.assignments.clone().unwrap_or_default();
		}
		NodeType::Dataset => {
			out.target_handle = Handle::target(HandlePosition::Right);
			out.toolbar = toolbar(ToolbarAction::ViewDataset {
				id: node.data.id.clone(),
			});
		}
		NodeType::DataOutput => {
			out.source_handle = Handle::source(HandlePosition::Left);
			out.target_handle = Handle::target(HandlePosition::Right);
			out.is_active = true;
			out.toolbar = match &node.data.link_to_id {
				Some(product_id) => toolbar(ToolbarAction::ViewDataOutput {
					id: node.id.clone(),
					product_id: product_id.clone(),
				}),
				None => {
					warn!("catalog-explorer: data output {} has no owning product", node.id);
					None
				}
			};
		}
		NodeType::Domain => return adapt_domain(node, 0),
	}

	if domains_enabled {
		out.parent = node.data.domain_id.clone();
	}
	out
}

/// Adapt a whole node set, grouping by domain.
///
/// Domain groups are included only when grouping is on and at least one
/// visible node belongs to them. Groups come first in the returned list so
/// every parent precedes the children that reference it.
pub fn build_render_nodes(nodes: &[GraphNode], domains_enabled: bool) -> Vec<RenderNode> {
	let mut regular: Vec<RenderNode> = nodes
		.iter()
		.filter(|n| n.node_type != NodeType::Domain)
		.map(|n| adapt_node(n, domains_enabled))
		.collect();

	if !domains_enabled {
		return regular;
	}

	let mut child_counts: HashMap<&str, usize> = HashMap::new();
	for node in nodes.iter().filter(|n| n.node_type != NodeType::Domain) {
		if let Some(domain_id) = node.data.domain_id.as_deref() {
			*child_counts.entry(domain_id).or_insert(0) += 1;
		}
	}

	let domains: Vec<RenderNode> = nodes
		.iter()
		.filter(|n| n.node_type == NodeType::Domain)
		.filter_map(|n| {
			let count = child_counts.get(n.id.as_str()).copied().unwrap_or(0);
			(count > 0).then(|| adapt_domain(n, count))
		})
		.collect();

	let visible: HashSet<&str> = domains.iter().map(|d| d.id.as_str()).collect();
	for node in &mut regular {
		if node
			.parent
			.as_deref()
			.is_some_and(|parent| !visible.contains(parent))
		{
			node.parent = None;
		}
	}

	let mut out = domains;
	out.extend(regular);
	out
}

/// Adapt backend edges: fixed anchors, dashed stroke, read-only.
pub fn adapt_edges(edges: &[GraphEdge], theme: &Theme) -> Vec<RenderEdge> {
	edges
		.iter()
		.map(|edge| RenderEdge {
			id: edge.id.clone(),
			source: edge.source.clone(),
			target: edge.target.clone(),
			source_handle: SOURCE_HANDLE_ID,
			target_handle: TARGET_HANDLE_ID,
			animated: edge.animated,
			style: EdgeStyle {
				color: theme.edge_color(edge.animated),
				dash: (5.0, 5.0),
			},
			visual: VisualState::default(),
		})
		.collect()
}

/// Adapt nodes and edges together.
pub fn adapt_graph(
	nodes: &[GraphNode],
	edges: &[GraphEdge],
	domains_enabled: bool,
	theme: &Theme,
) -> RenderGraph {
	RenderGraph {
		nodes: build_render_nodes(nodes, domains_enabled),
		edges: adapt_edges(edges, theme),
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn ids(nodes: &[RenderNode]) -> Vec<&str> {
		nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn data_product_gets_left_target_and_toolbar() {
		let node = GraphNode::new("p1", NodeType::DataProduct, "Sales");
		let out = adapt_node(&node, false);
		assert_eq!(out.target_handle.position, HandlePosition::Left);
		assert_eq!(
			out.toolbar,
			Some(ToolbarAction::ViewDataProduct { id: "p1".into() })
		);
		assert!(!out.is_active);
	}

	#[test]
	fn dataset_target_handle_is_on_the_right() {
		let node = GraphNode::new("s1", NodeType::Dataset, "Orders");
		let out = adapt_node(&node, false);
		assert_eq!(
			out.target_handle,
			Handle {
				position: HandlePosition::Right,
				id: TARGET_HANDLE_ID
			}
		);
		assert_eq!(out.toolbar.as_ref().map(|t| t.label()), Some("View dataset"));
	}

	#[test]
	fn data_output_links_to_owning_product() {
		let node = GraphNode::new("o1", NodeType::DataOutput, "orders_s3").linked_to("p1");
		let out = adapt_node(&node, false);
		assert!(out.is_active);
		assert_eq!(out.source_handle.position, HandlePosition::Left);
		assert_eq!(out.target_handle.position, HandlePosition::Right);
		let action = out.toolbar.unwrap();
		assert_eq!(
			action.href("/portal/"),
			"/portal/data-products/p1/data-outputs/o1?tab=explorer"
		);
	}

	#[test]
	fn main_node_has_no_toolbar() {
		for kind in [NodeType::DataProduct, NodeType::Dataset, NodeType::DataOutput] {
			let node = GraphNode::new("n", kind, "N").linked_to("p").main();
			assert_eq!(adapt_node(&node, false).toolbar, None, "{kind}");
		}
	}

	#[test]
	fn every_declared_type_adapts_to_one_node() {
		let nodes = vec![
			GraphNode::new("p", NodeType::DataProduct, "P"),
			GraphNode::new("s", NodeType::Dataset, "S"),
			GraphNode::new("o", NodeType::DataOutput, "O").linked_to("p"),
			GraphNode::new("d", NodeType::Domain, "D"),
		];
		for node in &nodes {
			let out = adapt_node(node, true);
			assert_eq!(out.id, node.id);
			assert_eq!(out.kind, node.node_type);
		}
	}

	#[test]
	fn domains_precede_children_and_children_reference_them() {
		let nodes = vec![
			GraphNode::new("p1", NodeType::DataProduct, "P1").in_domain("d1"),
			GraphNode::new("d1", NodeType::Domain, "Retail"),
			GraphNode::new("s1", NodeType::Dataset, "S1").in_domain("d1"),
			GraphNode::new("p2", NodeType::DataProduct, "P2"),
		];
		let out = build_render_nodes(&nodes, true);
		assert_eq!(ids(&out), vec!["d1", "p1", "s1", "p2"]);
		assert_eq!(out[1].parent.as_deref(), Some("d1"));
		assert_eq!(out[2].parent.as_deref(), Some("d1"));
		assert_eq!(out[3].parent, None);
		assert_eq!(out[0].size, domain_size(2));
	}

	#[test]
	fn empty_domain_is_excluded_even_when_grouping_is_on() {
		let nodes = vec![
			GraphNode::new("d1", NodeType::Domain, "Empty"),
			GraphNode::new("d2", NodeType::Domain, "Used"),
			GraphNode::new("p1", NodeType::DataProduct, "P1").in_domain("d2"),
		];
		let out = build_render_nodes(&nodes, true);
		assert_eq!(ids(&out), vec!["d2", "p1"]);
	}

	#[test]
	fn grouping_off_drops_domains_and_parents() {
		let nodes = vec![
			GraphNode::new("d1", NodeType::Domain, "Retail"),
			GraphNode::new("p1", NodeType::DataProduct, "P1").in_domain("d1"),
		];
		let out = build_render_nodes(&nodes, false);
		assert_eq!(ids(&out), vec!["p1"]);
		assert_eq!(out[0].parent, None);
	}

	#[test]
	fn parent_is_cleared_when_domain_is_not_in_the_snapshot() {
		let nodes = vec![GraphNode::new("p1", NodeType::DataProduct, "P1").in_domain("gone")];
		let out = build_render_nodes(&nodes, true);
		assert_eq!(out[0].parent, None);
	}

	#[test]
	fn domain_size_grows_with_children() {
		assert_eq!(domain_size(1).width, 200.0);
		assert_eq!(domain_size(3).width, 360.0);
		assert!((domain_size(3).height - 216.0).abs() < 1e-9);
	}

	#[test]
	fn edges_use_fixed_handles_and_theme_colors() {
		let theme = Theme::portal();
		let edges = adapt_edges(
			&[GraphEdge::new("a", "b", true), GraphEdge::new("b", "c", false)],
			&theme,
		);
		assert_eq!(edges[0].id, "a-b");
		assert!(edges.iter().all(|e| e.source_handle == "right_s"
			&& e.target_handle == "left_t"
			&& e.style.dash == (5.0, 5.0)));
		assert_eq!(edges[0].style.color, theme.primary);
		assert_eq!(edges[1].style.color, theme.primary_border);
	}

	#[test]
	fn anchors_sit_on_the_handle_side() {
		let mut node = adapt_node(&GraphNode::new("s", NodeType::Dataset, "S"), false);
		node.position = Position { x: 10.0, y: 20.0 };
		let target = node.anchor(node.target_handle);
		assert_eq!(target, Position { x: 190.0, y: 48.0 });
		let source = node.anchor(node.source_handle);
		assert_eq!(source, Position { x: 190.0, y: 48.0 });
	}

	#[test]
	fn handles_are_found_by_edge_handle_id() {
		let product = adapt_node(&GraphNode::new("p", NodeType::DataProduct, "P"), false);
		assert_eq!(product.handle(SOURCE_HANDLE_ID), Some(product.source_handle));
		let target = product.handle(TARGET_HANDLE_ID).map(|h| h.position);
		assert_eq!(target, Some(HandlePosition::Left));
		assert_eq!(product.handle("top_t"), None);
	}

	#[test]
	fn domains_start_on_the_base_layer() {
		let domain = adapt_domain(&GraphNode::new("d", NodeType::Domain, "D"), 3);
		assert_eq!(domain.visual, VisualState::default());
		assert_eq!(domain.size, domain_size(3));
	}
}
