//! Automatic graph layout.
//!
//! Positions come from a `force_graph` physics simulation that runs to rest
//! before returning, so callers can fit the view as soon as `apply` returns.
//! Domain groups take part as hub bodies tied to their children by springs,
//! then get resized to enclose those children.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;
use serde::Deserialize;

use super::adapter::{Position, RenderEdge, RenderNode, Size};
use crate::error::GraphError;

/// Computes node positions.
///
/// Implementations must keep every input node and its order (groups before
/// their children).
pub trait LayoutEngine {
	fn apply(
		&self,
		nodes: Vec<RenderNode>,
		edges: &[RenderEdge],
		domains_enabled: bool,
	) -> Result<Vec<RenderNode>, GraphError>;
}

/// Tuning for [`ForceLayout`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
	/// Upper bound on simulation steps.
	pub max_iterations: usize,
	/// Simulation step in seconds.
	pub time_step: f32,
	/// The simulation counts as settled once no body moves further than this in one step.
	pub settle_threshold: f32,
	/// Scale from simulation units to graph units.
	pub spacing: f64,
	/// Minimum gap between cards after overlap removal.
	pub node_gap: f64,
	/// Space between a domain border and its children.
	pub group_padding: f64,
	/// Repulsion between every pair of bodies.
	pub force_charge: f32,
	/// Spring pull along edges and towards a body's domain.
	pub force_spring: f32,
	/// Cap on the force applied to one body per step.
	pub force_max: f32,
	/// Velocity scale of the simulation.
	pub node_speed: f32,
	/// Velocity kept from one step to the next.
	pub damping_factor: f32,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			max_iterations: 800,
			time_step: 0.016,
			settle_threshold: 0.01,
			spacing: 4.0,
			node_gap: 24.0,
			group_padding: 40.0,
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

/// Force-directed layout with domain grouping.
#[derive(Clone, Debug, Default)]
pub struct ForceLayout {
	pub params: LayoutParams,
}

impl ForceLayout {
	pub fn new(params: LayoutParams) -> Self {
		Self { params }
	}

	/// Deterministic starting points: top-level bodies on a circle, children
	/// on a small circle around their group.
	fn seed(nodes: &[RenderNode], group_of: &[Option<usize>]) -> Vec<(f32, f32)> {
		let top: Vec<usize> = (0..nodes.len()).filter(|&i| group_of[i].is_none()).collect();
		let radius = 40.0 + 12.0 * top.len() as f64;
		let mut seeds = vec![(0.0f32, 0.0f32); nodes.len()];

		for (slot, &i) in top.iter().enumerate() {
			let angle = slot as f64 * 2.0 * PI / top.len().max(1) as f64;
			seeds[i] = ((radius * angle.cos()) as f32, (radius * angle.sin()) as f32);
		}

		let mut child_slots: HashMap<usize, usize> = HashMap::new();
		let child_totals = group_of.iter().flatten().fold(HashMap::new(), |mut acc, &g| {
			*acc.entry(g).or_insert(0usize) += 1;
			acc
		});
		for i in 0..nodes.len() {
			if let Some(g) = group_of[i] {
				let slot = child_slots.entry(g).or_insert(0);
				let total = child_totals.get(&g).copied().unwrap_or(1).max(1);
				let angle = *slot as f64 * 2.0 * PI / total as f64;
				*slot += 1;
				let (gx, gy) = seeds[g];
				seeds[i] = (gx + (20.0 * angle.cos()) as f32, gy + (20.0 * angle.sin()) as f32);
			}
		}
		seeds
	}

	/// Run the simulation until it settles; returns body centers in simulation units.
	fn simulate(
		&self,
		nodes: &[RenderNode],
		edges: &[RenderEdge],
		group_of: &[Option<usize>],
	) -> Vec<(f32, f32)> {
		let p = &self.params;
		let mut graph: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
			force_charge: p.force_charge,
			force_spring: p.force_spring,
			force_max: p.force_max,
			node_speed: p.node_speed,
			damping_factor: p.damping_factor,
		});

		let seeds = Self::seed(nodes, group_of);
		let mut id_to_idx = HashMap::new();
		for (i, node) in nodes.iter().enumerate() {
			let (x, y) = if node.is_main { (0.0, 0.0) } else { seeds[i] };
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: node.is_main,
				user_data: i,
			});
			id_to_idx.insert(node.id.as_str(), idx);
		}

		let mut skipped = 0usize;
		for edge in edges {
			match (
				id_to_idx.get(edge.source.as_str()),
				id_to_idx.get(edge.target.as_str()),
			) {
				(Some(&src), Some(&tgt)) => {
					graph.add_edge(src, tgt, EdgeData::default());
				}
				_ => skipped += 1,
			}
		}
		if skipped > 0 {
			debug!("catalog-explorer: layout skipped {} dangling edges", skipped);
		}

		for (i, group) in group_of.iter().enumerate() {
			if let Some(g) = group {
				let child = id_to_idx[nodes[i].id.as_str()];
				let hub = id_to_idx[nodes[*g].id.as_str()];
				graph.add_edge(child, hub, EdgeData::default());
			}
		}

		let mut positions = seeds;
		let mut iterations = 0;
		while iterations < p.max_iterations {
			graph.update(p.time_step);
			iterations += 1;

			let mut max_step = 0.0f32;
			graph.visit_nodes(|node| {
				let i = node.data.user_data;
				let (px, py) = positions[i];
				let (dx, dy) = (node.x() - px, node.y() - py);
				max_step = max_step.max((dx * dx + dy * dy).sqrt());
				positions[i] = (node.x(), node.y());
			});
			if max_step < p.settle_threshold {
				break;
			}
		}
		debug!(
			"catalog-explorer: layout settled after {} of {} iterations",
			iterations, p.max_iterations
		);
		positions
	}
}

/// Push overlapping cards apart along the axis of least overlap.
fn resolve_overlaps(nodes: &mut [RenderNode], gap: f64) {
	const PASSES: usize = 50;
	let cards: Vec<usize> = (0..nodes.len()).filter(|&i| !nodes[i].is_group()).collect();

	for _ in 0..PASSES {
		let mut moved = false;
		for a in 0..cards.len() {
			for b in (a + 1)..cards.len() {
				let (i, j) = (cards[a], cards[b]);
				let (ci, cj) = (nodes[i].center(), nodes[j].center());
				let overlap_x = (nodes[i].size.width + nodes[j].size.width) / 2.0 + gap
					- (ci.x - cj.x).abs();
				let overlap_y = (nodes[i].size.height + nodes[j].size.height) / 2.0 + gap
					- (ci.y - cj.y).abs();
				if overlap_x <= 0.0 || overlap_y <= 0.0 {
					continue;
				}
				moved = true;
				// Ties (identical centers) split along x by index.
				if overlap_x < overlap_y {
					let dir = if ci.x < cj.x || (ci.x == cj.x && i < j) { -1.0 } else { 1.0 };
					nodes[i].position.x += dir * overlap_x / 2.0;
					nodes[j].position.x -= dir * overlap_x / 2.0;
				} else {
					let dir = if ci.y < cj.y || (ci.y == cj.y && i < j) { -1.0 } else { 1.0 };
					nodes[i].position.y += dir * overlap_y / 2.0;
					nodes[j].position.y -= dir * overlap_y / 2.0;
				}
			}
		}
		if !moved {
			break;
		}
	}
}

/// Resize each group to enclose its children, never shrinking below its estimate.
fn fit_groups(nodes: &mut [RenderNode], group_of: &[Option<usize>], padding: f64) {
	let mut bounds: HashMap<usize, (f64, f64, f64, f64)> = HashMap::new();
	for (i, group) in group_of.iter().enumerate() {
		if let Some(g) = group {
			let n = &nodes[i];
			let (x0, y0) = (n.position.x, n.position.y);
			let (x1, y1) = (x0 + n.size.width, y0 + n.size.height);
			bounds
				.entry(*g)
				.and_modify(|b| *b = (b.0.min(x0), b.1.min(y0), b.2.max(x1), b.3.max(y1)))
				.or_insert((x0, y0, x1, y1));
		}
	}

	for (g, (x0, y0, x1, y1)) in bounds {
		let group = &mut nodes[g];
		let width = (x1 - x0 + 2.0 * padding).max(group.size.width);
		let height = (y1 - y0 + 2.0 * padding).max(group.size.height);
		let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
		group.size = Size { width, height };
		group.position = Position {
			x: cx - width / 2.0,
			y: cy - height / 2.0,
		};
	}
}

/// A rectangle that moves as one: a domain with its members, or a card outside any domain.
struct Block {
	members: Vec<usize>,
	x: f64,
	y: f64,
	width: f64,
	height: f64,
}

impl Block {
	fn of(node: &RenderNode, index: usize) -> Self {
		Self {
			members: vec![index],
			x: node.position.x,
			y: node.position.y,
			width: node.size.width,
			height: node.size.height,
		}
	}

	fn center(&self) -> (f64, f64) {
		(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	/// Overlap with `other` on each axis once `gap` is added; both positive means a collision.
	fn overlap(&self, other: &Block, gap: f64) -> (f64, f64) {
		let ((ax, ay), (bx, by)) = (self.center(), other.center());
		(
			(self.width + other.width) / 2.0 + gap - (ax - bx).abs(),
			(self.height + other.height) / 2.0 + gap - (ay - by).abs(),
		)
	}
}

/// Keep domains apart from each other and from cards outside them.
///
/// Each domain moves together with its children, so enclosure from
/// [`fit_groups`] is preserved. Blocks still colliding after the relaxation
/// passes are laid out in a row.
fn separate_blocks(nodes: &mut [RenderNode], group_of: &[Option<usize>], gap: f64) {
	const PASSES: usize = 100;

	let mut blocks: Vec<Block> = Vec::new();
	let mut block_of_group: HashMap<usize, usize> = HashMap::new();
	for (i, node) in nodes.iter().enumerate() {
		if node.is_group() {
			block_of_group.insert(i, blocks.len());
			blocks.push(Block::of(node, i));
		}
	}
	for (i, node) in nodes.iter().enumerate() {
		if node.is_group() {
			continue;
		}
		match group_of[i].and_then(|g| block_of_group.get(&g)) {
			Some(&b) => blocks[b].members.push(i),
			None => blocks.push(Block::of(node, i)),
		}
	}
	let origins: Vec<(f64, f64)> = blocks.iter().map(|b| (b.x, b.y)).collect();

	let mut settled = false;
	for _ in 0..PASSES {
		let mut moved = false;
		for a in 0..blocks.len() {
			for b in (a + 1)..blocks.len() {
				let (overlap_x, overlap_y) = blocks[a].overlap(&blocks[b], gap);
				if overlap_x <= 0.0 || overlap_y <= 0.0 {
					continue;
				}
				moved = true;
				let ((ax, ay), (bx, by)) = (blocks[a].center(), blocks[b].center());
				if overlap_x < overlap_y {
					let dir = if ax <= bx { -1.0 } else { 1.0 };
					blocks[a].x += dir * overlap_x / 2.0;
					blocks[b].x -= dir * overlap_x / 2.0;
				} else {
					let dir = if ay <= by { -1.0 } else { 1.0 };
					blocks[a].y += dir * overlap_y / 2.0;
					blocks[b].y -= dir * overlap_y / 2.0;
				}
			}
		}
		if !moved {
			settled = true;
			break;
		}
	}

	if !settled {
		debug!(
			"catalog-explorer: {} layout blocks still collide, placing them in a row",
			blocks.len()
		);
		let mut order: Vec<usize> = (0..blocks.len()).collect();
		order.sort_by(|&a, &b| blocks[a].x.total_cmp(&blocks[b].x));
		let mut cursor = order.first().map_or(0.0, |&first| blocks[first].x);
		for b in order {
			blocks[b].x = cursor;
			cursor += blocks[b].width + gap;
		}
	}

	for (block, (x0, y0)) in blocks.iter().zip(origins) {
		let (dx, dy) = (block.x - x0, block.y - y0);
		for &i in &block.members {
			nodes[i].position.x += dx;
			nodes[i].position.y += dy;
		}
	}
}

impl LayoutEngine for ForceLayout {
	fn apply(
		&self,
		mut nodes: Vec<RenderNode>,
		edges: &[RenderEdge],
		domains_enabled: bool,
	) -> Result<Vec<RenderNode>, GraphError> {
		if nodes.is_empty() {
			return Ok(nodes);
		}

		let index: HashMap<&str, usize> = nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| n.is_group())
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();
		let group_of: Vec<Option<usize>> = nodes
			.iter()
			.map(|n| {
				if !domains_enabled {
					return None;
				}
				n.parent.as_deref().and_then(|p| index.get(p).copied())
			})
			.collect();

		let centers = self.simulate(&nodes, edges, &group_of);
		let spacing = self.params.spacing;
		for (node, (x, y)) in nodes.iter_mut().zip(centers) {
			node.position = Position {
				x: x as f64 * spacing - node.size.width / 2.0,
				y: y as f64 * spacing - node.size.height / 2.0,
			};
		}

		resolve_overlaps(&mut nodes, self.params.node_gap);
		if domains_enabled {
			fit_groups(&mut nodes, &group_of, self.params.group_padding);
			separate_blocks(&mut nodes, &group_of, self.params.node_gap);
		}
		Ok(nodes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::explorer::adapter::{adapt_graph, domain_size};
	use crate::components::explorer::theme::Theme;
	use crate::components::explorer::types::{GraphEdge, GraphNode, NodeType};

	fn layout(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>, domains: bool) -> Vec<RenderNode> {
		let graph = adapt_graph(&nodes, &edges, domains, &Theme::portal());
		ForceLayout::default()
			.apply(graph.nodes, &graph.edges, domains)
			.unwrap()
	}

	fn overlaps(a: &RenderNode, b: &RenderNode) -> bool {
		a.position.x < b.position.x + b.size.width
			&& b.position.x < a.position.x + a.size.width
			&& a.position.y < b.position.y + b.size.height
			&& b.position.y < a.position.y + a.size.height
	}

	#[test]
	fn empty_graph_is_a_no_op() {
		assert!(layout(vec![], vec![], true).is_empty());
	}

	#[test]
	fn keeps_order_and_every_node() {
		let out = layout(
			vec![
				GraphNode::new("p1", NodeType::DataProduct, "P1").in_domain("d1"),
				GraphNode::new("d1", NodeType::Domain, "D1"),
				GraphNode::new("s1", NodeType::Dataset, "S1"),
			],
			vec![GraphEdge::new("p1", "s1", true)],
			true,
		);
		let ids: Vec<&str> = out.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["d1", "p1", "s1"]);
		assert!(out.iter().all(|n| n.position.x.is_finite() && n.position.y.is_finite()));
	}

	#[test]
	fn cards_do_not_overlap() {
		let nodes: Vec<GraphNode> = (0..8)
			.map(|i| GraphNode::new(format!("s{i}"), NodeType::Dataset, format!("S{i}")))
			.collect();
		let edges = (1..8).map(|i| GraphEdge::new("s0", format!("s{i}"), false)).collect();
		let out = layout(nodes, edges, false);
		for (i, a) in out.iter().enumerate() {
			for b in &out[i + 1..] {
				assert!(!overlaps(a, b), "{} overlaps {}", a.id, b.id);
			}
		}
	}

	#[test]
	fn domain_encloses_its_children() {
		let out = layout(
			vec![
				GraphNode::new("d1", NodeType::Domain, "Retail"),
				GraphNode::new("p1", NodeType::DataProduct, "P1").in_domain("d1"),
				GraphNode::new("s1", NodeType::Dataset, "S1").in_domain("d1"),
				GraphNode::new("x", NodeType::Dataset, "X"),
			],
			vec![GraphEdge::new("p1", "s1", true), GraphEdge::new("s1", "x", false)],
			true,
		);
		let group = &out[0];
		assert!(group.size.width >= domain_size(2).width);
		for child in out.iter().filter(|n| n.parent.as_deref() == Some("d1")) {
			assert!(child.position.x >= group.position.x);
			assert!(child.position.y >= group.position.y);
			assert!(child.position.x + child.size.width <= group.position.x + group.size.width);
			assert!(child.position.y + child.size.height <= group.position.y + group.size.height);
		}
	}

	#[test]
	fn domains_stay_apart_and_hold_only_their_own_cards() {
		let mut nodes = Vec::new();
		let mut edges = Vec::new();
		for d in 0..4 {
			nodes.push(GraphNode::new(format!("d{d}"), NodeType::Domain, format!("Domain {d}")));
			for p in 0..4 {
				let id = format!("d{d}p{p}");
				let product = GraphNode::new(&id, NodeType::DataProduct, &id);
				nodes.push(product.in_domain(format!("d{d}")));
				edges.push(GraphEdge::new(&id, format!("d{}p{p}", (d + 1) % 4), true));
			}
		}
		nodes.push(GraphNode::new("loose", NodeType::Dataset, "Loose"));
		edges.push(GraphEdge::new("d0p0", "loose", false));

		let out = layout(nodes, edges, true);
		let groups: Vec<&RenderNode> = out.iter().filter(|n| n.is_group()).collect();
		assert_eq!(groups.len(), 4);
		for (i, a) in groups.iter().enumerate() {
			for b in &groups[i + 1..] {
				assert!(!overlaps(a, b), "{} overlaps {}", a.id, b.id);
			}
		}
		for group in &groups {
			for card in out.iter().filter(|n| !n.is_group()) {
				let member = card.parent.as_deref() == Some(group.id.as_str());
				assert_eq!(member, overlaps(group, card), "{} in {}", card.id, group.id);
			}
		}
	}

	#[test]
	fn main_node_stays_anchored_at_origin() {
		let out = layout(
			vec![
				GraphNode::new("m", NodeType::Dataset, "Main").main(),
				GraphNode::new("a", NodeType::DataProduct, "A"),
			],
			vec![GraphEdge::new("a", "m", true)],
			false,
		);
		let main = out.iter().find(|n| n.is_main).unwrap();
		let center = main.center();
		// Overlap removal may nudge it by at most one card.
		assert!(center.x.abs() <= main.size.width);
		assert!(center.y.abs() <= main.size.height);
	}

	#[test]
	fn dangling_edges_do_not_break_layout() {
		let out = layout(
			vec![GraphNode::new("a", NodeType::DataProduct, "A")],
			vec![GraphEdge::new("a", "ghost", false)],
			false,
		);
		assert_eq!(out.len(), 1);
	}
}
