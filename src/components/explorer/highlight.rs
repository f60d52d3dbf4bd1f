//! Selection highlighting.
//!
//! The selected node and its one-hop neighbors (both edge directions) stay at
//! full strength; everything else is dimmed. The whole graph is recomputed on
//! every selection change, O(nodes + edges).

use std::collections::HashSet;

use super::adapter::{RenderEdge, RenderGraph, VisualState};

pub const DIMMED_NODE_OPACITY: f64 = 0.3;
pub const DIMMED_EDGE_OPACITY: f64 = 0.2;
pub const Z_INDEX_ELEVATED: i32 = 10;
pub const Z_INDEX_BASE: i32 = 1;

/// The selected id plus every node it shares an edge with.
///
/// Edges pointing at ids missing from the node set still contribute their
/// endpoint here; such ids simply never match a node.
pub fn connected_ids<'a>(edges: &'a [RenderEdge], selected: &'a str) -> HashSet<&'a str> {
	let mut connected = HashSet::from([selected]);
	for edge in edges {
		if edge.source == selected {
			connected.insert(edge.target.as_str());
		}
		if edge.target == selected {
			connected.insert(edge.source.as_str());
		}
	}
	connected
}

fn emphasis(connected: bool, dimmed_opacity: f64) -> VisualState {
	if connected {
		VisualState {
			dimmed: false,
			opacity: 1.0,
			z_index: Z_INDEX_ELEVATED,
		}
	} else {
		VisualState {
			dimmed: true,
			opacity: dimmed_opacity,
			z_index: Z_INDEX_BASE,
		}
	}
}

/// Annotate every node and edge with its highlight state.
///
/// With no selection every element is reset to [`VisualState::default`].
pub fn highlight(mut graph: RenderGraph, selected: Option<&str>) -> RenderGraph {
	let Some(selected) = selected else {
		for node in &mut graph.nodes {
			node.visual = VisualState::default();
		}
		for edge in &mut graph.edges {
			edge.visual = VisualState::default();
		}
		return graph;
	};

	let connected: HashSet<String> = connected_ids(&graph.edges, selected)
		.into_iter()
		.map(str::to_owned)
		.collect();

	for node in &mut graph.nodes {
		node.visual = emphasis(connected.contains(&node.id), DIMMED_NODE_OPACITY);
	}
	for edge in &mut graph.edges {
		let both = connected.contains(&edge.source) && connected.contains(&edge.target);
		edge.visual = emphasis(both, DIMMED_EDGE_OPACITY);
	}
	graph
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::explorer::adapter::adapt_graph;
	use crate::components::explorer::theme::Theme;
	use crate::components::explorer::types::{GraphEdge, GraphNode, NodeType};

	/// A(DataProduct) -> B(Dataset) -> C(DataOutput)
	fn chain() -> RenderGraph {
		let nodes = vec![
			GraphNode::new("A", NodeType::DataProduct, "A"),
			GraphNode::new("B", NodeType::Dataset, "B"),
			GraphNode::new("C", NodeType::DataOutput, "C").linked_to("A"),
		];
		let edges = vec![GraphEdge::new("A", "B", true), GraphEdge::new("B", "C", false)];
		adapt_graph(&nodes, &edges, false, &Theme::portal())
	}

	fn dimmed_nodes(graph: &RenderGraph) -> Vec<&str> {
		graph
			.nodes
			.iter()
			.filter(|n| n.visual.dimmed)
			.map(|n| n.id.as_str())
			.collect()
	}

	#[test]
	fn selecting_the_middle_node_keeps_everything_lit() {
		let graph = highlight(chain(), Some("B"));
		assert!(dimmed_nodes(&graph).is_empty());
		assert!(graph.edges.iter().all(|e| !e.visual.dimmed));
		assert!(graph.nodes.iter().all(|n| n.visual.z_index == Z_INDEX_ELEVATED));
	}

	#[test]
	fn selecting_an_end_dims_the_far_side() {
		let graph = highlight(chain(), Some("A"));
		assert_eq!(dimmed_nodes(&graph), vec!["C"]);

		let c = graph.node("C").unwrap();
		assert_eq!(c.visual.opacity, DIMMED_NODE_OPACITY);
		assert_eq!(c.visual.z_index, Z_INDEX_BASE);

		let ab = &graph.edges[0];
		let bc = &graph.edges[1];
		assert!(!ab.visual.dimmed);
		assert_eq!(ab.visual.opacity, 1.0);
		assert!(bc.visual.dimmed);
		assert_eq!(bc.visual.opacity, DIMMED_EDGE_OPACITY);
	}

	#[test]
	fn no_selection_resets_every_element() {
		let dimmed = highlight(chain(), Some("A"));
		let cleared = highlight(dimmed, None);
		assert_eq!(cleared, chain());
		assert_eq!(highlight(cleared.clone(), None), cleared);
	}

	#[test]
	fn edge_dimmed_iff_an_endpoint_is_dimmed() {
		let mut graph = chain();
		let back_edge = GraphEdge::new("C", "A", false);
		graph.edges.extend(adapt_graph(&[], &[back_edge], false, &Theme::portal()).edges);
		for selected in ["A", "B", "C"] {
			let out = highlight(graph.clone(), Some(selected));
			let connected = connected_ids(&out.edges, selected);
			assert!(connected.contains(selected));
			for edge in &out.edges {
				let lit = connected.contains(edge.source.as_str())
					&& connected.contains(edge.target.as_str());
				assert_eq!(edge.visual.dimmed, !lit, "{} with {selected}", edge.id);
			}
			for node in &out.nodes {
				assert_eq!(node.visual.dimmed, !connected.contains(node.id.as_str()));
			}
		}
	}

	#[test]
	fn dangling_edges_are_tolerated() {
		let mut graph = chain();
		graph.edges.extend(
			adapt_graph(&[], &[GraphEdge::new("A", "ghost", true)], false, &Theme::portal()).edges,
		);
		let out = highlight(graph, Some("A"));
		assert_eq!(dimmed_nodes(&out), vec!["C"]);
		assert!(!out.edges[2].visual.dimmed);
	}

	#[test]
	fn selecting_an_isolated_node_dims_all_others() {
		let out = highlight(chain(), Some("nowhere"));
		assert_eq!(dimmed_nodes(&out), vec!["A", "B", "C"]);
		assert!(out.edges.iter().all(|e| e.visual.dimmed));
	}
}
