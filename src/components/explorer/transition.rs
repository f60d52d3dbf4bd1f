//! Smoothed visual transitions driven by the animation loop.
//!
//! Both the camera and per-element opacity ease toward their targets with
//! exponential smoothing: value += (target - value) * (1 - e^(-speed * dt)).
//! This gives natural ease-out motion that slows as it approaches the target.

use std::collections::HashMap;

use super::adapter::RenderGraph;
use super::view::ViewTransform;

/// Camera easing speed; reaches ~95% of a jump in roughly 0.6s.
const VIEW_SPEED: f64 = 5.0;
/// Opacity easing speed; ~150ms to 95%.
const FADE_SPEED: f64 = 6.0;
const EPSILON: f64 = 0.001;

fn smoothing(speed: f64, dt: f64) -> f64 {
	1.0 - (-speed * dt).exp()
}

/// Eases the view transform toward a requested target.
#[derive(Clone, Debug, Default)]
pub struct ViewAnimation {
	target: Option<ViewTransform>,
}

impl ViewAnimation {
	pub fn start(&mut self, target: ViewTransform) {
		self.target = Some(target);
	}

	/// Abandon the animation, e.g. when the user starts panning.
	pub fn cancel(&mut self) {
		self.target = None;
	}

	pub fn is_running(&self) -> bool {
		self.target.is_some()
	}

	/// Move `current` one step toward the target.
	pub fn tick(&mut self, current: &mut ViewTransform, dt: f64) {
		let Some(target) = self.target else {
			return;
		};
		let f = smoothing(VIEW_SPEED, dt);
		current.x += (target.x - current.x) * f;
		current.y += (target.y - current.y) * f;
		current.k += (target.k - current.k) * f;

		let done = (target.x - current.x).abs() < 0.5
			&& (target.y - current.y).abs() < 0.5
			&& (target.k - current.k).abs() < EPSILON;
		if done {
			*current = target;
			self.target = None;
		}
	}
}

/// Displayed opacity per node/edge id, easing toward the highlight target.
#[derive(Clone, Debug, Default)]
pub struct OpacityFade {
	nodes: HashMap<String, f64>,
	edges: HashMap<String, f64>,
}

fn step(values: &mut HashMap<String, f64>, id: &str, target: f64, f: f64) -> bool {
	if !values.contains_key(id) {
		values.insert(id.to_owned(), target);
	}
	let Some(value) = values.get_mut(id) else {
		return false;
	};
	*value += (target - *value) * f;
	if (target - *value).abs() < EPSILON {
		*value = target;
		false
	} else {
		true
	}
}

impl OpacityFade {
	/// Jump straight to the graph's targets (fresh graph, nothing to fade from).
	pub fn reset(&mut self, graph: &RenderGraph) {
		self.nodes = graph
			.nodes
			.iter()
			.map(|n| (n.id.clone(), n.visual.opacity))
			.collect();
		self.edges = graph
			.edges
			.iter()
			.map(|e| (e.id.clone(), e.visual.opacity))
			.collect();
	}

	/// Step every element toward its target. Returns true while anything is still moving.
	pub fn tick(&mut self, graph: &RenderGraph, dt: f64) -> bool {
		let f = smoothing(FADE_SPEED, dt);
		let mut moving = false;
		for node in &graph.nodes {
			moving |= step(&mut self.nodes, &node.id, node.visual.opacity, f);
		}
		for edge in &graph.edges {
			moving |= step(&mut self.edges, &edge.id, edge.visual.opacity, f);
		}
		moving
	}

	/// Current node opacity, falling back to `target` for unseen ids.
	pub fn node(&self, id: &str, target: f64) -> f64 {
		self.nodes.get(id).copied().unwrap_or(target)
	}

	/// Current edge opacity, falling back to `target` for unseen ids.
	pub fn edge(&self, id: &str, target: f64) -> f64 {
		self.edges.get(id).copied().unwrap_or(target)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::explorer::adapter::adapt_graph;
	use crate::components::explorer::highlight::{DIMMED_NODE_OPACITY, highlight};
	use crate::components::explorer::theme::Theme;
	use crate::components::explorer::types::{GraphEdge, GraphNode, NodeType};

	#[test]
	fn view_animation_converges_and_stops() {
		let mut current = ViewTransform::default();
		let target = ViewTransform {
			x: 200.0,
			y: -80.0,
			k: 2.0,
		};
		let mut anim = ViewAnimation::default();
		anim.start(target);
		for _ in 0..600 {
			anim.tick(&mut current, 0.016);
		}
		assert!(!anim.is_running());
		assert_eq!(current, target);
	}

	#[test]
	fn opacity_eases_toward_dimmed_state() {
		let graph = adapt_graph(
			&[
				GraphNode::new("a", NodeType::DataProduct, "A"),
				GraphNode::new("b", NodeType::Dataset, "B"),
			],
			&[GraphEdge::new("a", "b", true)],
			false,
			&Theme::portal(),
		);
		let mut fade = OpacityFade::default();
		fade.reset(&graph);
		assert_eq!(fade.node("a", 0.0), 1.0);

		let dimmed = highlight(graph, Some("nobody"));
		assert!(fade.tick(&dimmed, 0.016));
		let mid = fade.node("a", 1.0);
		assert!(mid < 1.0 && mid > DIMMED_NODE_OPACITY);

		while fade.tick(&dimmed, 0.016) {}
		assert_eq!(fade.node("a", 1.0), DIMMED_NODE_OPACITY);
	}
}
