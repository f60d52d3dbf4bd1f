//! View transform math: fitting, zooming, and hit testing.

use super::adapter::{Position, RenderNode};

/// Zoom limits shared by wheel zoom and view fitting.
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Fitting never zooms in past this, so tiny graphs stay readable.
pub const MAX_FIT_ZOOM: f64 = 1.5;
/// Padding used when fitting the whole graph.
pub const DEFAULT_FIT_PADDING: f64 = 0.1;
/// Padding used when fitting a selection's neighborhood.
pub const NEIGHBORHOOD_FIT_PADDING: f64 = 0.3;

const TOOLBAR_HEIGHT: f64 = 28.0;
const TOOLBAR_GAP: f64 = 8.0;
const TOOLBAR_CHAR_WIDTH: f64 = 7.5;
const TOOLBAR_PADDING_X: f64 = 14.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&self, sx: f64, sy: f64, factor: f64) -> Self {
		let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.k;
		Self {
			x: sx - (sx - self.x) * ratio,
			y: sy - (sy - self.y) * ratio,
			k,
		}
	}

	/// Center the viewport on a graph point at the given zoom.
	pub fn centered_on(point: Position, zoom: f64, width: f64, height: f64) -> Self {
		let k = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
		Self {
			x: width / 2.0 - point.x * k,
			y: height / 2.0 - point.y * k,
			k,
		}
	}

	/// Transform that shows `bounds` inside a `width` × `height` viewport.
	///
	/// `padding` is a fraction of the viewport left free on each axis.
	pub fn fit(bounds: Rect, width: f64, height: f64, padding: f64) -> Self {
		let usable_w = width * (1.0 - padding.clamp(0.0, 0.9));
		let usable_h = height * (1.0 - padding.clamp(0.0, 0.9));
		let k = (usable_w / bounds.width.max(1.0))
			.min(usable_h / bounds.height.max(1.0))
			.clamp(MIN_ZOOM, MAX_FIT_ZOOM);
		Self::centered_on(bounds.center(), k, width, height)
	}
}

/// Axis-aligned rectangle in graph space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn of(node: &RenderNode) -> Self {
		Self {
			x: node.position.x,
			y: node.position.y,
			width: node.size.width,
			height: node.size.height,
		}
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
	}

	pub fn center(&self) -> Position {
		Position {
			x: self.x + self.width / 2.0,
			y: self.y + self.height / 2.0,
		}
	}

	pub fn union(self, other: Rect) -> Rect {
		let x = self.x.min(other.x);
		let y = self.y.min(other.y);
		Rect {
			x,
			y,
			width: (self.x + self.width).max(other.x + other.width) - x,
			height: (self.y + self.height).max(other.y + other.height) - y,
		}
	}
}

/// Bounding box of a set of nodes, `None` when empty.
pub fn bounds_of<'a>(nodes: impl IntoIterator<Item = &'a RenderNode>) -> Option<Rect> {
	nodes.into_iter().map(Rect::of).reduce(Rect::union)
}

/// Toolbar pill drawn above a node, sized for its caption.
pub fn toolbar_rect(node: &RenderNode) -> Option<Rect> {
	let action = node.toolbar.as_ref()?;
	let width = action.label().len() as f64 * TOOLBAR_CHAR_WIDTH + 2.0 * TOOLBAR_PADDING_X;
	let center = node.center();
	Some(Rect {
		x: center.x - width / 2.0,
		y: node.position.y - TOOLBAR_GAP - TOOLBAR_HEIGHT,
		width,
		height: TOOLBAR_HEIGHT,
	})
}

/// Topmost node card under a graph-space point.
///
/// Cards win over domain groups; among cards the highest z-index wins, later
/// nodes breaking ties since they are drawn last.
pub fn node_at(nodes: &[RenderNode], gx: f64, gy: f64) -> Option<&RenderNode> {
	nodes
		.iter()
		.filter(|n| Rect::of(n).contains(gx, gy))
		.max_by_key(|n| (!n.is_group(), n.visual.z_index))
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	/// Largest distance from the press point; small values count as a click.
	pub travel: f64,
}

impl PanState {
	/// Pointer movement (screen pixels) below which a press counts as a click.
	pub const CLICK_SLOP: f64 = 4.0;

	pub fn begin(&mut self, x: f64, y: f64, transform: &ViewTransform) {
		*self = Self {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: transform.x,
			transform_start_y: transform.y,
			travel: 0.0,
		};
	}

	/// Apply pointer movement to `transform`.
	pub fn drag_to(&mut self, x: f64, y: f64, transform: &mut ViewTransform) {
		let (dx, dy) = (x - self.start_x, y - self.start_y);
		self.travel = self.travel.max((dx * dx + dy * dy).sqrt());
		transform.x = self.transform_start_x + dx;
		transform.y = self.transform_start_y + dy;
	}

	/// Finish the gesture; true when it was a click rather than a pan.
	pub fn end(&mut self) -> bool {
		let was_click = self.active && self.travel < Self::CLICK_SLOP;
		self.active = false;
		was_click
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::explorer::adapter::{adapt_node, build_render_nodes};
	use crate::components::explorer::types::{GraphNode, NodeType};

	fn card(id: &str, x: f64, y: f64) -> RenderNode {
		let mut node = adapt_node(&GraphNode::new(id, NodeType::Dataset, id), false);
		node.position = Position { x, y };
		node
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let t = ViewTransform {
			x: 100.0,
			y: 50.0,
			k: 1.0,
		};
		let before = t.screen_to_graph(300.0, 200.0);
		let zoomed = t.zoom_at(300.0, 200.0, 1.1);
		let after = zoomed.screen_to_graph(300.0, 200.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
		assert_eq!(t.zoom_at(0.0, 0.0, 1000.0).k, MAX_ZOOM);
		assert_eq!(t.zoom_at(0.0, 0.0, 0.0001).k, MIN_ZOOM);
	}

	#[test]
	fn fit_centers_bounds_and_leaves_padding() {
		let nodes = [card("a", 0.0, 0.0), card("b", 820.0, 344.0)];
		let bounds = bounds_of(&nodes).unwrap();
		assert_eq!(bounds.width, 1000.0);
		assert_eq!(bounds.height, 400.0);

		let t = ViewTransform::fit(bounds, 1000.0, 800.0, 0.1);
		assert!((t.k - 0.9).abs() < 1e-9);
		let (gx, gy) = t.screen_to_graph(500.0, 400.0);
		assert!((gx - bounds.center().x).abs() < 1e-9);
		assert!((gy - bounds.center().y).abs() < 1e-9);
	}

	#[test]
	fn fit_does_not_blow_up_single_small_nodes() {
		let nodes = [card("a", 0.0, 0.0)];
		let t = ViewTransform::fit(bounds_of(&nodes).unwrap(), 2000.0, 2000.0, 0.3);
		assert_eq!(t.k, MAX_FIT_ZOOM);
		assert!(bounds_of(&[] as &[RenderNode]).is_none());
	}

	#[test]
	fn hit_test_prefers_cards_over_groups() {
		let mut nodes = build_render_nodes(
			&[
				GraphNode::new("d", NodeType::Domain, "D"),
				GraphNode::new("p", NodeType::DataProduct, "P").in_domain("d"),
			],
			true,
		);
		nodes[0].position = Position { x: -100.0, y: -100.0 };
		nodes[0].size.width = 500.0;
		nodes[0].size.height = 500.0;
		nodes[1].position = Position { x: 0.0, y: 0.0 };

		assert_eq!(node_at(&nodes, 10.0, 10.0).map(|n| n.id.as_str()), Some("p"));
		assert_eq!(node_at(&nodes, 300.0, 300.0).map(|n| n.id.as_str()), Some("d"));
		assert!(node_at(&nodes, 1000.0, 0.0).is_none());
	}

	#[test]
	fn toolbar_sits_above_the_card() {
		let node = card("s", 0.0, 100.0);
		let rect = toolbar_rect(&node).unwrap();
		assert!(rect.y + rect.height < node.position.y);
		assert!((rect.center().x - node.center().x).abs() < 1e-9);

		let main = adapt_node(&GraphNode::new("m", NodeType::Dataset, "M").main(), false);
		assert!(toolbar_rect(&main).is_none());
	}

	#[test]
	fn short_press_is_a_click_long_drag_is_a_pan() {
		let mut t = ViewTransform::default();
		let mut pan = PanState::default();
		pan.begin(10.0, 10.0, &t);
		pan.drag_to(11.0, 12.0, &mut t);
		assert!(pan.end());

		pan.begin(10.0, 10.0, &t);
		pan.drag_to(60.0, 10.0, &mut t);
		assert!(!pan.end());
		assert_eq!(t.x, 51.0);
	}
}
