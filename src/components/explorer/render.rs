//! Canvas rendering for the explorer.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Domain groups, always beneath everything else
//! 3. Edges between handle anchors
//! 4. Node cards by ascending z-index, then the selected node's toolbar
//!
//! Each card carries a round badge with a glyph for its data product type
//! (`icon_key`), falling back to one per node kind.

use std::collections::HashMap;
use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::adapter::{Position, RenderEdge, RenderNode};
use super::types::NodeType;
use super::theme::Theme;
use super::transition::OpacityFade;
use super::view::{ViewTransform, toolbar_rect};

const CARD_RADIUS: f64 = 8.0;
const ACCENT_WIDTH: f64 = 6.0;
const CARD_PADDING: f64 = 14.0;
const EDGE_WIDTH: f64 = 1.5;
const RING_WIDTH: f64 = 3.0;
const ACTIVE_DOT_RADIUS: f64 = 4.0;
const BADGE_RADIUS: f64 = 12.0;
const BADGE_FONT: &str = "13px Inter, system-ui, sans-serif";
const NAME_FONT: &str = "600 13px Inter, system-ui, sans-serif";
const KIND_FONT: &str = "11px Inter, system-ui, sans-serif";
const GROUP_FONT: &str = "600 14px Inter, system-ui, sans-serif";
/// Dash offset speed of animated edges, px per second.
const FLOW_SPEED: f64 = 20.0;

/// Everything one frame needs.
pub struct Scene<'a> {
	pub nodes: &'a [RenderNode],
	pub edges: &'a [RenderEdge],
	pub fade: &'a OpacityFade,
	pub transform: &'a ViewTransform,
	pub selected: Option<&'a str>,
	pub theme: &'a Theme,
	pub width: f64,
	pub height: f64,
	/// Seconds since the canvas was mounted.
	pub time: f64,
}

/// Renders the complete graph to the canvas.
pub fn render(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&scene.theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);

	ctx.save();
	let _ = ctx.translate(scene.transform.x, scene.transform.y);
	let _ = ctx.scale(scene.transform.k, scene.transform.k);

	draw_groups(scene, ctx);
	draw_edges(scene, ctx);
	draw_cards(scene, ctx);
	draw_toolbar(scene, ctx);

	ctx.restore();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

/// Shorten `text` with an ellipsis until it fits `max_width` in the current font.
fn ellipsize(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> String {
	let width = |s: &str| ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0);
	if width(text) <= max_width {
		return text.to_owned();
	}
	let mut chars: Vec<char> = text.chars().collect();
	while !chars.is_empty() {
		chars.pop();
		let candidate: String = chars.iter().collect::<String>() + "…";
		if width(&candidate) <= max_width {
			return candidate;
		}
	}
	String::new()
}

fn draw_groups(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let style = &scene.theme.domain;
	for node in scene.nodes.iter().filter(|n| n.is_group()) {
		let alpha = scene.fade.node(&node.id, node.visual.opacity);
		let (x, y) = (node.position.x, node.position.y);
		let (w, h) = (node.size.width, node.size.height);

		rounded_rect(ctx, x, y, w, h, style.radius);
		ctx.set_fill_style_str(&style.fill.fade(alpha).to_css());
		ctx.fill();
		ctx.set_stroke_style_str(&style.border.fade(alpha).to_css());
		ctx.set_line_width(1.0);
		ctx.stroke();

		ctx.set_font(GROUP_FONT);
		ctx.set_fill_style_str(&style.label.fade(alpha).to_css());
		let label = ellipsize(ctx, &node.name, w - 2.0 * CARD_PADDING);
		let _ = ctx.fill_text(&label, x + CARD_PADDING, y + 24.0);
	}
}

fn draw_edges(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let by_id: HashMap<&str, &RenderNode> =
		scene.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

	ctx.set_line_width(EDGE_WIDTH);
	for edge in scene.edges {
		let (Some(source), Some(target)) = (
			by_id.get(edge.source.as_str()),
			by_id.get(edge.target.as_str()),
		) else {
			continue;
		};
		let (Some(start), Some(end)) = (
			source.handle(edge.source_handle),
			target.handle(edge.target_handle),
		) else {
			continue;
		};
		let (start, end) = (source.anchor(start), target.anchor(end));
		let alpha = scene.fade.edge(&edge.id, edge.visual.opacity);

		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(edge.style.dash.0),
			&JsValue::from_f64(edge.style.dash.1),
		));
		ctx.set_line_dash_offset(if edge.animated {
			-scene.time * FLOW_SPEED
		} else {
			0.0
		});
		ctx.set_stroke_style_str(&edge.style.color.fade(alpha).to_css());
		draw_bezier(ctx, start, end);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

/// Horizontal S-curve between two anchors.
fn draw_bezier(ctx: &CanvasRenderingContext2d, start: Position, end: Position) {
	let bend = ((end.x - start.x).abs() / 2.0).max(40.0);
	let c1 = if start.x <= end.x {
		start.x + bend
	} else {
		start.x - bend
	};
	let c2 = if start.x <= end.x { end.x - bend } else { end.x + bend };

	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.bezier_curve_to(c1, start.y, c2, end.y, end.x, end.y);
	ctx.stroke();
}

/// Badge glyph for a card: its data product type icon, else its kind.
fn badge_glyph(node: &RenderNode) -> &'static str {
	match node.icon_key.as_deref() {
		Some("reporting") => "▤",
		Some("processing") => "⚙",
		Some("exploration") => "⌕",
		Some("ingestion") => "⇣",
		Some("machine_learning") => "✦",
		Some("analytics") => "∿",
		_ => match node.kind {
			NodeType::DataProduct | NodeType::Domain => "◆",
			NodeType::Dataset => "▦",
			NodeType::DataOutput => "⇢",
		},
	}
}

fn draw_badge(ctx: &CanvasRenderingContext2d, node: &RenderNode, center: Position, fill: &str) {
	ctx.begin_path();
	let _ = ctx.arc(center.x, center.y, BADGE_RADIUS, 0.0, TAU);
	ctx.set_fill_style_str(fill);
	ctx.fill();

	ctx.set_font(BADGE_FONT);
	ctx.set_fill_style_str("#ffffff");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(badge_glyph(node), center.x, center.y + 1.0);
	ctx.set_text_align("start");
	ctx.set_text_baseline("alphabetic");
}

fn draw_cards(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let mut cards: Vec<&RenderNode> = scene.nodes.iter().filter(|n| !n.is_group()).collect();
	cards.sort_by_key(|n| n.visual.z_index);

	for node in cards {
		let alpha = scene.fade.node(&node.id, node.visual.opacity);
		let style = scene.theme.node_style(node.kind);
		let (x, y) = (node.position.x, node.position.y);
		let (w, h) = (node.size.width, node.size.height);

		ctx.set_global_alpha(alpha);

		let (fill, border, text, muted) = if node.is_main {
			(
				style.accent,
				style.accent.lerp(scene.theme.text, 0.3),
				scene.theme.toolbar_fill,
				scene.theme.toolbar_fill.with_alpha(0.8),
			)
		} else {
			(style.fill, style.border, scene.theme.text, scene.theme.muted_text)
		};

		rounded_rect(ctx, x, y, w, h, CARD_RADIUS);
		ctx.set_fill_style_str(&fill.to_css());
		ctx.fill();
		ctx.set_stroke_style_str(&border.to_css());
		ctx.set_line_width(1.0);
		ctx.stroke();

		if !node.is_main {
			ctx.save();
			rounded_rect(ctx, x, y, w, h, CARD_RADIUS);
			ctx.clip();
			ctx.set_fill_style_str(&style.accent.to_css());
			ctx.fill_rect(x, y, ACCENT_WIDTH, h);
			ctx.restore();
		}

		let badge = Position {
			x: x + ACCENT_WIDTH + CARD_PADDING + BADGE_RADIUS,
			y: y + h / 2.0,
		};
		let badge_fill = if node.is_main {
			scene.theme.toolbar_fill.with_alpha(0.25)
		} else if node.visual.dimmed {
			scene.theme.muted_text
		} else {
			style.accent
		};
		draw_badge(ctx, node, badge, &badge_fill.to_css());

		let text_x = badge.x + BADGE_RADIUS + CARD_PADDING / 2.0;
		let text_w = x + w - CARD_PADDING - text_x;
		ctx.set_font(NAME_FONT);
		ctx.set_fill_style_str(&text.to_css());
		let name = ellipsize(ctx, &node.name, text_w);
		let _ = ctx.fill_text(&name, text_x, y + h / 2.0 - 2.0);

		ctx.set_font(KIND_FONT);
		ctx.set_fill_style_str(&muted.to_css());
		let _ = ctx.fill_text(node.kind.label(), text_x, y + h / 2.0 + 14.0);

		if node.is_active {
			ctx.begin_path();
			let _ = ctx.arc(x + w - CARD_PADDING, y + CARD_PADDING, ACTIVE_DOT_RADIUS, 0.0, TAU);
			ctx.set_fill_style_str(&scene.theme.primary.to_css());
			ctx.fill();
		}

		if scene.selected == Some(node.id.as_str()) {
			let offset = RING_WIDTH;
			rounded_rect(
				ctx,
				x - offset,
				y - offset,
				w + 2.0 * offset,
				h + 2.0 * offset,
				CARD_RADIUS + offset,
			);
			ctx.set_stroke_style_str(&scene.theme.selection_ring.to_css());
			ctx.set_line_width(RING_WIDTH);
			ctx.stroke();
		}

		ctx.set_global_alpha(1.0);
	}
}

fn draw_toolbar(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let Some(node) = scene
		.selected
		.and_then(|id| scene.nodes.iter().find(|n| n.id == id))
	else {
		return;
	};
	let (Some(action), Some(rect)) = (node.toolbar.as_ref(), toolbar_rect(node)) else {
		return;
	};

	rounded_rect(ctx, rect.x, rect.y, rect.width, rect.height, rect.height / 2.0);
	ctx.set_fill_style_str(&scene.theme.toolbar_fill.to_css());
	ctx.fill();
	ctx.set_stroke_style_str(&scene.theme.primary.to_css());
	ctx.set_line_width(1.0);
	ctx.stroke();

	ctx.set_font(KIND_FONT);
	ctx.set_fill_style_str(&scene.theme.toolbar_text.to_css());
	ctx.set_text_align("center");
	let center = rect.center();
	let _ = ctx.fill_text(action.label(), center.x, center.y + 4.0);
	ctx.set_text_align("start");
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::explorer::adapter::adapt_node;
	use crate::components::explorer::types::GraphNode;

	fn card(kind: NodeType, icon_key: Option<&str>) -> RenderNode {
		let mut node = GraphNode::new("n", kind, "N");
		node.data.icon_key = icon_key.map(str::to_owned);
		adapt_node(&node, false)
	}

	#[test]
	fn badge_follows_icon_key() {
		assert_eq!(badge_glyph(&card(NodeType::DataProduct, Some("reporting"))), "▤");
		assert_eq!(badge_glyph(&card(NodeType::DataProduct, Some("machine_learning"))), "✦");
		assert_ne!(
			badge_glyph(&card(NodeType::DataProduct, Some("analytics"))),
			badge_glyph(&card(NodeType::DataProduct, Some("ingestion")))
		);
	}

	#[test]
	fn badge_falls_back_to_node_kind() {
		assert_eq!(badge_glyph(&card(NodeType::DataProduct, None)), "◆");
		assert_eq!(badge_glyph(&card(NodeType::DataProduct, Some("default"))), "◆");
		assert_eq!(badge_glyph(&card(NodeType::Dataset, Some("unheard_of"))), "▦");
		assert_eq!(badge_glyph(&card(NodeType::DataOutput, None)), "⇢");
	}
}
