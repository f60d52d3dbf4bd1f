//! Visual theming for the explorer.
//!
//! The palette follows the portal's green brand colors. Edge colors come from
//! the brand primary and its lightened border variant.

use super::types::NodeType;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Multiply the current alpha, used when dimming.
	pub fn fade(self, opacity: f64) -> Self {
		Self {
			a: self.a * opacity.clamp(0.0, 1.0),
			..self
		}
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t) as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t) as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t) as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses a CSS color string.
	/// Supports hex (`#RRGGBB`) and `rgb()`/`rgba()` functional notation;
	/// anything else yields `None`.
	pub fn parse(color_str: &str) -> Option<Color> {
		let s = color_str.trim();
		if let Some(hex) = s.strip_prefix('#') {
			if hex.len() != 6 || !hex.is_ascii() {
				return None;
			}
			let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
			let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
			let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
			return Some(Color::rgb(r, g, b));
		}
		let inner = s
			.strip_prefix("rgba(")
			.or_else(|| s.strip_prefix("rgb("))?
			.strip_suffix(')')?;
		let nums: Vec<&str> = inner.split(',').map(str::trim).collect();
		let r = nums.first()?.parse().ok()?;
		let g = nums.get(1)?.parse().ok()?;
		let b = nums.get(2)?.parse().ok()?;
		let a = match nums.get(3) {
			Some(a) => a.parse().ok()?,
			None => 1.0,
		};
		Some(Color::rgba(r, g, b, a))
	}
}

/// Card colors for one node kind.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Accent strip and icon badge.
	pub accent: Color,
	pub fill: Color,
	pub border: Color,
}

/// Domain group appearance.
#[derive(Clone, Debug)]
pub struct GroupStyle {
	pub fill: Color,
	pub border: Color,
	pub label: Color,
	/// Corner radius in graph units.
	pub radius: f64,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Brand primary; active (animated) edges.
	pub primary: Color,
	/// Light primary variant; inactive edges.
	pub primary_border: Color,
	pub background: Color,
	pub text: Color,
	pub muted_text: Color,
	pub selection_ring: Color,
	pub data_product: NodeStyle,
	pub dataset: NodeStyle,
	pub data_output: NodeStyle,
	pub domain: GroupStyle,
	pub toolbar_fill: Color,
	pub toolbar_text: Color,
}

impl Theme {
	/// The portal's green brand theme (default)
	pub fn portal() -> Self {
		let primary = Color::rgb(60, 150, 115);
		let card = Color::rgb(255, 255, 255);
		Self {
			primary,
			primary_border: primary.lighten(0.6),
			background: Color::rgb(247, 249, 248),
			text: Color::rgb(70, 63, 63),
			muted_text: Color::rgb(140, 134, 134),
			selection_ring: primary,
			data_product: NodeStyle {
				accent: Color::rgb(16, 112, 114),
				fill: card,
				border: Color::rgb(200, 214, 207),
			},
			dataset: NodeStyle {
				accent: primary,
				fill: card,
				border: Color::rgb(200, 214, 207),
			},
			data_output: NodeStyle {
				accent: Color::rgb(77, 145, 139),
				fill: card,
				border: Color::rgb(200, 214, 207),
			},
			domain: GroupStyle {
				fill: Color::rgba(0, 255, 42, 0.1),
				border: Color::rgba(0, 255, 42, 0.5),
				label: Color::rgb(47, 64, 68),
				radius: 24.0,
			},
			toolbar_fill: Color::rgb(255, 255, 255),
			toolbar_text: Color::rgb(47, 64, 68),
		}
	}

	/// Swap the brand primary; edges, selection ring and the dataset accent follow it.
	pub fn with_primary(self, primary: Color) -> Self {
		Self {
			primary,
			primary_border: primary.lighten(0.6),
			selection_ring: primary,
			dataset: NodeStyle {
				accent: primary,
				..self.dataset
			},
			..self
		}
	}

	/// Card style for a non-domain node kind.
	pub fn node_style(&self, kind: NodeType) -> &NodeStyle {
		match kind {
			NodeType::DataProduct | NodeType::Domain => &self.data_product,
			NodeType::Dataset => &self.dataset,
			NodeType::DataOutput => &self.data_output,
		}
	}

	/// Edge stroke color for an edge's `animated` flag.
	pub fn edge_color(&self, animated: bool) -> Color {
		if animated {
			self.primary
		} else {
			self.primary_border
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::portal()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_and_functional_notation() {
		assert_eq!(Color::parse("#3c9673"), Some(Color::rgb(60, 150, 115)));
		assert_eq!(
			Color::parse("rgba(0, 255, 42, 0.5)"),
			Some(Color::rgba(0, 255, 42, 0.5))
		);
		assert_eq!(Color::parse("rgb(1,2,3)"), Some(Color::rgb(1, 2, 3)));
		assert_eq!(Color::parse("#fff"), None);
		assert_eq!(Color::parse("green"), None);
	}

	#[test]
	fn css_output_drops_alpha_when_opaque() {
		assert_eq!(Color::rgb(60, 150, 115).to_css(), "#3c9673");
		assert_eq!(
			Color::rgb(60, 150, 115).fade(0.2).to_css(),
			"rgba(60, 150, 115, 0.2)"
		);
	}

	#[test]
	fn edge_colors_follow_animated_flag() {
		let theme = Theme::portal();
		assert_eq!(theme.edge_color(true), theme.primary);
		assert_eq!(theme.edge_color(false), theme.primary_border);
		assert_ne!(theme.primary, theme.primary_border);
	}
}
