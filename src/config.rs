//! Page-provided explorer configuration.
//!
//! The host page describes the explorer instance in a JSON script element:
//!
//! ```html
//! <script id="explorer-config" type="application/json">
//!   { "api_base": "/api", "source": { "kind": "dataset", "id": "..." }, "level": 2 }
//! </script>
//! ```
//!
//! Every field is optional.

use log::{info, warn};
use serde::Deserialize;

use crate::components::explorer::{
	Color, GraphSource, LayoutParams, SidebarFilters, Theme, script_text,
};
use crate::error::GraphError;

/// Id of the script element holding the configuration.
pub const CONFIG_ELEMENT_ID: &str = "explorer-config";

/// Explorer settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
	/// Prefix of backend graph endpoints.
	pub api_base: String,
	/// Prefix of portal pages the toolbar links to.
	pub app_base: String,
	/// Which graph to show.
	pub source: GraphSource,
	/// Neighborhood depth for entity graphs.
	pub level: Option<u32>,
	/// Initial sidebar filters.
	pub filters: SidebarFilters,
	/// Layout tuning.
	pub layout: LayoutParams,
	/// Fill the viewport and follow window resizes.
	pub fullscreen: bool,
	/// Brand color override as a CSS color.
	pub accent: Option<String>,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			api_base: "/api".into(),
			app_base: String::new(),
			source: GraphSource::default(),
			level: None,
			filters: SidebarFilters::default(),
			layout: LayoutParams::default(),
			fullscreen: true,
			accent: None,
		}
	}
}

impl ExplorerConfig {
	/// Parse a configuration document; missing fields take their defaults.
	pub fn from_json(text: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(text)?)
	}

	/// Portal theme with the configured accent applied.
	pub(crate) fn theme(&self) -> Theme {
		let theme = Theme::portal();
		match self.accent.as_deref() {
			None => theme,
			Some(css) => match Color::parse(css) {
				Some(color) => theme.with_primary(color),
				None => {
					warn!("catalog-explorer: ignoring unparseable accent color {:?}", css);
					theme
				}
			},
		}
	}
}

/// Read the page's configuration, falling back to defaults.
pub fn load_config() -> ExplorerConfig {
	let Some(text) = script_text(CONFIG_ELEMENT_ID) else {
		info!("catalog-explorer: no #{} element, using defaults", CONFIG_ELEMENT_ID);
		return ExplorerConfig::default();
	};
	match ExplorerConfig::from_json(&text) {
		Ok(config) => config,
		Err(e) => {
			warn!("catalog-explorer: invalid explorer config: {}", e);
			ExplorerConfig::default()
		}
	}
}
