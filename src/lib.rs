//! catalog-explorer: Interactive lineage graph explorer for data-mesh catalog portals.
//!
//! This crate provides a WASM-based explorer that fetches the catalog's lineage
//! graph, lays it out automatically and renders it with domain grouping,
//! selection highlighting, pan/zoom, and a filter sidebar.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod components;
pub mod config;
pub mod error;

pub use components::explorer::{GraphData, GraphExplorer, GraphSource};
pub use config::{ExplorerConfig, load_config};
pub use error::GraphError;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("catalog-explorer: logging initialized");
}

/// Main application component.
/// Reads the page configuration and mounts the explorer.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	info!("catalog-explorer: showing {:?}", config.source);

	view! {
		<Title text="Lineage Explorer" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<GraphExplorer config=config />
	}
}
