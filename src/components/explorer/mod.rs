//! Lineage graph explorer component.
//!
//! Renders the catalog's data products, datasets and data outputs, grouped by
//! domain, on an HTML canvas with:
//! - Backend or page-embedded graph snapshots, filterable by node kind
//! - Force-directed automatic layout that runs to rest before display
//! - Selection highlighting of a node's one-hop neighborhood
//! - Pan, zoom, and animated fit-to-view
//!
//! # Example
//!
//! ```ignore
//! use catalog_explorer::{ExplorerConfig, GraphExplorer};
//!
//! let config = ExplorerConfig {
//!     source: GraphSource::Dataset { id: "orders".into() },
//!     level: Some(2),
//!     ..ExplorerConfig::default()
//! };
//!
//! view! { <GraphExplorer config=config /> }
//! ```

mod adapter;
mod app;
mod component;
mod highlight;
mod layout;
mod render;
mod search;
mod sidebar;
mod source;
mod state;
mod theme;
mod transition;
mod types;
mod view;

pub use app::GraphExplorer;
pub use layout::LayoutParams;
pub use source::GraphSource;
pub use state::SidebarFilters;
pub use types::{
	AssignedRole, AssignedUser, GraphData, GraphEdge, GraphNode, NodeData, NodeType, RoleAssignment,
};

pub(crate) use source::script_text;
pub(crate) use theme::{Color, Theme};
