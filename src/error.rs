//! Error type shared by the graph pipeline.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong between the backend response and a rendered graph.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The backend sent a node type tag outside the closed set the explorer renders.
	#[error("unknown node type: {0}")]
	UnknownNodeType(String),
	/// The response body was not a valid graph document.
	#[error("failed to decode graph data: {0}")]
	Decode(#[from] serde_json::Error),
	/// The browser rejected the request before a response arrived.
	#[error("graph request failed: {0}")]
	Request(String),
	/// The backend answered with a non-success status.
	#[error("graph request returned status {0}")]
	Status(u16),
	/// An embedded graph snapshot was requested but the page carries none.
	#[error("no embedded graph data found on the page")]
	MissingGraphData,
}

impl GraphError {
	/// Wrap a rejected JS promise or thrown value.
	pub fn from_js(value: JsValue) -> Self {
		let message = value
			.as_string()
			.or_else(|| {
				js_sys::Reflect::get(&value, &JsValue::from_str("message"))
					.ok()
					.and_then(|m| m.as_string())
			})
			.unwrap_or_else(|| format!("{value:?}"));
		Self::Request(message)
	}
}
