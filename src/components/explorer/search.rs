//! Node picker search and the selected node's details panel model.

use super::adapter::RenderNode;

/// Most results the picker lists at once.
pub const MAX_RESULTS: usize = 20;

/// One picker entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
	pub id: String,
	pub name: String,
	pub kind_label: &'static str,
	pub domain: Option<String>,
}

/// Nodes whose name contains `query`, ignoring case.
///
/// Domain groups are never offered. Results are sorted by name and capped at
/// [`MAX_RESULTS`]; an empty query lists the first nodes alphabetically.
pub fn search_nodes(nodes: &[RenderNode], query: &str) -> Vec<SearchHit> {
	let needle = query.trim().to_lowercase();
	let mut hits: Vec<SearchHit> = nodes
		.iter()
		.filter(|n| !n.is_group())
		.filter(|n| needle.is_empty() || n.name.to_lowercase().contains(&needle))
		.map(|n| SearchHit {
			id: n.id.clone(),
			name: n.name.clone(),
			kind_label: n.kind.label(),
			domain: n.domain.clone(),
		})
		.collect();
	hits.sort_by(|a, b| {
		a.name
			.to_lowercase()
			.cmp(&b.name.to_lowercase())
			.then_with(|| a.id.cmp(&b.id))
	});
	hits.truncate(MAX_RESULTS);
	hits
}

/// What the sidebar shows for the selected node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDetails {
	pub name: String,
	pub kind_label: &'static str,
	pub domain: Option<String>,
	pub description: Option<String>,
	/// "First Last (Role)" lines.
	pub members: Vec<String>,
	pub link: Option<(String, &'static str)>,
}

impl NodeDetails {
	pub fn of(node: &RenderNode, app_base: &str) -> Self {
		Self {
			name: node.name.clone(),
			kind_label: node.kind.label(),
			domain: node.domain.clone(),
			description: node
				.description
				.as_ref()
				.filter(|d| !d.trim().is_empty())
				.cloned(),
			members: node.assignments.iter().filter_map(|a| a.summary()).collect(),
			link: node
				.toolbar
				.as_ref()
				.map(|action| (action.href(app_base), action.label())),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::explorer::adapter::build_render_nodes;
	use crate::components::explorer::types::{
		AssignedRole, AssignedUser, GraphNode, NodeType, RoleAssignment,
	};

	fn catalog() -> Vec<RenderNode> {
		build_render_nodes(
			&[
				GraphNode::new("d", NodeType::Domain, "Sales domain").in_domain("x"),
				GraphNode::new("p2", NodeType::DataProduct, "sales forecast").in_domain("d"),
				GraphNode::new("p1", NodeType::DataProduct, "Sales"),
				GraphNode::new("s1", NodeType::Dataset, "Orders"),
			],
			true,
		)
	}

	#[test]
	fn search_is_case_insensitive_and_skips_domains() {
		let hits = search_nodes(&catalog(), "SALES");
		let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
		assert_eq!(ids, vec!["p1", "p2"]);
		assert_eq!(hits[0].kind_label, "Data product");
	}

	#[test]
	fn empty_query_lists_everything_sorted() {
		let hits = search_nodes(&catalog(), "  ");
		let names: Vec<&str> = hits.iter().map(|h| h.name.as_str()).collect();
		assert_eq!(names, vec!["Orders", "Sales", "sales forecast"]);
	}

	#[test]
	fn results_are_capped() {
		let nodes: Vec<GraphNode> = (0..50)
			.map(|i| GraphNode::new(format!("n{i:02}"), NodeType::Dataset, format!("table {i:02}")))
			.collect();
		let hits = search_nodes(&build_render_nodes(&nodes, false), "table");
		assert_eq!(hits.len(), MAX_RESULTS);
		assert_eq!(hits[0].name, "table 00");
	}

	#[test]
	fn details_list_members_and_link() {
		let mut node = GraphNode::new("p1", NodeType::DataProduct, "Sales");
		node.data.description = Some("Monthly sales".into());
		node.data.assignments = Some(vec![
			RoleAssignment {
				id: Some("a1".into()),
				user: Some(AssignedUser {
					first_name: Some("Jane".into()),
					last_name: Some("Doe".into()),
					email: Some("jane@example.com".into()),
				}),
				role: Some(AssignedRole {
					name: "Owner".into(),
				}),
				decision: Some("approved".into()),
			},
			RoleAssignment::default(),
		]);
		let rendered = build_render_nodes(&[node], false);
		let details = NodeDetails::of(&rendered[0], "/app");
		assert_eq!(details.members, vec!["Jane Doe (Owner)".to_string()]);
		assert_eq!(details.description.as_deref(), Some("Monthly sales"));
		assert_eq!(
			details.link,
			Some((
				"/app/data-products/p1?tab=explorer".to_string(),
				"View data product"
			))
		);
	}
}
