//! Graph data structures exchanged with the portal backend.

use std::fmt;

use serde::Deserialize;

use crate::error::GraphError;

/// Kind of catalog entity a node stands for.
///
/// The set is closed: decoding any other tag fails with
/// [`GraphError::UnknownNodeType`], so every match over it stays exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum NodeType {
	/// `dataProductNode`
	DataProduct,
	/// `datasetNode`
	Dataset,
	/// `dataOutputNode`
	DataOutput,
	/// `domainNode`, drawn as a group around its members.
	Domain,
}

impl NodeType {
	/// Tag used on the wire.
	pub fn as_str(self) -> &'static str {
		match self {
			NodeType::DataProduct => "dataProductNode",
			NodeType::Dataset => "datasetNode",
			NodeType::DataOutput => "dataOutputNode",
			NodeType::Domain => "domainNode",
		}
	}

	/// Human readable name shown in the sidebar and on node cards.
	pub fn label(self) -> &'static str {
		match self {
			NodeType::DataProduct => "Data product",
			NodeType::Dataset => "Dataset",
			NodeType::DataOutput => "Data output",
			NodeType::Domain => "Domain",
		}
	}
}

impl TryFrom<String> for NodeType {
	type Error = GraphError;

	fn try_from(tag: String) -> Result<Self, Self::Error> {
		match tag.as_str() {
			"dataProductNode" => Ok(NodeType::DataProduct),
			"datasetNode" => Ok(NodeType::Dataset),
			"dataOutputNode" => Ok(NodeType::DataOutput),
			"domainNode" => Ok(NodeType::Domain),
			_ => Err(GraphError::UnknownNodeType(tag)),
		}
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// User referenced by a role assignment.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AssignedUser {
	/// Given name.
	#[serde(default)]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default)]
	pub last_name: Option<String>,
	/// Contact address, shown when the user has no name.
	#[serde(default)]
	pub email: Option<String>,
}

impl AssignedUser {
	/// Full name when known, otherwise the email address.
	pub fn display_name(&self) -> Option<String> {
		let name = [self.first_name.as_deref(), self.last_name.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");
		if name.is_empty() {
			self.email.clone()
		} else {
			Some(name)
		}
	}
}

/// Role granted by an assignment.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AssignedRole {
	/// Display name, e.g. `"Owner"`.
	pub name: String,
}

/// A member of a data product: user, role and review decision.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RoleAssignment {
	/// Assignment id.
	#[serde(default)]
	pub id: Option<String>,
	/// The member.
	#[serde(default)]
	pub user: Option<AssignedUser>,
	/// The member's role in the data product.
	#[serde(default)]
	pub role: Option<AssignedRole>,
	/// Review decision, e.g. `"approved"`.
	#[serde(default)]
	pub decision: Option<String>,
}

impl RoleAssignment {
	/// One-line summary, e.g. `"Jane Doe (Owner)"`.
	pub fn summary(&self) -> Option<String> {
		let user = self.user.as_ref().and_then(AssignedUser::display_name)?;
		Some(match &self.role {
			Some(role) => format!("{} ({})", user, role.name),
			None => user,
		})
	}
}

/// Entity payload attached to a node.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NodeData {
	/// Catalog entity id, used in page links.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Name of the owning domain.
	#[serde(default)]
	pub domain: Option<String>,
	/// Id of the owning domain's node.
	#[serde(default)]
	pub domain_id: Option<String>,
	/// Data product type icon, e.g. `"reporting"` or `"machine_learning"`.
	#[serde(default)]
	pub icon_key: Option<String>,
	/// For data outputs: the owning data product.
	#[serde(default)]
	pub link_to_id: Option<String>,
	/// Free text shown in the details panel.
	#[serde(default)]
	pub description: Option<String>,
	/// Data product members.
	#[serde(default)]
	pub assignments: Option<Vec<RoleAssignment>>,
}

/// A vertex as returned by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GraphNode {
	/// Unique within one graph snapshot. Edges reference nodes by this id.
	pub id: String,
	/// Entity kind, from the `type` tag.
	#[serde(rename = "type")]
	pub node_type: NodeType,
	/// Marks the focal entity of the page the explorer is embedded in.
	#[serde(rename = "isMain", default)]
	pub is_main: bool,
	/// Entity payload.
	pub data: NodeData,
}

impl GraphNode {
	/// Node whose entity id equals its graph id.
	pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			data: NodeData {
				id: id.clone(),
				name: name.into(),
				..NodeData::default()
			},
			id,
			node_type,
			is_main: false,
		}
	}

	/// Place the node in a domain.
	pub fn in_domain(mut self, domain_id: impl Into<String>) -> Self {
		self.data.domain_id = Some(domain_id.into());
		self
	}

	/// Set the owning entity reference (`link_to_id`).
	pub fn linked_to(mut self, owner: impl Into<String>) -> Self {
		self.data.link_to_id = Some(owner.into());
		self
	}

	/// Mark as the focal node.
	pub fn main(mut self) -> Self {
		self.is_main = true;
		self
	}
}

/// A directed relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GraphEdge {
	/// Unique within one snapshot, usually `"{source}-{target}"`.
	pub id: String,
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	/// Set for approved/active links; drives edge color.
	#[serde(default)]
	pub animated: bool,
}

impl GraphEdge {
	/// Edge with the backend's `"{source}-{target}"` id convention.
	pub fn new(source: impl Into<String>, target: impl Into<String>, animated: bool) -> Self {
		let (source, target) = (source.into(), target.into());
		Self {
			id: format!("{source}-{target}"),
			source,
			target,
			animated,
		}
	}
}

/// Complete graph snapshot: nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
	/// Every vertex, domains included.
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	/// Relationships; endpoints may be missing from `nodes`.
	#[serde(default)]
	pub edges: Vec<GraphEdge>,
}

impl GraphData {
	/// Decode a graph document.
	pub fn from_json(text: &str) -> Result<Self, GraphError> {
		let data: GraphData = serde_json::from_str(text)?;
		Ok(data)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_backend_document() {
		let json = r#"{
			"nodes": [
				{"id": "p1", "type": "dataProductNode", "isMain": true,
				 "data": {"id": "p1", "name": "Sales", "domain_id": "d1", "icon_key": "reporting",
				          "assignments": [{"user": {"first_name": "Jane", "last_name": "Doe"}, "role": {"name": "Owner"}}]}},
				{"id": "o1", "type": "dataOutputNode",
				 "data": {"id": "o1", "name": "sales_s3", "link_to_id": "p1", "assignments": null}},
				{"id": "d1", "type": "domainNode", "data": {"id": "d1", "name": "Retail"}}
			],
			"edges": [{"id": "p1-o1", "source": "p1", "target": "o1", "animated": true}]
		}"#;

		let data = GraphData::from_json(json).unwrap();
		assert_eq!(data.nodes.len(), 3);
		assert_eq!(data.nodes[0].node_type, NodeType::DataProduct);
		assert!(data.nodes[0].is_main);
		assert!(!data.nodes[1].is_main);
		assert_eq!(data.nodes[1].data.link_to_id.as_deref(), Some("p1"));
		assert_eq!(data.nodes[1].data.assignments, None);
		assert_eq!(data.nodes[2].node_type, NodeType::Domain);

		let assignments = data.nodes[0].data.assignments.as_ref().unwrap();
		assert_eq!(assignments[0].summary().as_deref(), Some("Jane Doe (Owner)"));
		assert!(data.edges[0].animated);
	}

	#[test]
	fn unknown_node_type_is_rejected() {
		let json = r#"{"nodes": [{"id": "x", "type": "teamNode", "data": {"id": "x", "name": "X"}}], "edges": []}"#;
		let err = GraphData::from_json(json).unwrap_err();
		assert!(err.to_string().contains("unknown node type: teamNode"), "{err}");
	}

	#[test]
	fn missing_animated_flag_defaults_to_false() {
		let json = r#"{"nodes": [], "edges": [{"id": "a-b", "source": "a", "target": "b"}]}"#;
		let data = GraphData::from_json(json).unwrap();
		assert!(!data.edges[0].animated);
	}

	#[test]
	fn assignment_falls_back_to_email() {
		let assignment = RoleAssignment {
			user: Some(AssignedUser {
				email: Some("ops@example.com".into()),
				..AssignedUser::default()
			}),
			..RoleAssignment::default()
		};
		assert_eq!(assignment.summary().as_deref(), Some("ops@example.com"));
		assert_eq!(RoleAssignment::default().summary(), None);
	}
}
