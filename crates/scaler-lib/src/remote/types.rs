//! Wire types for the control plane API

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server group label carrying the owning cluster's UUID.
pub const LABEL_CLUSTER_ID: &str = "mks_cluster_id";

/// Server group label carrying the provisioner-generated group name.
pub const LABEL_GENERATED_NAME: &str = "mks_generated_name";

/// Remote lifecycle state of a node group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeGroupState {
    Pending,
    Running,
    ScalingUp,
    ScalingDown,
    Terminating,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NodeGroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeGroupState::Pending => "pending",
            NodeGroupState::Running => "running",
            NodeGroupState::ScalingUp => "scaling-up",
            NodeGroupState::ScalingDown => "scaling-down",
            NodeGroupState::Terminating => "terminating",
            NodeGroupState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One node group as returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGroupSummary {
    pub name: String,
    pub count: i32,
    pub state: NodeGroupState,
}

/// Reference to one node within a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRef {
    /// Node name as the scheduling host knows it.
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Full node group details from the get/modify endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGroupDetails {
    pub name: String,
    pub count: i32,
    pub state: NodeGroupState,
    /// Member nodes; populated only when nodes were requested.
    #[serde(default)]
    pub nodes: Vec<NodeRef>,
}

/// A label filter for server group listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Query-string form, `key=value`.
    pub fn to_query_value(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// A server group: the grouping abstraction enumerating the compute
/// instances backing one node group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerGroup {
    pub title: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Details of one compute server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDetails {
    pub uuid: String,
    /// Raw lifecycle state string, input to the instance state mapping.
    pub state: String,
}
