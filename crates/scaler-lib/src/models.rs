//! Caller-visible data model for node groups and instances

use serde::{Deserialize, Serialize};

/// Provider name, used as the scheme of cloud-scoped provider IDs.
pub const PROVIDER_NAME: &str = "mks";

/// Default minimum size for node groups discovered without a static spec.
pub const NODE_GROUP_MIN_SIZE: i32 = 1;

/// Default maximum size for node groups discovered without a static spec.
pub const NODE_GROUP_MAX_SIZE: i32 = 20;

/// Builds the cloud-scoped provider ID for a server UUID.
///
/// The scheduling host correlates its node objects with instances through
/// this value. It is derived from the server's unique ID, never from the
/// Kubernetes-assigned node name.
pub fn provider_id(server_id: &str) -> String {
    format!("{PROVIDER_NAME}:////{server_id}")
}

/// Observable lifecycle state of one compute instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    /// Instance is being provisioned and has not joined the group yet.
    Creating,
    /// Instance is up and serving.
    Running,
    /// Instance is being terminated or drained.
    Deleting,
}

/// Error classification for an instance in an unrecognized remote state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceError {
    /// Coarse error class; the control plane does not distinguish further.
    pub class: InstanceErrorClass,
    /// Raw remote state string, preserved for diagnostics.
    pub code: String,
}

/// Known instance error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceErrorClass {
    Other,
}

/// Status of one instance: an observable state or an error classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub state: Option<InstanceState>,
    pub error: Option<InstanceError>,
}

impl InstanceStatus {
    /// Maps a remote server lifecycle state into an instance status.
    ///
    /// Total over all inputs: the known remote states map to `Creating`,
    /// `Running` or `Deleting`, and anything else becomes an error
    /// classification carrying the raw state string.
    pub fn from_server_state(server_state: &str) -> Self {
        match server_state {
            "starting" => Self {
                state: Some(InstanceState::Creating),
                error: None,
            },
            "started" => Self {
                state: Some(InstanceState::Running),
                error: None,
            },
            "maintenance" | "stopped" => Self {
                state: Some(InstanceState::Deleting),
                error: None,
            },
            other => Self {
                state: None,
                error: Some(InstanceError {
                    class: InstanceErrorClass::Other,
                    code: other.to_string(),
                }),
            },
        }
    }
}

/// One compute instance believed to belong to a node group.
///
/// Instances are produced fresh on every refresh and never mutated in
/// place, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Cloud-scoped provider ID, see [`provider_id`].
    pub id: String,
    pub status: InstanceStatus,
}

/// Machine shape of the nodes in a group, used for template synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachinePlan {
    /// CPU core count.
    pub core_number: i64,
    /// Memory in MiB.
    pub memory_mb: i64,
}

/// A key/value label attached to synthesized template nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

/// A taint attached to synthesized template nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintSpec {
    pub key: String,
    pub value: String,
    /// Taint effect, e.g. `NoSchedule`.
    pub effect: String,
}

/// Static, configuration-supplied shape for a node group.
///
/// Groups discovered purely from the control plane get the hard-coded
/// default bounds instead. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGroupSpec {
    /// Group name, unique within the cluster.
    pub name: String,
    pub min_size: i32,
    pub max_size: i32,
    pub plan: Option<MachinePlan>,
    pub labels: Vec<Label>,
    pub taints: Vec<TaintSpec>,
}

/// Per-group autoscaling option overrides a scheduling host may ask for.
///
/// The control plane has no per-group options, so controllers report the
/// capability as unsupported rather than returning defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoscalingOptions {
    pub scale_down_utilization_threshold: Option<f64>,
    pub scale_down_unneeded_duration_secs: Option<u64>,
}
