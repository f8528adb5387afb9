//! Node group lifecycle controller
//!
//! Owns one group's believed target size and converges the remote group
//! on scale and delete operations. The control plane scales in the
//! background, so every mutation is followed by a polling wait until the
//! group reports the expected state, and the cached size is only ever
//! adopted from a successful remote read, never incremented locally.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ScalerError;
use crate::models::{AutoscalingOptions, Instance, Label, MachinePlan, TaintSpec};
use crate::observability::ScalerMetrics;
use crate::remote::{NodeGroupApi, NodeGroupDetails, NodeGroupState};
use crate::template::{self, NodeInfo};

/// Per-request timeout for control plane reads.
pub(crate) const TIMEOUT_GET_REQUEST: Duration = Duration::from_secs(10);

/// Per-request timeout for a size change request.
const TIMEOUT_MODIFY_NODE_GROUP: Duration = Duration::from_secs(20);

/// Per-request timeout for a single node deletion.
const TIMEOUT_DELETE_NODE: Duration = Duration::from_secs(20);

/// Wall-clock budget for one convergence wait.
const TIMEOUT_WAIT_STATE: Duration = Duration::from_secs(20 * 60);

/// Fixed sleep between convergence checks.
const STATE_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Knobs for the convergence polling loop.
///
/// The per-read timeout stays separate from the overall deadline, so one
/// slow call cannot consume the whole convergence budget.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub converge_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            converge_timeout: TIMEOUT_WAIT_STATE,
            poll_interval: STATE_POLL_INTERVAL,
        }
    }
}

/// Controller for one remotely managed node group.
///
/// All size-mutating operations serialize on a per-controller lock held
/// for their entire duration, polling included. Accessors read cached
/// state without locking; they may be stale until the next refresh but
/// never torn.
pub struct NodeGroup {
    cluster_id: Uuid,
    name: String,
    min_size: i32,
    max_size: i32,
    size: AtomicI32,
    plan: Option<MachinePlan>,
    labels: Vec<Label>,
    taints: Vec<TaintSpec>,
    instances: Vec<Instance>,
    api: Arc<dyn NodeGroupApi>,
    poll: PollConfig,
    op_lock: Mutex<()>,
}

impl std::fmt::Debug for NodeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGroup")
            .field("cluster_id", &self.cluster_id)
            .field("name", &self.name)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("size", &self.size)
            .field("plan", &self.plan)
            .field("labels", &self.labels)
            .field("taints", &self.taints)
            .field("instances", &self.instances)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl NodeGroup {
    pub fn new(
        api: Arc<dyn NodeGroupApi>,
        cluster_id: Uuid,
        name: impl Into<String>,
        size: i32,
        min_size: i32,
        max_size: i32,
    ) -> Self {
        Self {
            cluster_id,
            name: name.into(),
            min_size,
            max_size,
            size: AtomicI32::new(size),
            plan: None,
            labels: Vec::new(),
            taints: Vec::new(),
            instances: Vec::new(),
            api,
            poll: PollConfig::default(),
            op_lock: Mutex::new(()),
        }
    }

    /// Attaches the static machine shape used for template synthesis.
    pub fn with_shape(
        mut self,
        plan: Option<MachinePlan>,
        labels: Vec<Label>,
        taints: Vec<TaintSpec>,
    ) -> Self {
        self.plan = plan;
        self.labels = labels;
        self.taints = taints;
        self
    }

    /// Replaces the cached instance list. Set once per refresh.
    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Unique identifier of the group, `{cluster_id}/{name}`.
    pub fn id(&self) -> String {
        format!("{}/{}", self.cluster_id, self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_size(&self) -> i32 {
        self.min_size
    }

    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    /// The controller's believed target size. Authoritative only between
    /// refreshes; the node count seen by the scheduling host may differ
    /// until the remote system stabilizes.
    pub fn target_size(&self) -> i32 {
        self.size.load(Ordering::SeqCst)
    }

    /// True for a real group as opposed to a placeholder.
    pub fn exist(&self) -> bool {
        !self.name.is_empty()
    }

    /// Cached instances from the last refresh. Never triggers a remote
    /// call and may be stale.
    pub fn nodes(&self) -> Vec<Instance> {
        self.instances.clone()
    }

    pub fn autoprovisioned(&self) -> bool {
        false
    }

    /// Human-readable summary for diagnostics.
    pub fn debug_info(&self) -> String {
        format!(
            "node group {} (min:{} max:{} size:{})",
            self.id(),
            self.min_size,
            self.max_size,
            self.target_size()
        )
    }

    /// Grows the group by `delta` nodes and waits for convergence.
    ///
    /// Argument and bound violations are rejected before any remote call.
    pub async fn increase_size(&self, delta: i32) -> Result<(), ScalerError> {
        if delta <= 0 {
            return Err(ScalerError::InvalidDelta {
                group: self.id(),
                delta,
            });
        }
        let current = self.target_size();
        let want = current + delta;
        if want > self.max_size {
            return Err(ScalerError::SizeOutOfBounds {
                group: self.id(),
                current,
                want,
                min: self.min_size,
                max: self.max_size,
            });
        }
        self.scale_to(want).await
    }

    /// Retracts `delta` (negative) nodes from an unfulfilled capacity
    /// request and waits for convergence.
    ///
    /// Must not be used to remove existing nodes; that is what
    /// [`NodeGroup::delete_nodes`] is for. The distinction is a caller
    /// contract, not verified here.
    pub async fn decrease_target_size(&self, delta: i32) -> Result<(), ScalerError> {
        if delta >= 0 {
            return Err(ScalerError::InvalidDelta {
                group: self.id(),
                delta,
            });
        }
        let current = self.target_size();
        let want = current + delta;
        if want < self.min_size {
            return Err(ScalerError::SizeOutOfBounds {
                group: self.id(),
                current,
                want,
                min: self.min_size,
                max: self.max_size,
            });
        }
        self.scale_to(want).await
    }

    async fn scale_to(&self, size: i32) -> Result<(), ScalerError> {
        let _guard = self.op_lock.lock().await;
        info!(group = %self.id(), from = self.target_size(), to = size, "scaling node group");
        self.api
            .modify_node_group(self.cluster_id, &self.name, size, TIMEOUT_MODIFY_NODE_GROUP)
            .await
            .map_err(|source| ScalerError::Remote {
                group: self.id(),
                operation: "modify",
                source,
            })?;
        let details = self
            .wait_for_state(NodeGroupState::Running, self.poll.converge_timeout)
            .await?;
        // The accepted count may differ from the requested one, e.g. when
        // the control plane clamps it. Adopt what the remote reports.
        self.size.store(details.count, Ordering::SeqCst);
        ScalerMetrics::global().inc_scale_operations();
        Ok(())
    }

    /// Deletes the named nodes one at a time, strictly in input order,
    /// waiting for the group to settle after each deletion.
    ///
    /// The control plane has no atomic multi-node delete. On the first
    /// failure the batch aborts and the error is returned; nodes already
    /// deleted stay deleted, since the remote mutation cannot be undone
    /// at this layer.
    pub async fn delete_nodes(&self, node_names: &[String]) -> Result<(), ScalerError> {
        if node_names.is_empty() {
            return Err(ScalerError::EmptyNodeDelete(self.id()));
        }
        let _guard = self.op_lock.lock().await;
        for node_name in node_names {
            info!(group = %self.id(), node = %node_name, "deleting node");
            self.api
                .delete_node(self.cluster_id, &self.name, node_name, TIMEOUT_DELETE_NODE)
                .await
                .map_err(|source| ScalerError::Remote {
                    group: self.id(),
                    operation: "delete node",
                    source,
                })?;
            let details = self
                .wait_for_state(NodeGroupState::Running, self.poll.converge_timeout)
                .await?;
            self.size.store(details.count, Ordering::SeqCst);
            ScalerMetrics::global().inc_node_deletes();
        }
        Ok(())
    }

    /// Polls the remote group until it reports `target` or the deadline
    /// elapses.
    ///
    /// A failed read aborts the wait immediately; only a successful read
    /// in the wrong state is retried.
    async fn wait_for_state(
        &self,
        target: NodeGroupState,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, ScalerError> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempts: u32 = 0;
        debug!(group = %self.id(), state = %target, "waiting for node group state");
        while Instant::now() < deadline {
            attempts += 1;
            let details = self
                .api
                .get_node_group(self.cluster_id, &self.name, TIMEOUT_GET_REQUEST)
                .await
                .map_err(|source| ScalerError::Remote {
                    group: self.id(),
                    operation: "get",
                    source,
                })?;
            if details.state == target {
                ScalerMetrics::global().observe_convergence_wait(started.elapsed());
                return Ok(details);
            }
            debug!(
                group = %self.id(),
                attempt = attempts,
                current = %details.state,
                target = %target,
                "node group not converged yet"
            );
            tokio::time::sleep(self.poll.poll_interval).await;
        }
        ScalerMetrics::global().inc_convergence_timeouts();
        Err(ScalerError::ConvergenceTimeout {
            group: self.id(),
            state: target,
            timeout,
            attempts,
        })
    }

    /// Creating groups on the control plane is not supported.
    pub fn create(&self) -> Result<Arc<NodeGroup>, ScalerError> {
        Err(ScalerError::NotSupported)
    }

    /// Deleting the group itself is not supported.
    pub fn delete_group(&self) -> Result<(), ScalerError> {
        Err(ScalerError::NotSupported)
    }

    /// Atomic all-or-nothing scale-up is not supported.
    pub fn atomic_increase_size(&self, _delta: i32) -> Result<(), ScalerError> {
        Err(ScalerError::NotSupported)
    }

    /// Per-group autoscaling option overrides are not supported.
    pub fn autoscaling_options(&self) -> Result<AutoscalingOptions, ScalerError> {
        Err(ScalerError::NotSupported)
    }

    /// Synthesizes an empty node for scale-up simulation.
    ///
    /// Only meaningful before any real node exists: a non-empty group
    /// reports not-supported and the host derives the shape from live
    /// nodes instead. A group without a configured machine plan has no
    /// shape to synthesize from and reports not-supported too.
    pub fn template_node_info(&self) -> Result<NodeInfo, ScalerError> {
        if self.target_size() > 0 {
            return Err(ScalerError::NotSupported);
        }
        let Some(plan) = &self.plan else {
            return Err(ScalerError::NotSupported);
        };
        Ok(template::template_node(
            &self.name,
            plan,
            &self.labels,
            &self.taints,
        ))
    }
}
