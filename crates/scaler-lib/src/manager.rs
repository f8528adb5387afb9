//! Group registry for one cluster
//!
//! Owns the authoritative set of node group controllers and rebuilds it
//! from the control plane on demand. The collection is replaced
//! wholesale, never merged: a controller handle obtained before a refresh
//! is stale afterwards and must be re-resolved by name or provider ID.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ScalerError;
use crate::models::{
    provider_id, Instance, InstanceStatus, NodeGroupSpec, NODE_GROUP_MAX_SIZE, NODE_GROUP_MIN_SIZE,
};
use crate::node_group::{NodeGroup, PollConfig, TIMEOUT_GET_REQUEST};
use crate::observability::ScalerMetrics;
use crate::remote::{
    LabelFilter, NodeGroupApi, RemoteError, LABEL_CLUSTER_ID, LABEL_GENERATED_NAME,
};

/// Registry of node group controllers for one cluster.
pub struct Manager {
    cluster_id: Uuid,
    api: Arc<dyn NodeGroupApi>,
    specs: HashMap<String, NodeGroupSpec>,
    poll: PollConfig,
    groups: RwLock<Vec<Arc<NodeGroup>>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl Manager {
    /// Creates a manager for `cluster_id`. Static specs override the
    /// default bounds for groups with a matching name; groups without a
    /// spec use the hard-coded defaults.
    pub fn new(api: Arc<dyn NodeGroupApi>, cluster_id: Uuid, specs: Vec<NodeGroupSpec>) -> Self {
        Self {
            cluster_id,
            api,
            specs: specs.into_iter().map(|s| (s.name.clone(), s)).collect(),
            poll: PollConfig::default(),
            groups: RwLock::new(Vec::new()),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn cluster_id(&self) -> Uuid {
        self.cluster_id
    }

    /// Re-enumerates node groups and their instances from the control
    /// plane and replaces the cached controller set.
    ///
    /// Concurrent refreshes serialize on a cluster-wide lock. A group
    /// whose instance enumeration fails is logged and skipped, so one bad
    /// group does not blind the caller to the rest.
    pub async fn refresh(&self) -> Result<(), ScalerError> {
        let _guard = self.refresh_lock.lock().await;
        let summaries = self
            .api
            .list_node_groups(self.cluster_id, TIMEOUT_GET_REQUEST)
            .await
            .map_err(|source| ScalerError::Remote {
                group: self.cluster_id.to_string(),
                operation: "list",
                source,
            })?;

        let mut groups = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let instances = match self.group_instances(&summary.name).await {
                Ok(instances) => instances,
                Err(err) => {
                    warn!(
                        group = %summary.name,
                        error = %err,
                        "skipping node group, failed to enumerate instances"
                    );
                    ScalerMetrics::global().inc_refresh_group_errors();
                    continue;
                }
            };
            let (min_size, max_size, plan, labels, taints) = match self.specs.get(&summary.name) {
                Some(spec) => (
                    spec.min_size,
                    spec.max_size,
                    spec.plan,
                    spec.labels.clone(),
                    spec.taints.clone(),
                ),
                None => (
                    NODE_GROUP_MIN_SIZE,
                    NODE_GROUP_MAX_SIZE,
                    None,
                    Vec::new(),
                    Vec::new(),
                ),
            };
            debug!(
                cluster = %self.cluster_id,
                group = %summary.name,
                size = summary.count,
                min_size,
                max_size,
                nodes = instances.len(),
                "caching node group"
            );
            groups.push(Arc::new(
                NodeGroup::new(
                    Arc::clone(&self.api),
                    self.cluster_id,
                    summary.name,
                    summary.count,
                    min_size,
                    max_size,
                )
                .with_shape(plan, labels, taints)
                .with_instances(instances)
                .with_poll_config(self.poll),
            ));
        }

        let count = groups.len();
        *self
            .groups
            .write()
            .unwrap_or_else(PoisonError::into_inner) = groups;
        ScalerMetrics::global().inc_refreshes();
        ScalerMetrics::global().set_node_groups(count as i64);
        info!(cluster = %self.cluster_id, groups = count, "refreshed node groups");
        Ok(())
    }

    /// Snapshot of the currently cached controllers.
    pub fn node_groups(&self) -> Vec<Arc<NodeGroup>> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves a cloud-scoped provider ID to its owning controller.
    ///
    /// `None` is a valid negative result: the node belongs to no cached
    /// group and is none of this provider's concern.
    pub fn group_for_node(&self, provider_id: &str) -> Option<Arc<NodeGroup>> {
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        for group in groups.iter() {
            if group.nodes().iter().any(|n| n.id == provider_id) {
                return Some(Arc::clone(group));
            }
        }
        debug!(provider_id = %provider_id, "no node group claims node");
        None
    }

    /// Enumerates the instances backing one node group through its
    /// provisioner-labeled server group.
    async fn group_instances(&self, name: &str) -> Result<Vec<Instance>, RemoteError> {
        let filters = [
            LabelFilter::new(LABEL_CLUSTER_ID, self.cluster_id.to_string()),
            LabelFilter::new(LABEL_GENERATED_NAME, format!("{name}-server-group")),
        ];
        let server_groups = self
            .api
            .list_server_groups(&filters, TIMEOUT_GET_REQUEST)
            .await?;
        if server_groups.len() != 1 {
            return Err(RemoteError::UnexpectedResponse(format!(
                "wanted exactly one server group for {name}, got {}",
                server_groups.len()
            )));
        }
        let server_group = &server_groups[0];
        debug!(
            group = %name,
            server_group = %server_group.title,
            members = server_group.members.len(),
            "resolved server group"
        );

        let mut instances = Vec::with_capacity(server_group.members.len());
        for server_id in &server_group.members {
            let server = self.api.get_server(server_id, TIMEOUT_GET_REQUEST).await?;
            instances.push(Instance {
                id: provider_id(&server.uuid),
                status: InstanceStatus::from_server_state(&server.state),
            });
        }
        Ok(instances)
    }
}
