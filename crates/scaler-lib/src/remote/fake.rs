//! In-memory control plane fake for controller and manager tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{
    LabelFilter, NodeGroupDetails, NodeGroupState, NodeGroupSummary, NodeRef, ServerDetails,
    ServerGroup, LABEL_GENERATED_NAME,
};
use super::{NodeGroupApi, RemoteError};

#[derive(Debug, Clone)]
pub(crate) struct FakeServer {
    pub uuid: String,
    pub node_name: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeGroup {
    pub name: String,
    pub count: i32,
    pub servers: Vec<FakeServer>,
}

/// Control plane fake: holds cluster state behind a mutex and counts
/// calls per operation. Mutations converge instantly unless `held_state`
/// pins reads to a non-target state.
pub(crate) struct FakeApi {
    groups: Mutex<Vec<FakeGroup>>,
    pub get_calls: AtomicUsize,
    pub modify_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_get: AtomicBool,
    pub fail_modify: AtomicBool,
    /// Node name whose delete call fails.
    pub fail_delete_node: Mutex<Option<String>>,
    /// When set, get_node_group always reports this state.
    pub held_state: Mutex<Option<NodeGroupState>>,
    /// When set, modify clamps the requested count to this value.
    pub count_cap: Mutex<Option<i32>>,
    /// Group name whose server group lookup fails.
    pub fail_server_groups_for: Mutex<Option<String>>,
}

impl FakeApi {
    pub fn new(groups: Vec<FakeGroup>) -> Self {
        Self {
            groups: Mutex::new(groups),
            get_calls: AtomicUsize::new(0),
            modify_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_get: AtomicBool::new(false),
            fail_modify: AtomicBool::new(false),
            fail_delete_node: Mutex::new(None),
            held_state: Mutex::new(None),
            count_cap: Mutex::new(None),
            fail_server_groups_for: Mutex::new(None),
        }
    }

    /// Two groups: group1 with three running nodes, group2 with two nodes
    /// of which one is still starting.
    pub fn seeded() -> Self {
        Self::new(vec![
            FakeGroup {
                name: "group1".to_string(),
                count: 3,
                servers: (1..=3)
                    .map(|i| FakeServer {
                        uuid: format!("srv-group1-{i}"),
                        node_name: format!("group1-node-{i}"),
                        state: "started".to_string(),
                    })
                    .collect(),
            },
            FakeGroup {
                name: "group2".to_string(),
                count: 2,
                servers: vec![
                    FakeServer {
                        uuid: "srv-group2-1".to_string(),
                        node_name: "group2-node-1".to_string(),
                        state: "started".to_string(),
                    },
                    FakeServer {
                        uuid: "srv-group2-2".to_string(),
                        node_name: "group2-node-2".to_string(),
                        state: "starting".to_string(),
                    },
                ],
            },
        ])
    }

    pub fn add_group(&self, group: FakeGroup) {
        self.groups.lock().unwrap().push(group);
    }

    pub fn group_count(&self, name: &str) -> Option<i32> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.count)
    }

    fn server_error(message: &str) -> RemoteError {
        RemoteError::Api {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: message.to_string(),
        }
    }

    fn not_found(name: &str) -> RemoteError {
        RemoteError::Api {
            status: reqwest::StatusCode::NOT_FOUND,
            body: format!("{name} not found"),
        }
    }
}

#[async_trait]
impl NodeGroupApi for FakeApi {
    async fn list_node_groups(
        &self,
        _cluster_id: Uuid,
        _timeout: Duration,
    ) -> Result<Vec<NodeGroupSummary>, RemoteError> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .map(|g| NodeGroupSummary {
                name: g.name.clone(),
                count: g.count,
                state: NodeGroupState::Running,
            })
            .collect())
    }

    async fn get_node_group(
        &self,
        _cluster_id: Uuid,
        name: &str,
        _timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::server_error("injected get failure"));
        }
        let state = self
            .held_state
            .lock()
            .unwrap()
            .unwrap_or(NodeGroupState::Running);
        let groups = self.groups.lock().unwrap();
        let group = groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| Self::not_found(name))?;
        Ok(NodeGroupDetails {
            name: group.name.clone(),
            count: group.count,
            state,
            nodes: Vec::new(),
        })
    }

    async fn get_node_group_with_nodes(
        &self,
        cluster_id: Uuid,
        name: &str,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError> {
        let mut details = self.get_node_group(cluster_id, name, timeout).await?;
        let groups = self.groups.lock().unwrap();
        if let Some(group) = groups.iter().find(|g| g.name == name) {
            details.nodes = group
                .servers
                .iter()
                .map(|s| NodeRef {
                    name: s.node_name.clone(),
                    state: Some(s.state.clone()),
                })
                .collect();
        }
        Ok(details)
    }

    async fn modify_node_group(
        &self,
        _cluster_id: Uuid,
        name: &str,
        count: i32,
        _timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError> {
        self.modify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_modify.load(Ordering::SeqCst) {
            return Err(Self::server_error("injected modify failure"));
        }
        let accepted = match *self.count_cap.lock().unwrap() {
            Some(cap) => count.min(cap),
            None => count,
        };
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| Self::not_found(name))?;
        group.count = accepted;
        Ok(NodeGroupDetails {
            name: group.name.clone(),
            count: group.count,
            state: NodeGroupState::ScalingUp,
            nodes: Vec::new(),
        })
    }

    async fn delete_node(
        &self,
        _cluster_id: Uuid,
        name: &str,
        node_name: &str,
        _timeout: Duration,
    ) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_node.lock().unwrap().as_deref() == Some(node_name) {
            return Err(Self::server_error("injected delete failure"));
        }
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| Self::not_found(name))?;
        let before = group.servers.len();
        group.servers.retain(|s| s.node_name != node_name);
        if group.servers.len() == before {
            return Err(Self::not_found(node_name));
        }
        group.count -= 1;
        Ok(())
    }

    async fn list_server_groups(
        &self,
        filters: &[LabelFilter],
        _timeout: Duration,
    ) -> Result<Vec<ServerGroup>, RemoteError> {
        let generated_name = filters
            .iter()
            .find(|f| f.key == LABEL_GENERATED_NAME)
            .map(|f| f.value.clone())
            .unwrap_or_default();
        let group_name = generated_name
            .strip_suffix("-server-group")
            .unwrap_or(&generated_name)
            .to_string();
        if self.fail_server_groups_for.lock().unwrap().as_deref() == Some(group_name.as_str()) {
            return Err(Self::server_error("injected server group failure"));
        }
        let groups = self.groups.lock().unwrap();
        Ok(groups
            .iter()
            .filter(|g| g.name == group_name)
            .map(|g| ServerGroup {
                title: generated_name.clone(),
                members: g.servers.iter().map(|s| s.uuid.clone()).collect(),
            })
            .collect())
    }

    async fn get_server(
        &self,
        server_id: &str,
        _timeout: Duration,
    ) -> Result<ServerDetails, RemoteError> {
        let groups = self.groups.lock().unwrap();
        groups
            .iter()
            .flat_map(|g| g.servers.iter())
            .find(|s| s.uuid == server_id)
            .map(|s| ServerDetails {
                uuid: s.uuid.clone(),
                state: s.state.clone(),
            })
            .ok_or_else(|| Self::not_found(server_id))
    }
}
