//! Control plane API boundary
//!
//! This module provides:
//! - The [`NodeGroupApi`] trait, the narrow seam node group controllers
//!   need from the control plane
//! - [`ControlPlaneClient`], the reqwest-backed implementation
//! - Wire types for node groups, server groups and servers
//!
//! The control plane scales asynchronously: mutating calls return once the
//! request is accepted, and convergence is observed by polling reads.
//! Every call takes a caller-supplied timeout and fails fast on expiry.

mod client;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use client::ControlPlaneClient;
pub use types::{
    LabelFilter, NodeGroupDetails, NodeGroupState, NodeGroupSummary, NodeRef, ServerDetails,
    ServerGroup, LABEL_CLUSTER_ID, LABEL_GENERATED_NAME,
};

/// Errors from the control plane API boundary.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("control plane returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected control plane response: {0}")]
    UnexpectedResponse(String),
}

/// Synchronous request/response operations against the control plane.
///
/// A single concrete client implements this in production; tests
/// substitute an in-memory fake.
#[async_trait]
pub trait NodeGroupApi: Send + Sync {
    /// Lists all node groups of a cluster.
    async fn list_node_groups(
        &self,
        cluster_id: Uuid,
        timeout: Duration,
    ) -> Result<Vec<NodeGroupSummary>, RemoteError>;

    /// Fetches one node group's current state and count.
    async fn get_node_group(
        &self,
        cluster_id: Uuid,
        name: &str,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError>;

    /// Fetches one node group including its member node references.
    async fn get_node_group_with_nodes(
        &self,
        cluster_id: Uuid,
        name: &str,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError>;

    /// Requests a new target size. The returned details reflect the
    /// accepted request, not necessarily a converged group.
    async fn modify_node_group(
        &self,
        cluster_id: Uuid,
        name: &str,
        count: i32,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError>;

    /// Deletes one named node from a group.
    async fn delete_node(
        &self,
        cluster_id: Uuid,
        name: &str,
        node_name: &str,
        timeout: Duration,
    ) -> Result<(), RemoteError>;

    /// Lists server groups matching all given label filters.
    async fn list_server_groups(
        &self,
        filters: &[LabelFilter],
        timeout: Duration,
    ) -> Result<Vec<ServerGroup>, RemoteError>;

    /// Fetches one server's details by its UUID.
    async fn get_server(
        &self,
        server_id: &str,
        timeout: Duration,
    ) -> Result<ServerDetails, RemoteError>;
}
