//! HTTP client for the control plane API
//!
//! Thin reqwest wrapper with basic authentication. Each request carries
//! the caller-supplied timeout, so one slow call cannot consume a whole
//! convergence budget.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::types::{LabelFilter, NodeGroupDetails, NodeGroupSummary, ServerDetails, ServerGroup};
use super::{NodeGroupApi, RemoteError};

/// Control plane API client with basic authentication.
pub struct ControlPlaneClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl ControlPlaneClient {
    /// Creates a client for the given API endpoint and credentials.
    pub fn new(
        api_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let base_url = Url::parse(api_url)?;
        let http = Client::builder()
            .user_agent(concat!("nodegroup-scaler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, RemoteError> {
        debug!(path = %path, "control plane GET");
        let response = self
            .http
            .get(self.url(path)?)
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl NodeGroupApi for ControlPlaneClient {
    async fn list_node_groups(
        &self,
        cluster_id: Uuid,
        timeout: Duration,
    ) -> Result<Vec<NodeGroupSummary>, RemoteError> {
        self.get_json(&format!("/v1/clusters/{cluster_id}/node-groups"), &[], timeout)
            .await
    }

    async fn get_node_group(
        &self,
        cluster_id: Uuid,
        name: &str,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError> {
        self.get_json(
            &format!("/v1/clusters/{cluster_id}/node-groups/{name}"),
            &[],
            timeout,
        )
        .await
    }

    async fn get_node_group_with_nodes(
        &self,
        cluster_id: Uuid,
        name: &str,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError> {
        self.get_json(
            &format!("/v1/clusters/{cluster_id}/node-groups/{name}"),
            &[("nodes", "true".to_string())],
            timeout,
        )
        .await
    }

    async fn modify_node_group(
        &self,
        cluster_id: Uuid,
        name: &str,
        count: i32,
        timeout: Duration,
    ) -> Result<NodeGroupDetails, RemoteError> {
        debug!(cluster = %cluster_id, group = %name, count, "control plane PATCH node group");
        let response = self
            .http
            .patch(self.url(&format!("/v1/clusters/{cluster_id}/node-groups/{name}"))?)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(timeout)
            .json(&serde_json::json!({ "count": count }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_node(
        &self,
        cluster_id: Uuid,
        name: &str,
        node_name: &str,
        timeout: Duration,
    ) -> Result<(), RemoteError> {
        debug!(cluster = %cluster_id, group = %name, node = %node_name, "control plane DELETE node");
        let response = self
            .http
            .delete(self.url(&format!(
                "/v1/clusters/{cluster_id}/node-groups/{name}/nodes/{node_name}"
            ))?)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(timeout)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn list_server_groups(
        &self,
        filters: &[LabelFilter],
        timeout: Duration,
    ) -> Result<Vec<ServerGroup>, RemoteError> {
        let query: Vec<(&str, String)> = filters
            .iter()
            .map(|f| ("label", f.to_query_value()))
            .collect();
        self.get_json("/v1/server-groups", &query, timeout).await
    }

    async fn get_server(
        &self,
        server_id: &str,
        timeout: Duration,
    ) -> Result<ServerDetails, RemoteError> {
        self.get_json(&format!("/v1/servers/{server_id}"), &[], timeout)
            .await
    }
}
