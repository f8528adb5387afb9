//! Scaler configuration
//!
//! Control plane credentials and the target cluster identity come from
//! `SCALER_`-prefixed environment variables. Validation returns
//! structured errors; treating a missing credential as fatal is the
//! daemon bootstrap's decision, not this module's.

use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::NodeGroupSpec;

/// Default control plane API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.mks.cloud";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    MissingSetting(&'static str),

    #[error("cluster ID {value} is not a valid UUID")]
    InvalidClusterId {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("invalid node group spec {0:?}, expected min:max:name")]
    InvalidNodeGroupSpec(String),

    #[error("failed to read configuration")]
    Source(#[from] config::ConfigError),
}

/// Settings for the control plane connection and static group bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerConfig {
    /// Control plane API username.
    #[serde(default)]
    pub username: String,

    /// Control plane API password.
    #[serde(default)]
    pub password: String,

    /// UUID of the target cluster.
    #[serde(default)]
    pub cluster_id: String,

    /// Control plane API endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Static node group bounds as comma-separated `min:max:name`
    /// entries. Groups not listed here use the built-in defaults.
    #[serde(default)]
    pub node_groups: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl ScalerConfig {
    /// Loads and validates configuration from `SCALER_*` environment
    /// variables.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg: ScalerConfig = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCALER"))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks required settings without touching the environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::MissingSetting("SCALER_USERNAME"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingSetting("SCALER_PASSWORD"));
        }
        if self.cluster_id.is_empty() {
            return Err(ConfigError::MissingSetting("SCALER_CLUSTER_ID"));
        }
        self.parsed_cluster_id()?;
        self.node_group_specs()?;
        Ok(())
    }

    /// The target cluster UUID.
    pub fn parsed_cluster_id(&self) -> Result<Uuid, ConfigError> {
        Uuid::from_str(&self.cluster_id).map_err(|source| ConfigError::InvalidClusterId {
            value: self.cluster_id.clone(),
            source,
        })
    }

    /// Parses the static `min:max:name` group bounds.
    pub fn node_group_specs(&self) -> Result<Vec<NodeGroupSpec>, ConfigError> {
        self.node_groups
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for NodeGroupSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidNodeGroupSpec(s.to_string());
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let [min, max, name] = parts.as_slice() else {
            return Err(invalid());
        };
        if name.is_empty() {
            return Err(invalid());
        }
        let min_size: i32 = min.parse().map_err(|_| invalid())?;
        let max_size: i32 = max.parse().map_err(|_| invalid())?;
        if min_size < 0 || max_size < min_size {
            return Err(invalid());
        }
        Ok(NodeGroupSpec {
            name: name.to_string(),
            min_size,
            max_size,
            plan: None,
            labels: Vec::new(),
            taints: Vec::new(),
        })
    }
}
