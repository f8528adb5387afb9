//! Daemon configuration

use anyhow::Result;
use serde::Deserialize;

/// Daemon-level settings; control plane credentials live in
/// [`scaler_lib::ScalerConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Node group refresh interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_api_port() -> u16 {
    8085
}

fn default_refresh_interval() -> u64 {
    30
}

impl DaemonConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SCALER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| DaemonConfig {
            api_port: default_api_port(),
            refresh_interval_secs: default_refresh_interval(),
        }))
    }
}
