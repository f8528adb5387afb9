//! Core library for the node group autoscaler
//!
//! This crate reconciles the desired and actual size of managed Kubernetes
//! node groups against a control plane that scales asynchronously. It
//! provides:
//! - HTTP client for the control plane API
//! - Node group controllers with size invariants and convergence polling
//! - A per-cluster manager that caches controllers between refreshes
//! - Template node synthesis for scale-up simulation
//! - Configuration loading and Prometheus metrics

pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod node_group;
pub mod observability;
pub mod remote;
pub mod template;

pub use config::{ConfigError, ScalerConfig};
pub use error::ScalerError;
pub use manager::Manager;
pub use models::*;
pub use node_group::{NodeGroup, PollConfig};
pub use observability::ScalerMetrics;
