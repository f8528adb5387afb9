//! Scaler error types.

use std::time::Duration;

use thiserror::Error;

use crate::remote::{NodeGroupState, RemoteError};

/// Errors surfaced by node group controllers and the manager.
///
/// Bound and argument violations are rejected before any remote call is
/// made; `Remote` means the mutating call itself failed and no cached
/// state was changed; `ConvergenceTimeout` means the control plane
/// accepted a mutation but never reported the expected state, so the
/// cached size may lag the remote truth until the next refresh.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("invalid scaling delta {delta} for node group {group}")]
    InvalidDelta { group: String, delta: i32 },

    #[error(
        "node group {group} cannot scale from {current} to {want}, allowed range {min}..={max}"
    )]
    SizeOutOfBounds {
        group: String,
        current: i32,
        want: i32,
        min: i32,
        max: i32,
    },

    #[error("no nodes given to delete from node group {0}")]
    EmptyNodeDelete(String),

    #[error("remote {operation} failed for {group}")]
    Remote {
        group: String,
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error("node group {group} did not reach state {state} within {timeout:?} ({attempts} checks)")]
    ConvergenceTimeout {
        group: String,
        state: NodeGroupState,
        timeout: Duration,
        attempts: u32,
    },

    #[error("operation is not supported by the control plane")]
    NotSupported,
}

impl ScalerError {
    /// True for the stable capability-not-supported signal, so callers can
    /// branch on capability instead of parsing error text.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, ScalerError::NotSupported)
    }
}
