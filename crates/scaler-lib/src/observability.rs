//! Prometheus metrics for the scaler
//!
//! Metrics are registered once in the default registry and exposed by the
//! daemon's `/metrics` endpoint.

use std::sync::OnceLock;
use std::time::Duration;

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};

/// Histogram buckets for convergence waits (seconds). Scale operations
/// regularly take minutes on the control plane.
const CONVERGENCE_BUCKETS: &[f64] = &[1.0, 3.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScalerMetricsInner> = OnceLock::new();

struct ScalerMetricsInner {
    refreshes: IntCounter,
    refresh_group_errors: IntCounter,
    node_groups: IntGauge,
    scale_operations: IntCounter,
    node_deletes: IntCounter,
    convergence_timeouts: IntCounter,
    convergence_wait_seconds: Histogram,
}

impl ScalerMetricsInner {
    fn new() -> Self {
        Self {
            refreshes: register_int_counter!(
                "scaler_refreshes_total",
                "Number of completed node group refresh cycles"
            )
            .expect("Failed to register refreshes_total"),

            refresh_group_errors: register_int_counter!(
                "scaler_refresh_group_errors_total",
                "Node groups skipped during refresh because instance enumeration failed"
            )
            .expect("Failed to register refresh_group_errors_total"),

            node_groups: register_int_gauge!(
                "scaler_node_groups",
                "Number of node groups currently cached for the cluster"
            )
            .expect("Failed to register node_groups"),

            scale_operations: register_int_counter!(
                "scaler_scale_operations_total",
                "Number of successfully converged scale operations"
            )
            .expect("Failed to register scale_operations_total"),

            node_deletes: register_int_counter!(
                "scaler_node_deletes_total",
                "Number of successfully deleted nodes"
            )
            .expect("Failed to register node_deletes_total"),

            convergence_timeouts: register_int_counter!(
                "scaler_convergence_timeouts_total",
                "Convergence waits that expired before the target state was observed"
            )
            .expect("Failed to register convergence_timeouts_total"),

            convergence_wait_seconds: register_histogram!(
                "scaler_convergence_wait_seconds",
                "Time spent waiting for a node group to reach its target state",
                CONVERGENCE_BUCKETS.to_vec()
            )
            .expect("Failed to register convergence_wait_seconds"),
        }
    }
}

/// Handle to the global scaler metrics. Cheap to copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalerMetrics;

impl ScalerMetrics {
    pub fn global() -> Self {
        Self::inner();
        ScalerMetrics
    }

    fn inner() -> &'static ScalerMetricsInner {
        GLOBAL_METRICS.get_or_init(ScalerMetricsInner::new)
    }

    pub fn inc_refreshes(self) {
        Self::inner().refreshes.inc();
    }

    pub fn inc_refresh_group_errors(self) {
        Self::inner().refresh_group_errors.inc();
    }

    pub fn set_node_groups(self, count: i64) {
        Self::inner().node_groups.set(count);
    }

    pub fn inc_scale_operations(self) {
        Self::inner().scale_operations.inc();
    }

    pub fn inc_node_deletes(self) {
        Self::inner().node_deletes.inc();
    }

    pub fn inc_convergence_timeouts(self) {
        Self::inner().convergence_timeouts.inc();
    }

    pub fn observe_convergence_wait(self, elapsed: Duration) {
        Self::inner()
            .convergence_wait_seconds
            .observe(elapsed.as_secs_f64());
    }
}
