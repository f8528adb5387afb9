//! Template node synthesis for scale-up simulation
//!
//! Builds the hypothetical empty node a scheduling host uses to predict
//! what a new node would look like if a group were expanded. Pure
//! formatting over the group's static shape, no I/O.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Node, NodeSpec, NodeStatus, Taint};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::models::{provider_id, Label, MachinePlan, TaintSpec, PROVIDER_NAME};

/// Pods-per-node cap advertised on synthesized templates.
const NODE_MAX_PODS: i64 = 110;

/// Ephemeral storage advertised when the plan carries no memory amount.
const DEFAULT_EPHEMERAL_STORAGE_BYTES: i64 = 21_559_343_316_992;

/// Baseline resources assumed consumed on an otherwise empty node.
const TEMPLATE_REQUESTED_MILLI_CPU: i64 = 100;
const TEMPLATE_REQUESTED_MEMORY_BYTES: i64 = 100 * 1024 * 1024;

/// Resource totals of a synthesized node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeResources {
    pub milli_cpu: i64,
    pub memory_bytes: i64,
    pub ephemeral_storage_bytes: i64,
    pub allowed_pods: i64,
}

/// Hypothetical empty node plus the resource summaries the scheduling
/// host feeds into its scale-up simulation.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node: Node,
    pub requested: NodeResources,
    pub allocatable: NodeResources,
}

/// Synthesizes an empty node for a group with the given machine plan.
pub fn template_node(
    group_name: &str,
    plan: &MachinePlan,
    labels: &[Label],
    taints: &[TaintSpec],
) -> NodeInfo {
    let milli_cpu = plan.core_number * 1000;
    let memory_bytes = plan.memory_mb * 1024 * 1024;
    let ephemeral_storage_bytes = if plan.memory_mb > 0 {
        memory_bytes
    } else {
        DEFAULT_EPHEMERAL_STORAGE_BYTES
    };

    let mut resources: BTreeMap<String, Quantity> = BTreeMap::new();
    resources.insert("cpu".to_string(), Quantity(milli_cpu.to_string()));
    resources.insert("memory".to_string(), Quantity(memory_bytes.to_string()));
    resources.insert("pods".to_string(), Quantity(NODE_MAX_PODS.to_string()));
    resources.insert(
        "ephemeral-storage".to_string(),
        Quantity(ephemeral_storage_bytes.to_string()),
    );

    let node_labels: BTreeMap<String, String> = labels
        .iter()
        .map(|l| (l.key.clone(), l.value.clone()))
        .collect();
    let node_taints: Vec<Taint> = taints
        .iter()
        .map(|t| Taint {
            key: t.key.clone(),
            value: Some(t.value.clone()),
            effect: t.effect.clone(),
            time_added: None,
        })
        .collect();

    let node = Node {
        metadata: ObjectMeta {
            name: Some(format!("{PROVIDER_NAME}-template-{group_name}")),
            labels: if node_labels.is_empty() {
                None
            } else {
                Some(node_labels)
            },
            ..Default::default()
        },
        spec: Some(NodeSpec {
            provider_id: Some(provider_id(group_name)),
            taints: if node_taints.is_empty() {
                None
            } else {
                Some(node_taints)
            },
            ..Default::default()
        }),
        status: Some(NodeStatus {
            allocatable: Some(resources.clone()),
            capacity: Some(resources),
            ..Default::default()
        }),
    };

    NodeInfo {
        node,
        requested: NodeResources {
            milli_cpu: TEMPLATE_REQUESTED_MILLI_CPU,
            memory_bytes: TEMPLATE_REQUESTED_MEMORY_BYTES,
            ..Default::default()
        },
        allocatable: NodeResources {
            milli_cpu,
            memory_bytes,
            ephemeral_storage_bytes,
            allowed_pods: NODE_MAX_PODS,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> MachinePlan {
        MachinePlan {
            core_number: 1,
            memory_mb: 2048,
        }
    }

    #[test]
    fn template_carries_plan_resources() {
        let info = template_node("pool-a", &plan(), &[], &[]);

        let status = info.node.status.as_ref().unwrap();
        let capacity = status.capacity.as_ref().unwrap();
        assert_eq!(capacity["cpu"].0, "1000");
        assert_eq!(capacity["memory"].0, (2048_i64 * 1024 * 1024).to_string());
        assert_eq!(capacity["pods"].0, "110");
        assert_eq!(
            capacity["ephemeral-storage"].0,
            (2048_i64 * 1024 * 1024).to_string()
        );
        assert_eq!(status.allocatable, status.capacity);

        assert_eq!(info.allocatable.milli_cpu, 1000);
        assert_eq!(info.allocatable.memory_bytes, 2048 * 1024 * 1024);
        assert_eq!(info.allocatable.allowed_pods, 110);
        assert_eq!(info.requested.milli_cpu, 100);
        assert_eq!(info.requested.memory_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn template_names_and_provider_id() {
        let info = template_node("pool-a", &plan(), &[], &[]);
        assert_eq!(
            info.node.metadata.name.as_deref(),
            Some("mks-template-pool-a")
        );
        let spec = info.node.spec.as_ref().unwrap();
        assert_eq!(spec.provider_id.as_deref(), Some("mks:////pool-a"));
        assert!(spec.taints.is_none());
    }

    #[test]
    fn template_copies_labels_and_taints() {
        let labels = vec![Label {
            key: "tier".to_string(),
            value: "batch".to_string(),
        }];
        let taints = vec![TaintSpec {
            key: "dedicated".to_string(),
            value: "batch".to_string(),
            effect: "NoSchedule".to_string(),
        }];
        let info = template_node("pool-a", &plan(), &labels, &taints);

        let node_labels = info.node.metadata.labels.as_ref().unwrap();
        assert_eq!(node_labels["tier"], "batch");
        let node_taints = info.node.spec.as_ref().unwrap().taints.as_ref().unwrap();
        assert_eq!(node_taints.len(), 1);
        assert_eq!(node_taints[0].key, "dedicated");
        assert_eq!(node_taints[0].value.as_deref(), Some("batch"));
        assert_eq!(node_taints[0].effect, "NoSchedule");
    }

    #[test]
    fn ephemeral_storage_falls_back_without_memory() {
        let empty_plan = MachinePlan {
            core_number: 2,
            memory_mb: 0,
        };
        let info = template_node("pool-a", &empty_plan, &[], &[]);
        assert_eq!(
            info.allocatable.ephemeral_storage_bytes,
            DEFAULT_EPHEMERAL_STORAGE_BYTES
        );
    }
}
