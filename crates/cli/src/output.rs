//! Table rendering for CLI output

use colored::Colorize;
use scaler_lib::remote::{NodeGroupDetails, NodeGroupState, NodeGroupSummary};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "COUNT")]
    count: i32,
    #[tabled(rename = "STATE")]
    state: String,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "NODE")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
}

pub fn print_groups(groups: &[NodeGroupSummary]) {
    if groups.is_empty() {
        println!("no node groups found");
        return;
    }
    let rows: Vec<GroupRow> = groups
        .iter()
        .map(|g| GroupRow {
            name: g.name.clone(),
            count: g.count,
            state: colored_group_state(g.state),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::blank()));
}

pub fn print_nodes(details: &NodeGroupDetails) {
    if details.nodes.is_empty() {
        println!("node group {} has no nodes", details.name);
        return;
    }
    let rows: Vec<NodeRow> = details
        .nodes
        .iter()
        .map(|n| NodeRow {
            name: n.name.clone(),
            state: n.state.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::blank()));
}

fn colored_group_state(state: NodeGroupState) -> String {
    let text = state.to_string();
    match state {
        NodeGroupState::Running => text.green().to_string(),
        NodeGroupState::Terminating | NodeGroupState::Unknown => text.red().to_string(),
        _ => text.yellow().to_string(),
    }
}
