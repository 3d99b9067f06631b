use anyhow::Result;
use colored::*;
use sluice_core::orchestrator::Orchestrator;

pub fn execute(orchestrator: &Orchestrator) -> Result<()> {
    println!("{}", "Task Graph:".bold().underline());

    let graph = orchestrator.task_graph().graph;

    if graph.node_count() == 0 {
        println!("No tasks registered");
        return Ok(());
    }

    for (node_index, node_weight) in graph.node_indices().zip(graph.node_weights()) {
        println!("{}", node_weight.blue().bold());

        // petgraph yields neighbors newest edge first
        let mut deps = Vec::new();
        for neighbor in graph.neighbors(node_index) {
            if let Some(dep_name) = graph.node_weight(neighbor) {
                deps.push(dep_name.clone());
            }
        }
        deps.reverse();

        if !deps.is_empty() {
            println!("  {} {}", "depends on:".dimmed(), deps.join(", "));
        } else {
            println!("  {}", "no dependencies".dimmed());
        }
        println!();
    }

    Ok(())
}
