//! Command tasks declared in `sluice.yml`
//!
//! Declared tasks may depend on built-in tasks and on each other in any
//! order. They are sorted with `petgraph` so each one is registered after the
//! tasks it depends on; a dependency cycle among them is reported with the
//! tasks that form it.

use std::collections::{HashMap, HashSet};

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::prelude::*;
use tracing::debug;

use crate::configs::tasks::TaskConfig;
use crate::execution::command::CommandExecutor;
use crate::registry::Registry;
use crate::task::{Signal, Task};
use crate::types::{SluiceError, SluiceResult};

/// Register every declared task in dependency order
pub fn register_custom_tasks(
    registry: &mut Registry,
    tasks: &[TaskConfig],
    commands: &CommandExecutor,
) -> SluiceResult<()> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut node_indices = HashMap::new();

    for task in tasks {
        if registry.contains(&task.name) || node_indices.contains_key(task.name.as_str()) {
            return Err(SluiceError::DuplicateTask(task.name.clone()));
        }
        node_indices.insert(task.name.as_str(), graph.add_node(task.name.as_str()));
    }

    for task in tasks {
        let from_node = node_indices[task.name.as_str()];
        for dep in task.dependencies() {
            if let Some(&to_node) = node_indices.get(dep.as_str()) {
                // Add edge: task -> dependency (dependency comes first)
                graph.add_edge(from_node, to_node, ());
            } else if !registry.contains(dep) {
                return Err(SluiceError::UnknownDependency {
                    task: task.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| SluiceError::CyclicDependency {
        cycle: describe_cycle(&graph, cycle.node_id()),
    })?;

    // Dependencies sit at the end of the topological order
    for node in order.into_iter().rev() {
        let config = tasks
            .iter()
            .find(|t| t.name == graph[node])
            .ok_or_else(|| SluiceError::UnknownTask(graph[node].to_string()))?;
        registry.register(command_task(config, commands)?)?;
        debug!(task = %config.name, "registered command task");
    }
    Ok(())
}

/// Walk the strongly connected component holding `start` back to `start`
fn describe_cycle(graph: &DiGraph<&str, ()>, start: NodeIndex) -> Vec<String> {
    let component: HashSet<NodeIndex> = kosaraju_scc(graph)
        .into_iter()
        .find(|component| component.contains(&start))
        .unwrap_or_default()
        .into_iter()
        .collect();

    let mut path = vec![start];
    let mut visited = HashSet::from([start]);
    if !extend_to(graph, start, &component, &mut path, &mut visited) {
        path.push(start);
    }
    path.into_iter().map(|node| graph[node].to_string()).collect()
}

fn extend_to(
    graph: &DiGraph<&str, ()>,
    start: NodeIndex,
    component: &HashSet<NodeIndex>,
    path: &mut Vec<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
) -> bool {
    let Some(&current) = path.last() else {
        return false;
    };
    for next in graph.neighbors(current) {
        if next == start {
            path.push(start);
            return true;
        }
        if component.contains(&next) && visited.insert(next) {
            path.push(next);
            if extend_to(graph, start, component, path, visited) {
                return true;
            }
            path.pop();
        }
    }
    false
}

fn command_task(config: &TaskConfig, commands: &CommandExecutor) -> SluiceResult<Task> {
    let commands = commands
        .clone()
        .with_env("SLUICE_TASK", config.name.clone());
    let task = match (&config.script, &config.command) {
        (Some(script), None) => {
            let script = script.clone();
            Task::new(config.name.clone(), move |_| {
                let commands = commands.clone();
                let script = script.clone();
                async move {
                    commands.execute_script(&script).await?;
                    Ok(Signal::Done)
                }
            })
        }
        (None, Some(command)) => {
            let lines: Vec<String> = command.lines().into_iter().map(str::to_string).collect();
            Task::new(config.name.clone(), move |_| {
                let commands = commands.clone();
                let lines = lines.clone();
                async move {
                    for line in &lines {
                        commands.execute_shell_command(line).await?;
                    }
                    Ok(Signal::Done)
                }
            })
        }
        (Some(_), Some(_)) => {
            return Err(SluiceError::Config(format!(
                "Task '{}' has both 'script' and 'command'",
                config.name
            )))
        }
        (None, None) => {
            return Err(SluiceError::Config(format!(
                "Task '{}' needs either 'script' or 'command'",
                config.name
            )))
        }
    };

    let task = task.with_dependencies(config.dependencies().iter().cloned());
    Ok(match &config.description {
        Some(description) => task.with_description(description.clone()),
        None => task,
    })
}
