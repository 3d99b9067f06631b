//! Result types for orchestrator operations
//!
//! Output structures returned by [`Orchestrator`](crate::Orchestrator) queries,
//! kept apart from the CLI so any front end can render them.

use std::collections::HashMap;
use std::fmt;

use colored::Color;
use petgraph::Graph;

use crate::execution::plan::ExecutionPlan;
use crate::task::{Task, TaskBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Runs a work function.
    Work,
    /// Stands for a composition of other tasks.
    Composite,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Work => f.write_str("task"),
            TaskKind::Composite => f.write_str("composite"),
        }
    }
}

/// Information about a registered task
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: String,
    pub description: Option<String>,
    pub kind: TaskKind,
    pub long_running: bool,
    pub dependencies: Vec<String>,
    /// Tasks named by a composite body, empty for work tasks
    pub members: Vec<String>,
}

/// Result of listing registered tasks
#[derive(Debug)]
pub struct TaskListResult {
    pub tasks: Vec<TaskInfo>,
    pub task_colors: HashMap<String, Color>,
}

/// Result of getting the task graph.
///
/// Edges point from a task to every task it references, prerequisites and
/// composite members alike.
#[derive(Debug)]
pub struct TaskGraphResult {
    pub graph: Graph<String, ()>,
}

/// Result of planning a task without running it
#[derive(Debug)]
pub struct TaskPlanResult {
    pub task: String,
    pub plan: ExecutionPlan,
    pub task_colors: HashMap<String, Color>,
}

impl From<&Task> for TaskInfo {
    fn from(task: &Task) -> Self {
        let (kind, members) = match task.body() {
            TaskBody::Work(_) => (TaskKind::Work, Vec::new()),
            TaskBody::Composite(node) => (
                TaskKind::Composite,
                node.task_names().into_iter().map(str::to_string).collect(),
            ),
        };
        Self {
            name: task.name().to_string(),
            description: task.description().map(str::to_string),
            kind,
            long_running: task.is_long_running(),
            dependencies: task.dependencies().to_vec(),
            members,
        }
    }
}
