//! High-level orchestrator interface
//!
//! The [`Orchestrator`] is the primary entry point for front ends. It loads
//! `sluice.yml`, builds the toolchain, registers the built-in front-end tasks
//! followed by the command tasks the project declares, and runs tasks against
//! the resulting registry.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sluice_core::orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! # async fn example() -> sluice_core::types::SluiceResult<()> {
//! let orchestrator = Orchestrator::new(OrchestratorConfig::new("."))?;
//!
//! // Inspect what `build` would do
//! let plan = orchestrator.plan("build")?;
//! println!("{:?}", plan.plan.task_names());
//!
//! // Run it
//! orchestrator.run("build").await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::Graph;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::collaborators::Toolchain;
use crate::composition::CompositionNode;
use crate::configs::{load_project_config, ProjectConfig};
use crate::custom::register_custom_tasks;
use crate::execution::command::CommandExecutor;
use crate::execution::runner::{Executor, RunOutcome};
use crate::frontend::Frontend;
use crate::mode::{Mode, MODE_ENV_VAR};
use crate::registry::Registry;
use crate::results::{TaskGraphResult, TaskInfo, TaskListResult, TaskPlanResult};
use crate::tasks::get_task_color;
use crate::types::SluiceResult;

/// Configuration for initializing an orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub root: PathBuf,
    pub mode: Mode,
}

impl OrchestratorConfig {
    /// Use `root` as the project root, with the mode taken from `SLUICE_ENV`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: Mode::from_env(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

pub struct Orchestrator {
    root: PathBuf,
    mode: Mode,
    project: Arc<ProjectConfig>,
    executor: Executor,
    shutdown: CancellationToken,
}

impl Orchestrator {
    /// Load `sluice.yml` from the project root and register every task
    pub fn new(config: OrchestratorConfig) -> SluiceResult<Self> {
        let project = load_project_config(&config.root)?;
        let commands = Self::command_executor(&config);
        let tools = Toolchain::from_config(&project.tools, &commands);
        Self::with_toolchain(config, project, tools)
    }

    /// Build an orchestrator around an already loaded project and toolchain
    pub fn with_toolchain(
        config: OrchestratorConfig,
        project: ProjectConfig,
        tools: Toolchain,
    ) -> SluiceResult<Self> {
        let project = Arc::new(project);
        let commands = Self::command_executor(&config);

        let mut registry = Registry::new();
        Frontend::new(&config.root, Arc::clone(&project), config.mode, tools)
            .register(&mut registry)?;
        register_custom_tasks(&mut registry, &project.tasks, &commands)?;
        debug!(tasks = registry.len(), mode = %config.mode, "registry ready");

        let shutdown = CancellationToken::new();
        let executor = Executor::with_shutdown(Arc::new(registry), shutdown.clone());
        Ok(Self {
            root: config.root,
            mode: config.mode,
            project,
            executor,
            shutdown,
        })
    }

    fn command_executor(config: &OrchestratorConfig) -> CommandExecutor {
        CommandExecutor::new(&config.root).with_env(MODE_ENV_VAR, config.mode.to_string())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Token that interrupts every run of this orchestrator when cancelled
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Interrupt running tasks and stop long-running ones
    pub fn shutdown(&self) {
        info!("shutting down");
        self.shutdown.cancel();
    }

    /// Get the execution plan for a task
    pub fn plan(&self, task: &str) -> SluiceResult<TaskPlanResult> {
        let plan = self.executor.plan(&CompositionNode::task(task))?;
        let task_colors = plan
            .task_names()
            .into_iter()
            .map(|name| (name.to_string(), get_task_color(name)))
            .collect();
        Ok(TaskPlanResult {
            task: task.to_string(),
            plan,
            task_colors,
        })
    }

    /// Run a task with its prerequisites
    pub async fn run(&self, task: &str) -> SluiceResult<RunOutcome> {
        info!(task, mode = %self.mode, "running");
        self.executor.run_node(&CompositionNode::task(task)).await
    }

    /// List registered tasks in registration order
    pub fn list_tasks(&self) -> TaskListResult {
        let tasks: Vec<TaskInfo> = self.executor.registry().tasks().map(TaskInfo::from).collect();
        let task_colors = tasks
            .iter()
            .map(|task| (task.name.clone(), get_task_color(&task.name)))
            .collect();
        TaskListResult { tasks, task_colors }
    }

    /// Get the graph of task references
    pub fn task_graph(&self) -> TaskGraphResult {
        let mut graph = Graph::<String, ()>::new();
        let mut node_indices = HashMap::new();
        let registry = self.executor.registry();

        for task in registry.tasks() {
            node_indices.insert(task.name(), graph.add_node(task.name().to_string()));
        }
        for task in registry.tasks() {
            let from_node = node_indices[task.name()];
            let referenced = task
                .dependencies()
                .iter()
                .map(String::as_str)
                .chain(task.composition().map(CompositionNode::task_names).unwrap_or_default());
            for name in referenced {
                if let Some(&to_node) = node_indices.get(name) {
                    graph.update_edge(from_node, to_node, ());
                }
            }
        }
        TaskGraphResult { graph }
    }

    /// JSON schema of `sluice.yml`
    pub fn schema() -> serde_json::Value {
        crate::configs::project::project_config_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::testing::{toolchain, RecordingNotifier};
    use crate::results::TaskKind;

    fn orchestrator(root: &Path, yaml: &str) -> SluiceResult<Orchestrator> {
        let project = crate::configs::parse_project_config(yaml)?;
        Orchestrator::with_toolchain(
            OrchestratorConfig::new(root).with_mode(Mode::Production),
            project,
            toolchain(Arc::new(RecordingNotifier::default())),
        )
    }

    #[test]
    fn test_builtins_then_custom_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            "tasks:\n  - name: lint\n    command: echo lint\n    dependencies: [\"css:build\"]\n",
        )
        .unwrap();

        let list = orchestrator.list_tasks();
        let names: Vec<&str> = list.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.last(), Some(&"lint"));
        assert!(names.contains(&"default"));
        assert_eq!(list.task_colors.len(), list.tasks.len());

        let build = list.tasks.iter().find(|t| t.name == "build").unwrap();
        assert_eq!(build.kind, TaskKind::Composite);
        assert_eq!(build.members.len(), 6);
        assert!(list.tasks.iter().find(|t| t.name == "watch").unwrap().long_running);
    }

    #[test]
    fn test_production_default_plan() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path(), "").unwrap();
        let result = orchestrator.plan("default").unwrap();
        let names = result.plan.task_names();
        assert_eq!(names[0], "clean");
        assert_eq!(names.len(), 7);
        assert!(!names.contains(&"watch"));
    }

    #[test]
    fn test_task_graph_edges() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path(), "").unwrap();
        let graph = orchestrator.task_graph().graph;
        let build = graph
            .node_indices()
            .find(|&i| graph[i] == "build")
            .unwrap();
        assert_eq!(graph.neighbors(build).count(), 6);
    }

    #[test]
    fn test_unknown_task_plan() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path(), "").unwrap();
        assert!(matches!(
            orchestrator.plan("deploy"),
            Err(crate::types::SluiceError::UnknownTask(name)) if name == "deploy"
        ));
    }
}
