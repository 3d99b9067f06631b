//! Task registry
//!
//! Stores named tasks in registration order. A task may only reference tasks
//! registered before it, so the registry itself can never hold a cycle.

use std::collections::HashMap;

use crate::composition::CompositionNode;
use crate::task::Task;
use crate::types::{SluiceError, SluiceResult};

#[derive(Debug, Default)]
pub struct Registry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    ///
    /// Fails with [`SluiceError::DuplicateTask`] if the name is taken, or
    /// [`SluiceError::UnknownDependency`] if a prerequisite or a task named by
    /// a composite body is not registered yet.
    pub fn register(&mut self, task: Task) -> SluiceResult<()> {
        if self.index.contains_key(task.name()) {
            return Err(SluiceError::DuplicateTask(task.name().to_string()));
        }

        let referenced = task
            .dependencies()
            .iter()
            .map(String::as_str)
            .chain(task.composition().map(CompositionNode::task_names).unwrap_or_default());
        for dependency in referenced {
            if !self.index.contains_key(dependency) {
                return Err(SluiceError::UnknownDependency {
                    task: task.name().to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }

        self.index.insert(task.name().to_string(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Register a composite task standing for `node`
    pub fn register_composite(
        &mut self,
        name: impl Into<String>,
        node: CompositionNode,
    ) -> SluiceResult<()> {
        self.register(Task::composite(name, node))
    }

    pub fn lookup(&self, name: &str) -> SluiceResult<&Task> {
        self.index
            .get(name)
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| SluiceError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
