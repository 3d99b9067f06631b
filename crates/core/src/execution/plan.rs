//! Dependency resolution
//!
//! Turns a [`CompositionNode`] into an [`ExecutionPlan`]: a flat list of steps
//! where every step names the earlier steps it has to wait for.
//!
//! Each task leaf expands depth-first into its prerequisite chain, with the
//! prerequisites run in series before the task itself. A task already planned
//! during the same resolution is not planned again; later references wait for
//! the existing step instead. Composite tasks expand inline and never occupy a
//! step of their own.

use std::collections::HashMap;

use crate::composition::CompositionNode;
use crate::registry::Registry;
use crate::types::{SluiceError, SluiceResult};

/// Shape of a task as seen by the resolver
#[derive(Debug, Clone, Copy)]
pub struct TaskShape<'a> {
    pub prerequisites: &'a [String],
    pub composition: Option<&'a CompositionNode>,
}

/// Anything the resolver can look task definitions up in
pub trait TaskSource {
    fn shape(&self, name: &str) -> SluiceResult<TaskShape<'_>>;
}

impl TaskSource for Registry {
    fn shape(&self, name: &str) -> SluiceResult<TaskShape<'_>> {
        let task = self.lookup(name)?;
        Ok(TaskShape {
            prerequisites: task.dependencies(),
            composition: task.composition(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub task: String,
    /// Indices of the steps that must complete before this one starts.
    /// Always lower than the index of this step.
    pub after: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    steps: Vec<PlannedStep>,
}

impl ExecutionPlan {
    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    /// Task names in plan order
    pub fn task_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.task.as_str()).collect()
    }

    pub fn position(&self, task: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.task == task)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Resolve a composition into an execution plan
pub fn resolve<S: TaskSource>(source: &S, node: &CompositionNode) -> SluiceResult<ExecutionPlan> {
    let mut resolver = Resolver {
        source,
        steps: Vec::new(),
        planned: HashMap::new(),
        path: Vec::new(),
    };
    resolver.node(node, Vec::new())?;
    Ok(ExecutionPlan {
        steps: resolver.steps,
    })
}

struct Resolver<'a, S> {
    source: &'a S,
    steps: Vec<PlannedStep>,
    /// Task name -> steps whose completion means the task is complete.
    planned: HashMap<String, Vec<usize>>,
    /// Tasks currently being expanded, outermost first.
    path: Vec<String>,
}

impl<S: TaskSource> Resolver<'_, S> {
    /// Plan `node` so it starts after `after`; returns the steps that mark its completion.
    fn node(&mut self, node: &CompositionNode, after: Vec<usize>) -> SluiceResult<Vec<usize>> {
        match node {
            CompositionNode::Task(name) => self.task(name, after),
            CompositionNode::Series(children) => {
                let mut after = after;
                for child in children {
                    after = self.node(child, after)?;
                }
                Ok(after)
            }
            CompositionNode::Parallel(children) => {
                if children.is_empty() {
                    return Ok(after);
                }
                let mut exits = Vec::new();
                for child in children {
                    for step in self.node(child, after.clone())? {
                        if !exits.contains(&step) {
                            exits.push(step);
                        }
                    }
                }
                Ok(exits)
            }
        }
    }

    fn task(&mut self, name: &str, after: Vec<usize>) -> SluiceResult<Vec<usize>> {
        if let Some(start) = self.path.iter().position(|t| t == name) {
            let mut cycle = self.path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(SluiceError::CyclicDependency { cycle });
        }

        if let Some(exits) = self.planned.get(name) {
            let mut after = after;
            for &step in exits {
                if !after.contains(&step) {
                    after.push(step);
                }
            }
            return Ok(after);
        }

        let source = self.source;
        let shape = source.shape(name)?;
        self.path.push(name.to_string());

        let mut after = after;
        for prerequisite in shape.prerequisites {
            after = self.task(prerequisite, after)?;
        }

        let exits = match shape.composition {
            Some(composition) => self.node(composition, after)?,
            None => {
                self.steps.push(PlannedStep {
                    task: name.to_string(),
                    after,
                });
                vec![self.steps.len() - 1]
            }
        };

        self.path.pop();
        self.planned.insert(name.to_string(), exits.clone());
        Ok(exits)
    }
}
