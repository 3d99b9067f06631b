//! Task execution module
//!
//! This module handles dependency resolution into execution plans, running
//! those plans, and invoking external commands on behalf of tasks.

pub mod command;
pub mod plan;
pub mod runner;

pub use command::CommandExecutor;
pub use plan::{resolve, ExecutionPlan, PlannedStep, TaskShape, TaskSource};
pub use runner::{Executor, LiveTasks, RunOutcome};
