//! Sluice Core Library
//!
//! This is the core library for the sluice front-end build orchestrator. It
//! provides the task model, dependency resolution, the concurrent executor,
//! the debounced watch engine and the built-in front-end tasks.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`orchestrator`] - High-level interface: load `sluice.yml`, register, plan and run
//! - [`task`], [`composition`], [`registry`] - Tasks, series/parallel compositions and their registry
//! - [`execution`] - Plan resolution, the executor and external command invocation
//! - [`pipeline`] - Asset streams with source maps, renaming and destination writes
//! - [`sources`], [`incremental`] - Glob source collection and newer-than-destination filtering
//! - [`watch`] - Glob bindings with a debounce window per binding
//! - [`frontend`] - `css:build`, `js:bundle`, `watch`, `webserver` and the other built-in tasks
//! - [`collaborators`] - Default implementations of the external tool contracts
//! - [`mode`] - Development and production modes selected by `SLUICE_ENV`
//! - [`configs`] - `sluice.yml` parsing
//! - [`results`], [`tasks`] - Result types and task display helpers
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sluice_core::orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! # async fn example() -> sluice_core::types::SluiceResult<()> {
//! let orchestrator = Orchestrator::new(OrchestratorConfig::new("."))?;
//! let outcome = orchestrator.run("default").await?;
//! if let sluice_core::execution::RunOutcome::Live(live) = outcome {
//!     live.wait().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod composition;
pub mod configs;
pub mod custom;
pub mod execution;
pub mod frontend;
pub mod incremental;
pub mod mode;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod sources;
pub mod task;
pub mod tasks;
pub mod types;
pub mod watch;

// Re-export the main types for easier usage
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use types::{SluiceError, SluiceResult};
