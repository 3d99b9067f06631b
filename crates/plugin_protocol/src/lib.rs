//! # Sluice Plugin Protocol
//!
//! Interfaces for the external tools that sluice drives but does not implement.
//!
//! A front-end build delegates every heavy transformation to a collaborator:
//!
//! - [`StyleCompiler`] - turns a style-sheet source (Sass, Less, ...) into CSS
//! - [`Bundler`] - bundles a JavaScript entry file into a single script
//! - [`ImageOptimizer`] - recompresses raster or vector images
//! - [`SpriteGenerator`] - packs several SVG icons into one sprite asset
//! - [`ReloadTransport`] - tells connected browsers which output paths changed
//! - [`FailureNotifier`] - surfaces a task failure to the developer
//!
//! Adapters for concrete tools depend only on this crate. The orchestrator
//! wraps every [`CollaboratorError`] into a task failure, so adapters never
//! need to know about the task graph.
//!
//! ## Quick Start
//!
//! ```rust
//! use sluice_plugin_protocol::{CollaboratorResult, CompiledStyle, StyleCompiler, StyleOptions};
//! use std::path::Path;
//!
//! struct Verbatim;
//!
//! #[async_trait::async_trait]
//! impl StyleCompiler for Verbatim {
//!     fn name(&self) -> &str {
//!         "verbatim"
//!     }
//!
//!     async fn compile(
//!         &self,
//!         _path: &Path,
//!         source: &str,
//!         _options: &StyleOptions,
//!     ) -> CollaboratorResult<CompiledStyle> {
//!         Ok(CompiledStyle::new(source))
//!     }
//! }
//! ```

pub mod traits;
pub mod types;

pub use traits::*;
pub use types::*;
