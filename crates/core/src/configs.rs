//! Configuration parsing for `sluice.yml`

pub mod frontend;
pub mod project;
pub mod tasks;

pub use project::{load_project_config, parse_project_config, ProjectConfig, CONFIG_FILE};
