//! Data types exchanged with collaborators.
//!
//! Everything here is plain data: option structs handed to a collaborator and
//! the outputs it hands back. None of these types know about tasks or plans.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error reported by an external tool.
///
/// Collaborators return this instead of panicking. The orchestrator wraps it
/// into a task failure carrying the name of the task that invoked the tool.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The tool ran but rejected its input (syntax error, unresolved import, ...).
    #[error("{tool}: {message}")]
    Rejected { tool: String, message: String },

    /// The tool could not be started or exited abnormally.
    #[error("{tool} failed to run: {message}")]
    Unavailable { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollaboratorError {
    pub fn rejected(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Options handed to a [`crate::StyleCompiler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOptions {
    /// Produce a source map next to the CSS.
    pub source_maps: bool,
    /// Emit compressed output.
    pub minify: bool,
    /// Browser targets for vendor prefixing (browserslist syntax, e.g. `> 1%`).
    pub browsers: Vec<String>,
}

/// Output of a style compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    pub css: String,
    pub source_map: Option<String>,
}

impl CompiledStyle {
    #[must_use]
    pub fn new(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            source_map: None,
        }
    }

    #[must_use]
    pub fn with_source_map(mut self, source_map: impl Into<String>) -> Self {
        self.source_map = Some(source_map.into());
        self
    }
}

/// Options handed to a [`crate::Bundler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOptions {
    /// Global variable name the bundle is exposed under (`var Main = ...`).
    pub library: Option<String>,
    /// Public URL prefix the bundle is served from.
    pub public_path: Option<String>,
    pub source_maps: bool,
    pub minify: bool,
}

/// Severity of a bundler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single message reported by a bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Output of a bundling run.
///
/// A bundler may produce code and still report errors; callers decide whether
/// errors are fatal by checking [`BundleOutput::has_errors`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutput {
    pub code: String,
    pub source_map: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BundleOutput {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// One SVG icon handed to a [`crate::SpriteGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgSource {
    /// Icon identifier, usually the file stem (`arrow-left` for `arrow-left.svg`).
    pub name: String,
    pub contents: String,
}

/// Sprite layout options.
///
/// Mirrors the `sprite:` section of `sluice.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SpriteOptions {
    /// Maximum icon width in pixels.
    pub max_width: u32,
    /// Maximum icon height in pixels.
    pub max_height: u32,
    /// Padding added around each icon.
    pub padding: u32,
    /// Directory (relative to the image output directory) the sprite is written to.
    pub dest: String,
    /// File name of the sprite.
    pub sprite: String,
    /// Also emit an HTML page listing every symbol.
    pub example: bool,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            max_width: 30,
            max_height: 30,
            padding: 0,
            dest: "svg".to_string(),
            sprite: "sprite.svg".to_string(),
            example: true,
        }
    }
}

/// A packed sprite plus its optional example page.
///
/// Paths are relative to the output directory of the sprite task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteAsset {
    pub path: PathBuf,
    pub contents: String,
    pub example: Option<(PathBuf, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_output_errors() {
        let mut output = BundleOutput {
            code: "var Main = {};".to_string(),
            diagnostics: vec![Diagnostic::warning("unused import")],
            ..Default::default()
        };
        assert!(!output.has_errors());

        output.diagnostics.push(Diagnostic::error("cannot resolve './missing'"));
        assert!(output.has_errors());
    }

    #[test]
    fn test_sprite_options_defaults_fill_missing_fields() {
        let options: SpriteOptions = serde_json::from_str(r#"{"maxWidth": 24}"#).unwrap();
        assert_eq!(options.max_width, 24);
        assert_eq!(options.max_height, 30);
        assert_eq!(options.sprite, "sprite.svg");
        assert!(options.example);
    }

    #[test]
    fn test_collaborator_error_display() {
        let err = CollaboratorError::rejected("sass", "expected \";\"");
        assert_eq!(err.to_string(), "sass: expected \";\"");
    }
}
