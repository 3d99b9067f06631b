//! Collaborators backed by external programs

use std::path::Path;

use async_trait::async_trait;
use sluice_plugin_protocol::{
    BundleOptions, BundleOutput, Bundler, CollaboratorError, CollaboratorResult, CompiledStyle,
    Diagnostic, ImageOptimizer, StyleCompiler, StyleOptions,
};

use crate::configs::frontend::ToolCommand;
use crate::execution::command::CommandExecutor;

fn utf8(tool: &str, bytes: Vec<u8>) -> CollaboratorResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| CollaboratorError::rejected(tool, format!("output is not UTF-8: {}", e)))
}

/// Style compiler reading the stylesheet on stdin and writing CSS to stdout
#[derive(Debug, Clone)]
pub struct CommandStyleCompiler {
    executor: CommandExecutor,
    command: ToolCommand,
}

impl CommandStyleCompiler {
    pub fn new(executor: CommandExecutor, command: ToolCommand) -> Self {
        Self { executor, command }
    }
}

#[async_trait]
impl StyleCompiler for CommandStyleCompiler {
    fn name(&self) -> &str {
        &self.command.program
    }

    async fn compile(
        &self,
        path: &Path,
        source: &str,
        options: &StyleOptions,
    ) -> CollaboratorResult<CompiledStyle> {
        let file = path.to_string_lossy();
        let browsers = options.browsers.join(", ");
        let args = self.command.arguments(
            options.source_maps,
            options.minify,
            &[("file", &*file), ("browsers", browsers.as_str())],
        );
        let output = self
            .executor
            .capture(&self.command.program, &args, Some(source.as_bytes()))
            .await?;
        Ok(CompiledStyle::new(utf8(self.name(), output.stdout)?))
    }
}

/// Bundler writing the bundle to stdout; anything on stderr becomes a warning
#[derive(Debug, Clone)]
pub struct CommandBundler {
    executor: CommandExecutor,
    command: ToolCommand,
}

impl CommandBundler {
    pub fn new(executor: CommandExecutor, command: ToolCommand) -> Self {
        Self { executor, command }
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    fn name(&self) -> &str {
        &self.command.program
    }

    async fn bundle(&self, entry: &Path, options: &BundleOptions) -> CollaboratorResult<BundleOutput> {
        let entry = entry.to_string_lossy();
        let args = self.command.arguments(
            options.source_maps,
            options.minify,
            &[
                ("entry", &*entry),
                ("library", options.library.as_deref().unwrap_or_default()),
                ("publicPath", options.public_path.as_deref().unwrap_or_default()),
            ],
        );
        let output = self
            .executor
            .capture(&self.command.program, &args, None)
            .await?;

        let warnings = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let mut bundle = BundleOutput {
            code: utf8(self.name(), output.stdout)?,
            ..BundleOutput::default()
        };
        if !warnings.is_empty() {
            bundle.diagnostics.push(Diagnostic::warning(warnings));
        }
        Ok(bundle)
    }
}

/// Image optimizer reading the image on stdin and writing the result to stdout
#[derive(Debug, Clone)]
pub struct CommandImageOptimizer {
    executor: CommandExecutor,
    command: ToolCommand,
}

impl CommandImageOptimizer {
    pub fn new(executor: CommandExecutor, command: ToolCommand) -> Self {
        Self { executor, command }
    }
}

#[async_trait]
impl ImageOptimizer for CommandImageOptimizer {
    fn name(&self) -> &str {
        &self.command.program
    }

    async fn optimize(&self, path: &Path, contents: Vec<u8>) -> CollaboratorResult<Vec<u8>> {
        let file = path.to_string_lossy();
        let args = self.command.arguments(false, true, &[("file", &*file)]);
        let output = self
            .executor
            .capture(&self.command.program, &args, Some(&contents))
            .await?;
        // tools print nothing for formats they skip
        if output.stdout.is_empty() {
            return Ok(contents);
        }
        Ok(output.stdout)
    }
}

/// Copies images unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughImageOptimizer;

#[async_trait]
impl ImageOptimizer for PassthroughImageOptimizer {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn optimize(&self, _path: &Path, contents: Vec<u8>) -> CollaboratorResult<Vec<u8>> {
        Ok(contents)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh").with_args(["-c", script])
    }

    #[tokio::test]
    async fn test_style_compiler_round_trip_through_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CommandStyleCompiler::new(
            CommandExecutor::new(dir.path()),
            sh("tr -d ' \\n'"),
        );
        let css = compiler
            .compile(Path::new("main.scss"), "a { color: red; }\n", &StyleOptions::default())
            .await
            .unwrap();
        assert_eq!(css.css, "a{color:red;}");
    }

    #[tokio::test]
    async fn test_style_compiler_error_is_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CommandStyleCompiler::new(
            CommandExecutor::new(dir.path()),
            sh("echo 'expected \"}\"' >&2; exit 65"),
        );
        let err = compiler
            .compile(Path::new("main.scss"), "a {", &StyleOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Rejected { .. }));
        assert!(err.to_string().contains("expected"));
    }

    #[tokio::test]
    async fn test_bundler_substitutes_and_collects_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let mut command = sh("echo \"var $1 = {};\"; echo 'unused import' >&2");
        command.args.extend(["bundler".to_string(), "{library}".to_string()]);
        let bundler = CommandBundler::new(CommandExecutor::new(dir.path()), command);

        let output = bundler
            .bundle(
                Path::new("src/js/main.js"),
                &BundleOptions {
                    library: Some("Main".to_string()),
                    ..BundleOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(output.code.trim(), "var Main = {};");
        assert_eq!(output.diagnostics, vec![Diagnostic::warning("unused import")]);
        assert!(!output.has_errors());
    }

    #[tokio::test]
    async fn test_image_optimizer_keeps_input_on_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let silent = CommandImageOptimizer::new(
            CommandExecutor::new(dir.path()),
            sh("cat > /dev/null"),
        );
        let bytes = silent
            .optimize(Path::new("logo.png"), vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_passthrough() {
        let bytes = PassthroughImageOptimizer
            .optimize(Path::new("logo.png"), b"png".to_vec())
            .await
            .unwrap();
        assert_eq!(bytes, b"png");
    }
}
