//! Built-in front-end tasks
//!
//! Registers the build tasks (`css:build`, `js:bundle`, ...), the `build`
//! composite running them in parallel, the long-running `watch` and
//! `webserver` tasks, and a `default` task whose shape depends on the mode:
//!
//! - development: `series(build, parallel(watch, webserver))`
//! - production: `series(clean, build)`

pub mod copy;
pub mod images;
pub mod live;
pub mod scripts;
pub mod styles;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collaborators::Toolchain;
use crate::composition::CompositionNode;
use crate::configs::ProjectConfig;
use crate::mode::Mode;
use crate::registry::Registry;
use crate::task::Task;
use crate::types::SluiceResult;

/// Tasks run by the `build` composite
pub const BUILD_TASKS: [&str; 6] = [
    "css:build",
    "assets:build",
    "svg:build",
    "js:build",
    "image:build",
    "js:bundle",
];

/// Everything the built-in tasks read: project root, settings, mode and tools
#[derive(Clone)]
pub struct Frontend {
    root: PathBuf,
    config: Arc<ProjectConfig>,
    mode: Mode,
    tools: Toolchain,
}

impl Frontend {
    pub fn new(root: impl Into<PathBuf>, config: Arc<ProjectConfig>, mode: Mode, tools: Toolchain) -> Self {
        Self {
            root: root.into(),
            config,
            mode,
            tools,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tools(&self) -> &Toolchain {
        &self.tools
    }

    /// A configured path, resolved against the project root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Composition the `default` task stands for
    pub fn default_composition(&self) -> CompositionNode {
        let mut steps = Vec::new();
        if self.mode.clean_first() {
            steps.push(CompositionNode::task("clean"));
        }
        steps.push(CompositionNode::task("build"));
        if self.mode.auto_serve() {
            steps.push(CompositionNode::parallel(["watch", "webserver"]));
        }
        CompositionNode::series(steps)
    }

    /// Register every built-in task
    pub fn register(&self, registry: &mut Registry) -> SluiceResult<()> {
        registry.register(copy::clean(self.clone()))?;
        registry.register(copy::assets(self.clone()))?;
        registry.register(scripts::vendor(self.clone()))?;
        registry.register(styles::compile(self.clone()))?;
        registry.register(images::optimize(self.clone()))?;
        registry.register(images::sprite(self.clone()))?;
        registry.register(scripts::bundle(self.clone()))?;
        registry.register(
            Task::composite("build", CompositionNode::parallel(BUILD_TASKS))
                .with_description("Run every build task in parallel"),
        )?;
        registry.register(live::watch(self.clone()))?;
        registry.register(live::webserver(self.clone()))?;
        registry.register(
            Task::composite("default", self.default_composition())
                .with_description(format!("Default {} pipeline", self.mode)),
        )?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Toolchain fakes shared by the front-end task tests

    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use sluice_plugin_protocol::*;

    use super::*;
    use crate::collaborators::{ConsoleReloadTransport, SymbolSpriteGenerator};

    /// Uppercases stylesheets; a stylesheet containing `error` is rejected
    pub struct FakeCompiler;

    #[async_trait]
    impl StyleCompiler for FakeCompiler {
        fn name(&self) -> &str {
            "fake-sass"
        }

        async fn compile(
            &self,
            _path: &Path,
            source: &str,
            options: &StyleOptions,
        ) -> CollaboratorResult<CompiledStyle> {
            if source.contains("error") {
                return Err(CollaboratorError::rejected(self.name(), "syntax error on line 1"));
            }
            let css = CompiledStyle::new(source.to_uppercase());
            Ok(if options.source_maps {
                css.with_source_map("{\"version\":3}")
            } else {
                css
            })
        }
    }

    pub struct FakeBundler;

    #[async_trait]
    impl Bundler for FakeBundler {
        fn name(&self) -> &str {
            "fake-bundler"
        }

        async fn bundle(&self, entry: &Path, options: &BundleOptions) -> CollaboratorResult<BundleOutput> {
            let source = tokio::fs::read_to_string(entry).await?;
            Ok(BundleOutput {
                code: format!(
                    "var {} = (function(){{{}}})();",
                    options.library.as_deref().unwrap_or("bundle"),
                    source.trim()
                ),
                source_map: None,
                diagnostics: vec![Diagnostic::warning("fake warning")],
            })
        }
    }

    /// Reverses image bytes so tests can tell optimized output apart
    pub struct FakeOptimizer;

    #[async_trait]
    impl ImageOptimizer for FakeOptimizer {
        fn name(&self) -> &str {
            "fake-optimizer"
        }

        async fn optimize(&self, _path: &Path, mut contents: Vec<u8>) -> CollaboratorResult<Vec<u8>> {
            contents.reverse();
            Ok(contents)
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub failures: Mutex<Vec<(String, String)>>,
    }

    impl FailureNotifier for RecordingNotifier {
        fn notify_failure(&self, title: &str, message: &str) {
            self.failures
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    #[derive(Default)]
    pub struct RecordingReload {
        pub changes: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl ReloadTransport for RecordingReload {
        async fn start(&self, _address: &str) -> CollaboratorResult<()> {
            Ok(())
        }

        async fn notify(&self, changed: &[PathBuf]) -> CollaboratorResult<()> {
            self.changes.lock().unwrap().extend_from_slice(changed);
            Ok(())
        }
    }

    pub fn toolchain(notifier: Arc<RecordingNotifier>) -> Toolchain {
        Toolchain {
            style_compiler: Arc::new(FakeCompiler),
            bundler: Arc::new(FakeBundler),
            image_optimizer: Arc::new(FakeOptimizer),
            sprite_generator: Arc::new(SymbolSpriteGenerator),
            reload: Arc::new(ConsoleReloadTransport::new()),
            notifier,
        }
    }

    pub fn frontend(root: &Path, mode: Mode) -> (Frontend, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let frontend = Frontend::new(
            root,
            Arc::new(ProjectConfig::default()),
            mode,
            toolchain(Arc::clone(&notifier)),
        );
        (frontend, notifier)
    }

    pub fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::execution::plan::resolve;

    #[test]
    fn test_registers_builtin_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let (frontend, _) = frontend(dir.path(), Mode::Development);
        let mut registry = Registry::new();
        frontend.register(&mut registry).unwrap();

        for name in BUILD_TASKS.iter().chain(&["clean", "build", "watch", "webserver", "default"]) {
            assert!(registry.contains(name), "{} missing", name);
        }
        assert!(registry.lookup("watch").unwrap().is_long_running());
        assert!(registry.lookup("webserver").unwrap().is_long_running());
    }

    #[test]
    fn test_default_depends_on_mode() {
        let dir = tempfile::tempdir().unwrap();

        let (development, _) = frontend(dir.path(), Mode::Development);
        let mut registry = Registry::new();
        development.register(&mut registry).unwrap();
        let plan = resolve(&registry, &CompositionNode::task("default")).unwrap();
        assert!(plan.position("watch").is_some());
        assert!(plan.position("clean").is_none());
        let watch = plan.position("watch").unwrap();
        assert_eq!(plan.steps()[watch].after.len(), BUILD_TASKS.len());

        let (production, _) = frontend(dir.path(), Mode::Production);
        let mut registry = Registry::new();
        production.register(&mut registry).unwrap();
        let plan = resolve(&registry, &CompositionNode::task("default")).unwrap();
        assert_eq!(plan.task_names()[0], "clean");
        assert!(plan.position("webserver").is_none());
        assert_eq!(plan.len(), 1 + BUILD_TASKS.len());
    }
}
