//! End-to-end runs through the orchestrator with stand-in compilers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sluice_core::collaborators::{
    ConsoleNotifier, ConsoleReloadTransport, PassthroughImageOptimizer, SymbolSpriteGenerator,
    Toolchain,
};
use sluice_core::configs::parse_project_config;
use sluice_core::execution::RunOutcome;
use sluice_core::mode::Mode;
use sluice_core::{Orchestrator, OrchestratorConfig, SluiceError};
use sluice_plugin_protocol::{
    BundleOptions, BundleOutput, Bundler, CollaboratorResult, CompiledStyle, StyleCompiler,
    StyleOptions,
};

/// Echoes the stylesheet, squashing whitespace when minifying
struct EchoCompiler;

#[async_trait]
impl StyleCompiler for EchoCompiler {
    fn name(&self) -> &str {
        "echo"
    }

    async fn compile(
        &self,
        _path: &Path,
        source: &str,
        options: &StyleOptions,
    ) -> CollaboratorResult<CompiledStyle> {
        let css = if options.minify {
            source.split_whitespace().collect::<String>()
        } else {
            source.to_string()
        };
        let compiled = CompiledStyle::new(css);
        Ok(if options.source_maps {
            compiled.with_source_map("{\"version\":3,\"mappings\":\"\"}")
        } else {
            compiled
        })
    }
}

struct ConcatBundler;

#[async_trait]
impl Bundler for ConcatBundler {
    fn name(&self) -> &str {
        "concat"
    }

    async fn bundle(&self, entry: &Path, _options: &BundleOptions) -> CollaboratorResult<BundleOutput> {
        Ok(BundleOutput {
            code: tokio::fs::read_to_string(entry).await?,
            ..BundleOutput::default()
        })
    }
}

fn toolchain() -> Toolchain {
    Toolchain {
        style_compiler: Arc::new(EchoCompiler),
        bundler: Arc::new(ConcatBundler),
        image_optimizer: Arc::new(PassthroughImageOptimizer),
        sprite_generator: Arc::new(SymbolSpriteGenerator),
        reload: Arc::new(ConsoleReloadTransport::new()),
        notifier: Arc::new(ConsoleNotifier),
    }
}

fn orchestrator(root: &Path, mode: Mode, yaml: &str) -> Result<Orchestrator, SluiceError> {
    Orchestrator::with_toolchain(
        OrchestratorConfig::new(root).with_mode(mode),
        parse_project_config(yaml)?,
        toolchain(),
    )
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn project(root: &Path) {
    write(root, "src/css/main.scss", "body {\n  margin: 0;\n}\n");
    write(root, "src/js/main.js", "console.log('main');\n");
    write(root, "src/assets/fonts/a.woff", "font");
    write(root, "src/svg/close.svg", r#"<svg viewBox="0 0 8 8"><path d="M0 0"/></svg>"#);
}

#[tokio::test]
async fn test_production_default_cleans_then_builds() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    write(dir.path(), "build/stale.txt", "left over");

    let orchestrator = orchestrator(dir.path(), Mode::Production, "").unwrap();
    let outcome = orchestrator.run("default").await.unwrap();

    assert!(matches!(outcome, RunOutcome::Done));
    assert!(!dir.path().join("build/stale.txt").exists());
    let css = std::fs::read_to_string(dir.path().join("build/css/main.css")).unwrap();
    assert_eq!(css, "body{margin:0;}");
    assert!(!dir.path().join("build/css/main.css.map").exists());
    assert!(dir.path().join("build/js/main.js").exists());
    assert!(dir.path().join("build/assets/fonts/a.woff").exists());
    assert!(dir.path().join("build/img/svg/sprite.svg").exists());
}

#[tokio::test]
async fn test_development_build_keeps_source_maps() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    let orchestrator = orchestrator(dir.path(), Mode::Development, "").unwrap();
    orchestrator.run("build").await.unwrap();

    let css = std::fs::read_to_string(dir.path().join("build/css/main.css")).unwrap();
    assert!(css.ends_with("/*# sourceMappingURL=main.css.map */\n"));
    assert!(dir.path().join("build/css/main.css.map").exists());
}

#[test]
fn test_custom_task_cycle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = r#"
tasks:
  - name: docs
    command: echo docs
    dependencies: ["publish"]
  - name: publish
    command: echo publish
    dependencies: ["docs"]
"#;
    match orchestrator(dir.path(), Mode::Production, yaml) {
        Err(SluiceError::CyclicDependency { cycle }) => {
            assert_eq!(cycle.len(), 3);
            assert_eq!(cycle.first(), cycle.last());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("cycle accepted"),
    }
}

#[test]
fn test_unknown_custom_dependency_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = "tasks:\n  - name: docs\n    command: echo docs\n    dependencies: [\"lint\"]\n";
    let err = orchestrator(dir.path(), Mode::Production, yaml).err().unwrap();
    assert!(err.is_configuration_error());
}

#[cfg(unix)]
#[tokio::test]
async fn test_custom_task_runs_after_build() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let yaml = r#"
tasks:
  - name: verify
    command:
      - test -f build/css/main.css
      - echo "$SLUICE_ENV" > verified.txt
    dependencies: ["build"]
"#;
    let orchestrator = orchestrator(dir.path(), Mode::Production, yaml).unwrap();
    let plan = orchestrator.plan("verify").unwrap();
    assert_eq!(plan.plan.task_names().last(), Some(&"verify"));

    orchestrator.run("verify").await.unwrap();
    let verified = std::fs::read_to_string(dir.path().join("verified.txt")).unwrap();
    assert_eq!(verified.trim(), "production");
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_prerequisite_stops_dependents() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = r#"
tasks:
  - name: broken
    command: exit 3
  - name: after
    command: touch after.txt
    dependencies: ["broken"]
"#;
    let orchestrator = orchestrator(dir.path(), Mode::Production, yaml).unwrap();
    let err = orchestrator.run("after").await.unwrap_err();

    assert_eq!(err.failed_task(), Some("broken"));
    assert!(!dir.path().join("after.txt").exists());
}

#[tokio::test]
async fn test_watch_rebuilds_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let orchestrator = orchestrator(dir.path(), Mode::Development, "").unwrap();

    let live = match orchestrator.run("default").await.unwrap() {
        RunOutcome::Live(live) => live,
        RunOutcome::Done => panic!("default should leave watch and webserver running"),
    };
    assert_eq!(live.names(), &["watch", "webserver"]);

    // let the watcher register before touching sources
    tokio::time::sleep(Duration::from_millis(300)).await;
    write(dir.path(), "src/css/main.scss", "main { color: blue }");

    let output = dir.path().join("build/css/main.css");
    let mut rebuilt = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if std::fs::read_to_string(&output)
            .map(|css| css.starts_with("main { color: blue }"))
            .unwrap_or(false)
        {
            rebuilt = true;
            break;
        }
    }
    assert!(rebuilt, "stylesheet was not rebuilt after a change");

    orchestrator.shutdown();
    tokio::time::timeout(Duration::from_secs(5), live.wait())
        .await
        .expect("live tasks did not stop")
        .unwrap();
}
