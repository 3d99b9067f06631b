//! `css:build`: compile the stylesheet entry point

use std::sync::Arc;

use sluice_plugin_protocol::StyleOptions;

use crate::frontend::Frontend;
use crate::pipeline::{Asset, Pipeline, Rename};
use crate::sources::collect_async;
use crate::task::Task;
use crate::types::SluiceError;

pub const TASK: &str = "css:build";

/// Compile the stylesheet, with source maps in development and minified in
/// production. Compile errors go through the failure notifier before failing
/// the task.
pub fn compile(frontend: Frontend) -> Task {
    Task::new(TASK, move |_| {
        let frontend = frontend.clone();
        async move {
            let config = frontend.config();
            let sources = collect_async(frontend.root(), &config.paths.src.css).await?;
            let options = Arc::new(StyleOptions {
                source_maps: frontend.mode().source_maps(),
                minify: frontend.mode().minify(),
                browsers: config.tools.browsers.clone(),
            });
            let compiler = Arc::clone(&frontend.tools().style_compiler);
            let notifier = Arc::clone(&frontend.tools().notifier);

            let pipeline = Pipeline::from_sources(sources)
                .map(move |asset| {
                    let compiler = Arc::clone(&compiler);
                    let notifier = Arc::clone(&notifier);
                    let options = Arc::clone(&options);
                    async move {
                        let compiled = match compiler
                            .compile(asset.origin(), asset.text()?, &options)
                            .await
                        {
                            Ok(compiled) => compiled,
                            Err(e) => {
                                notifier.notify_failure(TASK, &e.to_string());
                                return Err(SluiceError::from(e).notified());
                            }
                        };
                        Ok(Asset {
                            contents: compiled.css.into_bytes(),
                            source_map: compiled.source_map,
                            ..asset
                        })
                    }
                })
                .pipe(Rename::extension("css"))
                .dest(frontend.path(&config.paths.build.css));
            Ok(pipeline.into_signal())
        }
    })
    .with_description("Compile stylesheets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::CompositionNode;
    use crate::execution::runner::Executor;
    use crate::frontend::testing::*;
    use crate::mode::Mode;
    use crate::registry::Registry;

    fn executor(frontend: &Frontend) -> Executor {
        let mut registry = Registry::new();
        frontend.register(&mut registry).unwrap();
        Executor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_development_build_writes_source_map() {
        let dir = tempfile::tempdir().unwrap();
        let (frontend, _) = frontend(dir.path(), Mode::Development);
        write(dir.path(), "src/css/main.scss", "body { color: red }");
        write(dir.path(), "src/css/_partial.scss", "ignored");

        executor(&frontend)
            .run_node(&CompositionNode::task(TASK))
            .await
            .unwrap();

        let css = std::fs::read_to_string(dir.path().join("build/css/main.css")).unwrap();
        assert!(css.starts_with("BODY { COLOR: RED }"));
        assert!(css.contains("sourceMappingURL=main.css.map"));
        assert!(dir.path().join("build/css/main.css.map").exists());
        assert!(!dir.path().join("build/css/_partial.css").exists());
    }

    #[tokio::test]
    async fn test_production_build_has_no_source_map() {
        let dir = tempfile::tempdir().unwrap();
        let (frontend, _) = frontend(dir.path(), Mode::Production);
        write(dir.path(), "src/css/main.scss", "a {}");

        executor(&frontend)
            .run_node(&CompositionNode::task(TASK))
            .await
            .unwrap();

        assert!(!dir.path().join("build/css/main.css.map").exists());
    }

    #[tokio::test]
    async fn test_compile_error_is_notified() {
        let dir = tempfile::tempdir().unwrap();
        let (frontend, notifier) = frontend(dir.path(), Mode::Development);
        write(dir.path(), "src/css/main.scss", "a { error }");

        let err = executor(&frontend)
            .run_node(&CompositionNode::task(TASK))
            .await
            .unwrap_err();

        assert_eq!(err.failed_task(), Some(TASK));
        let failures = notifier.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].1.contains("syntax error"));
    }
}
