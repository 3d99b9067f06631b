//! `watch` and `webserver`, the two long-running tasks

use std::sync::Arc;
use std::time::Duration;

use colored::*;
use tracing::{debug, info};

use crate::composition::CompositionNode;
use crate::configs::frontend::WatchPaths;
use crate::execution::runner::{Executor, RunOutcome};
use crate::frontend::Frontend;
use crate::task::{Signal, Task, TaskContext};
use crate::types::{SluiceError, SluiceResult};
use crate::watch::WatchEngine;

/// Watch globs and the composition each one re-runs
pub fn watch_bindings(paths: &WatchPaths) -> Vec<(String, CompositionNode)> {
    vec![
        (paths.css.clone(), CompositionNode::task("css:build")),
        (paths.assets.clone(), CompositionNode::task("assets:build")),
        (paths.svg.clone(), CompositionNode::task("svg:build")),
        (
            paths.js.clone(),
            CompositionNode::parallel(["js:build", "js:bundle"]),
        ),
        (paths.img.clone(), CompositionNode::task("image:build")),
    ]
}

/// Re-run build tasks when their sources change.
///
/// A failing re-run is reported through the failure notifier once (tasks that
/// report their own errors are not reported again) and watching carries on.
pub fn watch(frontend: Frontend) -> Task {
    Task::new("watch", move |ctx: TaskContext| {
        let frontend = frontend.clone();
        async move {
            let debounce = Duration::from_millis(frontend.config().watch.debounce_ms);
            let mut engine = WatchEngine::new().with_debounce(debounce);

            for (pattern, node) in watch_bindings(&frontend.config().paths.watch) {
                let executor = ctx.executor().clone();
                let notifier = Arc::clone(&frontend.tools().notifier);
                let node = Arc::new(node);
                engine.bind(&pattern, move |changed| {
                    let executor = executor.clone();
                    let notifier = Arc::clone(&notifier);
                    let node = Arc::clone(&node);
                    async move {
                        debug!(%node, changed = changed.len(), "re-running after change");
                        match rerun(&executor, &node).await {
                            Err(e) if !e.is_notified() => {
                                notifier.notify_failure(&format!("'{}' failed", node), &e.to_string());
                            }
                            Err(e) => debug!(%node, error = %e, "re-run failed"),
                            Ok(()) => {}
                        }
                    }
                })?;
            }

            engine.run(frontend.root(), ctx.cancellation().clone()).await?;
            Ok(Signal::Done)
        }
    })
    .long_running()
    .with_description("Rebuild on source changes")
}

async fn rerun(executor: &Executor, node: &CompositionNode) -> SluiceResult<()> {
    match executor.run_node(node).await {
        Ok(RunOutcome::Done) | Err(SluiceError::Interrupted) => Ok(()),
        Ok(RunOutcome::Live(live)) => live.shutdown().await,
        Err(e) => Err(e),
    }
}

/// Serve the project and reload browsers when served files change
pub fn webserver(frontend: Frontend) -> Task {
    Task::new("webserver", move |ctx: TaskContext| {
        let frontend = frontend.clone();
        async move {
            let server = &frontend.config().server;
            let reload = Arc::clone(&frontend.tools().reload);
            reload.start(&server.address()).await?;
            info!(proxy = %server.proxy, address = %server.address(), "dev server started");
            println!("{} {}", "Proxying".cyan(), server.proxy);

            let debounce = Duration::from_millis(frontend.config().watch.debounce_ms);
            let mut engine = WatchEngine::new().with_debounce(debounce);
            let notifier = Arc::clone(&frontend.tools().notifier);
            let transport = Arc::clone(&reload);
            engine.bind_all(&server.watch, move |changed| {
                let transport = Arc::clone(&transport);
                let notifier = Arc::clone(&notifier);
                async move {
                    if let Err(e) = transport.notify(&changed).await {
                        notifier.notify_failure("webserver", &e.to_string());
                    }
                }
            })?;

            engine.run(frontend.root(), ctx.cancellation().clone()).await?;
            reload.stop().await?;
            Ok(Signal::Done)
        }
    })
    .long_running()
    .with_description("Serve the project with live reload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::testing::*;
    use crate::mode::Mode;
    use crate::registry::Registry;

    async fn poll(mut ready: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if ready() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[test]
    fn test_watch_bindings_cover_build_tasks() {
        let bindings = watch_bindings(&WatchPaths::default());
        let tasks: Vec<&str> = bindings.iter().flat_map(|(_, node)| node.task_names()).collect();
        for task in crate::frontend::BUILD_TASKS {
            assert!(tasks.contains(&task), "{} is not watched", task);
        }
        assert_eq!(bindings[0].0, "src/css/**/*.scss");
    }

    #[tokio::test]
    async fn test_failed_rerun_is_reported_once_and_watching_continues() {
        let dir = tempfile::tempdir().unwrap();
        let (frontend, notifier) = frontend(dir.path(), Mode::Development);
        write(dir.path(), "src/css/main.scss", "a {}");
        let mut registry = Registry::new();
        frontend.register(&mut registry).unwrap();
        let executor = Executor::new(Arc::new(registry));

        let live = match executor.run_node(&CompositionNode::task("watch")).await.unwrap() {
            RunOutcome::Live(live) => live,
            RunOutcome::Done => panic!("watch should keep running"),
        };

        // let the watcher register before touching sources
        tokio::time::sleep(Duration::from_millis(300)).await;
        write(dir.path(), "src/css/main.scss", "a { error }");
        assert!(poll(|| !notifier.failures.lock().unwrap().is_empty()).await);
        tokio::time::sleep(Duration::from_millis(300)).await;
        {
            let failures = notifier.failures.lock().unwrap();
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "css:build");
            assert!(failures[0].1.contains("syntax error"));
        }

        write(dir.path(), "src/css/main.scss", "b { color: red }");
        let output = dir.path().join("build/css/main.css");
        let rebuilt = poll(|| {
            std::fs::read_to_string(&output)
                .map(|css| css.starts_with("B { COLOR: RED }"))
                .unwrap_or(false)
        })
        .await;
        assert!(rebuilt, "stylesheet was not rebuilt after the fix");
        assert_eq!(notifier.failures.lock().unwrap().len(), 1);

        tokio::time::timeout(Duration::from_secs(5), live.shutdown())
            .await
            .unwrap()
            .unwrap();
    }
}
