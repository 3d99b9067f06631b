//! `js:build` and `js:bundle`

use colored::*;
use sluice_plugin_protocol::{BundleOptions, Severity};
use tracing::debug;

use crate::frontend::Frontend;
use crate::pipeline::{Asset, Pipeline};
use crate::sources::collect_async;
use crate::task::Task;
use crate::types::{SluiceError, SluiceResult};

pub const BUNDLE_TASK: &str = "js:bundle";

/// Copy vendor scripts as they are
pub fn vendor(frontend: Frontend) -> Task {
    Task::new("js:build", move |_| {
        let frontend = frontend.clone();
        async move {
            let paths = &frontend.config().paths;
            let sources = collect_async(frontend.root(), &paths.src.js_vendor).await?;
            Ok(Pipeline::from_sources(sources)
                .dest(frontend.path(&paths.build.js_vendor))
                .into_signal())
        }
    })
    .with_description("Copy vendor scripts")
}

/// Bundle the script entry point.
///
/// Runs the bundler in the background and signals completion once the bundle
/// is on disk. Warnings are printed; errors fail the task and are notified.
pub fn bundle(frontend: Frontend) -> Task {
    Task::from_callback(BUNDLE_TASK, move |_, done| {
        let frontend = frontend.clone();
        tokio::spawn(async move {
            match write_bundle(&frontend).await {
                Ok(()) => done.done(),
                Err(e) => {
                    frontend
                        .tools()
                        .notifier
                        .notify_failure(BUNDLE_TASK, &e.to_string());
                    done.fail(e.notified());
                }
            }
        });
        Ok(())
    })
    .with_description("Bundle the script entry point")
}

async fn write_bundle(frontend: &Frontend) -> SluiceResult<()> {
    let config = frontend.config();
    let entry = frontend.path(&config.paths.src.js);
    let options = BundleOptions {
        library: Some(config.bundle.library.clone()),
        public_path: Some(config.bundle.public_path.clone()),
        source_maps: frontend.mode().source_maps(),
        minify: frontend.mode().minify(),
    };
    debug!(entry = %entry.display(), bundler = frontend.tools().bundler.name(), "bundling");
    let output = frontend.tools().bundler.bundle(&entry, &options).await?;

    for diagnostic in &output.diagnostics {
        match diagnostic.severity {
            Severity::Warning => println!("{} {}", "warning:".yellow().bold(), diagnostic.message),
            Severity::Error => eprintln!("{} {}", "error:".red().bold(), diagnostic.message),
        }
    }
    if output.has_errors() {
        let count = output
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        return Err(SluiceError::Task(format!(
            "{} reported {} error(s)",
            frontend.tools().bundler.name(),
            count
        )));
    }

    let mut asset = Asset::new(&config.bundle.output, output.code);
    asset.source_map = output.source_map;
    Pipeline::from_assets(vec![asset])
        .dest(frontend.path(&config.paths.build.js))
        .collect()
        .await?;
    Ok(())
}
