//! `clean` and `assets:build`

use std::io::ErrorKind;

use tracing::debug;

use crate::frontend::Frontend;
use crate::incremental::filter_newer_async;
use crate::pipeline::Pipeline;
use crate::sources::collect_async;
use crate::task::{Signal, Task};

/// Remove the build directory
pub fn clean(frontend: Frontend) -> Task {
    Task::new("clean", move |_| {
        let dir = frontend.path(&frontend.config().paths.clean);
        async move {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => debug!(dir = %dir.display(), "removed build directory"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            Ok(Signal::Done)
        }
    })
    .with_description("Remove the build directory")
}

/// Copy static assets that changed since the last copy
pub fn assets(frontend: Frontend) -> Task {
    Task::new("assets:build", move |_| {
        let frontend = frontend.clone();
        async move {
            let paths = &frontend.config().paths;
            let dest = frontend.path(&paths.build.assets);
            let sources = collect_async(frontend.root(), &paths.src.assets).await?;
            let changed = filter_newer_async(sources, &dest).await?;
            debug!(count = changed.len(), "copying assets");
            Ok(Pipeline::from_sources(changed).dest(dest).into_signal())
        }
    })
    .with_description("Copy static assets into the build directory")
}
