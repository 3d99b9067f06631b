//! `image:build` and `svg:build`

use std::sync::Arc;

use sluice_plugin_protocol::SvgSource;
use tracing::debug;

use crate::frontend::Frontend;
use crate::incremental::filter_newer_async;
use crate::pipeline::{Asset, Pipeline};
use crate::sources::collect_async;
use crate::task::{Signal, Task};

/// Optimize images that changed since the last build
pub fn optimize(frontend: Frontend) -> Task {
    Task::new("image:build", move |_| {
        let frontend = frontend.clone();
        async move {
            let paths = &frontend.config().paths;
            let dest = frontend.path(&paths.build.img);
            let sources = collect_async(frontend.root(), &paths.src.img).await?;
            let changed = filter_newer_async(sources, &dest).await?;
            let optimizer = Arc::clone(&frontend.tools().image_optimizer);
            debug!(count = changed.len(), optimizer = optimizer.name(), "optimizing images");

            Ok(Pipeline::from_sources(changed)
                .map(move |asset| {
                    let optimizer = Arc::clone(&optimizer);
                    async move {
                        let origin = asset.origin().to_path_buf();
                        let contents = optimizer.optimize(&origin, asset.contents).await?;
                        Ok(Asset { contents, ..asset })
                    }
                })
                .dest(dest)
                .into_signal())
        }
    })
    .with_description("Optimize images")
}

/// Pack SVG icons into a symbol sprite
pub fn sprite(frontend: Frontend) -> Task {
    Task::new("svg:build", move |_| {
        let frontend = frontend.clone();
        async move {
            let config = frontend.config();
            let sources = collect_async(frontend.root(), &config.paths.src.svg).await?;
            if sources.is_empty() {
                debug!("no icons to pack");
                return Ok(Signal::Done);
            }

            let mut icons = Vec::with_capacity(sources.len());
            for source in &sources {
                let contents = tokio::fs::read_to_string(&source.path).await?;
                let name = source
                    .path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                icons.push(SvgSource { name, contents });
            }

            let packed = frontend
                .tools()
                .sprite_generator
                .pack(&icons, &config.sprite)?;
            let mut assets = vec![Asset::new(packed.path, packed.contents)];
            if let Some((path, page)) = packed.example {
                assets.push(Asset::new(path, page));
            }
            Ok(Pipeline::from_assets(assets)
                .dest(frontend.path(&config.paths.build.img))
                .into_signal())
        }
    })
    .with_description("Pack SVG icons into a sprite")
}
