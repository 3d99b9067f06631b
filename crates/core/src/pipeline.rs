//! Asset pipelines
//!
//! A pipeline is a stream of in-memory [`Asset`]s pushed through a chain of
//! [`Transform`]s, usually ending in [`Dest`] which writes them to disk. Work
//! functions hand the finished stream back as [`Signal::Stream`]; the executor
//! drains it and the task completes once the last asset has been written.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use futures::FutureExt;
use tracing::trace;

use crate::sources::SourceFile;
use crate::task::Signal;
use crate::types::{SluiceError, SluiceResult};

pub type AssetStream = BoxStream<'static, SluiceResult<Asset>>;

/// A file moving through a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output path, relative to wherever the asset is finally written.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
    /// Source map written next to the output as `<file>.map`.
    pub source_map: Option<String>,
    /// File the asset was read from, if any.
    pub source: Option<PathBuf>,
}

impl Asset {
    pub fn new(relative: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            relative: relative.into(),
            contents: contents.into(),
            source_map: None,
            source: None,
        }
    }

    /// Read a collected source file
    pub async fn read(file: &SourceFile) -> SluiceResult<Self> {
        let contents = tokio::fs::read(&file.path).await?;
        Ok(Self {
            relative: file.relative.clone(),
            contents,
            source_map: None,
            source: Some(file.path.clone()),
        })
    }

    pub fn with_source_map(mut self, map: impl Into<String>) -> Self {
        self.source_map = Some(map.into());
        self
    }

    pub fn text(&self) -> SluiceResult<&str> {
        std::str::from_utf8(&self.contents).map_err(|e| {
            SluiceError::Task(format!("{} is not UTF-8: {}", self.relative.display(), e))
        })
    }

    /// Path used in diagnostics: the source file when known
    pub fn origin(&self) -> &Path {
        self.source.as_deref().unwrap_or(&self.relative)
    }
}

/// A stage of a pipeline
pub trait Transform: Send + Sync {
    fn process(&self, input: AssetStream) -> AssetStream;
}

type MapFn = Arc<dyn Fn(Asset) -> BoxFuture<'static, SluiceResult<Asset>> + Send + Sync>;

/// Apply an async function to every asset, one at a time
#[derive(Clone)]
pub struct MapAssets {
    f: MapFn,
}

impl MapAssets {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Asset) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SluiceResult<Asset>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |asset| f(asset).boxed()),
        }
    }
}

impl Transform for MapAssets {
    fn process(&self, input: AssetStream) -> AssetStream {
        let f = Arc::clone(&self.f);
        input.and_then(move |asset| f(asset)).boxed()
    }
}

/// Change the output path of every asset
#[derive(Clone)]
pub struct Rename {
    f: Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>,
}

impl Rename {
    pub fn new(f: impl Fn(&Path) -> PathBuf + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Replace the extension, e.g. `main.scss` -> `main.css`
    pub fn extension(extension: &'static str) -> Self {
        Self::new(move |path| path.with_extension(extension))
    }
}

impl Transform for Rename {
    fn process(&self, input: AssetStream) -> AssetStream {
        let f = Arc::clone(&self.f);
        input
            .map_ok(move |mut asset| {
                asset.relative = f(&asset.relative);
                asset
            })
            .boxed()
    }
}

/// Write every asset below a directory and pass it on.
///
/// An attached source map is written as `<file>.map` and referenced from the
/// output with a `sourceMappingURL` comment.
#[derive(Debug, Clone)]
pub struct Dest {
    dir: PathBuf,
}

impl Dest {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Transform for Dest {
    fn process(&self, input: AssetStream) -> AssetStream {
        let dir = self.dir.clone();
        input
            .and_then(move |asset| write_asset(dir.clone(), asset))
            .boxed()
    }
}

async fn write_asset(dir: PathBuf, mut asset: Asset) -> SluiceResult<Asset> {
    let target = dir.join(&asset.relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if let Some(map) = &asset.source_map {
        let mut map_path = target.clone().into_os_string();
        map_path.push(".map");
        let map_path = PathBuf::from(map_path);
        tokio::fs::write(&map_path, map).await?;

        let map_name = map_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let comment = match target.extension().and_then(|e| e.to_str()) {
            Some("css") => format!("\n/*# sourceMappingURL={} */\n", map_name),
            _ => format!("\n//# sourceMappingURL={}\n", map_name),
        };
        asset.contents.extend_from_slice(comment.as_bytes());
    }

    tokio::fs::write(&target, &asset.contents).await?;
    trace!(path = %target.display(), "wrote asset");
    Ok(asset)
}

/// Builder over an [`AssetStream`]
pub struct Pipeline {
    stream: AssetStream,
}

impl Pipeline {
    /// Stream the contents of collected source files, in order
    pub fn from_sources(sources: Vec<SourceFile>) -> Self {
        let stream = stream::iter(sources)
            .then(|file| async move { Asset::read(&file).await })
            .boxed();
        Self { stream }
    }

    pub fn from_assets(assets: Vec<Asset>) -> Self {
        Self {
            stream: stream::iter(assets.into_iter().map(Ok)).boxed(),
        }
    }

    pub fn pipe(self, transform: impl Transform) -> Self {
        Self {
            stream: transform.process(self.stream),
        }
    }

    pub fn map<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Asset) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SluiceResult<Asset>> + Send + 'static,
    {
        self.pipe(MapAssets::new(f))
    }

    pub fn dest(self, dir: impl Into<PathBuf>) -> Self {
        self.pipe(Dest::new(dir))
    }

    pub fn into_signal(self) -> Signal {
        Signal::Stream(self.stream)
    }

    /// Drain the pipeline, returning every asset that came out of it
    pub async fn collect(self) -> SluiceResult<Vec<Asset>> {
        self.stream.try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::collect;
    use std::fs;

    #[tokio::test]
    async fn test_sources_to_dest() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/js/vendor/lib")).unwrap();
        fs::write(dir.path().join("src/js/vendor/jquery.js"), "jq").unwrap();
        fs::write(dir.path().join("src/js/vendor/lib/x.js"), "x").unwrap();

        let sources = collect(dir.path(), "src/js/vendor/**/*.*").unwrap();
        let written = Pipeline::from_sources(sources)
            .dest(dir.path().join("build/js/vendor"))
            .collect()
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("build/js/vendor/lib/x.js")).unwrap(),
            "x"
        );
        assert_eq!(
            written[0].source,
            Some(dir.path().join("src/js/vendor/jquery.js"))
        );
    }

    #[tokio::test]
    async fn test_map_rename_and_source_map() {
        let dir = tempfile::tempdir().unwrap();
        let assets = vec![Asset::new("main.scss", "a { b: c }")];

        Pipeline::from_assets(assets)
            .map(|asset| async move {
                let css = asset.text()?.replace(' ', "");
                Ok::<_, SluiceError>(Asset::new(asset.relative, css).with_source_map("{\"version\":3}"))
            })
            .pipe(Rename::extension("css"))
            .dest(dir.path())
            .collect()
            .await
            .unwrap();

        let css = fs::read_to_string(dir.path().join("main.css")).unwrap();
        assert!(css.starts_with("a{b:c}"));
        assert!(css.contains("/*# sourceMappingURL=main.css.map */"));
        assert_eq!(
            fs::read_to_string(dir.path().join("main.css.map")).unwrap(),
            "{\"version\":3}"
        );
    }

    #[tokio::test]
    async fn test_failing_stage_stops_stream() {
        let result = Pipeline::from_assets(vec![Asset::new("a", "1"), Asset::new("b", "2")])
            .map(|asset| async move {
                if asset.relative == Path::new("a") {
                    Err(SluiceError::Task("bad input".into()))
                } else {
                    Ok(asset)
                }
            })
            .collect()
            .await;
        assert!(result.is_err());
    }
}
