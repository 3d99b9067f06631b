//! Collaborator traits.
//!
//! Each trait is one external tool the front-end build consumes. All of them
//! are object safe and `Send + Sync` so the orchestrator can hold them as
//! `Arc<dyn Trait>` and call them from any task.

use crate::types::{
    BundleOptions, BundleOutput, CollaboratorResult, CompiledStyle, SpriteAsset, SpriteOptions,
    StyleOptions, SvgSource,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Compiles a style-sheet language into CSS.
///
/// **Contract**: `compile` either returns CSS or a [`crate::CollaboratorError`].
/// Syntax errors in the source are [`crate::CollaboratorError::Rejected`]; a
/// missing compiler binary is [`crate::CollaboratorError::Unavailable`].
///
/// `path` is the absolute path of the entry file. Compilers that resolve
/// `@import` relative to the entry need it; others may ignore it.
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    /// Short tool name used in diagnostics (`sass`, `lessc`, ...).
    fn name(&self) -> &str;

    async fn compile(
        &self,
        path: &Path,
        source: &str,
        options: &StyleOptions,
    ) -> CollaboratorResult<CompiledStyle>;
}

/// Bundles a JavaScript entry file and everything it imports.
///
/// Warnings travel in [`BundleOutput::diagnostics`]. A bundler may also
/// report errors as diagnostics instead of failing outright; the caller treats
/// [`BundleOutput::has_errors`] as a failure.
#[async_trait]
pub trait Bundler: Send + Sync {
    fn name(&self) -> &str;

    async fn bundle(&self, entry: &Path, options: &BundleOptions)
        -> CollaboratorResult<BundleOutput>;
}

/// Recompresses a single image.
///
/// Implementations must return the input unchanged for formats they do not
/// understand rather than failing.
#[async_trait]
pub trait ImageOptimizer: Send + Sync {
    fn name(&self) -> &str;

    async fn optimize(&self, path: &Path, contents: Vec<u8>) -> CollaboratorResult<Vec<u8>>;
}

/// Packs SVG icons into a sprite.
pub trait SpriteGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn pack(&self, icons: &[SvgSource], options: &SpriteOptions) -> CollaboratorResult<SpriteAsset>;
}

/// Pushes change notifications to connected browsers.
#[async_trait]
pub trait ReloadTransport: Send + Sync {
    /// Announce that the server is up. Called once before the first `notify`.
    async fn start(&self, address: &str) -> CollaboratorResult<()>;

    async fn notify(&self, changed: &[PathBuf]) -> CollaboratorResult<()>;

    /// Release any sockets held by the transport.
    async fn stop(&self) -> CollaboratorResult<()> {
        Ok(())
    }
}

/// Surfaces a task failure to the developer.
///
/// Notifying must never fail the caller: a watch session keeps running after a
/// notification regardless of how it was delivered.
pub trait FailureNotifier: Send + Sync {
    fn notify_failure(&self, title: &str, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CollaboratorError;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl ReloadTransport for Recorder {
        async fn start(&self, _address: &str) -> CollaboratorResult<()> {
            Ok(())
        }

        async fn notify(&self, changed: &[PathBuf]) -> CollaboratorResult<()> {
            self.seen.lock().unwrap().extend_from_slice(changed);
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl ImageOptimizer for Refusing {
        fn name(&self) -> &str {
            "refusing"
        }

        async fn optimize(&self, path: &Path, _contents: Vec<u8>) -> CollaboratorResult<Vec<u8>> {
            Err(CollaboratorError::rejected(
                self.name(),
                format!("cannot read {}", path.display()),
            ))
        }
    }

    #[tokio::test]
    async fn test_reload_transport_default_stop() {
        let transport = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        transport
            .notify(&[PathBuf::from("build/css/main.css")])
            .await
            .unwrap();
        transport.stop().await.unwrap();
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_optimizer_through_trait_object() {
        let optimizer: Box<dyn ImageOptimizer> = Box::new(Refusing);
        let err = optimizer
            .optimize(Path::new("logo.png"), vec![0, 1, 2])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("logo.png"));
    }
}
