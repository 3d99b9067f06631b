//! Watch engine
//!
//! Binds path globs to change handlers. Filesystem events arrive from a
//! `notify` watcher and are matched against every binding relative to the
//! project root. The first matching event opens a debounce window for that
//! binding; events landing inside the window are folded into the same trigger,
//! and the handler runs once when the window closes.
//!
//! Handlers run one at a time. Events that arrive while a handler is running
//! are queued and open a new window afterwards. The engine only returns when
//! its shutdown token is cancelled.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use globset::GlobMatcher;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::sources::compile_glob;
use crate::types::SluiceResult;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Called with the root-relative paths that changed during one window
pub type ChangeHandler = Arc<dyn Fn(Vec<PathBuf>) -> BoxFuture<'static, ()> + Send + Sync>;

struct Binding {
    label: String,
    matchers: Vec<GlobMatcher>,
    on_change: ChangeHandler,
}

impl Binding {
    fn matches(&self, path: &Path) -> bool {
        self.matchers.iter().any(|m| m.is_match(path))
    }
}

struct Window {
    deadline: Instant,
    paths: Vec<PathBuf>,
}

pub struct WatchEngine {
    bindings: Vec<Binding>,
    debounce: Duration,
}

impl Default for WatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchEngine {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Run `on_change` whenever a file matching `pattern` is created, modified or removed
    pub fn bind<F, Fut>(&mut self, pattern: &str, on_change: F) -> SluiceResult<()>
    where
        F: Fn(Vec<PathBuf>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.bind_all([pattern], on_change)
    }

    /// Like [`WatchEngine::bind`], with one debounce window shared by several patterns
    pub fn bind_all<I, S, F, Fut>(&mut self, patterns: I, on_change: F) -> SluiceResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(Vec<PathBuf>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut labels = Vec::new();
        let mut matchers = Vec::new();
        for pattern in patterns {
            matchers.push(compile_glob(pattern.as_ref())?);
            labels.push(pattern.as_ref().to_string());
        }
        self.bindings.push(Binding {
            label: labels.join(", "),
            matchers,
            on_change: Arc::new(move |paths| on_change(paths).boxed()),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Watch `root` recursively until `shutdown` is cancelled
    pub async fn run(self, root: &Path, shutdown: CancellationToken) -> SluiceResult<()> {
        let root = root.canonicalize()?;
        let (tx, rx) = unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "file watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), bindings = self.bindings.len(), "watching for changes");

        let result = self.run_with_events(&root, rx, shutdown).await;
        drop(watcher);
        result
    }

    /// Drive the bindings from a stream of changed paths.
    ///
    /// Absolute paths are matched relative to `root`.
    pub async fn run_with_events(
        self,
        root: &Path,
        mut events: UnboundedReceiver<PathBuf>,
        shutdown: CancellationToken,
    ) -> SluiceResult<()> {
        let mut windows: Vec<Option<Window>> = self.bindings.iter().map(|_| None).collect();
        let mut events_open = true;

        loop {
            let next_deadline = windows.iter().flatten().map(|w| w.deadline).min();

            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv(), if events_open => match event {
                    Some(path) => self.record(root, path, &mut windows),
                    None => {
                        debug!("change feed closed");
                        events_open = false;
                    }
                },
                _ = tokio::time::sleep_until(next_deadline.unwrap_or_else(Instant::now)),
                    if next_deadline.is_some() =>
                {
                    let now = Instant::now();
                    for (binding, window) in self.bindings.iter().zip(windows.iter_mut()) {
                        let due = window.as_ref().is_some_and(|w| w.deadline <= now);
                        if !due {
                            continue;
                        }
                        let Some(window) = window.take() else { continue };
                        debug!(pattern = %binding.label, changed = window.paths.len(), "change detected");
                        tokio::select! {
                            _ = shutdown.cancelled() => return Ok(()),
                            _ = (binding.on_change)(window.paths) => {}
                        }
                    }
                }
            }
        }

        debug!("watch engine stopped");
        Ok(())
    }

    fn record(&self, root: &Path, path: PathBuf, windows: &mut [Option<Window>]) {
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        for (binding, window) in self.bindings.iter().zip(windows.iter_mut()) {
            if !binding.matches(&relative) {
                continue;
            }
            let window = window.get_or_insert_with(|| Window {
                deadline: Instant::now() + self.debounce,
                paths: Vec::new(),
            });
            if !window.paths.contains(&relative) {
                window.paths.push(relative.clone());
            }
        }
    }
}
