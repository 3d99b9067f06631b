//! Task definitions
//!
//! A [`Task`] is a named unit of build work. Its body is either a work function
//! or a composite (a named [`CompositionNode`] such as `build = parallel(...)`).
//!
//! Work functions are invoked with a [`TaskContext`] and return a future that
//! resolves to a [`Signal`]. The executor treats the task as complete when that
//! future resolves to [`Signal::Done`], or when the asset stream carried by
//! [`Signal::Stream`] is fully drained.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::composition::CompositionNode;
use crate::execution::runner::Executor;
use crate::pipeline::AssetStream;
use crate::types::{SluiceError, SluiceResult};

pub type WorkFuture = BoxFuture<'static, SluiceResult<Signal>>;
pub type WorkFn = Arc<dyn Fn(TaskContext) -> WorkFuture + Send + Sync>;

/// What a work function hands back to the executor
pub enum Signal {
    /// The task finished its work.
    Done,
    /// The task produced a pipeline; it is complete once the stream is drained.
    Stream(AssetStream),
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Done => f.write_str("Done"),
            Signal::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Handle given to callback-style tasks.
///
/// The task is complete once [`Completion::done`] or [`Completion::fail`] is
/// called. Dropping the handle without calling either fails the task.
pub struct Completion {
    tx: oneshot::Sender<SluiceResult<()>>,
}

impl Completion {
    pub fn done(self) {
        let _ = self.tx.send(Ok(()));
    }

    pub fn fail(self, error: SluiceError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Per-invocation context passed to a work function
#[derive(Clone)]
pub struct TaskContext {
    task: String,
    executor: Executor,
    cancel: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(task: impl Into<String>, executor: Executor, cancel: CancellationToken) -> Self {
        Self {
            task: task.into(),
            executor,
            cancel,
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    /// Executor that started this task, for tasks that run other plans (watch).
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Cancelled when the invocation is shut down. Long-running tasks must
    /// return once this fires.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

pub enum TaskBody {
    Work(WorkFn),
    Composite(CompositionNode),
}

pub struct Task {
    name: String,
    description: Option<String>,
    dependencies: Vec<String>,
    long_running: bool,
    body: TaskBody,
}

impl Task {
    /// Create a task from an async work function
    pub fn new<F, Fut>(name: impl Into<String>, work: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SluiceResult<Signal>> + Send + 'static,
    {
        let work: WorkFn = Arc::new(move |ctx| work(ctx).boxed());
        Self::with_body(name, TaskBody::Work(work))
    }

    /// Create a task that reports completion through a [`Completion`] handle.
    ///
    /// An error returned directly from `work` fails the task without waiting
    /// for the handle.
    pub fn from_callback<F>(name: impl Into<String>, work: F) -> Self
    where
        F: Fn(TaskContext, Completion) -> SluiceResult<()> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        Self::new(name, move |ctx: TaskContext| {
            let work = Arc::clone(&work);
            async move {
                let (tx, rx) = oneshot::channel();
                work(ctx, Completion { tx })?;
                match rx.await {
                    Ok(result) => result.map(|_| Signal::Done),
                    Err(_) => Err(SluiceError::Task(
                        "completion handle dropped without signalling".to_string(),
                    )),
                }
            }
        })
    }

    /// Create a task that stands for a composition of other tasks
    pub fn composite(name: impl Into<String>, node: CompositionNode) -> Self {
        Self::with_body(name, TaskBody::Composite(node))
    }

    fn with_body(name: impl Into<String>, body: TaskBody) -> Self {
        Self {
            name: name.into(),
            description: None,
            dependencies: Vec::new(),
            long_running: false,
            body,
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the task as never completing on its own (watcher, dev server).
    pub fn long_running(mut self) -> Self {
        self.long_running = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_long_running(&self) -> bool {
        self.long_running
    }

    pub fn body(&self) -> &TaskBody {
        &self.body
    }

    pub fn composition(&self) -> Option<&CompositionNode> {
        match &self.body {
            TaskBody::Composite(node) => Some(node),
            TaskBody::Work(_) => None,
        }
    }

    pub fn work(&self) -> Option<&WorkFn> {
        match &self.body {
            TaskBody::Work(work) => Some(work),
            TaskBody::Composite(_) => None,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("long_running", &self.long_running)
            .field("composition", &self.composition())
            .finish()
    }
}
