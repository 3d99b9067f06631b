//! Plan executor
//!
//! Drives an [`ExecutionPlan`] from a single coordinating future. A step starts
//! once every step it waits for has completed; independent steps run
//! concurrently. When a step fails, every step waiting on it (directly or
//! through other steps) is skipped. Independent branches keep running to the
//! end, and the first failure is returned once everything else has settled.
//!
//! Long-running steps (watchers, dev servers) are spawned onto the runtime and
//! release their dependents as soon as they start. They are excluded from the
//! completion gate: a plan containing one resolves to [`RunOutcome::Live`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use colored::*;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::composition::CompositionNode;
use crate::execution::plan::{resolve, ExecutionPlan};
use crate::registry::Registry;
use crate::task::{Signal, TaskContext, WorkFn};
use crate::tasks::{format_elapsed, get_task_color};
use crate::types::{SluiceError, SluiceResult};

/// Result of a successful run
#[derive(Debug)]
pub enum RunOutcome {
    /// Every step completed.
    Done,
    /// Every regular step completed and long-running steps are still active.
    Live(LiveTasks),
}

/// Long-running tasks started by a run
#[derive(Debug)]
pub struct LiveTasks {
    tasks: JoinSet<(String, SluiceResult<()>)>,
    names: Vec<String>,
    cancel: CancellationToken,
}

impl LiveTasks {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Wait until every long-running task has returned.
    ///
    /// The first failure cancels the remaining tasks and is returned once
    /// they have all stopped.
    pub async fn wait(mut self) -> SluiceResult<()> {
        let mut failure = None;
        while let Some(joined) = self.tasks.join_next().await {
            let result = match joined {
                Ok((name, result)) => {
                    report_settled(&name, &result, None);
                    result.map_err(|e| SluiceError::task_failure(name, e))
                }
                Err(e) => Err(SluiceError::Task(format!("long-running task aborted: {}", e))),
            };
            if let Err(e) = result {
                if failure.is_none() {
                    self.cancel.cancel();
                    failure = Some(e);
                }
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Ask every long-running task to stop and wait for them.
    pub async fn shutdown(self) -> SluiceResult<()> {
        self.cancel.cancel();
        self.wait().await
    }
}

/// Runs plans against a registry
#[derive(Clone)]
pub struct Executor {
    registry: Arc<Registry>,
    shutdown: CancellationToken,
}

impl Executor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_shutdown(registry, CancellationToken::new())
    }

    /// Create an executor whose runs are interrupted when `shutdown` is cancelled
    pub fn with_shutdown(registry: Arc<Registry>, shutdown: CancellationToken) -> Self {
        Self { registry, shutdown }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn plan(&self, node: &CompositionNode) -> SluiceResult<ExecutionPlan> {
        resolve(self.registry.as_ref(), node)
    }

    /// Resolve and run a composition
    pub async fn run_node(&self, node: &CompositionNode) -> SluiceResult<RunOutcome> {
        let plan = self.plan(node)?;
        self.run(&plan).await
    }

    pub async fn run(&self, plan: &ExecutionPlan) -> SluiceResult<RunOutcome> {
        let steps = plan.steps();
        let invocation = self.shutdown.child_token();

        let mut waiting: Vec<usize> = steps.iter().map(|s| s.after.len()).collect();
        let mut dependents = vec![Vec::new(); steps.len()];
        for (i, step) in steps.iter().enumerate() {
            for &before in &step.after {
                dependents[before].push(i);
            }
        }
        let mut ready: VecDeque<usize> = (0..steps.len()).filter(|&i| waiting[i] == 0).collect();

        let mut in_flight = FuturesUnordered::new();
        let mut live = JoinSet::new();
        let mut live_names = Vec::new();
        let mut failure: Option<SluiceError> = None;
        let mut skipped = vec![false; steps.len()];
        let mut settled = 0;

        loop {
            while !invocation.is_cancelled() {
                let Some(i) = ready.pop_front() else { break };
                if skipped[i] {
                    continue;
                }
                let name = steps[i].task.clone();
                let (work, long_running) = match self.work_for(&name) {
                    Ok(found) => found,
                    Err(e) => {
                        settled += 1;
                        skip_dependents(i, &dependents, &mut skipped);
                        failure.get_or_insert(e);
                        continue;
                    }
                };
                // a failed run would only start a watcher to stop it again
                if long_running && failure.is_some() {
                    skipped[i] = true;
                    skip_dependents(i, &dependents, &mut skipped);
                    continue;
                }
                let ctx = TaskContext::new(name.clone(), self.clone(), invocation.clone());
                report_start(&name);

                if long_running {
                    debug!(task = %name, "spawning long-running task");
                    live_names.push(name.clone());
                    live.spawn(async move {
                        let result = drive(work, ctx).await;
                        (name, result)
                    });
                    settled += 1;
                    release(i, &dependents, &mut waiting, &mut ready);
                } else {
                    in_flight.push(
                        async move {
                            let started = Instant::now();
                            let result = drive(work, ctx).await;
                            (i, result, started)
                        }
                        .boxed(),
                    );
                }
            }

            let Some((i, result, started)) = in_flight.next().await else {
                break;
            };
            settled += 1;
            let name = &steps[i].task;
            report_settled(name, &result, Some(started));
            match result {
                Ok(()) => release(i, &dependents, &mut waiting, &mut ready),
                Err(e) => {
                    error!(task = %name, error = %e, "task failed");
                    skip_dependents(i, &dependents, &mut skipped);
                    if failure.is_none() {
                        failure = Some(SluiceError::task_failure(name.clone(), e));
                    }
                }
            }
        }

        let live = LiveTasks {
            tasks: live,
            names: live_names,
            cancel: invocation.clone(),
        };

        if let Some(failure) = failure {
            let _ = live.shutdown().await;
            return Err(failure);
        }
        let skipped = skipped.iter().filter(|&&s| s).count();
        if settled + skipped < steps.len() {
            let _ = live.shutdown().await;
            return Err(SluiceError::Interrupted);
        }
        if live.names.is_empty() {
            Ok(RunOutcome::Done)
        } else {
            Ok(RunOutcome::Live(live))
        }
    }

    fn work_for(&self, name: &str) -> SluiceResult<(WorkFn, bool)> {
        let task = self.registry.lookup(name)?;
        let work = task.work().ok_or_else(|| {
            SluiceError::Task(format!("composite task '{}' cannot be run directly", name))
        })?;
        Ok((Arc::clone(work), task.is_long_running()))
    }
}

fn release(
    step: usize,
    dependents: &[Vec<usize>],
    waiting: &mut [usize],
    ready: &mut VecDeque<usize>,
) {
    for &dependent in &dependents[step] {
        waiting[dependent] -= 1;
        if waiting[dependent] == 0 {
            ready.push_back(dependent);
        }
    }
}

/// Mark every step that transitively waits for `step` as never to be started
fn skip_dependents(step: usize, dependents: &[Vec<usize>], skipped: &mut [bool]) {
    let mut pending: Vec<usize> = dependents[step].clone();
    while let Some(next) = pending.pop() {
        if !skipped[next] {
            skipped[next] = true;
            pending.extend_from_slice(&dependents[next]);
        }
    }
}

/// Invoke a work function and wait for its completion signal
async fn drive(work: WorkFn, ctx: TaskContext) -> SluiceResult<()> {
    match work(ctx).await? {
        Signal::Done => Ok(()),
        Signal::Stream(mut stream) => {
            while let Some(asset) = stream.next().await {
                asset?;
            }
            Ok(())
        }
    }
}

fn report_start(name: &str) {
    println!(
        "{} '{}'...",
        "Starting".bright_black(),
        name.color(get_task_color(name))
    );
}

fn report_settled(name: &str, result: &SluiceResult<()>, started: Option<Instant>) {
    let elapsed = started
        .map(|s| format!(" after {}", format_elapsed(s.elapsed())))
        .unwrap_or_default();
    match result {
        Ok(()) => println!(
            "{} '{}'{}",
            "Finished".green(),
            name.color(get_task_color(name)),
            elapsed.bright_black()
        ),
        Err(e) => eprintln!(
            "{} '{}'{}: {}",
            "Errored".red().bold(),
            name.color(get_task_color(name)),
            elapsed.bright_black(),
            e
        ),
    }
}
