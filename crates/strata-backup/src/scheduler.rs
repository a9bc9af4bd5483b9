//! Background dispatch for retention pruning.
//!
//! A backup hands its prune pass to a [`PruneScheduler`] and returns
//! immediately. Schedulers make no promise about when, or whether, a job
//! runs; pruning is idempotent, so a skipped or late run only delays cleanup.

use tracing::warn;

/// A unit of background work.
pub type PruneJob = Box<dyn FnOnce() + Send + 'static>;

/// Fire-and-forget executor for prune jobs.
pub trait PruneScheduler: Send + Sync {
    /// Submit a job. Must not block on the job's completion.
    fn submit(&self, job: PruneJob);
}

/// Runs each job on a fresh, detached OS thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadScheduler;

impl PruneScheduler for ThreadScheduler {
    fn submit(&self, job: PruneJob) {
        let spawned = std::thread::Builder::new()
            .name("strata-prune".into())
            .spawn(job);
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn prune thread; skipping prune");
        }
    }
}

/// Runs each job on a Tokio runtime's blocking pool.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl PruneScheduler for TokioScheduler {
    fn submit(&self, job: PruneJob) {
        // The JoinHandle is dropped: the task detaches and runs to completion.
        drop(self.handle.spawn_blocking(job));
    }
}

/// Runs each job synchronously inside `submit`.
///
/// Useful where deterministic ordering matters more than latency, such as
/// one-shot command-line invocations and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineScheduler;

impl PruneScheduler for InlineScheduler {
    fn submit(&self, job: PruneJob) {
        job();
    }
}

/// Discards every job. Pruning then only happens when invoked explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScheduler;

impl PruneScheduler for NoopScheduler {
    fn submit(&self, _job: PruneJob) {}
}
