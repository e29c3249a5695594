use crate::error::RuntimeError;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tracing::{debug, trace};

/// A unit of work submitted to an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that accepts jobs and runs them asynchronously.
///
/// `execute` must not run the job inline: callers rely on it returning before
/// the job completes.
pub trait Executor: Send + Sync + Debug {
    /// Short name used in log records.
    fn label(&self) -> &str;

    /// Submits `job` for asynchronous execution.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Closed`] when the context no longer accepts work.
    fn execute(&self, job: Job) -> Result<(), RuntimeError>;
}

/// A Tokio runtime used as an execution context.
///
/// Jobs are synchronous callbacks, so they go to the blocking pool rather than
/// onto a worker thread of the async scheduler.
///
/// Tokio cancels work spawned on a runtime that has shut down without telling
/// the caller. Whoever owns the runtime calls [`RuntimeTarget::close`] before
/// shutting it down; every clone then refuses jobs with [`RuntimeError::Closed`].
#[derive(Debug, Clone)]
pub struct RuntimeTarget {
    handle: Handle,
    closed: Arc<AtomicBool>,
}

impl RuntimeTarget {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle, closed: Arc::new(AtomicBool::new(false)) }
    }

    /// Targets the runtime the caller is running on.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime, like [`Handle::current`].
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Refuses every later job, on this value and all its clones. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(executor = "tokio", "Runtime target closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl From<Handle> for RuntimeTarget {
    fn from(handle: Handle) -> Self {
        Self::new(handle)
    }
}

impl Executor for RuntimeTarget {
    fn label(&self) -> &str {
        "tokio"
    }

    fn execute(&self, job: Job) -> Result<(), RuntimeError> {
        if self.is_closed() {
            return Err(RuntimeError::Closed {
                message: "runtime target is closed".into(),
                context: None,
            });
        }
        trace!(executor = "tokio", "Submitting job to blocking pool");
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }
}
