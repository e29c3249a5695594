use crate::error::{RuntimeError, RuntimeErrorExt};
use crate::executor::{Executor, Job};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// A named worker thread that runs submitted jobs one at a time, in submission order.
///
/// Cloning is cheap and every clone feeds the same thread. The worker exits once
/// [`SerialQueue::shutdown`] is called or the last clone is dropped.
///
/// A panicking job is logged and discarded; the worker keeps draining the queue.
#[derive(Debug, Clone)]
pub struct SerialQueue {
    inner: Arc<QueueInner>,
}

#[derive(Debug)]
struct QueueInner {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl SerialQueue {
    /// Spawns the worker thread. The thread carries `name`, which also labels log records.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Spawn`] if the OS refuses to create the thread.
    pub fn new(name: impl Into<String>) -> Result<Self, RuntimeError> {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel::<Job>();

        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn({
                let name = name.clone();
                move || drain(&name, rx)
            })
            .context(format!("Spawning serial queue `{name}`"))?;

        debug!(queue = %name, "Serial queue started");

        Ok(Self {
            inner: Arc::new(QueueInner {
                name,
                sender: Mutex::new(Some(tx)),
                worker_id: worker.thread().id(),
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` when called from this queue's worker thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.inner.worker_id
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.sender.lock().as_ref().is_none_or(mpsc::UnboundedSender::is_closed)
    }

    /// Blocks until every job submitted before this call has run.
    ///
    /// Returns immediately when called from the worker thread itself.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Closed`] if the queue was shut down.
    pub fn flush(&self) -> Result<(), RuntimeError> {
        if self.is_current() {
            return Ok(());
        }
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.execute(Box::new(move || {
            let _ = tx.send(());
        }))?;
        rx.recv().map_err(|_| RuntimeError::Closed {
            message: format!("queue `{}` stopped before flushing", self.inner.name).into(),
            context: None,
        })
    }

    /// Stops accepting jobs and waits for the worker to drain what is already queued.
    ///
    /// Idempotent. When called from the worker thread the join is skipped.
    pub fn shutdown(&self) {
        drop(self.inner.sender.lock().take());

        let Some(worker) = self.inner.worker.lock().take() else {
            return;
        };
        if self.is_current() {
            return;
        }
        if worker.join().is_err() {
            warn!(queue = %self.inner.name, "Serial queue worker terminated abnormally");
        }
    }
}

impl Executor for SerialQueue {
    fn label(&self) -> &str {
        &self.inner.name
    }

    fn execute(&self, job: Job) -> Result<(), RuntimeError> {
        let guard = self.inner.sender.lock();
        let Some(sender) = guard.as_ref() else {
            return Err(RuntimeError::Closed {
                message: format!("queue `{}` is shut down", self.inner.name).into(),
                context: None,
            });
        };
        sender.send(job).map_err(|_| RuntimeError::Closed {
            message: format!("queue `{}` worker is gone", self.inner.name).into(),
            context: None,
        })
    }
}

fn drain(name: &str, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.blocking_recv() {
        trace!(queue = %name, "Running queued job");
        if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
            error!(queue = %name, panic = %panic_message(panic.as_ref()), "Queued job panicked");
        }
    }
    debug!(queue = %name, "Serial queue stopped");
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
