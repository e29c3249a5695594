//! # Runtime
//!
//! Execution contexts that event deliveries can hop onto.
//!
//! A registration on the event bus may name a dispatch target; the bus then hands
//! the delivery to that target as a [`Job`] instead of running it on the posting
//! thread. Anything implementing [`Executor`] can serve as a target:
//!
//! * [`SerialQueue`]: one named OS thread draining a FIFO queue. Use it for
//!   components that must observe events on a single, well-known thread.
//! * [`RuntimeTarget`]: deliveries run on a Tokio runtime's blocking pool until
//!   the target is closed. [`build_runtime_with_config`] builds such a runtime
//!   from a [`RuntimeConfig`].
//!
//! ## Example
//!
//! ```rust
//! use herald_runtime::{Executor, SerialQueue};
//!
//! # fn main() -> Result<(), herald_runtime::RuntimeError> {
//! let queue = SerialQueue::new("ui")?;
//! queue.execute(Box::new(|| println!("runs on the `ui` thread")))?;
//! queue.flush()?;
//! queue.shutdown();
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod executor;
mod queue;

pub use config::{RuntimeConfig, build_runtime_with_config};
pub use error::{RuntimeError, RuntimeErrorExt};
pub use executor::{Executor, Job, RuntimeTarget};
pub use queue::SerialQueue;
