//! Facade crate for herald.
//! Re-exports the event bus and composes it with logging, configuration and an
//! optional background dispatch runtime.
//! Keep this crate thin: it wires the infra crates together, it does not route events.
//!
//! ## Usage
//! - Read a [`config::HeraldConfig`] with [`config::load_config`] (or build one in code).
//! - Call [`init_logging`] once per process if nothing else installs a subscriber.
//! - Create a [`Herald`] and hand out [`Herald::bus`] to posters and receivers.
//!
//! ```rust
//! use herald::prelude::*;
//! use herald::{Herald, config::HeraldConfig};
//! use std::sync::Arc;
//! use std::sync::mpsc;
//! use std::time::Duration;
//!
//! let mut config = HeraldConfig::default();
//! config.dispatch.enabled = true;
//! config.dispatch.worker_threads = 1;
//!
//! let herald = Herald::new(&config).unwrap();
//! let (tx, rx) = mpsc::channel();
//! let tx = std::sync::Mutex::new(tx);
//! let receiver = Arc::new(());
//!
//! let target = herald.dispatch_target().unwrap();
//! herald.bus().register(&receiver, ReceiveRule::category("download"), RegisterOptions::new().target(target), move |event| {
//!     tx.lock().unwrap().send(event.category().to_owned()).unwrap();
//! });
//!
//! herald.bus().post(Event::new("download"));
//! assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "download");
//! herald.shutdown();
//! ```

pub mod config;
mod error;

pub use error::{HeraldError, HeraldErrorExt};
pub use herald_event_bus as events;
pub use herald_logger as logger;
pub use herald_runtime as runtime;

/// The types most callers need.
pub mod prelude {
    pub use herald_event_bus::{
        BusConfig, Event, EventBus, Executor, Payload, ReceiveRule, Receiver, RegisterOptions,
        RegistrationHandle, RuntimeTarget, SerialQueue,
    };
}

use crate::config::{HeraldConfig, LoggingConfig};
use herald_event_bus::{EventBus, Executor, RuntimeTarget, SerialQueue};
use herald_logger::{Logger, parse_level};
use herald_runtime::build_runtime_with_config;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Installs the global subscriber described by `config`.
///
/// # Errors
/// Returns [`HeraldError::Logger`] for an unknown level, an invalid filter, an
/// unusable log directory or when a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Logger, HeraldError> {
    let level = parse_level(&config.level).context("logging.level")?;

    let builder = Logger::builder().name(config.name.clone()).level(level).console(config.console);
    let builder = match &config.filter {
        Some(filter) => builder.filter(filter.clone()),
        None => builder,
    };

    let logger = match &config.directory {
        Some(directory) => builder.directory(directory).json(config.json).init(),
        None => builder.init(),
    };
    logger.map_err(HeraldError::from)
}

/// A running herald: the bus plus the dispatch runtime its targets run on.
///
/// Dropping it without [`Herald::shutdown`] closes the dispatch target and
/// drops the runtime without a grace period.
#[derive(Debug)]
pub struct Herald {
    bus: EventBus,
    dispatch: Option<Dispatch>,
}

#[derive(Debug)]
struct Dispatch {
    runtime: Runtime,
    target: RuntimeTarget,
}

impl Herald {
    /// Creates the bus and, when `config.dispatch.enabled`, the dispatch runtime.
    ///
    /// Must not be called from inside an async context if dispatch is enabled:
    /// the runtime cannot be dropped there.
    ///
    /// # Errors
    /// Returns [`HeraldError::Runtime`] if the dispatch runtime cannot start.
    pub fn new(config: &HeraldConfig) -> Result<Self, HeraldError> {
        let dispatch = if config.dispatch.enabled {
            let runtime = build_runtime_with_config(&config.dispatch.runtime_config())
                .context("dispatch")?;
            let target = RuntimeTarget::new(runtime.handle().clone());
            Some(Dispatch { runtime, target })
        } else {
            None
        };

        info!(
            compaction_interval = config.bus.compaction_interval,
            dispatch = dispatch.is_some(),
            "Herald started"
        );
        Ok(Self { bus: EventBus::with_config(config.bus.clone()), dispatch })
    }

    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The dispatch runtime as a registration target, if enabled.
    ///
    /// The target refuses deliveries once this herald shuts down.
    #[must_use]
    pub fn dispatch_target(&self) -> Option<Arc<dyn Executor>> {
        self.dispatch.as_ref().map(|dispatch| Arc::new(dispatch.target.clone()) as Arc<dyn Executor>)
    }

    /// Starts a serial queue for receivers that need ordered, single-threaded delivery.
    ///
    /// # Errors
    /// Returns [`HeraldError::Runtime`] if the queue thread cannot be spawned.
    pub fn serial_queue(&self, name: impl Into<String>) -> Result<Arc<SerialQueue>, HeraldError> {
        Ok(Arc::new(SerialQueue::new(name)?))
    }

    /// Purges dead registrations, closes the dispatch target and stops the runtime.
    ///
    /// Deliveries already handed to the runtime get a short grace period. Later
    /// posts drop deliveries bound for the dispatch target with a warning.
    pub fn shutdown(mut self) {
        let purged = self.bus.purge_dead();
        if let Some(Dispatch { runtime, target }) = self.dispatch.take() {
            target.close();
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
        }
        info!(purged, "Herald stopped");
    }
}

impl Drop for Herald {
    fn drop(&mut self) {
        if let Some(dispatch) = self.dispatch.take() {
            dispatch.target.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use crate::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispatch_is_off_by_default() {
        let herald = Herald::new(&HeraldConfig::default()).unwrap();
        assert!(herald.dispatch_target().is_none());
        assert!(herald.bus().is_empty());
        herald.shutdown();
    }

    #[test]
    fn bus_follows_config() {
        let config = HeraldConfig { bus: BusConfig { compaction_interval: 8 }, ..HeraldConfig::default() };
        let herald = Herald::new(&config).unwrap();
        assert_eq!(herald.bus().config().compaction_interval, 8);
    }

    #[test]
    fn serial_queue_target_runs_on_named_thread() {
        let herald = Herald::new(&HeraldConfig::default()).unwrap();
        let queue = herald.serial_queue("herald-facade-queue").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        herald.bus().register(
            &hits,
            ReceiveRule::all(),
            RegisterOptions::new().target(queue.clone()),
            move |_| {
                assert_eq!(std::thread::current().name(), Some("herald-facade-queue"));
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        herald.bus().post(Event::new("a"));
        herald.bus().post(Event::new("b"));
        queue.flush().unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        queue.shutdown();
    }

    #[test]
    fn dispatch_runtime_is_built_when_enabled() {
        let config = HeraldConfig {
            dispatch: DispatchConfig { enabled: true, worker_threads: 1, ..DispatchConfig::default() },
            ..HeraldConfig::default()
        };
        let herald = Herald::new(&config).unwrap();
        let target = herald.dispatch_target().unwrap();
        assert_eq!(target.label(), "tokio");
        herald.shutdown();
    }

    #[test]
    fn shutdown_closes_the_dispatch_target() {
        let config = HeraldConfig {
            dispatch: DispatchConfig { enabled: true, worker_threads: 1, ..DispatchConfig::default() },
            ..HeraldConfig::default()
        };
        let herald = Herald::new(&config).unwrap();
        let bus = herald.bus().clone();
        let target = herald.dispatch_target().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        bus.register(&hits, ReceiveRule::all(), RegisterOptions::new().target(target.clone()), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        herald.shutdown();

        assert!(target.execute(Box::new(|| {})).is_err());
        assert_eq!(bus.post(Event::new("late")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_level_fails_before_install() {
        let config = LoggingConfig { level: "chatty".to_owned(), ..LoggingConfig::default() };
        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, HeraldError::Logger { .. }));
    }
}
