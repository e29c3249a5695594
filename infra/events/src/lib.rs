//! # Event Bus
//!
//! An in-process publish/subscribe hub that routes [`Event`]s to registered
//! receivers by category, by category and subcategory, or by a custom predicate.
//!
//! ## Overview
//!
//! Posters and receivers never reference each other. A receiver registers with
//! a [`ReceiveRule`] and a delivery action; [`EventBus::post`] runs the action of
//! every live matching registration exactly once, either inline on the posting
//! thread or on a dispatch target such as a [`SerialQueue`] or a Tokio runtime.
//!
//! ## Features
//!
//! * **Weak receivers**: the bus never keeps a receiver alive.
//! * **Partitioned registry**: one `parking_lot::RwLock` per rule kind, `FxHashMap` lookups.
//! * **Re-entrant**: delivery runs outside every lock, so handlers may post or
//!   register.
//! * **Three delivery forms**: closures, methods (`fn(&R, &Event)`) and the
//!   [`Receiver`] trait.
//!
//! # Example
//!
//! ```rust
//! use herald_event_bus::{Event, EventBus, Payload, ReceiveRule, RegisterOptions};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeted: Mutex<Vec<String>>,
//! }
//!
//! impl Greeter {
//!     fn on_login(&self, event: &Event) {
//!         if let Some(user) = event.get::<String>("user") {
//!             self.greeted.lock().unwrap().push(user.clone());
//!         }
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let greeter = Arc::new(Greeter::default());
//! bus.register_method(
//!     &greeter,
//!     ReceiveRule::subcategory("login", "success"),
//!     RegisterOptions::new(),
//!     Greeter::on_login,
//! );
//!
//! bus.post_parts("login", Some("success"), Some(Payload::new().with("user", "Alice".to_owned())));
//!
//! assert_eq!(*greeter.greeted.lock().unwrap(), ["Alice"]);
//! ```

mod bus;
mod error;
mod event;
mod receiver;
mod registration;
mod registry;
mod rule;

pub use bus::{BusConfig, EventBus, RegisterOptions};
pub use error::{EventBusError, EventBusErrorExt};
pub use event::{Event, Payload, Value};
pub use herald_runtime::{Executor, Job, RuntimeTarget, SerialQueue};
pub use receiver::Receiver;
pub use registration::{Handler, ReceiverId, Registration, RegistrationHandle, RegistrationId};
pub use registry::Registry;
pub use rule::{Partition, Predicate, ReceiveRule};
