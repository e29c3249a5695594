use crate::event::Event;

/// Capability interface for direct delivery.
///
/// Types implementing it can be registered with
/// [`EventBus::register_receiver`](crate::EventBus::register_receiver); the bus
/// then calls [`Receiver::on_event`] for every matching event while the
/// receiver is alive.
///
/// ```rust
/// use herald_event_bus::{Event, EventBus, ReceiveRule, Receiver, RegisterOptions};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct LoginBadge {
///     unseen: AtomicUsize,
/// }
///
/// impl Receiver for LoginBadge {
///     fn on_event(&self, _event: &Event) {
///         self.unseen.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let bus = EventBus::new();
/// let badge = Arc::new(LoginBadge::default());
/// bus.register_receiver(&badge, ReceiveRule::category("login"), RegisterOptions::new());
///
/// bus.post(Event::new("login"));
/// assert_eq!(badge.unseen.load(Ordering::Relaxed), 1);
/// ```
pub trait Receiver: Send + Sync + 'static {
    /// Handles one delivered event.
    ///
    /// Runs on the posting thread, or on the registration's dispatch target when one was given.
    fn on_event(&self, event: &Event);
}
