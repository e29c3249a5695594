use crate::error::{EventBusError, EventBusErrorExt};
use crate::event::Event;
use crate::receiver::Receiver;
use crate::rule::ReceiveRule;
use herald_runtime::Executor;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// The delivery action of a registration.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Process-unique id of a stored registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    fn next() -> Self {
        Self(NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identity of a receiver: the address of its shared allocation.
///
/// A registration keeps a weak pointer to that allocation, so the address cannot be
/// handed to another object while the registration exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(usize);

impl ReceiverId {
    #[must_use]
    pub fn of<R: ?Sized>(receiver: &Arc<R>) -> Self {
        Self(Arc::as_ptr(receiver).cast::<()>().addr())
    }
}

trait Liveness: Send + Sync {
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized + Send + Sync> Liveness for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Non-owning reference to a receiver.
struct ReceiverRef {
    id: ReceiverId,
    weak: Box<dyn Liveness>,
}

impl ReceiverRef {
    fn new<R: ?Sized + Send + Sync + 'static>(receiver: &Arc<R>) -> Self {
        Self { id: ReceiverId::of(receiver), weak: Box::new(Arc::downgrade(receiver)) }
    }
}

/// Opaque handle returned by registration, usable with [`crate::EventBus::cancel`].
#[derive(Debug, Clone)]
pub struct RegistrationHandle {
    id: RegistrationId,
    rule: ReceiveRule,
}

impl RegistrationHandle {
    #[must_use]
    pub const fn id(&self) -> RegistrationId {
        self.id
    }

    #[must_use]
    pub const fn rule(&self) -> &ReceiveRule {
        &self.rule
    }
}

impl PartialEq for RegistrationHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RegistrationHandle {}

/// A receiver's interest in a class of events, plus how to deliver them.
///
/// The receiver is held weakly. Once it is dropped the registration stays in the
/// registry but never matches again; it is physically removed by the next
/// unregister scan of its partition or by compaction.
pub struct Registration {
    id: RegistrationId,
    receiver: ReceiverRef,
    rule: ReceiveRule,
    target: Option<Arc<dyn Executor>>,
    handler: Handler,
}

impl Registration {
    /// Delivers through `handler`.
    ///
    /// The handler should not capture `receiver` strongly, or the receiver will
    /// never be released.
    pub fn with_handler<R, F>(receiver: &Arc<R>, rule: ReceiveRule, handler: F) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self::build(receiver, rule, Arc::new(handler))
    }

    /// Delivers by calling `method` on the receiver, as long as it is alive.
    pub fn with_method<R>(receiver: &Arc<R>, rule: ReceiveRule, method: fn(&R, &Event)) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(receiver);
        Self::build(
            receiver,
            rule,
            Arc::new(move |event: &Event| {
                if let Some(receiver) = weak.upgrade() {
                    method(&receiver, event);
                }
            }),
        )
    }

    /// Delivers through [`Receiver::on_event`], as long as the receiver is alive.
    pub fn with_receiver<R>(receiver: &Arc<R>, rule: ReceiveRule) -> Self
    where
        R: Receiver + ?Sized,
    {
        let weak = Arc::downgrade(receiver);
        Self::build(
            receiver,
            rule,
            Arc::new(move |event: &Event| {
                if let Some(receiver) = weak.upgrade() {
                    receiver.on_event(event);
                }
            }),
        )
    }

    fn build<R: ?Sized + Send + Sync + 'static>(
        receiver: &Arc<R>,
        rule: ReceiveRule,
        handler: Handler,
    ) -> Self {
        Self {
            id: RegistrationId::next(),
            receiver: ReceiverRef::new(receiver),
            rule,
            target: None,
            handler,
        }
    }

    /// Runs deliveries on `target` instead of the posting thread.
    #[must_use]
    pub fn on_target(mut self, target: Option<Arc<dyn Executor>>) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub const fn id(&self) -> RegistrationId {
        self.id
    }

    #[must_use]
    pub const fn rule(&self) -> &ReceiveRule {
        &self.rule
    }

    #[must_use]
    pub const fn receiver(&self) -> ReceiverId {
        self.receiver.id
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.receiver.weak.is_alive()
    }

    #[must_use]
    pub fn handle(&self) -> RegistrationHandle {
        RegistrationHandle { id: self.id, rule: self.rule.clone() }
    }

    /// Same receiver and equal rule.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.receiver.id == other.receiver.id && self.rule == other.rule
    }

    /// A dead receiver never matches.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.is_alive() && self.rule.matches(event)
    }

    /// Runs the delivery action, inline or on the dispatch target.
    pub(crate) fn fire(&self, event: &Arc<Event>) -> Result<(), EventBusError> {
        let Some(target) = &self.target else {
            (self.handler)(event.as_ref());
            return Ok(());
        };

        let handler = Arc::clone(&self.handler);
        let event = Arc::clone(event);
        target
            .execute(Box::new(move || handler(event.as_ref())))
            .context(format!("target `{}`", target.label()))
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("rule", &self.rule)
            .field("alive", &self.is_alive())
            .field("target", &self.target.as_ref().map(|t| t.label().to_owned()))
            .finish_non_exhaustive()
    }
}
