use crate::event::{Event, Payload};
use crate::receiver::Receiver;
use crate::registration::{ReceiverId, Registration, RegistrationHandle};
use crate::registry::Registry;
use crate::rule::ReceiveRule;
use herald_runtime::Executor;
use serde::Deserialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Tunables of an [`EventBus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Run [`EventBus::purge_dead`] every this many posts. `0` disables it.
    pub compaction_interval: u64,
}

/// How a registration delivers its events.
#[derive(Clone)]
pub struct RegisterOptions {
    target: Option<Arc<dyn Executor>>,
    allow_duplication: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self { target: None, allow_duplication: true }
    }
}

impl RegisterOptions {
    /// Inline delivery, duplicates allowed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hop every delivery onto `target` instead of running it on the posting thread.
    #[must_use]
    pub fn target(mut self, target: Arc<dyn Executor>) -> Self {
        self.target = Some(target);
        self
    }

    /// Same as [`RegisterOptions::target`] for an executor not yet behind an `Arc`.
    #[must_use]
    pub fn on(self, target: impl Executor + 'static) -> Self {
        self.target(Arc::new(target))
    }

    /// With `false`, registering again for an equal rule is a no-op that returns
    /// the existing handle.
    #[must_use]
    pub const fn allow_duplication(mut self, allow: bool) -> Self {
        self.allow_duplication = allow;
        self
    }
}

impl fmt::Debug for RegisterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterOptions")
            .field("target", &self.target.as_ref().map(|t| t.label().to_owned()))
            .field("allow_duplication", &self.allow_duplication)
            .finish()
    }
}

#[derive(Debug)]
struct BusInner {
    registry: Registry,
    config: BusConfig,
    posts: AtomicU64,
}

/// In-process publish/subscribe hub.
///
/// Receivers register interest with a [`ReceiveRule`]; every [`post`](Self::post)
/// delivers to each live matching registration exactly once. The bus holds
/// receivers weakly, so dropping the last `Arc` of a receiver silently ends its
/// subscriptions.
///
/// Clones share the same registry.
///
/// # Examples
/// ```rust
/// use herald_event_bus::{Event, EventBus, ReceiveRule, RegisterOptions};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Audit {
///     seen: AtomicUsize,
/// }
///
/// let bus = EventBus::new();
/// let audit = Arc::new(Audit { seen: AtomicUsize::new(0) });
///
/// bus.register_method(&audit, ReceiveRule::subcategory("login", "failed"), RegisterOptions::new(), |audit: &Audit, _: &Event| {
///     audit.seen.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.post(Event::new("login").with_subcategory("failed"));
/// bus.post(Event::new("login").with_subcategory("success"));
///
/// assert_eq!(audit.seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for BusInner {
    fn default() -> Self {
        Self::with_config(BusConfig::default())
    }
}

impl BusInner {
    fn with_config(config: BusConfig) -> Self {
        Self { registry: Registry::new(), config, posts: AtomicU64::new(0) }
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        debug!(config = ?config, "Creating event bus");
        Self { inner: Arc::new(BusInner::with_config(config)) }
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Registers `handler` for events matching `rule`, on behalf of `receiver`.
    ///
    /// `receiver` is only used for identity and liveness; capture it weakly in
    /// `handler` if you need it, or use [`EventBus::register_method`].
    pub fn register<R, F>(
        &self,
        receiver: &Arc<R>,
        rule: ReceiveRule,
        options: RegisterOptions,
        handler: F,
    ) -> RegistrationHandle
    where
        R: ?Sized + Send + Sync + 'static,
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.store(Registration::with_handler(receiver, rule, handler), options)
    }

    /// Registers a method of `receiver`, called with the receiver as long as it is alive.
    pub fn register_method<R>(
        &self,
        receiver: &Arc<R>,
        rule: ReceiveRule,
        options: RegisterOptions,
        method: fn(&R, &Event),
    ) -> RegistrationHandle
    where
        R: ?Sized + Send + Sync + 'static,
    {
        self.store(Registration::with_method(receiver, rule, method), options)
    }

    /// Registers a [`Receiver`] implementation.
    pub fn register_receiver<R>(
        &self,
        receiver: &Arc<R>,
        rule: ReceiveRule,
        options: RegisterOptions,
    ) -> RegistrationHandle
    where
        R: Receiver + ?Sized,
    {
        self.store(Registration::with_receiver(receiver, rule), options)
    }

    fn store(&self, registration: Registration, options: RegisterOptions) -> RegistrationHandle {
        let registration = registration.on_target(options.target);
        self.inner.registry.register(registration, options.allow_duplication)
    }

    /// Removes every registration of `receiver`, whatever its rule.
    pub fn unregister<R: ?Sized>(&self, receiver: &Arc<R>) -> usize {
        self.inner.registry.unregister_all(ReceiverId::of(receiver))
    }

    /// Removes the registrations of `receiver` under a rule equal to `rule`.
    ///
    /// Custom rules compare by id, so [`ReceiveRule::custom_id`] is enough here.
    pub fn unregister_rule<R: ?Sized>(&self, receiver: &Arc<R>, rule: &ReceiveRule) -> usize {
        self.inner.registry.unregister(ReceiverId::of(receiver), rule)
    }

    /// Removes exactly the registration behind `handle`.
    pub fn cancel(&self, handle: &RegistrationHandle) -> bool {
        self.inner.registry.cancel(handle)
    }

    /// Delivers `event` to all live matching registrations.
    ///
    /// Inline deliveries have run by the time this returns. Deliveries with a
    /// target have been handed to it. A target that refuses the job drops that
    /// delivery with a warning.
    pub fn post(&self, event: Event) -> usize {
        let event = Arc::new(event);
        let delivered = self.inner.registry.post(&event);
        trace!(category = event.category(), subcategory = event.subcategory(), delivered, "Event posted");
        self.maybe_compact();
        delivered
    }

    /// Builds an [`Event`] from its parts and posts it.
    pub fn post_parts(
        &self,
        category: impl Into<String>,
        subcategory: Option<&str>,
        payload: Option<Payload>,
    ) -> usize {
        self.post(event_from_parts(category, subcategory, payload))
    }

    /// [`EventBus::post_parts`] with an attached object, see [`Event::with_object`].
    pub fn post_parts_with_object(
        &self,
        category: impl Into<String>,
        subcategory: Option<&str>,
        object: impl Any + Send + Sync,
        payload: Option<Payload>,
    ) -> usize {
        self.post(event_from_parts(category, subcategory, payload).with_object(object))
    }

    /// Drops registrations whose receiver no longer exists.
    pub fn purge_dead(&self) -> usize {
        self.inner.registry.purge_dead()
    }

    /// Stored registrations, including dead ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    fn maybe_compact(&self) {
        let interval = self.inner.config.compaction_interval;
        if interval == 0 {
            return;
        }
        let posts = self.inner.posts.fetch_add(1, Ordering::Relaxed) + 1;
        if posts.is_multiple_of(interval) {
            self.purge_dead();
        }
    }
}

fn event_from_parts(category: impl Into<String>, subcategory: Option<&str>, payload: Option<Payload>) -> Event {
    let mut event = Event::new(category);
    if let Some(subcategory) = subcategory {
        event = event.with_subcategory(subcategory);
    }
    if let Some(payload) = payload {
        event = event.with_payload(payload);
    }
    event
}
