//! Partitioned store of registrations.
//!
//! Four partitions, one lock each. No operation ever holds two partition locks
//! at once, so there is no lock ordering to get wrong.
//!
//! Dispatch is snapshot-then-fire: matching candidates are cloned under a read
//! lock and the delivery actions run after it is released. Handlers may
//! therefore call back into the bus. A registration added during an in-flight
//! post may or may not see that post; a snapshot never visits an entry twice.

use crate::event::Event;
use crate::registration::{ReceiverId, Registration, RegistrationHandle};
use crate::rule::ReceiveRule;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Slot = Vec<Arc<Registration>>;

/// Concurrent registration store keyed by rule variant.
#[derive(Default)]
pub struct Registry {
    all: RwLock<Slot>,
    by_category: RwLock<FxHashMap<String, Slot>>,
    by_subcategory: RwLock<FxHashMap<String, FxHashMap<String, Slot>>>,
    custom: RwLock<Slot>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `registration` in the partition of its rule.
    ///
    /// With `allow_duplication == false` an equivalent registration (same receiver,
    /// equal rule) already present wins: nothing is inserted and its handle is
    /// returned. The check and the insert happen under one write lock.
    pub fn register(&self, registration: Registration, allow_duplication: bool) -> RegistrationHandle {
        let registration = Arc::new(registration);
        let rule = registration.rule().clone();

        let handle = match &rule {
            ReceiveRule::All => insert(&mut self.all.write(), registration, allow_duplication),
            ReceiveRule::Category(category) => {
                let mut map = self.by_category.write();
                insert(map.entry(category.clone()).or_default(), registration, allow_duplication)
            },
            ReceiveRule::Subcategory(category, subcategory) => {
                let mut map = self.by_subcategory.write();
                let slot = map.entry(category.clone()).or_default().entry(subcategory.clone()).or_default();
                insert(slot, registration, allow_duplication)
            },
            ReceiveRule::Custom { .. } => {
                insert(&mut self.custom.write(), registration, allow_duplication)
            },
        };

        debug!(id = handle.id().get(), rule = ?rule, "Registration stored");
        handle
    }

    /// Removes every registration of `receiver` under a rule equal to `rule`.
    ///
    /// Only the partition of `rule` is scanned. Dead registrations met by the scan
    /// are removed too. Returns how many entries were dropped.
    pub fn unregister(&self, receiver: ReceiverId, rule: &ReceiveRule) -> usize {
        let doomed = |r: &Registration| !r.is_alive() || (r.receiver() == receiver && r.rule() == rule);

        let removed = match rule {
            ReceiveRule::All => remove_where(&mut self.all.write(), doomed),
            ReceiveRule::Category(category) => {
                let mut map = self.by_category.write();
                remove_from_key(&mut map, category, doomed)
            },
            ReceiveRule::Subcategory(category, subcategory) => {
                let mut map = self.by_subcategory.write();
                let Some(inner) = map.get_mut(category) else {
                    return 0;
                };
                let removed = remove_from_key(inner, subcategory, doomed);
                if inner.is_empty() {
                    map.remove(category);
                }
                removed
            },
            ReceiveRule::Custom { .. } => remove_where(&mut self.custom.write(), doomed),
        };

        debug!(?receiver, rule = ?rule, removed, "Receiver unregistered for rule");
        removed
    }

    /// Removes every registration of `receiver` from all four partitions.
    pub fn unregister_all(&self, receiver: ReceiverId) -> usize {
        let removed = self.sweep(|r| !r.is_alive() || r.receiver() == receiver);
        debug!(?receiver, removed, "Receiver unregistered from all rules");
        removed
    }

    /// Removes exactly the registration behind `handle`. Returns whether it was found.
    pub fn cancel(&self, handle: &RegistrationHandle) -> bool {
        let id = handle.id();
        let doomed = |r: &Registration| r.id() == id;

        let removed = match handle.rule() {
            ReceiveRule::All => remove_where(&mut self.all.write(), doomed),
            ReceiveRule::Category(category) => {
                remove_from_key(&mut self.by_category.write(), category, doomed)
            },
            ReceiveRule::Subcategory(category, subcategory) => {
                let mut map = self.by_subcategory.write();
                let Some(inner) = map.get_mut(category) else {
                    return false;
                };
                let removed = remove_from_key(inner, subcategory, doomed);
                if inner.is_empty() {
                    map.remove(category);
                }
                removed
            },
            ReceiveRule::Custom { .. } => remove_where(&mut self.custom.write(), doomed),
        };

        debug!(id = id.get(), found = removed > 0, "Registration cancelled");
        removed > 0
    }

    /// Drops registrations whose receiver is gone. Returns how many were dropped.
    pub fn purge_dead(&self) -> usize {
        let removed = self.sweep(|r| !r.is_alive());
        if removed > 0 {
            debug!(removed, "Purged dead registrations");
        }
        removed
    }

    /// Delivers `event` to every live matching registration and returns how many
    /// deliveries were fired or handed to a dispatch target.
    pub fn post(&self, event: &Arc<Event>) -> usize {
        let all = self.all.read().clone();
        let mut delivered = fire_matching(&all, event);

        let by_category = self.by_category.read().get(event.category()).cloned();
        if let Some(candidates) = by_category {
            delivered += fire_matching(&candidates, event);
        }

        if let Some(subcategory) = event.subcategory() {
            let by_subcategory = self
                .by_subcategory
                .read()
                .get(event.category())
                .and_then(|inner| inner.get(subcategory))
                .cloned();
            if let Some(candidates) = by_subcategory {
                delivered += fire_matching(&candidates, event);
            }
        }

        let custom = self.custom.read().clone();
        delivered += fire_matching(&custom, event);
        delivered
    }

    /// Number of stored registrations, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        let all = self.all.read().len();
        let by_category: usize = self.by_category.read().values().map(Vec::len).sum();
        let by_subcategory: usize =
            self.by_subcategory.read().values().flat_map(|inner| inner.values()).map(Vec::len).sum();
        let custom = self.custom.read().len();
        all + by_category + by_subcategory + custom
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies `doomed` to every partition, one lock at a time.
    fn sweep(&self, doomed: impl Fn(&Registration) -> bool) -> usize {
        let mut removed = remove_where(&mut self.all.write(), &doomed);

        {
            let mut map = self.by_category.write();
            for slot in map.values_mut() {
                removed += remove_where(slot, &doomed);
            }
            map.retain(|_, slot| !slot.is_empty());
        }

        {
            let mut map = self.by_subcategory.write();
            for inner in map.values_mut() {
                for slot in inner.values_mut() {
                    removed += remove_where(slot, &doomed);
                }
                inner.retain(|_, slot| !slot.is_empty());
            }
            map.retain(|_, inner| !inner.is_empty());
        }

        removed += remove_where(&mut self.custom.write(), &doomed);
        removed
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("all", &self.all.read().len())
            .field("categories", &self.by_category.read().len())
            .field("subcategory_groups", &self.by_subcategory.read().len())
            .field("custom", &self.custom.read().len())
            .finish()
    }
}

fn insert(slot: &mut Slot, registration: Arc<Registration>, allow_duplication: bool) -> RegistrationHandle {
    if !allow_duplication
        && let Some(existing) = slot.iter().find(|r| r.is_equivalent(&registration))
    {
        trace!(id = existing.id().get(), "Duplicate registration skipped");
        return existing.handle();
    }
    let handle = registration.handle();
    slot.push(registration);
    handle
}

fn remove_where(slot: &mut Slot, doomed: impl Fn(&Registration) -> bool) -> usize {
    let before = slot.len();
    slot.retain(|r| !doomed(r));
    before - slot.len()
}

/// Scans the slot under `key` and drops the key once its slot is empty.
fn remove_from_key(
    map: &mut FxHashMap<String, Slot>,
    key: &str,
    doomed: impl Fn(&Registration) -> bool,
) -> usize {
    let Some(slot) = map.get_mut(key) else {
        return 0;
    };
    let removed = remove_where(slot, doomed);
    if slot.is_empty() {
        map.remove(key);
    }
    removed
}

fn fire_matching(candidates: &[Arc<Registration>], event: &Arc<Event>) -> usize {
    let mut delivered = 0;
    for registration in candidates.iter().filter(|r| r.matches(event)) {
        match registration.fire(event) {
            Ok(()) => delivered += 1,
            Err(err) => warn!(
                id = registration.id().get(),
                category = event.category(),
                error = %err,
                "Delivery dropped"
            ),
        }
    }
    delivered
}
