use crate::event::Event;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Caller-supplied filter used by [`ReceiveRule::Custom`].
pub type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Which events a registration wants.
///
/// Equality ignores custom predicates: two `Custom` rules are equal when their
/// ids are equal. Keep the id around to unregister a custom rule later;
/// [`ReceiveRule::custom_id`] builds a predicate-less rule for exactly that.
#[derive(Clone)]
pub enum ReceiveRule {
    /// Every event.
    All,
    /// Events whose category equals the given one.
    Category(String),
    /// Events whose category and subcategory both equal the given ones.
    Subcategory(String, String),
    /// Events accepted by `predicate`. Without a predicate nothing matches.
    Custom { id: String, predicate: Option<Predicate> },
}

/// The registry partition a rule is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    All,
    Category,
    Subcategory,
    Custom,
}

impl ReceiveRule {
    #[must_use]
    pub const fn all() -> Self {
        Self::All
    }

    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self::Category(category.into())
    }

    #[must_use]
    pub fn subcategory(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self::Subcategory(category.into(), subcategory.into())
    }

    #[must_use]
    pub fn custom<F>(id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Self::Custom { id: id.into(), predicate: Some(Arc::new(predicate)) }
    }

    /// A custom rule without a predicate. It matches nothing and is meant for
    /// unregistering by id.
    #[must_use]
    pub fn custom_id(id: impl Into<String>) -> Self {
        Self::Custom { id: id.into(), predicate: None }
    }

    #[must_use]
    pub const fn partition(&self) -> Partition {
        match self {
            Self::All => Partition::All,
            Self::Category(_) => Partition::Category,
            Self::Subcategory(..) => Partition::Subcategory,
            Self::Custom { .. } => Partition::Custom,
        }
    }

    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => event.category() == category,
            Self::Subcategory(category, subcategory) => {
                event.category() == category && event.subcategory() == Some(subcategory.as_str())
            },
            Self::Custom { id, predicate } => predicate.as_ref().map_or_else(
                || {
                    trace!(rule = %id, "Custom rule without predicate skipped");
                    false
                },
                |accept| accept(event),
            ),
        }
    }
}

impl PartialEq for ReceiveRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::All, Self::All) => true,
            (Self::Category(l), Self::Category(r)) => l == r,
            (Self::Subcategory(l1, l2), Self::Subcategory(r1, r2)) => l1 == r1 && l2 == r2,
            (Self::Custom { id: l, .. }, Self::Custom { id: r, .. }) => l == r,
            _ => false,
        }
    }
}

impl Eq for ReceiveRule {}

impl fmt::Debug for ReceiveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Category(c) => f.debug_tuple("Category").field(c).finish(),
            Self::Subcategory(c, s) => f.debug_tuple("Subcategory").field(c).field(s).finish(),
            Self::Custom { id, predicate } => f
                .debug_struct("Custom")
                .field("id", id)
                .field("predicate", &predicate.is_some())
                .finish(),
        }
    }
}
