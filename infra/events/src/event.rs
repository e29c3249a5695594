use fxhash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased value carried by an [`Event`].
pub type Value = Arc<dyn Any + Send + Sync>;

/// Open, caller-defined key/value bag attached to an [`Event`].
///
/// The bus never looks inside. Values are retrieved by key and concrete type:
/// a value stored as `String` is read back with `get::<String>`, a `&'static str`
/// with `get::<&str>`.
#[derive(Clone, Default)]
pub struct Payload {
    entries: FxHashMap<String, Value>,
}

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Any + Send + Sync) -> Option<Value> {
        self.entries.insert(key.into(), Arc::new(value))
    }

    /// Returns the value under `key` if it exists and has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Payload").field("keys", &keys).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Any + Send + Sync,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}

/// Something that happened, described by a category, an optional subcategory
/// and optional data.
///
/// Events are immutable once built; the bus shares one instance between every
/// receiver of a post.
///
/// ```rust
/// use herald_event_bus::{Event, Payload};
///
/// let event = Event::new("login")
///     .with_subcategory("success")
///     .with_payload(Payload::new().with("user", "Alice".to_owned()));
///
/// assert_eq!(event.category(), "login");
/// assert_eq!(event.subcategory(), Some("success"));
/// assert_eq!(event.get::<String>("user").map(String::as_str), Some("Alice"));
/// ```
#[derive(Clone)]
pub struct Event {
    category: String,
    subcategory: Option<String>,
    payload: Option<Payload>,
    object: Option<Value>,
}

impl Event {
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self { category: category.into(), subcategory: None, payload: None, object: None }
    }

    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attaches a single opaque object, typically the sender or the subject of the event.
    #[must_use]
    pub fn with_object(mut self, object: impl Any + Send + Sync) -> Self {
        self.object = Some(Arc::new(object));
        self
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Shorthand for `payload()?.get::<T>(key)`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.payload.as_ref().and_then(|p| p.get::<T>(key))
    }

    #[must_use]
    pub fn object<T: Any>(&self) -> Option<&T> {
        self.object.as_ref().and_then(|o| o.downcast_ref::<T>())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("category", &self.category)
            .field("subcategory", &self.subcategory)
            .field("payload", &self.payload)
            .field("object", &self.object.is_some())
            .finish()
    }
}
