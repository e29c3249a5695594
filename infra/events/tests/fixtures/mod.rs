use herald_event_bus::{Event, Receiver};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiver that counts deliveries and remembers what it saw.
#[derive(Debug, Default)]
pub struct Recorder {
    hits: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn record(&self, event: &Event) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let label = match event.subcategory() {
            Some(subcategory) => format!("{}/{subcategory}", event.category()),
            None => event.category().to_owned(),
        };
        self.seen.lock().push(label);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

impl Receiver for Recorder {
    fn on_event(&self, event: &Event) {
        self.record(event);
    }
}

pub fn login(subcategory: &str) -> Event {
    Event::new("login").with_subcategory(subcategory)
}
