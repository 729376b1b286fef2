//! Event capture.

use std::sync::{Arc, Mutex};

use tandem_events::{EventCallback, RuntimeEvent};

/// Captures every event of a run for assertions.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<RuntimeEvent>>>,
}

impl CollectingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The callback to install as `RuntimeConfig::on_event`.
    #[must_use]
    pub fn callback(&self) -> EventCallback {
        let events = Arc::clone(&self.events);
        Arc::new(move |event: RuntimeEvent| {
            if let Ok(mut guard) = events.lock() {
                guard.push(event);
            }
        })
    }

    /// Snapshot of everything captured so far.
    #[must_use]
    pub fn events(&self) -> Vec<RuntimeEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Captured events of one type.
    #[must_use]
    pub fn of_type(&self, event_type: &str) -> Vec<RuntimeEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }
}
