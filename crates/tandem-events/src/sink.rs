//! The per-runtime event sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::event::RuntimeEvent;

/// Callback type receiving every event of a run.
pub type EventCallback = Arc<dyn Fn(RuntimeEvent) + Send + Sync>;

/// Sink that delivers events to the runtime's single `on_event` callback
/// and hands out the runtime-wide monotonic event ids.
///
/// A sink without a callback swallows events; id allocation still advances
/// so event ids stay comparable across reconfigurations.
#[derive(Clone)]
pub struct EventSink {
    callback: Option<EventCallback>,
    next_id: Arc<AtomicU64>,
}

impl EventSink {
    /// Create a sink delivering to `callback`.
    #[must_use]
    pub fn new(callback: Option<EventCallback>) -> Self {
        Self {
            callback,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allocate the next runtime-wide event id.
    #[must_use]
    pub fn next_event_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Deliver an event.
    pub fn emit(&self, event: RuntimeEvent) {
        trace!(event_type = event.event_type(), "emitting event");
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Whether a callback is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.callback.is_some()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("attached", &self.is_attached())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMeta;
    use std::sync::Mutex;

    #[test]
    fn test_sink_delivers_events() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        let sink = EventSink::new(Some(Arc::new(move |event: RuntimeEvent| {
            seen_cb.lock().unwrap().push(event.event_type().to_string());
        })));

        sink.emit(RuntimeEvent::Status {
            meta: EventMeta::new("main", 0, sink.next_event_id(), 0),
            message: "working".to_string(),
        });

        assert_eq!(seen.lock().unwrap().as_slice(), &["status".to_string()]);
    }

    #[test]
    fn test_event_ids_are_monotonic() {
        let sink = EventSink::new(None);
        let a = sink.next_event_id();
        let b = sink.next_event_id();
        assert!(b > a);
    }

    #[test]
    fn test_detached_sink_is_silent() {
        let sink = EventSink::new(None);
        assert!(!sink.is_attached());
        sink.emit(RuntimeEvent::Status {
            meta: EventMeta::new("main", 0, 0, 0),
            message: "dropped".to_string(),
        });
    }
}
