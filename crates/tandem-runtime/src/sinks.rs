//! The only mutable cross-call state: lock-guarded, append-only collectors.

use std::sync::Mutex;

use tandem_llm::{Message, Usage};

/// Per-call usage record.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    /// Invocation the usage belongs to.
    pub invocation_name: String,
    /// Call depth of that invocation.
    pub depth: usize,
    /// Tokens consumed.
    pub usage: Usage,
}

/// Thread-safe aggregator of token usage across all calls of a run.
#[derive(Debug, Default)]
pub struct UsageCollector {
    inner: Mutex<UsageInner>,
}

#[derive(Debug, Default)]
struct UsageInner {
    total: Usage,
    records: Vec<UsageRecord>,
}

impl UsageCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record usage for one agent request.
    pub fn record(&self, invocation_name: &str, depth: usize, usage: Usage) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.total.absorb(usage);
        inner.records.push(UsageRecord {
            invocation_name: invocation_name.to_string(),
            depth,
            usage,
        });
    }

    /// Aggregated totals so far.
    #[must_use]
    pub fn total(&self) -> Usage {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .total
    }

    /// Snapshot of the per-call records.
    #[must_use]
    pub fn records(&self) -> Vec<UsageRecord> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .records
            .clone()
    }
}

/// A message recorded into the run transcript, attributed to its call.
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    /// Invocation the message belongs to.
    pub invocation_name: String,
    /// Call depth of that invocation.
    pub depth: usize,
    /// The message itself.
    pub message: Message,
}

/// Thread-safe, append-only transcript of every message in a run.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    messages: Mutex<Vec<RecordedMessage>>,
}

impl MessageAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record messages under `(invocation_name, depth)`. The batch is
    /// appended atomically, preserving model order.
    pub fn extend(&self, invocation_name: &str, depth: usize, batch: &[Message]) {
        if batch.is_empty() {
            return;
        }
        let mut messages = self
            .messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        messages.extend(batch.iter().map(|message| RecordedMessage {
            invocation_name: invocation_name.to_string(),
            depth,
            message: message.clone(),
        }));
    }

    /// Snapshot of the transcript.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RecordedMessage> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the transcript is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_totals_accumulate() {
        let collector = UsageCollector::new();
        collector.record("a", 0, Usage::new(10, 5));
        collector.record("b", 1, Usage::new(7, 3));

        let total = collector.total();
        assert_eq!(total.input_tokens, 17);
        assert_eq!(total.output_tokens, 8);
        assert_eq!(collector.records().len(), 2);
    }

    #[test]
    fn test_records_carry_attribution() {
        let collector = UsageCollector::new();
        collector.record("child", 2, Usage::new(1, 1));
        let records = collector.records();
        assert_eq!(records[0].invocation_name, "child");
        assert_eq!(records[0].depth, 2);
    }

    #[test]
    fn test_accumulator_preserves_order() {
        let accumulator = MessageAccumulator::new();
        accumulator.extend(
            "greeter",
            0,
            &[Message::user("hi"), Message::assistant("hello")],
        );
        let snapshot = accumulator.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].message.text(), Some("hi"));
        assert_eq!(snapshot[1].message.text(), Some("hello"));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let accumulator = MessageAccumulator::new();
        accumulator.extend("x", 0, &[]);
        assert!(accumulator.is_empty());
    }
}
