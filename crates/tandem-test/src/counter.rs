//! A stateful counter toolset for isolation and cleanup tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tandem_tools::{Tool, ToolResult, Toolset};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Toolset whose single `incr` tool returns its instance id and a per-
/// instance count. Two scopes sharing an instance would betray themselves
/// by sharing ids; cleanup counts betray double or missing cleanup.
#[derive(Debug)]
pub struct CounterToolset {
    instance_id: u64,
    count: Arc<AtomicUsize>,
    cleanups: Arc<AtomicUsize>,
}

impl CounterToolset {
    /// Create a toolset with a fresh instance id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            count: Arc::new(AtomicUsize::new(0)),
            cleanups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// This instance's id.
    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// A handle observing how many times this instance was cleaned up.
    #[must_use]
    pub fn cleanup_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.cleanups)
    }
}

impl Default for CounterToolset {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Toolset for CounterToolset {
    fn name(&self) -> &str {
        "counter"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(IncrTool {
            instance_id: self.instance_id,
            count: Arc::clone(&self.count),
        })]
    }

    async fn cleanup(&self) -> ToolResult<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct IncrTool {
    instance_id: u64,
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for IncrTool {
    fn name(&self) -> &str {
        "incr"
    }

    fn description(&self) -> &str {
        "Increments this toolset instance's counter and reports the instance id."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let count = self.count.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        Ok(serde_json::json!({
            "instance_id": self.instance_id,
            "count": count,
        })
        .to_string())
    }
}

