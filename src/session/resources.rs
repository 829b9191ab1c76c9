// Resource tracking - deterministic release of session-scoped handles

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ports::EnginePort;

/// Records every engine-side virtual file a session creates so they can be
/// released deterministically on every exit path.
///
/// `release_all` drains the tracked set, so calling it twice releases each
/// handle at most once.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    handles: Vec<String>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a virtual file name for later release
    pub fn track(&mut self, handle: impl Into<String>) {
        let handle = handle.into();
        debug!(handle = %handle, "Tracking session resource");
        self.handles.push(handle);
    }

    /// Number of handles currently awaiting release
    pub fn tracked_count(&self) -> usize {
        self.handles.len()
    }

    /// Best-effort release of every tracked handle. A failed unlink is
    /// logged and skipped; the remaining handles are still attempted.
    pub async fn release_all(&mut self, engine: &Arc<dyn EnginePort>) {
        for handle in self.handles.drain(..) {
            if let Err(e) = engine.unlink(&handle).await {
                warn!(handle = %handle, error = %e, "Failed to release session resource");
            } else {
                debug!(handle = %handle, "Released session resource");
            }
        }
    }
}
