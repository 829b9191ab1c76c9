// Engine lifecycle - single shared engine instance management

use std::sync::{Arc, RwLock};

use tokio::sync::{watch, Mutex, MutexGuard, OnceCell};
use tracing::{debug, info, warn};

use crate::domain::model::EngineState;
use crate::error::{SqueezeError, SqueezeResult};
use crate::ports::EnginePort;

/// Owns the single engine instance and its readiness state.
///
/// Initialization is lazy and deduplicated: the first `ensure_ready()` call
/// performs the load, concurrent and later callers observe the same cached
/// outcome without re-triggering it. `Ready` and `Failed` are terminal for
/// this manager instance; recovery after a load failure means constructing a
/// new manager.
pub struct EngineLifecycleManager {
    port: Arc<dyn EnginePort>,
    init: OnceCell<Result<(), String>>,
    state: RwLock<EngineState>,
    // Encodes against the one engine are serialized: a second session
    // queues here until the active run releases the slot.
    run_slot: Mutex<()>,
    progress: watch::Receiver<f64>,
}

impl EngineLifecycleManager {
    /// Create a manager around an engine port. Registers the one progress
    /// subscriber this manager holds for the engine's lifetime.
    pub fn new(port: Arc<dyn EnginePort>) -> Self {
        let progress = port.progress();
        Self {
            port,
            init: OnceCell::new(),
            state: RwLock::new(EngineState::Unloaded),
            run_slot: Mutex::new(()),
            progress,
        }
    }

    /// Bring the engine to `Ready`, or surface the cached load failure.
    ///
    /// Safe to call concurrently: all callers racing during `Loading` share
    /// the single in-flight initialization.
    pub async fn ensure_ready(&self) -> SqueezeResult<()> {
        let outcome = self.init.get_or_init(|| self.load_once()).await;
        match outcome {
            Ok(()) => Ok(()),
            Err(message) => Err(SqueezeError::engine_load(message.clone())),
        }
    }

    async fn load_once(&self) -> Result<(), String> {
        self.set_state(EngineState::Loading);
        info!("Loading transcoding engine");
        match self.port.load().await {
            Ok(()) => {
                self.set_state(EngineState::Ready);
                debug!("Transcoding engine ready");
                Ok(())
            }
            Err(e) => {
                self.set_state(EngineState::Failed);
                warn!(error = %e, "Transcoding engine failed to load");
                Err(e.to_string())
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or(EngineState::Failed)
    }

    /// The engine capability this manager guards
    pub fn port(&self) -> Arc<dyn EnginePort> {
        Arc::clone(&self.port)
    }

    /// Acquire the exclusive encode slot. Held for the whole Encoding phase
    /// of a session; waiting here is how overlapping requests queue.
    pub async fn acquire_run_slot(&self) -> MutexGuard<'_, ()> {
        self.run_slot.lock().await
    }

    /// Observe the engine's progress ratio through the one subscription
    /// this manager registered at construction
    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress.clone()
    }

    fn set_state(&self, next: EngineState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }
}
