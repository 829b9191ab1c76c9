// Transcode session - orchestrates one encode end-to-end

pub mod resources;

use std::path::Path;
use std::sync::Arc;

use tokio::pin;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::model::{Artifact, ConversionSettings, SessionState, SizeMetrics};
use crate::domain::rules::CommandPlanner;
use crate::engine::EngineLifecycleManager;
use crate::error::{SqueezeError, SqueezeResult};
use crate::ports::EnginePort;
use resources::ResourceTracker;

/// Drives one encode from staged input to retrieved artifact.
///
/// State machine: Idle -> Preparing -> Encoding -> Complete, with any
/// failure landing in Failed. Complete and Failed are terminal; a new
/// session is needed for another encode. Every virtual file the session
/// stages is released on every exit path, success or failure.
pub struct TranscodeSession {
    manager: Arc<EngineLifecycleManager>,
    state: SessionState,
    progress: u32,
    args: Vec<String>,
    tracker: ResourceTracker,
    artifact: Option<Artifact>,
    metrics: Option<SizeMetrics>,
    error_message: Option<String>,
}

impl TranscodeSession {
    /// Create an idle session against a shared engine manager
    pub fn new(manager: Arc<EngineLifecycleManager>) -> Self {
        Self {
            manager,
            state: SessionState::Idle,
            progress: 0,
            args: Vec::new(),
            tracker: ResourceTracker::new(),
            artifact: None,
            metrics: None,
            error_message: None,
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    /// Integer progress percentage, monotonically non-decreasing while
    /// Encoding
    pub fn progress(&self) -> u32 {
        self.progress
    }

    /// The argument sequence derived for this session's encode
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The completed artifact, visible only after `Complete`
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Hand the artifact to the caller, leaving the session without it
    pub fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    /// Size-delta metrics, available after `Complete`
    pub fn metrics(&self) -> Option<&SizeMetrics> {
        self.metrics.as_ref()
    }

    /// Human-readable failure message, set on terminal `Failed`
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Run one encode end-to-end.
    ///
    /// `data` is treated as opaque bytes; no content validation happens
    /// beyond what the engine itself rejects. On any error the session ends
    /// in `Failed` and every virtual file already staged for it has been
    /// removed before the error propagates.
    pub async fn start(
        &mut self,
        file_name: &str,
        data: &[u8],
        settings: &ConversionSettings,
    ) -> SqueezeResult<()> {
        if self.state != SessionState::Idle {
            return Err(SqueezeError::encode(format!(
                "session cannot start from state '{}'",
                self.state
            )));
        }
        if data.is_empty() {
            let error = SqueezeError::invalid_settings("input file is empty");
            self.error_message = Some(error.to_string());
            self.state = SessionState::Failed;
            return Err(error);
        }

        self.state = SessionState::Preparing;
        info!(file = %file_name, size = data.len(), "Starting transcode session");

        match self.encode(file_name, data, settings).await {
            Ok(artifact) => {
                self.metrics = Some(SizeMetrics::from_sizes(data.len() as u64, artifact.len()));
                self.progress = 100;
                self.artifact = Some(artifact);
                let port = self.manager.port();
                self.tracker.release_all(&port).await;
                self.state = SessionState::Complete;
                info!(
                    savings_percent = self.metrics.as_ref().map(|m| m.savings_percent),
                    "Transcode session complete"
                );
                Ok(())
            }
            Err(error) => {
                // Staged virtual files are removed before the error is
                // surfaced to the caller.
                let port = self.manager.port();
                self.tracker.release_all(&port).await;
                self.error_message = Some(error.to_string());
                self.state = SessionState::Failed;
                Err(error)
            }
        }
    }

    /// Release the artifact and every tracked resource. Callable from any
    /// state and idempotent; a second call finds nothing left to release.
    pub async fn dispose(&mut self) {
        let port = self.manager.port();
        self.tracker.release_all(&port).await;
        self.artifact = None;
        debug!("Session disposed");
    }

    async fn encode(
        &mut self,
        file_name: &str,
        data: &[u8],
        settings: &ConversionSettings,
    ) -> SqueezeResult<Artifact> {
        self.manager.ensure_ready().await?;

        let tag = Uuid::new_v4();
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let input_name = format!("input-{}.{}", tag, extension);
        let output_name = format!("output-{}.mp4", tag);

        let port = self.manager.port();
        port.write_file(&input_name, data).await?;
        self.tracker.track(&input_name);

        let args = CommandPlanner::build_args(&input_name, &output_name, settings);
        self.args = args.clone();
        debug!(args = ?args, "Translated engine command");

        // Hold the engine's encode slot for the whole Encoding phase; a
        // concurrent session queues here until this run finishes.
        let manager = Arc::clone(&self.manager);
        let run_slot = manager.acquire_run_slot().await;
        self.state = SessionState::Encoding;
        self.drive_run(&port, &args).await?;
        drop(run_slot);

        self.tracker.track(&output_name);
        let bytes = port.read_file(&output_name).await?;

        Ok(Artifact {
            data: bytes,
            file_name: derive_artifact_name(file_name),
        })
    }

    /// Await the engine run while folding progress events into the
    /// session's percentage.
    async fn drive_run(
        &mut self,
        port: &Arc<dyn EnginePort>,
        args: &[String],
    ) -> SqueezeResult<()> {
        let mut rx = self.manager.subscribe_progress();
        // Mark whatever the engine last delivered as seen: a value left
        // over from an earlier encode must not leak into this session.
        rx.borrow_and_update();
        let run = port.run(args);
        pin!(run);

        loop {
            tokio::select! {
                result = &mut run => {
                    result?;
                    break;
                }
                changed = rx.changed() => {
                    if changed.is_ok() {
                        let ratio = *rx.borrow_and_update();
                        self.observe_progress(ratio);
                    } else {
                        // Progress channel closed; just wait the run out
                        (&mut run).await?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fold one fractional completion ratio into the integer percentage.
    /// The engine may emit approximate or late events, so later lower
    /// values are dropped rather than surfaced.
    fn observe_progress(&mut self, ratio: f64) {
        let pct = (ratio.clamp(0.0, 1.0) * 100.0).round() as u32;
        if pct > self.progress {
            self.progress = pct;
            debug!(progress = pct, "Encode progress");
        }
    }
}

/// Derive the caller-facing artifact name from the source file name
fn derive_artifact_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{}_converted.mp4", stem)
}
