// FFmpeg CLI engine adapter - subprocess-backed engine capability
//
// Implements the opaque engine port over a local ffmpeg binary. A scratch
// directory plays the role of the engine's virtual filesystem namespace:
// virtual file names resolve inside it and never escape it.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{SqueezeError, SqueezeResult};
use crate::ports::EnginePort;

/// Engine adapter driving a local ffmpeg binary
pub struct FfmpegCliEngine {
    ffmpeg_binary: String,
    ffprobe_binary: String,
    scratch: TempDir,
    progress_tx: watch::Sender<f64>,
    progress_rx: watch::Receiver<f64>,
}

impl FfmpegCliEngine {
    /// Create an adapter with a fresh scratch directory, resolving the
    /// binaries from PATH
    pub fn new() -> SqueezeResult<Self> {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    /// Create an adapter around explicit binary names/paths
    pub fn with_binaries(ffmpeg: &str, ffprobe: &str) -> SqueezeResult<Self> {
        let scratch = TempDir::new()?;
        let (progress_tx, progress_rx) = watch::channel(0.0);
        Ok(Self {
            ffmpeg_binary: ffmpeg.to_string(),
            ffprobe_binary: ffprobe.to_string(),
            scratch,
            progress_tx,
            progress_rx,
        })
    }

    /// Resolve a virtual file name inside the scratch namespace. Names with
    /// path separators are rejected so sessions cannot reach outside it.
    fn resolve(&self, name: &str) -> SqueezeResult<PathBuf> {
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(SqueezeError::encode(format!(
                "virtual file names cannot contain path separators: {}",
                name
            )));
        }
        Ok(self.scratch.path().join(name))
    }

    /// Probe the staged input's duration in seconds, if ffprobe can read it
    async fn probe_duration(&self, input_name: &str) -> Option<f64> {
        let path = self.resolve(input_name).ok()?;
        let output = Command::new(&self.ffprobe_binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(&path)
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| *d > 0.0)
    }

    fn input_name(args: &[String]) -> Option<&str> {
        args.windows(2)
            .find(|w| w[0] == "-i")
            .map(|w| w[1].as_str())
    }
}

#[async_trait]
impl EnginePort for FfmpegCliEngine {
    async fn load(&self) -> SqueezeResult<()> {
        let output = Command::new(&self.ffmpeg_binary)
            .arg("-version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                SqueezeError::engine_load(format!(
                    "'{}' is not runnable: {}",
                    self.ffmpeg_binary, e
                ))
            })?;
        if !output.status.success() {
            return Err(SqueezeError::engine_load(format!(
                "'{} -version' exited with {}",
                self.ffmpeg_binary, output.status
            )));
        }
        debug!(binary = %self.ffmpeg_binary, "Engine binary verified");
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> SqueezeResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> SqueezeResult<Vec<u8>> {
        let path = self.resolve(name)?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(bytes)
    }

    async fn unlink(&self, name: &str) -> SqueezeResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    async fn run(&self, args: &[String]) -> SqueezeResult<()> {
        // Duration is needed to turn out_time into a completion ratio; if
        // the probe fails, progress stays silent until completion.
        let duration = match Self::input_name(args) {
            Some(input) => self.probe_duration(input).await,
            None => None,
        };

        let mut child = Command::new(&self.ffmpeg_binary)
            .current_dir(self.scratch.path())
            .args(["-hide_banner", "-y", "-progress", "pipe:1", "-nostats"])
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SqueezeError::encode(format!("failed to spawn engine: {}", e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Structured key=value progress lines arrive on stdout
        let progress_task = {
            let tx = self.progress_tx.clone();
            tokio::spawn(async move {
                let Some(stdout) = stdout else { return };
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(value) = line.strip_prefix("out_time_us=") {
                        if let (Some(total), Ok(us)) = (duration, value.trim().parse::<f64>()) {
                            let ratio = (us / 1_000_000.0 / total).clamp(0.0, 1.0);
                            let _ = tx.send(ratio);
                        }
                    } else if line.trim() == "progress=end" {
                        let _ = tx.send(1.0);
                    }
                }
            })
        };

        let stderr_task = tokio::spawn(async move {
            let mut collected = Vec::new();
            let Some(stderr) = stderr else {
                return collected;
            };
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                collected.push(line);
            }
            collected
        });

        let status = child
            .wait()
            .await
            .map_err(|e| SqueezeError::encode(format!("engine run did not finish: {}", e)))?;

        let _ = progress_task.await;
        let stderr_lines = stderr_task.await.unwrap_or_default();

        if !status.success() {
            // The useful diagnostics sit at the tail of ffmpeg's stderr
            let tail = stderr_lines
                .iter()
                .rev()
                .take(5)
                .rev()
                .cloned()
                .collect::<Vec<_>>()
                .join("; ");
            warn!(status = %status, "Engine run failed");
            return Err(SqueezeError::encode(format!(
                "engine exited with {}: {}",
                status, tail
            )));
        }
        Ok(())
    }

    fn progress(&self) -> watch::Receiver<f64> {
        self.progress_rx.clone()
    }
}
