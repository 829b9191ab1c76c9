// Domain models - Core types and data structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SqueezeError, SqueezeResult};

/// Target resolution expressed as "WIDTHxHEIGHT" (e.g. "1280x720")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution with validation
    pub fn new(width: u32, height: u32) -> SqueezeResult<Self> {
        if width == 0 || height == 0 {
            return Err(SqueezeError::invalid_settings(
                "Resolution dimensions cannot be zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Parse a "WxH" resolution string
    pub fn parse(s: &str) -> SqueezeResult<Self> {
        let mut parts = s.trim().splitn(2, 'x');
        let width = parts
            .next()
            .and_then(|w| w.parse::<u32>().ok())
            .ok_or_else(|| {
                SqueezeError::invalid_settings(format!(
                    "Invalid resolution '{}'. Expected WIDTHxHEIGHT, e.g. 1280x720",
                    s
                ))
            })?;
        let height = parts
            .next()
            .and_then(|h| h.parse::<u32>().ok())
            .ok_or_else(|| {
                SqueezeError::invalid_settings(format!(
                    "Invalid resolution '{}'. Expected WIDTHxHEIGHT, e.g. 1280x720",
                    s
                ))
            })?;
        Self::new(width, height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How much to compress: exactly one strategy applies per session.
///
/// Each variant carries only the fields it needs, so there is no "optional
/// field meaningful only sometimes" ambiguity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum CompressionStrategy {
    /// Explicit video bitrate string, e.g. "2500k"
    Bitrate { video_bitrate: String },
    /// Explicit constant rate factor (lower is higher quality)
    Crf { value: u32 },
    /// Target percentage of the original perceived quality, 1-100
    Percentage { target: u32 },
    /// Target output size in megabytes
    Filesize { target_mb: f64 },
}

impl CompressionStrategy {
    /// Default CRF when the caller selects the strategy without a value
    pub const DEFAULT_CRF: u32 = 23;

    /// Default video bitrate when no strategy is specified
    pub const DEFAULT_BITRATE: &'static str = "2500k";

    /// Build a strategy from a method tag plus its (optional) numeric input.
    /// Missing values default rather than hard-failing.
    pub fn from_parts(
        method: &str,
        bitrate: Option<&str>,
        crf: Option<u32>,
        percentage: Option<u32>,
        filesize_mb: Option<f64>,
    ) -> SqueezeResult<Self> {
        match method.to_lowercase().as_str() {
            "bitrate" => Ok(CompressionStrategy::Bitrate {
                video_bitrate: bitrate.unwrap_or(Self::DEFAULT_BITRATE).to_string(),
            }),
            "crf" => Ok(CompressionStrategy::Crf {
                value: crf.unwrap_or(Self::DEFAULT_CRF),
            }),
            "percentage" => Ok(CompressionStrategy::Percentage {
                target: percentage.unwrap_or(100),
            }),
            "filesize" => Ok(CompressionStrategy::Filesize {
                target_mb: filesize_mb.unwrap_or(100.0),
            }),
            other => Err(SqueezeError::invalid_settings(format!(
                "Unknown compression method '{}'. Valid methods: bitrate, crf, percentage, filesize",
                other
            ))),
        }
    }
}

impl Default for CompressionStrategy {
    fn default() -> Self {
        CompressionStrategy::Bitrate {
            video_bitrate: Self::DEFAULT_BITRATE.to_string(),
        }
    }
}

/// Immutable configuration record describing one encode request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub frame_rate: u32,
    pub resolution: Resolution,
    pub strategy: CompressionStrategy,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            frame_rate: 30,
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            strategy: CompressionStrategy::default(),
        }
    }
}

/// Lifecycle state of the single shared engine instance.
///
/// `Ready` and `Failed` are terminal for the process lifetime; there is no
/// automatic retry after a load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Unloaded => "unloaded",
            EngineState::Loading => "loading",
            EngineState::Ready => "ready",
            EngineState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// State of one transcode session.
///
/// `Idle` is the only entry state; `Complete` and `Failed` are terminal for
/// the session instance. Another encode needs a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Preparing,
    Encoding,
    Complete,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Preparing => "preparing",
            SessionState::Encoding => "encoding",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Final output of a session: the produced bytes plus the caller-facing name
#[derive(Debug, Clone)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub file_name: String,
}

impl Artifact {
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Size-delta metrics for a completed encode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeMetrics {
    pub original_size: u64,
    pub compressed_size: u64,
    pub savings_percent: i32,
}

impl SizeMetrics {
    /// Compute metrics from byte counts. Savings may be negative when the
    /// output grew; it is surfaced as-is, never clamped to zero.
    pub fn from_sizes(original_size: u64, compressed_size: u64) -> Self {
        let savings_percent = if original_size == 0 {
            0
        } else {
            ((1.0 - compressed_size as f64 / original_size as f64) * 100.0).round() as i32
        };
        Self {
            original_size,
            compressed_size,
            savings_percent,
        }
    }
}
