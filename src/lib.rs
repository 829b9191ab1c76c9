//! vidsqueeze library
//!
//! Shrinks a video file by delegating the encode to an embedded, stateful
//! transcoding engine: a settings record is translated into an ordered
//! argument sequence, one session drives the encode end-to-end, and every
//! staged resource is released on every exit path.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod session;

// Re-export commonly used types
pub use domain::model::{
    Artifact, CompressionStrategy, ConversionSettings, EngineState, Resolution, SessionState,
    SizeMetrics,
};
pub use engine::EngineLifecycleManager;
pub use error::{SqueezeError, SqueezeResult};
pub use ports::EnginePort;
pub use session::TranscodeSession;
