// Adapters - Concrete implementations of the engine port

pub mod ffmpeg_cli;
pub mod scripted;

pub use ffmpeg_cli::FfmpegCliEngine;
pub use scripted::ScriptedEngine;
