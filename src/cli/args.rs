//! Command-line argument definitions

use clap::Args;

/// Arguments for the compress command
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Output file path (default: <input stem>_converted.mp4)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Video codec
    #[arg(long, default_value = "libx264")]
    pub video_codec: String,

    /// Audio codec
    #[arg(long, default_value = "aac")]
    pub audio_codec: String,

    /// Audio bitrate
    #[arg(long, default_value = "128k")]
    pub audio_bitrate: String,

    /// Output frame rate
    #[arg(long, default_value_t = 30)]
    pub frame_rate: u32,

    /// Target resolution (WIDTHxHEIGHT); output width is capped at the
    /// source width
    #[arg(long, default_value = "1280x720")]
    pub resolution: String,

    /// Compression method: bitrate, crf, percentage, or filesize
    #[arg(long, default_value = "bitrate")]
    pub method: String,

    /// Video bitrate for the bitrate method (e.g. 2500k)
    #[arg(long)]
    pub video_bitrate: Option<String>,

    /// Constant rate factor for the crf method (default 23)
    #[arg(long)]
    pub crf: Option<u32>,

    /// Target quality percentage (1-100) for the percentage method
    #[arg(long)]
    pub percentage: Option<u32>,

    /// Target output size in MB for the filesize method
    #[arg(long)]
    pub filesize_mb: Option<f64>,

    /// Emit a JSON completion report instead of plain text
    #[arg(long)]
    pub json: bool,
}
