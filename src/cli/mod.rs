// CLI layer - argument parsing and command dispatch

pub mod args;
pub mod commands;

use clap::{Parser, Subcommand};

pub use args::CompressArgs;
pub use commands::execute_compress;

/// Shrink video files through an embedded transcoding engine
#[derive(Parser, Debug)]
#[command(name = "squeeze", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compress one video file
    Compress(CompressArgs),
}
