//! vidsqueeze CLI
//!
//! Shrink video files through an embedded transcoding engine with
//! declarative compression strategies.
//!
//! # Usage
//!
//! ```bash
//! squeeze compress --input movie.mp4 --method crf --crf 28
//! squeeze compress --input movie.mp4 --method filesize --filesize-mb 25
//! squeeze compress --input movie.mp4 --resolution 854x480 --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use vidsqueeze::cli::{execute_compress, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compress(args) => {
            info!("Executing compress command");
            execute_compress(args).await?;
        }
    }

    Ok(())
}
