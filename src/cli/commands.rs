//! Command execution - wires the CLI onto the session state machine
//!
//! The CLI is a pure observer/driver of the session's public operations; all
//! state transitions live in the session itself.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::adapters::FfmpegCliEngine;
use crate::cli::args::CompressArgs;
use crate::domain::model::{CompressionStrategy, ConversionSettings, Resolution};
use crate::engine::EngineLifecycleManager;
use crate::session::TranscodeSession;

/// Machine-readable completion report
#[derive(Debug, Serialize)]
struct CompressReport {
    input: String,
    output: String,
    original_size: u64,
    compressed_size: u64,
    savings_percent: i32,
    completed_at: String,
}

/// Execute the compress command end-to-end
pub async fn execute_compress(args: CompressArgs) -> Result<()> {
    let settings = settings_from_args(&args)?;

    let data = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read input file: {}", args.input))?;
    let file_name = Path::new(&args.input)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(args.input.as_str())
        .to_string();

    let engine = Arc::new(FfmpegCliEngine::new().context("Failed to set up engine scratch")?);
    let manager = Arc::new(EngineLifecycleManager::new(engine));
    let mut session = TranscodeSession::new(Arc::clone(&manager));

    // Report progress while the encode is in flight
    let mut progress_rx = manager.subscribe_progress();
    let reporter = tokio::spawn(async move {
        let mut last = 0u32;
        while progress_rx.changed().await.is_ok() {
            let pct = (*progress_rx.borrow_and_update() * 100.0).round() as u32;
            if pct > last {
                last = pct;
                info!(progress = pct, "Encoding");
            }
        }
    });

    let result = session.start(&file_name, &data, &settings).await;
    reporter.abort();

    if let Err(e) = result {
        session.dispose().await;
        return Err(e).context("Compression failed");
    }

    let artifact = session
        .take_artifact()
        .context("Session completed without an artifact")?;
    let metrics = session
        .metrics()
        .cloned()
        .context("Session completed without metrics")?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| artifact.file_name.clone());
    tokio::fs::write(&output_path, &artifact.data)
        .await
        .with_context(|| format!("Failed to write output file: {}", output_path))?;

    session.dispose().await;

    let report = CompressReport {
        input: args.input.clone(),
        output: output_path,
        original_size: metrics.original_size,
        compressed_size: metrics.compressed_size,
        savings_percent: metrics.savings_percent,
        completed_at: Utc::now().to_rfc3339(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Compressed {} -> {} ({} -> {} bytes, {}% savings)",
            report.input,
            report.output,
            report.original_size,
            report.compressed_size,
            report.savings_percent
        );
    }

    Ok(())
}

/// Build the immutable settings record from CLI arguments
fn settings_from_args(args: &CompressArgs) -> Result<ConversionSettings> {
    let resolution = Resolution::parse(&args.resolution)?;
    let strategy = CompressionStrategy::from_parts(
        &args.method,
        args.video_bitrate.as_deref(),
        args.crf,
        args.percentage,
        args.filesize_mb,
    )?;

    Ok(ConversionSettings {
        video_codec: args.video_codec.clone(),
        audio_codec: args.audio_codec.clone(),
        audio_bitrate: args.audio_bitrate.clone(),
        frame_rate: args.frame_rate,
        resolution,
        strategy,
    })
}
