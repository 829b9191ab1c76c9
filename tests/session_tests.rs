//! End-to-end session tests over the scripted engine adapter

use std::sync::Arc;

use vidsqueeze::adapters::ScriptedEngine;
use vidsqueeze::{
    CompressionStrategy, ConversionSettings, EngineLifecycleManager, Resolution, SessionState,
    SqueezeError, TranscodeSession,
};

fn crf_settings(value: u32) -> ConversionSettings {
    ConversionSettings {
        strategy: CompressionStrategy::Crf { value },
        resolution: Resolution::parse("1280x720").unwrap(),
        ..ConversionSettings::default()
    }
}

fn harness(engine: ScriptedEngine) -> (Arc<ScriptedEngine>, TranscodeSession) {
    let engine = Arc::new(engine);
    let manager = Arc::new(EngineLifecycleManager::new(
        Arc::clone(&engine) as Arc<dyn vidsqueeze::EnginePort>
    ));
    let session = TranscodeSession::new(manager);
    (engine, session)
}

#[tokio::test]
async fn test_end_to_end_crf_encode() {
    let (engine, mut session) = harness(ScriptedEngine::new());

    session
        .start("holiday.mov", b"source bytes", &crf_settings(28))
        .await
        .unwrap();

    assert_eq!(session.state(), SessionState::Complete);
    assert_eq!(session.progress(), 100);

    // Translated command carries the explicit quality value and the
    // width-bounding scale filter
    let args = session.args();
    assert!(args.windows(2).any(|w| w == ["-crf", "28"]));
    assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
    assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
    assert!(args
        .windows(2)
        .any(|w| w[0] == "-vf" && w[1] == "scale='min(1280,iw)':'-2'"));

    let artifact = session.artifact().unwrap();
    assert_eq!(artifact.file_name, "holiday_converted.mp4");
    assert!(!artifact.is_empty());

    // Input staging preserved the source extension
    let written = engine.written_names();
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with("input-"));
    assert!(written[0].ends_with(".mov"));
}

#[tokio::test]
async fn test_complete_session_releases_all_virtual_files() {
    let (engine, mut session) = harness(ScriptedEngine::new());

    session
        .start("clip.mp4", b"source bytes", &crf_settings(23))
        .await
        .unwrap();

    // Both the staged input and the produced output were unlinked
    let unlinked = engine.unlinked_names();
    for name in engine.written_names() {
        assert!(unlinked.contains(&name), "{} was never unlinked", name);
    }
    assert!(unlinked.iter().any(|n| n.starts_with("output-")));
}

#[tokio::test]
async fn test_metrics_surface_savings() {
    let (_, mut session) = harness(ScriptedEngine::new().with_run_output(vec![0u8; 4_000_000]));

    let input = vec![0u8; 10_000_000];
    session
        .start("big.mp4", &input, &crf_settings(23))
        .await
        .unwrap();

    let metrics = session.metrics().unwrap();
    assert_eq!(metrics.original_size, 10_000_000);
    assert_eq!(metrics.compressed_size, 4_000_000);
    assert_eq!(metrics.savings_percent, 60);
}

#[tokio::test]
async fn test_metrics_surface_negative_savings_when_output_grew() {
    let (_, mut session) = harness(ScriptedEngine::new().with_run_output(vec![0u8; 1_200_000]));

    let input = vec![0u8; 1_000_000];
    session
        .start("tiny.mp4", &input, &crf_settings(23))
        .await
        .unwrap();

    assert_eq!(session.metrics().unwrap().savings_percent, -20);
}

#[tokio::test]
async fn test_run_failure_ends_failed_and_unlinks_staged_files() {
    let (engine, mut session) =
        harness(ScriptedEngine::new().with_failing_run("codec exploded mid-run"));

    let result = session
        .start("doomed.mp4", b"source bytes", &crf_settings(23))
        .await;

    assert!(matches!(result, Err(SqueezeError::Encode { .. })));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session
        .error_message()
        .unwrap()
        .contains("codec exploded mid-run"));
    assert!(session.artifact().is_none());

    // Every virtual file staged via write_file has a matching unlink
    let unlinked = engine.unlinked_names();
    for name in engine.written_names() {
        assert!(unlinked.contains(&name), "{} was never unlinked", name);
    }
}

#[tokio::test]
async fn test_progress_reflects_events_delivered_before_failure() {
    let (_, mut session) = harness(
        ScriptedEngine::new()
            .with_run_progress(vec![0.25, 0.5])
            .with_failing_run("ran out of frames"),
    );

    let result = session
        .start("clip.mp4", b"source bytes", &crf_settings(23))
        .await;

    assert!(result.is_err());
    // The ratios emitted before the run failed were folded in; the session
    // never fabricates a terminal 100 on failure
    assert_eq!(session.progress(), 50);
}

#[tokio::test]
async fn test_engine_load_failure_surfaces_and_session_fails() {
    let (engine, mut session) =
        harness(ScriptedEngine::new().with_failing_load("wasm core unreachable"));

    let result = session
        .start("clip.mp4", b"source bytes", &crf_settings(23))
        .await;

    assert!(matches!(result, Err(SqueezeError::EngineLoad { .. })));
    assert_eq!(session.state(), SessionState::Failed);
    // Nothing was staged before the load failed
    assert!(engine.written_names().is_empty());
}

#[tokio::test]
async fn test_dispose_twice_releases_each_handle_at_most_once() {
    let (engine, mut session) = harness(ScriptedEngine::new().with_failing_run("boom"));

    let _ = session
        .start("clip.mp4", b"source bytes", &crf_settings(23))
        .await;
    let releases_after_failure = engine.unlinked_names().len();

    session.dispose().await;
    session.dispose().await;

    // The terminal transition already drained the tracker; dispose finds
    // nothing left and never double-frees
    assert_eq!(engine.unlinked_names().len(), releases_after_failure);
}

#[tokio::test]
async fn test_overlapping_sessions_serialize_on_one_engine() {
    let engine = Arc::new(ScriptedEngine::new());
    let manager = Arc::new(EngineLifecycleManager::new(
        Arc::clone(&engine) as Arc<dyn vidsqueeze::EnginePort>
    ));

    let m1 = Arc::clone(&manager);
    let first = tokio::spawn(async move {
        let mut session = TranscodeSession::new(m1);
        session
            .start("one.mp4", b"source bytes", &crf_settings(23))
            .await
            .map(|_| session.state())
    });
    let m2 = Arc::clone(&manager);
    let second = tokio::spawn(async move {
        let mut session = TranscodeSession::new(m2);
        session
            .start("two.mp4", b"source bytes", &crf_settings(23))
            .await
            .map(|_| session.state())
    });

    assert_eq!(first.await.unwrap().unwrap(), SessionState::Complete);
    assert_eq!(second.await.unwrap().unwrap(), SessionState::Complete);

    // One engine, one load, two queued runs with distinct session names
    assert_eq!(engine.load_calls(), 1);
    let runs = engine.run_invocations();
    assert_eq!(runs.len(), 2);
    assert_ne!(runs[0][1], runs[1][1]);
}
