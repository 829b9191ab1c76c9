//! Property tests for the compression heuristics and the args translator

use proptest::prelude::*;

use vidsqueeze::domain::rules::{CommandPlanner, QualityMapper, ScalePlanner};
use vidsqueeze::{CompressionStrategy, ConversionSettings, Resolution};

proptest! {
    /// Percentage targets always map into [18, 51]
    #[test]
    fn percentage_quality_in_range(p in 1u32..=100) {
        let quality = QualityMapper::percentage_to_quality(p);
        prop_assert!((18..=51).contains(&quality));
    }

    /// A higher target percentage never produces a worse quality value
    #[test]
    fn percentage_quality_monotonic(a in 1u32..=100, b in 1u32..=100) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            QualityMapper::percentage_to_quality(high)
                <= QualityMapper::percentage_to_quality(low)
        );
    }

    /// Filesize targets are clamped into [18, 51] however extreme
    #[test]
    fn filesize_quality_in_range(mb in 0.001f64..10_000_000.0) {
        let quality = QualityMapper::filesize_to_quality(mb);
        prop_assert!((18..=51).contains(&quality));
    }

    /// A larger size budget never produces a worse quality value
    #[test]
    fn filesize_quality_monotonic(a in 0.001f64..10_000_000.0, b in 0.001f64..10_000_000.0) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            QualityMapper::filesize_to_quality(large)
                <= QualityMapper::filesize_to_quality(small)
        );
    }

    /// Scaled output height is even for any source geometry
    #[test]
    fn scaled_height_always_even(
        src_w in 2u32..8192,
        src_h in 2u32..8192,
        req_w in 2u32..8192,
    ) {
        let (out_w, out_h) = ScalePlanner::scaled_dimensions(src_w, src_h, req_w);
        prop_assert!(out_w <= src_w.max(2));
        prop_assert_eq!(out_h % 2, 0);
    }

    /// The args translator is referentially transparent: identical settings
    /// always yield an identical argument sequence
    #[test]
    fn build_args_deterministic(
        crf in 0u32..=63,
        width in 2u32..8192,
        height in 2u32..8192,
        frame_rate in 1u32..=120,
    ) {
        let settings = ConversionSettings {
            strategy: CompressionStrategy::Crf { value: crf },
            resolution: Resolution::new(width, height).unwrap(),
            frame_rate,
            ..ConversionSettings::default()
        };
        let first = CommandPlanner::build_args("input.mp4", "output.mp4", &settings);
        let second = CommandPlanner::build_args("input.mp4", "output.mp4", &settings);
        prop_assert_eq!(first, second);
    }
}
