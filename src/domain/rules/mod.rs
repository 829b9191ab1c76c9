// Domain rules - Compression heuristics and command planning

use crate::domain::model::{CompressionStrategy, ConversionSettings};

/// Best (numerically lowest) quality value the planner will emit
pub const QUALITY_BEST: u32 = 18;

/// Worst (numerically highest) quality value the planner will emit
pub const QUALITY_WORST: u32 = 51;

/// Reference ceiling for the filesize heuristic: targets at or above
/// 10 GB map to the best quality value.
const FILESIZE_CEILING_MB: f64 = 10_240.0;

/// Heuristic mappings from user-facing compression targets onto the
/// encoder's quality-value scale.
///
/// These are documented best-effort mappings, not exact size targets. They
/// guarantee boundedness within [QUALITY_BEST, QUALITY_WORST] and
/// monotonicity, nothing more.
pub struct QualityMapper;

impl QualityMapper {
    /// Map a target percentage of original quality (clamped to 1-100)
    /// linearly onto the quality range. 100% is best (18), approaching 0%
    /// is worst (51).
    pub fn percentage_to_quality(percentage: u32) -> u32 {
        let p = percentage.clamp(1, 100) as f64;
        let span = (QUALITY_WORST - QUALITY_BEST) as f64;
        (QUALITY_WORST as f64 - (p / 100.0) * span).round() as u32
    }

    /// Map a requested output size in megabytes onto the quality range with
    /// a logarithmic curve: very small targets approach the worst value,
    /// targets at or above the 10 GB ceiling approach the best.
    pub fn filesize_to_quality(target_mb: f64) -> u32 {
        let mb = if target_mb.is_finite() && target_mb > 1.0 {
            target_mb
        } else {
            1.0
        };
        let span = (QUALITY_WORST - QUALITY_BEST) as f64;
        let quality = QUALITY_WORST as f64 - span * (mb.ln() / FILESIZE_CEILING_MB.ln());
        (quality.round() as i64).clamp(QUALITY_BEST as i64, QUALITY_WORST as i64) as u32
    }

    /// Resolve the quality value for a strategy, if the strategy is
    /// quality-driven. Bitrate strategies carry no quality value.
    pub fn quality_for_strategy(strategy: &CompressionStrategy) -> Option<u32> {
        match strategy {
            CompressionStrategy::Bitrate { .. } => None,
            CompressionStrategy::Crf { value } => Some(*value),
            CompressionStrategy::Percentage { target } => {
                Some(Self::percentage_to_quality(*target))
            }
            CompressionStrategy::Filesize { target_mb } => {
                Some(Self::filesize_to_quality(*target_mb))
            }
        }
    }
}

/// Output-geometry derivation for the scale filter
pub struct ScalePlanner;

impl ScalePlanner {
    /// Build the scale filter expression for a requested width.
    ///
    /// Output width is bounded to the lesser of the requested width and the
    /// source width; '-2' lets the engine derive a height that preserves
    /// aspect ratio while staying even, as chroma subsampling requires.
    pub fn filter_expression(requested_width: u32) -> String {
        format!("scale='min({},iw)':'-2'", requested_width)
    }

    /// Compute the concrete output dimensions the filter expression resolves
    /// to for a known source. Height is rounded down to the nearest even
    /// number.
    pub fn scaled_dimensions(
        source_width: u32,
        source_height: u32,
        requested_width: u32,
    ) -> (u32, u32) {
        let out_width = requested_width.min(source_width).max(2);
        let ratio = out_width as f64 / source_width as f64;
        let out_height = (source_height as f64 * ratio).round() as u32;
        let out_height = (out_height & !1).max(2);
        (out_width, out_height)
    }
}

/// Pure translation from a settings record into the ordered engine argument
/// sequence. No I/O, no side effects; identical inputs always yield an
/// identical sequence.
pub struct CommandPlanner;

impl CommandPlanner {
    /// Build the full argument sequence for one encode.
    ///
    /// The output container is fixed to fast-start MP4 and the encoding
    /// preset to the balanced "medium" tradeoff; neither is user
    /// configurable.
    pub fn build_args(
        input_name: &str,
        output_name: &str,
        settings: &ConversionSettings,
    ) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        args.push("-i".to_string());
        args.push(input_name.to_string());

        args.push("-c:v".to_string());
        args.push(settings.video_codec.clone());
        args.push("-c:a".to_string());
        args.push(settings.audio_codec.clone());

        match &settings.strategy {
            CompressionStrategy::Bitrate { video_bitrate } => {
                args.push("-b:v".to_string());
                args.push(video_bitrate.clone());
            }
            strategy => {
                // Quality-driven strategies emit a CRF instead of a bitrate
                let quality = QualityMapper::quality_for_strategy(strategy)
                    .unwrap_or(CompressionStrategy::DEFAULT_CRF);
                args.push("-crf".to_string());
                args.push(quality.to_string());
            }
        }

        args.push("-b:a".to_string());
        args.push(settings.audio_bitrate.clone());

        args.push("-r".to_string());
        args.push(settings.frame_rate.to_string());

        args.push("-vf".to_string());
        args.push(ScalePlanner::filter_expression(settings.resolution.width));

        args.push("-preset".to_string());
        args.push("medium".to_string());

        args.push("-f".to_string());
        args.push("mp4".to_string());
        args.push("-movflags".to_string());
        args.push("+faststart".to_string());

        args.push(output_name.to_string());

        args
    }
}
