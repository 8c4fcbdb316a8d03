//! Detection configuration and validation.
//!
//! The core consumes this configuration; it does not own persistence or a
//! configuration file format. Defaults mirror the blackframe filter's
//! practical values for mixed codecs.

use crate::error::{CoreError, CoreResult};

/// Pixel format applied by the normalization stage before classification.
///
/// Always applied; the classification filter expects 8-bit 4:2:0 input
/// regardless of the source format.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Default minimum run length (single black frames are reported).
pub const DEFAULT_MIN_RUN_LENGTH: u32 = 1;

/// Decode acceleration mode for the analysis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeAccel {
    /// Use hardware decoding when the platform supports it.
    #[default]
    Auto,
    /// Request hardware decoding unconditionally. An acceleration-related
    /// early failure still falls back to software exactly once.
    Hardware,
    /// Software decoding only.
    None,
}

/// Named threshold/amount presets.
///
/// The project's documentation and its change log disagree on what
/// "Standard" means (32/98.00 vs 16/99.90), so both are exposed as named
/// presets rather than silently picking one as canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPreset {
    /// Practical near-black detection for most codecs: threshold 32, 98.00%.
    Standard,
    /// The stricter historical "Standard": threshold 16, 99.90%.
    Classic,
    /// Exact black only: threshold 0, 100.00%.
    Strict,
}

impl DetectionPreset {
    /// Luma threshold below which a pixel counts as black.
    #[must_use]
    pub fn threshold(self) -> u32 {
        match self {
            DetectionPreset::Standard => 32,
            DetectionPreset::Classic => 16,
            DetectionPreset::Strict => 0,
        }
    }

    /// Percentage of pixels that must be black for a frame to count.
    #[must_use]
    pub fn amount(self) -> f64 {
        match self {
            DetectionPreset::Standard => 98.00,
            DetectionPreset::Classic => 99.90,
            DetectionPreset::Strict => 100.00,
        }
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Luma threshold, 0-50. 0 = exact black.
    pub threshold: u32,
    /// Required black pixel percentage, 90.00-100.00.
    pub amount: f64,
    /// Minimum consecutive-frame run length for a range to qualify.
    pub min_run_length: u32,
    /// Whether to fold hits into contiguous ranges at all.
    pub group_ranges: bool,
    /// Decode acceleration mode.
    pub decode_accel: DecodeAccel,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig::from_preset(DetectionPreset::Standard)
    }
}

impl DetectionConfig {
    /// Creates a configuration from a named preset.
    #[must_use]
    pub fn from_preset(preset: DetectionPreset) -> Self {
        Self {
            threshold: preset.threshold(),
            amount: preset.amount(),
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
            group_ranges: true,
            decode_accel: DecodeAccel::Auto,
        }
    }

    /// Validates parameter ranges.
    pub fn validate(&self) -> CoreResult<()> {
        if self.threshold > 50 {
            return Err(CoreError::Config(format!(
                "threshold must be 0-50, got {}",
                self.threshold
            )));
        }
        if !(90.0..=100.0).contains(&self.amount) {
            return Err(CoreError::Config(format!(
                "amount must be 90.00-100.00, got {:.2}",
                self.amount
            )));
        }
        if self.min_run_length == 0 {
            return Err(CoreError::Config(
                "min_run_length must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
