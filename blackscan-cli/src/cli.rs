// blackscan-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use blackscan_core::{CoreResult, DecodeAccel, DetectionConfig, DetectionPreset};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Blackscan: black frame analysis tool",
    long_about = "Scans video files for black frames using ffmpeg via the blackscan-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyzes video files or directories for black frames
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Input video files or directories (directories are scanned recursively)
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Detection preset selecting threshold and amount together
    #[arg(long, value_enum, default_value_t = PresetArg::Standard)]
    pub preset: PresetArg,

    /// Override: luma value below which a pixel counts as black (0-50)
    #[arg(long, value_name = "LUMA", value_parser = clap::value_parser!(u32).range(0..=50))]
    pub threshold: Option<u32>,

    /// Override: percentage of pixels that must be black (90.00-100.00)
    #[arg(long, value_name = "PERCENT")]
    pub amount: Option<f64>,

    /// Minimum consecutive black frames for a range to qualify
    #[arg(long = "min-run", value_name = "FRAMES", value_parser = clap::value_parser!(u32).range(1..))]
    pub min_run_length: Option<u32>,

    /// Report individual frames only; skip range grouping
    #[arg(long)]
    pub no_ranges: bool,

    /// Decode acceleration mode
    #[arg(long, value_enum, default_value_t = AccelArg::Auto)]
    pub hwaccel: AccelArg,

    // --- Exports ---
    /// Write detected frames to a CSV file
    #[arg(long, value_name = "PATH")]
    pub frames_csv: Option<PathBuf>,

    /// Write detected frames to a JSON file
    #[arg(long, value_name = "PATH")]
    pub frames_json: Option<PathBuf>,

    /// Write black ranges to a CSV file
    #[arg(long, value_name = "PATH")]
    pub ranges_csv: Option<PathBuf>,

    /// Write black ranges to a JSON file
    #[arg(long, value_name = "PATH")]
    pub ranges_json: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetArg {
    /// Practical near-black detection (threshold 32, amount 98.00)
    Standard,
    /// Stricter historical default (threshold 16, amount 99.90)
    Classic,
    /// Exact black only (threshold 0, amount 100.00)
    Strict,
}

impl From<PresetArg> for DetectionPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Standard => DetectionPreset::Standard,
            PresetArg::Classic => DetectionPreset::Classic,
            PresetArg::Strict => DetectionPreset::Strict,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelArg {
    /// Hardware decoding where the platform supports it
    Auto,
    /// Force a hardware decode request (falls back to software once)
    Hardware,
    /// Software decoding only
    None,
}

impl From<AccelArg> for DecodeAccel {
    fn from(arg: AccelArg) -> Self {
        match arg {
            AccelArg::Auto => DecodeAccel::Auto,
            AccelArg::Hardware => DecodeAccel::Hardware,
            AccelArg::None => DecodeAccel::None,
        }
    }
}

impl AnalyzeArgs {
    /// Resolves preset and individual overrides into a validated config.
    pub fn detection_config(&self) -> CoreResult<DetectionConfig> {
        let mut config = DetectionConfig::from_preset(self.preset.into());
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(amount) = self.amount {
            config.amount = amount;
        }
        if let Some(min_run) = self.min_run_length {
            config.min_run_length = min_run;
        }
        config.group_ranges = !self.no_ranges;
        config.decode_accel = self.hwaccel.into();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AnalyzeArgs {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Analyze(analyze) => analyze,
        }
    }

    #[test]
    fn defaults_follow_the_standard_preset() {
        let args = parse(&["blackscan", "analyze", "in.mkv"]);
        let config = args.detection_config().unwrap();
        assert_eq!(config.threshold, 32);
        assert!((config.amount - 98.0).abs() < f64::EPSILON);
        assert!(config.group_ranges);
    }

    #[test]
    fn overrides_beat_the_preset() {
        let args = parse(&[
            "blackscan", "analyze", "in.mkv", "--preset", "classic", "--threshold", "8",
            "--min-run", "3", "--no-ranges",
        ]);
        let config = args.detection_config().unwrap();
        assert_eq!(config.threshold, 8);
        assert!((config.amount - 99.9).abs() < 1e-9);
        assert_eq!(config.min_run_length, 3);
        assert!(!config.group_ranges);
    }

    #[test]
    fn out_of_range_amount_is_rejected() {
        let args = parse(&["blackscan", "analyze", "in.mkv", "--amount", "50.0"]);
        assert!(args.detection_config().is_err());
    }

    #[test]
    fn threshold_range_is_enforced_at_parse_time() {
        assert!(Cli::try_parse_from(["blackscan", "analyze", "in.mkv", "--threshold", "51"])
            .is_err());
        assert!(Cli::try_parse_from(["blackscan", "analyze", "in.mkv", "--min-run", "0"])
            .is_err());
    }
}
