//! FFprobe integration for media metadata.
//!
//! The session only needs two numbers from the probe: total duration (for
//! determinate progress) and the frame rate (for frame-to-timestamp
//! conversion). Either may be unknown; the pipeline degrades to
//! indeterminate progress and engine-supplied timestamp hints.

use std::path::Path;

use ffprobe::{ffprobe, FfProbeError};
use log::{debug, warn};

use crate::error::{command_failed_error, command_start_error, CoreError, CoreResult};

/// Metadata relevant to an analysis run.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaProbe {
    /// Total duration in seconds, if reported.
    pub duration_secs: Option<f64>,
    /// Frames per second of the first video stream, if reported.
    pub fps: Option<f64>,
}

/// Probes duration and frame rate for a given input file.
pub fn probe_media(input_path: &Path) -> CoreResult<MediaProbe> {
    debug!(
        "Running ffprobe (via crate) for duration/fps on: {}",
        input_path.display()
    );
    match ffprobe(input_path) {
        Ok(metadata) => {
            let duration_secs = metadata
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .filter(|d| *d > 0.0);

            let fps = metadata
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
                .and_then(|s| {
                    parse_frame_rate(&s.avg_frame_rate).or_else(|| parse_frame_rate(&s.r_frame_rate))
                });

            if duration_secs.is_none() {
                warn!(
                    "No duration reported for {}; progress will be indeterminate",
                    input_path.display()
                );
            }

            Ok(MediaProbe { duration_secs, fps })
        }
        Err(err) => {
            warn!(
                "ffprobe failed for {}: {:?}",
                input_path.display(),
                err
            );
            Err(map_ffprobe_error(err))
        }
    }
}

/// Parses a `num/den` frame rate fraction. `0/0` means unknown.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        None
    } else {
        Some(num / den)
    }
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error("ffprobe", output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::JsonParse(format!("ffprobe output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error: {err:?}")),
    }
}
