//! Frame index / timestamp conversions.
//!
//! Every downstream record is time-coded through these helpers, so the
//! `HH:MM:SS.mmm` rendering here is the single source of truth for both
//! the result tables and the export encoders.

/// Converts a frame index to seconds given a frame rate.
#[must_use]
pub fn frame_to_seconds(frame: u64, fps: f64) -> f64 {
    frame as f64 / fps
}

/// Formats seconds as `HH:MM:SS.mmm`, rounded to the nearest millisecond.
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let ms = (seconds * 1000.0).round().max(0.0) as u64;
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}.{:03}", ms % 1000)
}

/// Parses a `HH:MM:SS.mmm` timestamp back to seconds.
///
/// Returns `None` for anything that is not exactly three colon-separated
/// fields with an optional fractional part on the last one.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let secs_part = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let secs: f64 = secs_part.parse().ok()?;
    if secs < 0.0 || secs >= 60.0 {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_milliseconds() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(0.92), "00:00:00.920");
        assert_eq!(format_timestamp(3661.5), "01:01:01.500");
        // Rounds to nearest millisecond
        assert_eq!(format_timestamp(1.23456), "00:00:01.235");
    }

    #[test]
    fn parses_what_it_formats() {
        for secs in [0.0, 0.001, 0.92, 59.999, 61.04, 3661.5, 86399.999] {
            let rendered = format_timestamp(secs);
            let parsed = parse_timestamp(&rendered).unwrap();
            assert!((parsed - secs).abs() < 0.001, "{secs} -> {rendered} -> {parsed}");
        }
    }

    #[test]
    fn frame_round_trip_within_one_frame() {
        // Formatting a frame's timestamp and reparsing it recovers the frame
        // index to within one frame duration.
        let fps = 29.97;
        for frame in [0u64, 1, 719, 100_000] {
            let rendered = format_timestamp(frame_to_seconds(frame, fps));
            let parsed = parse_timestamp(&rendered).unwrap();
            let recovered = parsed * fps;
            assert!((recovered - frame as f64).abs() < 1.0);
        }
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert_eq!(parse_timestamp("n/a"), None);
        assert_eq!(parse_timestamp("00:00"), None);
        assert_eq!(parse_timestamp("00:00:00:00"), None);
        assert_eq!(parse_timestamp("00:00:75.000"), None);
    }
}
