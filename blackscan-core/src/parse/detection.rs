//! Incremental parser for blackframe detection records in the engine's
//! diagnostic stream.
//!
//! The diagnostic channel interleaves detection lines with unrelated log
//! noise by design; anything that does not match the detection record shape
//! is skipped silently. A tail of recent diagnostic lines is retained for
//! error reporting, and acceleration-failure markers are flagged for the
//! session's fallback decision.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::external::ffmpeg::is_hwaccel_failure;

use super::lines::LineBuffer;

// Example record:
// [Parsed_blackframe_0 @ ...] frame:23 pblack:100 pts:27600 t:0.920000 type:I last_keyframe:0
static BLACKFRAME_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Parsed_blackframe.*?\bframe:(?P<frame>\d+)(?:.*?\bpblack:(?P<pblack>\d+(?:\.\d+)?))?(?:.*?\bpts:(?P<pts>\d+))?(?:.*?\bt:(?P<t>\d+(?:\.\d+)?))?",
    )
    .unwrap()
});

/// Number of diagnostic lines kept for failure reporting.
const STDERR_TAIL_LINES: usize = 40;

/// One per-frame detection record as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    pub frame: u64,
    pub pblack: Option<f64>,
    pub pts: Option<i64>,
    /// Timestamp hint from the engine's own `t:` field, in seconds.
    pub time_hint_secs: Option<f64>,
}

/// Parses a single diagnostic line into a detection event, if it is one.
#[must_use]
pub fn parse_detection_line(line: &str) -> Option<DetectionEvent> {
    let caps = BLACKFRAME_LINE_RE.captures(line)?;
    let frame = caps.name("frame")?.as_str().parse().ok()?;
    Some(DetectionEvent {
        frame,
        pblack: caps.name("pblack").and_then(|m| m.as_str().parse().ok()),
        pts: caps.name("pts").and_then(|m| m.as_str().parse().ok()),
        time_hint_secs: caps.name("t").and_then(|m| m.as_str().parse().ok()),
    })
}

/// Incremental detection parser over the diagnostic byte stream.
#[derive(Debug, Default)]
pub struct DetectionParser {
    lines: LineBuffer,
    tail: VecDeque<String>,
    hwaccel_failure: bool,
}

impl DetectionParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a raw chunk and returns detection events in stream order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<DetectionEvent> {
        let lines = self.lines.push(chunk);
        lines.iter().filter_map(|l| self.consume_line(l)).collect()
    }

    /// Flushes the trailing partial line at end of stream. The engine does
    /// not always terminate its last diagnostic line before exiting.
    pub fn finish(&mut self) -> Vec<DetectionEvent> {
        self.lines
            .finish()
            .and_then(|line| self.consume_line(&line))
            .into_iter()
            .collect()
    }

    /// Whether a decode-acceleration failure marker appeared in diagnostics.
    #[must_use]
    pub fn saw_hwaccel_failure(&self) -> bool {
        self.hwaccel_failure
    }

    /// Recent diagnostic lines, newest last, for error detail.
    #[must_use]
    pub fn stderr_tail(&self) -> String {
        self.tail.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    fn consume_line(&mut self, line: &str) -> Option<DetectionEvent> {
        if self.tail.len() == STDERR_TAIL_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line.to_string());

        if is_hwaccel_failure(line) {
            self.hwaccel_failure = true;
        }
        parse_detection_line(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "[Parsed_blackframe_0 @ 0x7f8] frame:23 pblack:100 pts:27600 t:0.920000 type:I last_keyframe:0";

    #[test]
    fn parses_full_record() {
        let event = parse_detection_line(SAMPLE).unwrap();
        assert_eq!(event.frame, 23);
        assert_eq!(event.pblack, Some(100.0));
        assert_eq!(event.pts, Some(27600));
        assert_eq!(event.time_hint_secs, Some(0.92));
    }

    #[test]
    fn parses_record_with_fractional_pblack() {
        let line = "[Parsed_blackframe_0 @ 0x1] frame:7 pblack:98.75 pts:700 t:0.280000";
        let event = parse_detection_line(line).unwrap();
        assert_eq!(event.frame, 7);
        assert_eq!(event.pblack, Some(98.75));
    }

    #[test]
    fn skips_log_noise() {
        assert!(parse_detection_line("Input #0, mov,mp4, from 'clip.mp4':").is_none());
        assert!(parse_detection_line("frame:12 without the filter tag").is_none());
        assert!(parse_detection_line("").is_none());
    }

    #[test]
    fn streams_events_in_order_across_chunk_splits() {
        let mut parser = DetectionParser::new();
        let mut events = parser.push_chunk(
            b"[Parsed_blackframe_0 @ 0x1] frame:5 pblack:100 pts:500 t:0.200000\nnoise line\n[Parsed_blackframe_0 @ 0x1] frame:6 pbl",
        );
        events.extend(parser.push_chunk(b"ack:99.5 pts:600 t:0.240000\n"));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].frame, 5);
        assert_eq!(events[1].frame, 6);
        assert_eq!(events[1].pblack, Some(99.5));
    }

    #[test]
    fn finish_recovers_unterminated_record() {
        let mut parser = DetectionParser::new();
        assert!(parser
            .push_chunk(b"[Parsed_blackframe_0 @ 0x1] frame:9 pblack:100 pts:900 t:0.360000")
            .is_empty());
        let events = parser.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame, 9);
    }

    #[test]
    fn flags_hwaccel_failure_markers() {
        let mut parser = DetectionParser::new();
        parser.push_chunk(b"Failed setup for format videotoolbox_vld: hwaccel initialisation returned error.\n");
        assert!(parser.saw_hwaccel_failure());
        assert!(parser.stderr_tail().contains("Failed setup"));
    }

    #[test]
    fn keeps_bounded_tail() {
        let mut parser = DetectionParser::new();
        for i in 0..100 {
            parser.push_chunk(format!("line {i}\n").as_bytes());
        }
        let tail = parser.stderr_tail();
        assert!(!tail.contains("line 59"));
        assert!(tail.contains("line 60"));
        assert!(tail.contains("line 99"));
    }
}
