//! Incremental parser for the engine's `-progress` key=value stream.

use log::trace;

use super::lines::LineBuffer;

/// One progress observation from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Fractional completion in `[0, 1]`, available when total duration is
    /// known.
    Fraction(f64),
    /// Work is advancing but total duration is unknown.
    Indeterminate,
    /// The engine reported `progress=end`.
    End,
}

/// Parses the machine-readable progress channel.
///
/// Recognizes `out_time_us=` and the engine's mislabeled `out_time_ms=`
/// twin (both values are microseconds) plus the terminal `progress=end`
/// marker. Unknown keys are ignored.
#[derive(Debug)]
pub struct ProgressParser {
    lines: LineBuffer,
    duration_secs: Option<f64>,
    /// Last media position seen, in seconds.
    elapsed_secs: f64,
}

impl ProgressParser {
    #[must_use]
    pub fn new(duration_secs: Option<f64>) -> Self {
        Self {
            lines: LineBuffer::new(),
            duration_secs,
            elapsed_secs: 0.0,
        }
    }

    /// Seconds of media time reported so far. Used by the session to judge
    /// whether an abnormal exit happened early enough for hardware fallback.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Feeds a raw chunk and returns the updates it produced, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<ProgressUpdate> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Flushes any trailing partial line at end of stream.
    pub fn finish(&mut self) -> Vec<ProgressUpdate> {
        self.lines
            .finish()
            .and_then(|line| self.parse_line(&line))
            .into_iter()
            .collect()
    }

    fn parse_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        let (key, value) = line.split_once('=')?;
        match key.trim() {
            // Both keys carry microseconds; "out_time_ms" is a naming bug
            // in the engine itself.
            "out_time_us" | "out_time_ms" => {
                let micros: i64 = value.trim().parse().ok()?;
                self.elapsed_secs = micros.max(0) as f64 / 1_000_000.0;
                match self.duration_secs {
                    Some(duration) if duration > 0.0 => {
                        Some(ProgressUpdate::Fraction((self.elapsed_secs / duration).min(1.0)))
                    }
                    _ => Some(ProgressUpdate::Indeterminate),
                }
            }
            "progress" if value.trim() == "end" => Some(ProgressUpdate::End),
            other => {
                trace!("ignoring progress key {other}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_progress_from_microseconds() {
        let mut parser = ProgressParser::new(Some(10.0));
        let updates = parser.push_chunk(b"out_time_us=2500000\n");
        assert_eq!(updates, vec![ProgressUpdate::Fraction(0.25)]);
        assert!((parser.elapsed_secs() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn clamps_fraction_to_one() {
        let mut parser = ProgressParser::new(Some(1.0));
        let updates = parser.push_chunk(b"out_time_us=2500000\n");
        assert_eq!(updates, vec![ProgressUpdate::Fraction(1.0)]);
    }

    #[test]
    fn indeterminate_without_duration() {
        let mut parser = ProgressParser::new(None);
        let updates = parser.push_chunk(b"out_time_us=2500000\n");
        assert_eq!(updates, vec![ProgressUpdate::Indeterminate]);
    }

    #[test]
    fn mislabeled_ms_key_is_microseconds() {
        let mut parser = ProgressParser::new(Some(10.0));
        let updates = parser.push_chunk(b"out_time_ms=5000000\n");
        assert_eq!(updates, vec![ProgressUpdate::Fraction(0.5)]);
    }

    #[test]
    fn end_marker_and_unknown_keys() {
        let mut parser = ProgressParser::new(Some(10.0));
        let updates = parser.push_chunk(
            b"frame=120\nfps=240.5\nbitrate=N/A\nspeed=8.1x\nprogress=end\n",
        );
        assert_eq!(updates, vec![ProgressUpdate::End]);
    }

    #[test]
    fn value_split_across_reads() {
        let mut parser = ProgressParser::new(Some(10.0));
        assert!(parser.push_chunk(b"out_time_us=25").is_empty());
        let updates = parser.push_chunk(b"00000\n");
        assert_eq!(updates, vec![ProgressUpdate::Fraction(0.25)]);
    }

    #[test]
    fn trailing_partial_line_flushes_on_finish() {
        let mut parser = ProgressParser::new(Some(10.0));
        assert!(parser.push_chunk(b"out_time_us=2500000").is_empty());
        assert_eq!(parser.finish(), vec![ProgressUpdate::Fraction(0.25)]);
    }
}
