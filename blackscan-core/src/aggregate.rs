//! Frame hit collection and contiguous-range folding.
//!
//! Hits are kept in ingestion order, exactly one per reported detection
//! event. Range folding is a pure function of the ordered hit sequence and
//! the minimum run length; the incremental [`RangeBuilder`] exists for live
//! feedback and produces the same ranges as [`build_ranges`] over the
//! finished sequence.

use log::debug;

/// One detected black frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHit {
    pub frame: u64,
    /// Timestamp in seconds: `frame / fps` when the frame rate is known,
    /// otherwise the engine's own `t:` hint.
    pub time_secs: Option<f64>,
    /// Percentage of pixels classified black, `[0, 100]`.
    pub pblack: Option<f64>,
    /// Presentation timestamp as reported by the engine.
    pub pts: Option<i64>,
}

/// A maximal run of contiguous black frames with length >= the configured
/// minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackRange {
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_time_secs: Option<f64>,
    pub end_time_secs: Option<f64>,
    pub length_frames: u64,
    pub avg_pblack: Option<f64>,
    pub min_pblack: Option<f64>,
}

/// Incrementally folds an ordered hit sequence into qualifying ranges.
#[derive(Debug)]
pub struct RangeBuilder {
    min_run_length: u32,
    current_run: Vec<FrameHit>,
    ranges: Vec<BlackRange>,
}

impl RangeBuilder {
    #[must_use]
    pub fn new(min_run_length: u32) -> Self {
        Self {
            min_run_length,
            current_run: Vec::new(),
            ranges: Vec::new(),
        }
    }

    /// Feeds the next hit in ingestion order.
    pub fn push(&mut self, hit: &FrameHit) {
        if let Some(last) = self.current_run.last() {
            if hit.frame == last.frame {
                // Misbehaving engines can repeat a frame index; the hit is
                // preserved and treated as a break in contiguity.
                debug!("duplicate detection for frame {}", hit.frame);
            }
            if hit.frame != last.frame + 1 {
                self.close_run();
            }
        }
        self.current_run.push(hit.clone());
    }

    /// Closes the final in-progress run and returns all qualifying ranges.
    #[must_use]
    pub fn finish(mut self) -> Vec<BlackRange> {
        self.close_run();
        self.ranges
    }

    /// Ranges closed so far, not counting the in-progress run.
    #[must_use]
    pub fn ranges(&self) -> &[BlackRange] {
        &self.ranges
    }

    fn close_run(&mut self) {
        if self.current_run.is_empty() {
            return;
        }
        let run = std::mem::take(&mut self.current_run);
        let start = &run[0];
        let end = &run[run.len() - 1];
        let length = end.frame - start.frame + 1;
        if length < u64::from(self.min_run_length) {
            return;
        }

        let pblacks: Vec<f64> = run.iter().filter_map(|h| h.pblack).collect();
        let avg_pblack = if pblacks.is_empty() {
            None
        } else {
            Some(pblacks.iter().sum::<f64>() / pblacks.len() as f64)
        };
        let min_pblack = pblacks.iter().copied().reduce(f64::min);

        self.ranges.push(BlackRange {
            start_frame: start.frame,
            end_frame: end.frame,
            start_time_secs: start.time_secs,
            end_time_secs: end.time_secs,
            length_frames: length,
            avg_pblack,
            min_pblack,
        });
    }
}

/// Folds a finished hit sequence into ranges in one pass.
///
/// Order-preserving: the grouping is a pure function of the sequence as
/// given, so out-of-order input yields the same runs the incremental
/// builder would have produced.
#[must_use]
pub fn build_ranges(hits: &[FrameHit], min_run_length: u32) -> Vec<BlackRange> {
    let mut builder = RangeBuilder::new(min_run_length);
    for hit in hits {
        builder.push(hit);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(frame: u64) -> FrameHit {
        FrameHit {
            frame,
            time_secs: Some(frame as f64 / 25.0),
            pblack: Some(100.0),
            pts: None,
        }
    }

    fn hit_pblack(frame: u64, pblack: f64) -> FrameHit {
        FrameHit {
            pblack: Some(pblack),
            ..hit(frame)
        }
    }

    #[test]
    fn contiguous_run_becomes_one_range() {
        let hits = [hit(5), hit(6), hit(7)];
        let ranges = build_ranges(&hits, 2);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_frame, 5);
        assert_eq!(ranges[0].end_frame, 7);
        assert_eq!(ranges[0].length_frames, 3);
    }

    #[test]
    fn short_run_is_discarded() {
        let ranges = build_ranges(&[hit(10)], 2);
        assert!(ranges.is_empty());
    }

    #[test]
    fn min_run_one_keeps_singletons() {
        let ranges = build_ranges(&[hit(10)], 1);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].length_frames, 1);
    }

    #[test]
    fn gap_splits_runs() {
        let hits = [hit(1), hit(2), hit(10), hit(11), hit(12)];
        let ranges = build_ranges(&hits, 2);
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].start_frame, ranges[0].end_frame), (1, 2));
        assert_eq!((ranges[1].start_frame, ranges[1].end_frame), (10, 12));
    }

    #[test]
    fn ranges_are_ordered_and_disjoint() {
        let hits: Vec<FrameHit> =
            [3, 4, 5, 9, 20, 21, 22, 23, 40].iter().map(|&f| hit(f)).collect();
        let ranges = build_ranges(&hits, 2);
        for pair in ranges.windows(2) {
            assert!(pair[0].end_frame < pair[1].start_frame);
        }
    }

    #[test]
    fn incremental_equals_batch() {
        let sequences: Vec<Vec<u64>> = vec![
            vec![],
            vec![0],
            vec![5, 6, 7],
            vec![1, 2, 4, 5, 6, 9],
            vec![7, 7, 8], // duplicate frame index preserved upstream
            vec![10, 9, 8], // out-of-order from a misbehaving engine
            vec![0, 1, 2, 100, 101, 300],
        ];
        for seq in sequences {
            for min_run in 1..=3 {
                let hits: Vec<FrameHit> = seq.iter().map(|&f| hit(f)).collect();
                let batch = build_ranges(&hits, min_run);
                let mut builder = RangeBuilder::new(min_run);
                for h in &hits {
                    builder.push(h);
                }
                assert_eq!(builder.finish(), batch, "seq {seq:?} min_run {min_run}");
            }
        }
    }

    #[test]
    fn aggregates_pblack_statistics() {
        let hits = [
            hit_pblack(1, 100.0),
            hit_pblack(2, 98.0),
            hit_pblack(3, 96.0),
        ];
        let ranges = build_ranges(&hits, 1);
        assert_eq!(ranges.len(), 1);
        assert!((ranges[0].avg_pblack.unwrap() - 98.0).abs() < 1e-9);
        assert!((ranges[0].min_pblack.unwrap() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn pblack_statistics_absent_without_samples() {
        let hits = [FrameHit {
            frame: 1,
            time_secs: None,
            pblack: None,
            pts: None,
        }];
        let ranges = build_ranges(&hits, 1);
        assert_eq!(ranges[0].avg_pblack, None);
        assert_eq!(ranges[0].min_pblack, None);
    }
}
