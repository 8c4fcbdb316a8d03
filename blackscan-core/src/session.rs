//! Per-file analysis session.
//!
//! Owns one file's full lifecycle: launch the engine, stream and parse both
//! output channels, aggregate hits, and finalize into an immutable result.
//! Cancellation and the one-shot hardware-decode fallback are explicit
//! state transitions, never recursion.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::aggregate::{build_ranges, BlackRange, FrameHit};
use crate::config::DetectionConfig;
use crate::error::CoreError;
use crate::events::{Event, EventDispatcher};
use crate::external::ffmpeg::{spawn_blackframe, EngineMessage};
use crate::external::ffprobe::{probe_media, MediaProbe};
use crate::hardware_decode::resolve_use_hwaccel;
use crate::parse::{DetectionEvent, DetectionParser, ProgressParser, ProgressUpdate};
use crate::time::frame_to_seconds;

/// Hit notifications are coalesced into batches no older than this.
pub const HIT_FLUSH_INTERVAL: Duration = Duration::from_millis(150);

/// A batch is flushed early once it reaches this many hits.
pub const HIT_FLUSH_MAX: usize = 500;

/// Poll interval for cancellation while waiting on process output.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// An accelerated launch that dies before reporting this much media time is
/// treated as an acceleration failure even without an explicit marker.
const EARLY_EXIT_WINDOW_SECS: f64 = 5.0;

/// Terminal status of a per-file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    Completed,
    Cancelled,
    Failed,
}

/// The finished record for one file. Immutable once produced.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub file_path: PathBuf,
    pub status: AnalysisStatus,
    pub hits: Vec<FrameHit>,
    pub ranges: Vec<BlackRange>,
    /// Present iff `status` is `Failed`.
    pub error_detail: Option<String>,
    pub duration_secs: Option<f64>,
}

/// Shared, idempotent cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Requesting twice has the same effect as once.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Launching,
    Streaming,
    Retrying,
    Cancelling,
    Finalizing,
    Failed,
}

enum Attempt {
    Done(AnalysisResult),
    RetryWithoutAccel,
}

/// Drives one file through the engine to a terminal [`AnalysisResult`].
pub struct AnalysisSession<'a> {
    file: &'a Path,
    config: &'a DetectionConfig,
    dispatcher: &'a EventDispatcher,
    cancel: CancelToken,
    state: SessionState,
}

impl<'a> AnalysisSession<'a> {
    #[must_use]
    pub fn new(
        file: &'a Path,
        config: &'a DetectionConfig,
        dispatcher: &'a EventDispatcher,
        cancel: CancelToken,
    ) -> Self {
        Self {
            file,
            config,
            dispatcher,
            cancel,
            state: SessionState::Idle,
        }
    }

    /// Runs the session to completion. Errors never escape: launch and
    /// decode failures fold into a `Failed` result so a batch can continue.
    pub fn run(mut self) -> AnalysisResult {
        self.set_state(SessionState::Launching);

        let probe = match probe_media(self.file) {
            Ok(probe) => probe,
            Err(err) => {
                // Not fatal: the session degrades to indeterminate progress
                // and engine-supplied timestamps.
                self.dispatcher.emit(Event::Warning {
                    message: format!("probe failed for {}: {err}", self.file.display()),
                });
                MediaProbe::default()
            }
        };

        let mut use_hwaccel = resolve_use_hwaccel(self.config.decode_accel);
        let mut retry_attempted = false;
        loop {
            match self.stream_once(probe, use_hwaccel, !retry_attempted) {
                Attempt::Done(result) => return result,
                Attempt::RetryWithoutAccel => {
                    info!(
                        "retrying {} with hardware decoding disabled",
                        self.file.display()
                    );
                    self.set_state(SessionState::Retrying);
                    use_hwaccel = false;
                    retry_attempted = true;
                }
            }
        }
    }

    /// One launch-and-stream attempt. Parser and aggregation state is local
    /// to the attempt, so a retry starts from scratch by construction.
    fn stream_once(&mut self, probe: MediaProbe, use_hwaccel: bool, retry_allowed: bool) -> Attempt {
        self.set_state(SessionState::Launching);
        let mut engine = match spawn_blackframe(self.file, self.config, use_hwaccel) {
            Ok(engine) => engine,
            Err(err) => {
                self.set_state(SessionState::Failed);
                let detail = match &err {
                    CoreError::CommandStart(..) => format!("configuration error: {err}"),
                    _ => err.to_string(),
                };
                return Attempt::Done(self.terminal(
                    AnalysisStatus::Failed,
                    Vec::new(),
                    Some(detail),
                    probe,
                ));
            }
        };
        self.set_state(SessionState::Streaming);

        let mut progress = ProgressParser::new(probe.duration_secs);
        let mut detection = DetectionParser::new();
        let mut hits: Vec<FrameHit> = Vec::new();
        let mut pending: Vec<FrameHit> = Vec::new();
        let mut last_flush = Instant::now();
        let mut stdout_closed = false;
        let mut stderr_closed = false;

        while !(stdout_closed && stderr_closed) {
            if self.cancel.is_cancelled() && self.state != SessionState::Cancelling {
                self.set_state(SessionState::Cancelling);
                engine.kill();
            }

            match engine.messages().recv_timeout(CANCEL_POLL) {
                Ok(EngineMessage::Stdout(chunk)) => {
                    self.publish_progress(progress.push_chunk(&chunk));
                }
                Ok(EngineMessage::Stderr(chunk)) => {
                    self.collect_hits(detection.push_chunk(&chunk), probe, &mut hits, &mut pending);
                }
                Ok(EngineMessage::StdoutClosed) => stdout_closed = true,
                Ok(EngineMessage::StderrClosed) => stderr_closed = true,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if !pending.is_empty()
                && (pending.len() >= HIT_FLUSH_MAX || last_flush.elapsed() >= HIT_FLUSH_INTERVAL)
            {
                self.flush_hits(&mut pending);
                last_flush = Instant::now();
            }
        }

        // End of stream: recover trailing partial lines, then flush.
        self.publish_progress(progress.finish());
        self.collect_hits(detection.finish(), probe, &mut hits, &mut pending);
        self.flush_hits(&mut pending);

        let status = match engine.wait() {
            Ok(status) => status,
            Err(err) => {
                self.set_state(SessionState::Failed);
                return Attempt::Done(self.terminal(
                    AnalysisStatus::Failed,
                    hits,
                    Some(format!("failed to reap engine process: {err}")),
                    probe,
                ));
            }
        };

        if self.state == SessionState::Cancelling {
            info!(
                "analysis cancelled for {} ({} hits kept)",
                self.file.display(),
                hits.len()
            );
            return Attempt::Done(self.terminal(AnalysisStatus::Cancelled, hits, None, probe));
        }

        if status.success() {
            self.set_state(SessionState::Finalizing);
            return Attempt::Done(self.terminal(AnalysisStatus::Completed, hits, None, probe));
        }

        let fallback_eligible = use_hwaccel
            && (detection.saw_hwaccel_failure()
                || progress.elapsed_secs() < EARLY_EXIT_WINDOW_SECS);
        if retry_allowed && fallback_eligible {
            return Attempt::RetryWithoutAccel;
        }

        self.set_state(SessionState::Failed);
        let detail = format!(
            "decode error: engine exited with {status}: {}",
            detection.stderr_tail().trim()
        );
        Attempt::Done(self.terminal(AnalysisStatus::Failed, hits, Some(detail), probe))
    }

    fn collect_hits(
        &self,
        events: Vec<DetectionEvent>,
        probe: MediaProbe,
        hits: &mut Vec<FrameHit>,
        pending: &mut Vec<FrameHit>,
    ) {
        for event in events {
            if let Some(last) = hits.last() {
                if event.frame < last.frame {
                    debug!(
                        "out-of-order frame index {} after {} in {}",
                        event.frame,
                        last.frame,
                        self.file.display()
                    );
                }
            }
            let time_secs = probe
                .fps
                .map(|fps| frame_to_seconds(event.frame, fps))
                .or(event.time_hint_secs);
            let hit = FrameHit {
                frame: event.frame,
                time_secs,
                pblack: event.pblack,
                pts: event.pts,
            };
            hits.push(hit.clone());
            pending.push(hit);
        }
    }

    fn publish_progress(&self, updates: Vec<ProgressUpdate>) {
        for update in updates {
            match update {
                ProgressUpdate::Fraction(fraction) => self.dispatcher.emit(Event::Progress {
                    file: self.file.to_path_buf(),
                    fraction: Some(fraction),
                }),
                ProgressUpdate::Indeterminate => self.dispatcher.emit(Event::Progress {
                    file: self.file.to_path_buf(),
                    fraction: None,
                }),
                ProgressUpdate::End => debug!("progress stream ended for {}", self.file.display()),
            }
        }
    }

    fn flush_hits(&self, pending: &mut Vec<FrameHit>) {
        if pending.is_empty() {
            return;
        }
        self.dispatcher.emit(Event::HitsBatch {
            file: self.file.to_path_buf(),
            hits: std::mem::take(pending),
        });
    }

    fn terminal(
        &self,
        status: AnalysisStatus,
        hits: Vec<FrameHit>,
        error_detail: Option<String>,
        probe: MediaProbe,
    ) -> AnalysisResult {
        if let Some(detail) = &error_detail {
            warn!("analysis failed for {}: {detail}", self.file.display());
        }
        let ranges = if self.config.group_ranges {
            build_ranges(&hits, self.config.min_run_length)
        } else {
            Vec::new()
        };
        AnalysisResult {
            file_path: self.file.to_path_buf(),
            status,
            hits,
            ranges,
            error_detail,
            duration_secs: probe.duration_secs,
        }
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!(
                "{}: session {:?} -> {:?}",
                self.file.display(),
                self.state,
                next
            );
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_idempotent() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        // Clones observe the same flag.
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }
}
