//! Sequential batch coordination.
//!
//! Runs per-file sessions one at a time, isolates failures, and publishes
//! lifecycle events. The coordinator never aborts the batch because one
//! file failed; only cancellation stops it early.

use std::path::PathBuf;

use log::info;

use crate::config::DetectionConfig;
use crate::events::{Event, EventDispatcher};
use crate::session::{AnalysisResult, AnalysisSession, CancelToken};

/// Coarse lifecycle of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Running,
    Cancelling,
    Done,
}

/// Runs an ordered list of files through analysis, one session at a time.
pub struct BatchCoordinator {
    files: Vec<PathBuf>,
    config: DetectionConfig,
    cancel: CancelToken,
    status: BatchStatus,
    results: Vec<AnalysisResult>,
}

impl BatchCoordinator {
    #[must_use]
    pub fn new(files: Vec<PathBuf>, config: DetectionConfig) -> Self {
        Self {
            files,
            config,
            cancel: CancelToken::new(),
            status: BatchStatus::Idle,
            results: Vec::new(),
        }
    }

    /// The token that cancels the whole batch, including the file in flight.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Results accumulated so far, in file order.
    #[must_use]
    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    /// Processes every file in order and returns all per-file results.
    ///
    /// A failed file is recorded and the batch moves on. A cancelled batch
    /// stops before launching the next file; the in-flight session handles
    /// its own teardown and still yields a result.
    pub fn run(&mut self, dispatcher: &EventDispatcher) -> Vec<AnalysisResult> {
        self.status = BatchStatus::Running;
        let total = self.files.len();
        let files = std::mem::take(&mut self.files);

        for (index, file) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.status = BatchStatus::Cancelling;
                info!(
                    "batch cancelled after {} of {total} file(s)",
                    self.results.len()
                );
                break;
            }

            info!("analyzing {} ({}/{total})", file.display(), index + 1);
            dispatcher.emit(Event::FileStarted {
                index,
                total,
                file: file.clone(),
            });

            let session =
                AnalysisSession::new(file, &self.config, dispatcher, self.cancel.clone());
            let result = session.run();

            dispatcher.emit(Event::FileFinished {
                index,
                total,
                result: result.clone(),
            });
            self.results.push(result);
        }

        self.status = BatchStatus::Done;
        dispatcher.emit(Event::BatchFinished {
            results: self.results.clone(),
        });
        self.results.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_batch_starts_idle_with_no_results() {
        let batch = BatchCoordinator::new(Vec::new(), DetectionConfig::default());
        assert_eq!(batch.status(), BatchStatus::Idle);
        assert!(batch.results().is_empty());
    }

    #[test]
    fn empty_batch_finishes_immediately() {
        let mut batch = BatchCoordinator::new(Vec::new(), DetectionConfig::default());
        let dispatcher = EventDispatcher::new();
        let results = batch.run(&dispatcher);
        assert!(results.is_empty());
        assert_eq!(batch.status(), BatchStatus::Done);
    }
}
