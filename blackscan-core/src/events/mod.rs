//! Consumer-facing notification events.
//!
//! The pipeline publishes its progress and results through an
//! [`EventDispatcher`]; consumers (a CLI renderer, a GUI table, a test
//! collector) register [`EventHandler`]s and never poll shared state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregate::FrameHit;
use crate::session::AnalysisResult;

#[derive(Debug, Clone)]
pub enum Event {
    /// A file at `index` (0-based) of `total` began processing.
    FileStarted {
        index: usize,
        total: usize,
        file: PathBuf,
    },

    /// Fractional completion for the file currently streaming.
    /// `fraction` is `None` when total duration is unknown (indeterminate).
    Progress {
        file: PathBuf,
        fraction: Option<f64>,
    },

    /// A coalesced batch of newly detected black frames, in detection order.
    HitsBatch {
        file: PathBuf,
        hits: Vec<FrameHit>,
    },

    /// A file reached a terminal state; carries its full result.
    FileFinished {
        index: usize,
        total: usize,
        result: AnalysisResult,
    },

    /// The whole queue finished (or was cancelled); carries every per-file
    /// result accumulated so far.
    BatchFinished { results: Vec<AnalysisResult> },

    /// Non-fatal condition worth surfacing (probe failure, parse anomaly).
    Warning { message: String },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
