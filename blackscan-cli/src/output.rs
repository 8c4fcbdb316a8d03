// blackscan-cli/src/output.rs
//
// Terminal rendering of pipeline events: one progress bar per file, a
// summary line when the file finishes, and pass-through warnings.

use std::sync::Mutex;
use std::time::Duration;

use blackscan_core::{AnalysisStatus, Event, EventHandler};
use indicatif::{ProgressBar, ProgressStyle};

/// Bar resolution; progress fractions map onto this many ticks.
const BAR_SCALE: u64 = 1000;

#[derive(Default)]
struct ReporterState {
    bar: Option<ProgressBar>,
    file_label: String,
    hits: usize,
}

/// Renders pipeline events for an interactive terminal.
#[derive(Default)]
pub struct TerminalReporter {
    state: Mutex<ReporterState>,
}

impl TerminalReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn create_progress_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(BAR_SCALE);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {percent}%")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

impl EventHandler for TerminalReporter {
    fn handle(&self, event: &Event) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            Event::FileStarted { index, total, file } => {
                let label = format!(
                    "[{}/{}] {}",
                    index + 1,
                    total,
                    file.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| file.display().to_string())
                );
                let bar = create_progress_bar(&label);
                state.file_label = label;
                state.hits = 0;
                state.bar = Some(bar);
            }
            Event::Progress { fraction, .. } => {
                if let (Some(bar), Some(fraction)) = (&state.bar, fraction) {
                    bar.set_position((fraction * BAR_SCALE as f64).round() as u64);
                }
                // Indeterminate progress keeps the spinner alive via the
                // steady tick; there is nothing to position.
            }
            Event::HitsBatch { hits, .. } => {
                state.hits += hits.len();
                let label = format!("{} ({} black)", state.file_label, state.hits);
                if let Some(bar) = &state.bar {
                    bar.set_message(label);
                }
            }
            Event::FileFinished { result, .. } => {
                if let Some(bar) = state.bar.take() {
                    bar.finish_and_clear();
                }
                let name = result.file_path.display();
                match result.status {
                    AnalysisStatus::Completed => println!(
                        "✅ {}: {} black frame(s), {} range(s)",
                        name,
                        result.hits.len(),
                        result.ranges.len()
                    ),
                    AnalysisStatus::Cancelled => println!(
                        "🛑 {}: cancelled after {} black frame(s)",
                        name,
                        result.hits.len()
                    ),
                    AnalysisStatus::Failed => println!(
                        "❌ {}: {}",
                        name,
                        result.error_detail.as_deref().unwrap_or("analysis failed")
                    ),
                }
            }
            Event::BatchFinished { .. } => {}
            Event::Warning { message } => {
                if let Some(bar) = &state.bar {
                    bar.println(format!("⚠️  {message}"));
                } else {
                    eprintln!("⚠️  {message}");
                }
            }
        }
    }
}
