//! Incremental parsers for the engine's two output channels.

pub mod detection;
pub mod lines;
pub mod progress;

pub use detection::{parse_detection_line, DetectionEvent, DetectionParser};
pub use lines::LineBuffer;
pub use progress::{ProgressParser, ProgressUpdate};
