//! Core library for black frame analysis of video files using ffmpeg and ffprobe.
//!
//! This crate provides video file discovery, incremental parsing of the
//! engine's progress and detection output, frame-to-timestamp conversion,
//! grouping of hits into contiguous ranges, per-file analysis sessions with
//! a one-shot hardware-decode fallback, sequential batch coordination, and
//! CSV/JSON export of the results.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use blackscan_core::{BatchCoordinator, DetectionConfig, EventDispatcher};
//! use std::path::PathBuf;
//!
//! let config = DetectionConfig::default();
//! config.validate().unwrap();
//!
//! let files = blackscan_core::collect_video_files(&[PathBuf::from("/videos")]).unwrap();
//! let dispatcher = EventDispatcher::new();
//!
//! let mut batch = BatchCoordinator::new(files, config);
//! let results = batch.run(&dispatcher);
//! for result in &results {
//!     println!("{}: {} hits", result.file_path.display(), result.hits.len());
//! }
//! ```

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod export;
pub mod external;
pub mod hardware_decode;
pub mod parse;
pub mod session;
pub mod time;

// Re-exports for public API
pub use aggregate::{build_ranges, BlackRange, FrameHit, RangeBuilder};
pub use batch::{BatchCoordinator, BatchStatus};
pub use config::{DecodeAccel, DetectionConfig, DetectionPreset, DEFAULT_MIN_RUN_LENGTH};
pub use discovery::{collect_video_files, is_video_file, VIDEO_EXTENSIONS};
pub use error::{CoreError, CoreResult};
pub use events::{Event, EventDispatcher, EventHandler};
pub use export::{export_frames_csv, export_frames_json, export_ranges_csv, export_ranges_json};
pub use session::{
    AnalysisResult, AnalysisSession, AnalysisStatus, CancelToken, HIT_FLUSH_INTERVAL,
    HIT_FLUSH_MAX,
};
pub use time::{format_timestamp, frame_to_seconds, parse_timestamp};
