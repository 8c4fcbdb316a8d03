//! External tool integration: the ffmpeg analysis engine and ffprobe.

pub mod ffmpeg;
pub mod ffprobe;

pub use ffmpeg::{
    build_blackframe_args, is_hwaccel_failure, spawn_blackframe, EngineMessage, EngineProcess,
    FFMPEG_ENV,
};
pub use ffprobe::{probe_media, MediaProbe};
