//! Hardware decoding detection and configuration.
//!
//! This module is only about hardware DECODING of the input; the blackframe
//! classification itself always runs in software. Currently `VideoToolbox`
//! on macOS is the only platform decoder selected explicitly; elsewhere a
//! forced hardware request hands selection to the engine's own `auto` mode.

use std::env;

use crate::config::DecodeAccel;

/// Checks if the current platform is macOS.
#[must_use]
pub fn is_macos() -> bool {
    env::consts::OS == "macos"
}

/// Checks if platform hardware decoding is known to be available.
#[must_use]
pub fn is_hardware_decoding_available() -> bool {
    is_macos()
}

/// `FFmpeg` hardware decoding arguments for the current platform.
///
/// Must be placed BEFORE the input file on the command line.
#[must_use]
pub fn hwaccel_args() -> Vec<String> {
    if is_macos() {
        vec!["-hwaccel".to_string(), "videotoolbox".to_string()]
    } else {
        vec!["-hwaccel".to_string(), "auto".to_string()]
    }
}

/// Resolves a decode acceleration mode to a concrete launch decision.
///
/// `Auto` uses hardware only where the platform is known-good; `Hardware`
/// forces the request and relies on the session's one-shot software
/// fallback if the engine rejects it.
#[must_use]
pub fn resolve_use_hwaccel(mode: DecodeAccel) -> bool {
    match mode {
        DecodeAccel::Auto => is_hardware_decoding_available(),
        DecodeAccel::Hardware => true,
        DecodeAccel::None => false,
    }
}
