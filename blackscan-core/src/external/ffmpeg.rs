//! FFmpeg invocation for blackframe analysis.
//!
//! Builds the two-stage filter command (pixel-format normalization, then
//! blackframe classification), launches the engine non-blocking, and
//! forwards its raw output as messages so the session can parse both
//! channels incrementally without ever blocking on process I/O.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::debug;

use crate::config::{DetectionConfig, PIXEL_FORMAT};
use crate::error::{command_start_error, CoreResult};
use crate::hardware_decode::hwaccel_args;

/// Environment override for the ffmpeg executable path.
pub const FFMPEG_ENV: &str = "BLACKSCAN_FFMPEG";

const READ_CHUNK_BYTES: usize = 8192;

/// Resolves the ffmpeg executable: env override, else PATH.
#[must_use]
pub fn ffmpeg_tool() -> String {
    std::env::var(FFMPEG_ENV).unwrap_or_else(|_| "ffmpeg".to_string())
}

/// Raw output from the engine process, in per-channel arrival order.
#[derive(Debug)]
pub enum EngineMessage {
    /// Bytes from the progress channel (stdout).
    Stdout(Vec<u8>),
    /// Bytes from the diagnostic channel (stderr).
    Stderr(Vec<u8>),
    StdoutClosed,
    StderrClosed,
}

/// A running analysis engine: the child process plus its message stream.
pub struct EngineProcess {
    child: Child,
    receiver: Receiver<EngineMessage>,
}

impl EngineProcess {
    /// The message channel carrying both output streams.
    #[must_use]
    pub fn messages(&self) -> &Receiver<EngineMessage> {
        &self.receiver
    }

    /// Requests process termination. Safe to call more than once.
    pub fn kill(&mut self) {
        let _ = self.child.kill();
    }

    /// Waits for the process to exit and returns its status.
    pub fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait()
    }
}

/// Builds the full argument list for a blackframe analysis pass.
#[must_use]
pub fn build_blackframe_args(
    input: &Path,
    config: &DetectionConfig,
    use_hwaccel: bool,
) -> Vec<String> {
    let filter = format!(
        "format={PIXEL_FORMAT},blackframe=amount={:.2}:threshold={}",
        config.amount, config.threshold
    );

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostats".into(),
        "-nostdin".into(),
        "-loglevel".into(),
        "info".into(),
    ];
    if use_hwaccel {
        args.extend(hwaccel_args());
    }
    args.extend([
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-an".into(),
        "-sn".into(),
        "-dn".into(),
        "-vf".into(),
        filter,
        // Progress key=value stream on stdout; diagnostics stay on stderr.
        "-progress".into(),
        "pipe:1".into(),
        "-f".into(),
        "null".into(),
        "-".into(),
    ]);
    args
}

/// Launches the analysis engine for one file.
///
/// Two reader threads forward raw chunks from stdout and stderr over the
/// returned channel; each signals channel closure on EOF. The caller owns
/// the child for kill/wait.
pub fn spawn_blackframe(
    input: &Path,
    config: &DetectionConfig,
    use_hwaccel: bool,
) -> CoreResult<EngineProcess> {
    let tool = ffmpeg_tool();
    let args = build_blackframe_args(input, config, use_hwaccel);
    debug!("spawning {tool} {args:?}");

    let mut child = Command::new(&tool)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(tool, e))?;

    let (sender, receiver) = mpsc::channel();

    // Pipes are present: both were requested above.
    let stdout = child.stdout.take().expect("stdout piped");
    let stderr = child.stderr.take().expect("stderr piped");

    let stdout_sender = sender.clone();
    thread::spawn(move || {
        forward_stream(stdout, EngineMessage::Stdout, &stdout_sender);
        let _ = stdout_sender.send(EngineMessage::StdoutClosed);
    });
    thread::spawn(move || {
        forward_stream(stderr, EngineMessage::Stderr, &sender);
        let _ = sender.send(EngineMessage::StderrClosed);
    });

    Ok(EngineProcess { child, receiver })
}

fn forward_stream<R: Read>(
    mut reader: R,
    wrap: impl Fn(Vec<u8>) -> EngineMessage,
    sender: &mpsc::Sender<EngineMessage>,
) {
    let mut buf = [0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if sender.send(wrap(buf[..n].to_vec())).is_err() {
                    // Receiver dropped: the session is gone, stop reading.
                    break;
                }
            }
        }
    }
}

/// Determines whether a diagnostic line marks a decode-acceleration failure.
///
/// Seeing one of these while accelerated makes an abnormal exit eligible
/// for the one-shot software fallback.
#[must_use]
pub fn is_hwaccel_failure(line: &str) -> bool {
    line.contains("Failed setup for format")
        || line.contains("hwaccel initialisation returned error")
        || line.contains("Device creation failed")
        || line.contains("No device available for decoder")
        || line.contains("Hardware acceleration method")
        || line.contains("does not support hardware")
}
