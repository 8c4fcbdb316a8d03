//! Partial-line-safe splitting of raw byte chunks.
//!
//! Both engine output channels arrive as arbitrary byte chunks. A line that
//! straddles two reads must be emitted exactly once, after its terminator
//! arrives, so the buffer retains any trailing partial line between pushes.

/// Incremental line splitter over a byte stream.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the complete lines it unlocked.
    ///
    /// Lines are split on `\n` with a trailing `\r` stripped; empty lines
    /// are dropped. UTF-8 decoding happens per complete line, so multi-byte
    /// sequences split across chunks survive intact.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.pending[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if !line.is_empty() {
                lines.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Drains the trailing partial line, if any, at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let mut tail = std::mem::take(&mut self.pending);
        if tail.last() == Some(&b'\r') {
            tail.pop();
        }
        if tail.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&tail).into_owned())
        }
    }
}
