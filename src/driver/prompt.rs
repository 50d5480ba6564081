//! Negotiated shell prompt
//!
//! The backend answers `::prompt on` with whatever it has buffered up to the
//! first `>`: sometimes a clean prompt, sometimes a banner followed by the
//! prompt, sometimes several prompts in a row. Normalization reduces that to
//! the single prompt line used as the end-of-output marker.

use crate::session::find_marker;
use std::fmt;

/// The backend's interactive prompt, as raw bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    bytes: Vec<u8>,
}

impl Prompt {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { bytes: raw.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// End-of-output marker; `None` while the prompt is unknown
    pub fn marker(&self) -> Option<&[u8]> {
        if self.bytes.is_empty() {
            None
        } else {
            Some(&self.bytes)
        }
    }

    /// Normalize in place against the prompt `delimiter` (normally `>`).
    ///
    /// 1. More than one delimiter: cut right after the first one.
    /// 2. Trailing line terminators are dropped.
    /// 3. Anything up to and including the last newline is dropped.
    pub fn normalize(&mut self, delimiter: &[u8]) {
        if !delimiter.is_empty() && count_occurrences(&self.bytes, delimiter) > 1 {
            if let Some(pos) = find_marker(&self.bytes, delimiter) {
                self.bytes.truncate(pos + delimiter.len());
            }
        }

        while matches!(self.bytes.last(), Some(b'\n') | Some(b'\r')) {
            self.bytes.pop();
        }

        if let Some(pos) = self.bytes.iter().rposition(|&b| b == b'\n') {
            self.bytes.drain(..=pos);
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

/// Non-overlapping occurrences of `needle` in `haystack`
fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    let mut count = 0;
    let mut rest = haystack;
    while let Some(pos) = find_marker(rest, needle) {
        count += 1;
        rest = &rest[pos + needle.len()..];
    }
    count
}
