//! Pending output accumulation with incremental marker search

/// Position of the first occurrence of `needle` in `haystack`.
///
/// An empty needle matches at offset 0.
pub fn find_marker(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Output collected by a single read-until loop.
///
/// Grows monotonically up to `limit` bytes; anything past the limit is
/// dropped and the buffer reports itself full.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    data: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(limit.min(4096)),
            limit,
            truncated: false,
        }
    }

    /// Append a chunk and report whether `marker` is now present.
    ///
    /// Only the tail that could contain a new match is searched, so long
    /// outputs are not rescanned on every read.
    pub fn push(&mut self, chunk: &[u8], marker: Option<&[u8]>) -> bool {
        let previous = self.data.len();

        let room = self.limit.saturating_sub(previous);
        if chunk.len() > room {
            self.truncated = true;
        }
        self.data.extend_from_slice(&chunk[..chunk.len().min(room)]);

        match marker {
            Some(marker) => {
                let start = previous.saturating_sub(marker.len().saturating_sub(1));
                find_marker(&self.data[start..], marker).is_some()
            }
            None => false,
        }
    }

    /// Whether the output limit has been reached
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.limit
    }

    /// Whether bytes were dropped because of the limit
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
