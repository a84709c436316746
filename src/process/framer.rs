//! Line framing for raw stream bytes.
//!
//! Children do not always cooperate: prompts come without a trailing
//! newline, binary output has no newlines at all, and some programs print
//! megabyte-long lines. The framer turns arbitrary chunks into bounded,
//! displayable lines:
//!
//! - `\n` ends a line, a `\r` right before it is dropped;
//! - invalid UTF-8 is replaced lossily;
//! - a line longer than `max_line_bytes` is cut (on a char boundary when
//!   possible) and the rest continues as a new line;
//! - an unterminated tail is released by [`LineFramer::flush_stale`] once it
//!   has waited long enough, and by [`LineFramer::finish`] at end of stream.

use std::time::{Duration, Instant};

/// Default upper bound for a single line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024;

/// Splits a byte stream into lines.
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes of the current, unterminated line.
    pending: Vec<u8>,
    /// When the first byte of `pending` arrived.
    pending_since: Option<Instant>,
    /// Maximum bytes per emitted line.
    max_line_bytes: usize,
}

impl LineFramer {
    /// Create a framer. `max_line_bytes` is clamped to at least 4 so a
    /// single UTF-8 char always fits.
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::new(),
            pending_since: None,
            max_line_bytes: max_line_bytes.max(4),
        }
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, bytes: &[u8], now: Instant) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in bytes {
            if byte == b'\n' {
                if self.pending.last() == Some(&b'\r') {
                    self.pending.pop();
                }
                lines.push(self.take_pending());
                continue;
            }

            self.pending.push(byte);
            if self.pending.len() > self.max_line_bytes {
                let cut = self.split_point();
                let rest = self.pending.split_off(cut);
                lines.push(decode(&self.pending));
                self.pending = rest;
            }
        }

        if self.pending.is_empty() {
            self.pending_since = None;
        } else if self.pending_since.is_none() || !lines.is_empty() {
            self.pending_since = Some(now);
        }

        lines
    }

    /// Release the pending tail if it has waited at least `timeout`.
    pub fn flush_stale(&mut self, now: Instant, timeout: Duration) -> Option<String> {
        let since = self.pending_since?;
        if now.duration_since(since) >= timeout {
            Some(self.take_pending())
        } else {
            None
        }
    }

    /// Release whatever is pending; used at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take_pending())
        }
    }

    fn take_pending(&mut self) -> String {
        self.pending_since = None;
        let line = decode(&self.pending);
        self.pending.clear();
        line
    }

    /// Largest cut at or below the limit that does not split a UTF-8 char.
    fn split_point(&self) -> usize {
        let mut cut = self.max_line_bytes;
        while cut > 0 && is_continuation(self.pending[cut]) {
            cut -= 1;
        }
        if cut == 0 {
            self.max_line_bytes
        } else {
            cut
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

#[inline]
const fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framer_splits_lines() {
        let mut framer = LineFramer::default();
        let now = Instant::now();
        let lines = framer.push(b"one\ntwo\r\nthree", now);
        assert_eq!(lines, ["one", "two"]);
        assert_eq!(framer.finish().as_deref(), Some("three"));
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_framer_joins_across_chunks() {
        let mut framer = LineFramer::default();
        let now = Instant::now();
        assert!(framer.push(b"hel", now).is_empty());
        assert_eq!(framer.push(b"lo\n", now), ["hello"]);
    }

    #[test]
    fn test_framer_keeps_empty_lines() {
        let mut framer = LineFramer::default();
        assert_eq!(framer.push(b"\n\n", Instant::now()), ["", ""]);
    }

    #[test]
    fn test_framer_caps_line_length() {
        let mut framer = LineFramer::new(8);
        let lines = framer.push(b"abcdefghijkl\n", Instant::now());
        assert_eq!(lines, ["abcdefgh", "ijkl"]);
    }

    #[test]
    fn test_framer_cap_respects_char_boundaries() {
        let mut framer = LineFramer::new(5);
        // "aaaa" + 'é' (2 bytes) would be split inside 'é' at byte 5.
        let lines = framer.push("aaaaé\n".as_bytes(), Instant::now());
        assert_eq!(lines, ["aaaa", "é"]);
    }

    #[test]
    fn test_framer_lossy_decoding() {
        let mut framer = LineFramer::default();
        let lines = framer.push(b"bad \xff byte\n", Instant::now());
        assert_eq!(lines, ["bad \u{fffd} byte"]);
    }

    #[test]
    fn test_framer_flushes_stale_partial() {
        let mut framer = LineFramer::default();
        let start = Instant::now();
        framer.push(b"Enter name: ", start);

        let timeout = Duration::from_millis(250);
        assert!(framer.flush_stale(start + Duration::from_millis(100), timeout).is_none());
        assert_eq!(
            framer
                .flush_stale(start + Duration::from_millis(300), timeout)
                .as_deref(),
            Some("Enter name: ")
        );
        assert!(framer.flush_stale(start + Duration::from_secs(5), timeout).is_none());
    }

    #[test]
    fn test_framer_partial_age_restarts_after_line() {
        let mut framer = LineFramer::default();
        let start = Instant::now();
        framer.push(b"old", start);
        let later = start + Duration::from_millis(200);
        assert_eq!(framer.push(b"\nnew", later), ["old"]);

        let timeout = Duration::from_millis(250);
        assert!(framer.flush_stale(start + Duration::from_millis(300), timeout).is_none());
        assert_eq!(
            framer
                .flush_stale(later + Duration::from_millis(250), timeout)
                .as_deref(),
            Some("new")
        );
    }
}
