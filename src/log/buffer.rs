//! Log buffer: append-only store of every captured line.
//!
//! Unlike a scrollback ring, nothing is ever evicted. Lines leave the
//! buffer only through [`LogBuffer::clear`], which also restarts numbering.

use super::line::{LogLine, Source};

/// Append-only, sequence-numbered line store.
#[derive(Debug, Default)]
pub struct LogBuffer {
    /// Lines in arrival order.
    lines: Vec<LogLine>,
    /// Sequence assigned to the most recent append (0 = none since clear).
    last_sequence: u64,
    /// Bumped on every mutation; cached views key on it.
    revision: u64,
}

impl LogBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            last_sequence: 0,
            revision: 0,
        }
    }

    /// Append a line and return it.
    pub fn append(&mut self, source: Source, content: &str) -> &LogLine {
        self.last_sequence += 1;
        self.revision += 1;
        self.lines
            .push(LogLine::new(self.last_sequence, content, source));
        &self.lines[self.lines.len() - 1]
    }

    /// Drop every line and restart numbering at 1.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.last_sequence = 0;
        self.revision += 1;
    }

    /// All lines in arrival order.
    #[inline]
    pub fn snapshot(&self) -> &[LogLine] {
        &self.lines
    }

    /// Number of stored lines.
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the buffer holds no lines.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Mutation counter. Changes whenever the contents change.
    #[inline]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_buffer_new() {
        let buf = LogBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert!(buf.snapshot().is_empty());
    }

    #[test]
    fn test_log_buffer_append_order_and_sequence() {
        let mut buf = LogBuffer::new();
        buf.append(Source::Stdout, "one");
        buf.append(Source::Stderr, "two");
        buf.append(Source::System, "three");

        let contents: Vec<&str> = buf.snapshot().iter().map(LogLine::content).collect();
        assert_eq!(contents, ["one", "two", "three"]);

        let seqs: Vec<u64> = buf.snapshot().iter().map(LogLine::sequence).collect();
        assert_eq!(seqs, [1, 2, 3]);
    }

    #[test]
    fn test_log_buffer_sequences_strictly_increase() {
        let mut buf = LogBuffer::new();
        for i in 0..500 {
            let source = if i % 3 == 0 { Source::Stderr } else { Source::Stdout };
            buf.append(source, &format!("line {i}"));
        }
        assert!(buf
            .snapshot()
            .windows(2)
            .all(|pair| pair[0].sequence() < pair[1].sequence()));
    }

    #[test]
    fn test_log_buffer_clear_resets_numbering() {
        let mut buf = LogBuffer::new();
        buf.append(Source::Stdout, "a");
        buf.append(Source::Stdout, "b");

        buf.clear();
        assert!(buf.is_empty());

        let line = buf.append(Source::Stdout, "c");
        assert_eq!(line.sequence(), 1);
        assert_eq!(line.content(), "c");
    }

    #[test]
    fn test_log_buffer_revision_changes_on_mutation() {
        let mut buf = LogBuffer::new();
        let r0 = buf.revision();
        buf.append(Source::Stdout, "x");
        let r1 = buf.revision();
        assert_ne!(r0, r1);

        buf.clear();
        assert_ne!(buf.revision(), r1);
    }

    #[test]
    fn test_log_buffer_clear_on_empty_still_invalidates() {
        let mut buf = LogBuffer::new();
        let before = buf.revision();
        buf.clear();
        assert_ne!(buf.revision(), before);
    }
}
