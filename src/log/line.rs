//! `LogLine`: one captured, sequence-numbered unit of output.

use std::fmt;
use std::time::SystemTime;

/// Where a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The child's standard output.
    Stdout,
    /// The child's standard error.
    Stderr,
    /// Lifecycle and error messages produced by riveflow itself.
    System,
    /// Echo of text the user sent to the child.
    Input,
}

impl Source {
    /// Lowercase name used in messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::System => "system",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable line in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    sequence: u64,
    content: String,
    source: Source,
    timestamp: SystemTime,
}

impl LogLine {
    /// Build a line. Trailing `\n`/`\r` are stripped from `content`.
    pub(crate) fn new(sequence: u64, content: &str, source: Source) -> Self {
        Self {
            sequence,
            content: content.trim_end_matches(['\n', '\r']).to_string(),
            source,
            timestamp: SystemTime::now(),
        }
    }

    /// Sequence number, starting at 1 after every clear.
    #[inline]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The newline-stripped text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Origin of the line.
    #[inline]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// Capture time.
    #[inline]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
