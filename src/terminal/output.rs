//! `OutputBuffer`: Single-syscall output buffer for a painted frame.

use std::io::{self, Write};

/// Pre-allocated buffer that crossterm commands are queued into.
///
/// A whole frame is accumulated here, then flushed in a single `write()`
/// syscall so the terminal never shows a half-painted screen.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a full screen of styled text (64KB).
    pub fn new() -> Self {
        Self::with_capacity(64 * 1024)
    }

    /// Clear the buffer for reuse, keeping its allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flush to a writer in a single syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::{cursor::MoveTo, queue, style::Print};

    #[test]
    fn test_commands_accumulate_until_flush() {
        let mut buffer = OutputBuffer::with_capacity(16);
        queue!(buffer, MoveTo(2, 1), Print("hi")).unwrap();
        assert_eq!(buffer.as_bytes(), b"\x1b[2;3Hhi");

        let mut sink = Vec::new();
        buffer.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"\x1b[2;3Hhi");

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }
}
