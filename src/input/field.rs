//! Single-line editable field behind the INSERT, SEARCH and FILTER modes.
//!
//! The cursor is a byte offset that always sits on a grapheme boundary, so
//! Backspace removes a whole user-perceived character (an emoji with a
//! skin-tone modifier, a letter with a combining accent) in one press.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Editable single-line text with a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    /// Current text content.
    content: String,
    /// Cursor position as a byte offset on a grapheme boundary.
    cursor: usize,
}

impl InputField {
    /// Create an empty field.
    pub const fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
        }
    }

    /// Get the current text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cursor position in bytes.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display column of the cursor.
    pub fn cursor_column(&self) -> usize {
        self.content[..self.cursor].width()
    }

    /// Check if the field is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Take the content, leaving the field empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.snap_cursor();
    }

    /// Insert pasted text at the cursor. Line breaks become spaces since the
    /// field is a single line.
    pub fn insert_str(&mut self, text: &str) {
        let flattened: String = text
            .trim_end_matches(['\r', '\n'])
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .filter(|c| *c == ' ' || !c.is_control())
            .collect();
        self.content.insert_str(self.cursor, &flattened);
        self.cursor += flattened.len();
        self.snap_cursor();
    }

    /// Delete the grapheme before the cursor. Returns whether anything was
    /// removed.
    pub fn backspace(&mut self) -> bool {
        let Some(start) = self.prev_boundary() else {
            return false;
        };
        self.content.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    /// Delete the grapheme at the cursor. Returns whether anything was
    /// removed.
    pub fn delete(&mut self) -> bool {
        let Some(end) = self.next_boundary() else {
            return false;
        };
        self.content.replace_range(self.cursor..end, "");
        true
    }

    /// Move cursor one grapheme left.
    pub fn cursor_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    /// Move cursor one grapheme right.
    pub fn cursor_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    /// Move cursor to start.
    pub const fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn cursor_end(&mut self) {
        self.cursor = self.content.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.content[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }

    // A combining mark typed after a base character merges into its
    // grapheme; keep the cursor after the merged cluster.
    fn snap_cursor(&mut self) {
        let mut offset = 0;
        for grapheme in self.content.graphemes(true) {
            let end = offset + grapheme.len();
            if self.cursor > offset && self.cursor < end {
                self.cursor = end;
                return;
            }
            offset = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(text: &str) -> InputField {
        let mut field = InputField::new();
        field.insert_str(text);
        field
    }

    #[test]
    fn test_insert_and_take() {
        let mut input = InputField::new();
        input.insert_char('H');
        input.insert_char('i');
        assert_eq!(input.content(), "Hi");
        assert_eq!(input.cursor(), 2);

        assert_eq!(input.take(), "Hi");
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_backspace_removes_whole_grapheme() {
        let mut input = field("ok 👍🏽");
        assert!(input.backspace());
        assert_eq!(input.content(), "ok ");

        let mut input = field("cafe\u{301}");
        assert!(input.backspace());
        assert_eq!(input.content(), "caf");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut input = field("abc");
        input.cursor_home();
        assert!(!input.backspace());
        assert_eq!(input.content(), "abc");
    }

    #[test]
    fn test_cursor_movement_and_midline_edit() {
        let mut input = field("Hello");
        input.cursor_left();
        assert_eq!(input.cursor(), 4);
        input.insert_char('_');
        assert_eq!(input.content(), "Hell_o");

        input.cursor_home();
        assert!(input.delete());
        assert_eq!(input.content(), "ell_o");

        input.cursor_end();
        assert_eq!(input.cursor(), 5);
        assert!(!input.delete());
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let input = field("one\ntwo\r\nthree\n");
        assert_eq!(input.content(), "one two  three");
    }

    #[test]
    fn test_combining_mark_keeps_cursor_on_boundary() {
        let mut input = field("e");
        input.insert_char('\u{301}');
        assert_eq!(input.cursor(), input.content().len());
        input.cursor_left();
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_cursor_column_counts_wide_chars() {
        let input = field("日本");
        assert_eq!(input.cursor_column(), 4);
    }
}
