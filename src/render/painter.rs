//! Painter: turns a [`Frame`] into one buffer of terminal output.
//!
//! Every row is repainted on every frame: move to the row, write its spans
//! clipped to the terminal width, then clear to end of line. The whole
//! frame is wrapped in a synchronized update and flushed with one write.
//!
//! Child output is untrusted. Control characters (including ESC) are
//! replaced before they reach the terminal and tabs are expanded, so a
//! line can never move the cursor or change colors on its own.

use super::frame::{FieldView, Frame, StatusLine};
use super::style::Style;
use crate::log::ProjectedLine;
use crate::terminal::OutputBuffer;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};
use std::io;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const TAB: &str = "    ";
const REPLACEMENT: &str = "\u{fffd}";

/// Paints frames into a reusable output buffer.
#[derive(Debug, Default)]
pub struct Painter {
    out: OutputBuffer,
    /// Size of the last painted frame; a change forces a full clear.
    last_size: Option<(u16, u16)>,
}

impl Painter {
    /// Create a painter. The first frame clears the screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next frame to clear the whole screen first.
    pub const fn invalidate(&mut self) {
        self.last_size = None;
    }

    /// Paint `frame` and return the bytes to write.
    ///
    /// # Errors
    ///
    /// Only fails if queueing a command fails, which cannot happen for an
    /// in-memory buffer in practice.
    pub fn paint(&mut self, frame: &Frame) -> io::Result<&[u8]> {
        let out = &mut self.out;
        out.clear();
        queue!(out, BeginSynchronizedUpdate, Hide)?;

        let size = (frame.width, frame.height);
        if self.last_size != Some(size) {
            queue!(out, SetAttribute(Attribute::Reset), Clear(ClearType::All))?;
            self.last_size = Some(size);
        }

        let width = usize::from(frame.width);
        let log_height = Frame::log_height(frame.height, frame.field.is_some());
        for y in 0..log_height {
            let row = u16::try_from(y).unwrap_or(u16::MAX);
            queue!(out, MoveTo(0, row))?;
            let remaining = match frame.rows.get(y) {
                Some(line) => paint_log_line(out, line, width)?,
                None => width,
            };
            clear_rest(out, remaining)?;
        }

        let mut cursor = None;
        if frame.height >= 2 {
            if let Some(field) = &frame.field {
                let row = frame.height - 2;
                queue!(out, MoveTo(0, row))?;
                let (column, remaining) = paint_field(out, field, width)?;
                clear_rest(out, remaining)?;
                cursor = Some((column, row));
            }
        }

        if frame.height >= 1 {
            queue!(out, MoveTo(0, frame.height - 1))?;
            let remaining = paint_status(out, &frame.status, width)?;
            clear_rest(out, remaining)?;
        }

        if let Some((column, row)) = cursor {
            queue!(out, MoveTo(column, row), Show)?;
        }
        queue!(out, EndSynchronizedUpdate)?;
        Ok(self.out.as_bytes())
    }
}

/// Writes styled text into a row without exceeding its width.
struct RowWriter<'a> {
    out: &'a mut OutputBuffer,
    remaining: usize,
    clipped: bool,
    current: Option<Style>,
}

impl<'a> RowWriter<'a> {
    fn new(out: &'a mut OutputBuffer, width: usize) -> Self {
        Self {
            out,
            remaining: width,
            clipped: false,
            current: None,
        }
    }

    /// Write `text` in `style`, skipping the first `skip` columns. Returns
    /// whether there is room left.
    fn push_skipping(&mut self, text: &str, style: Style, mut skip: usize) -> io::Result<bool> {
        if self.clipped {
            return Ok(false);
        }
        for grapheme in text.graphemes(true) {
            let shown = sanitize(grapheme);
            let columns = shown.width();
            if skip > 0 {
                skip = skip.saturating_sub(columns);
                continue;
            }
            if columns > self.remaining {
                self.clipped = true;
                return Ok(false);
            }
            if self.current != Some(style) {
                style.apply(&mut *self.out)?;
                self.current = Some(style);
            }
            queue!(self.out, Print(shown))?;
            self.remaining -= columns;
        }
        Ok(self.remaining > 0)
    }

    fn push(&mut self, text: &str, style: Style) -> io::Result<bool> {
        self.push_skipping(text, style, 0)
    }

    /// Pad with spaces in `style` up to `columns` left.
    fn pad_to(&mut self, columns: usize, style: Style) -> io::Result<()> {
        let fill = self.remaining.saturating_sub(columns);
        if fill > 0 {
            self.push(&" ".repeat(fill), style)?;
        }
        Ok(())
    }
}

/// Reset attributes and erase the rest of the row. A row filled to the
/// last column is left alone: erasing there would take out its final cell.
fn clear_rest(out: &mut OutputBuffer, remaining: usize) -> io::Result<()> {
    queue!(out, SetAttribute(Attribute::Reset))?;
    if remaining > 0 {
        queue!(out, Clear(ClearType::UntilNewLine))?;
    }
    Ok(())
}

/// Replace graphemes that would be interpreted by the terminal.
fn sanitize(grapheme: &str) -> &str {
    if grapheme == "\t" {
        TAB
    } else if grapheme.chars().any(char::is_control) {
        REPLACEMENT
    } else {
        grapheme
    }
}

/// Paint one log row. Returns the columns left unpainted.
fn paint_log_line(out: &mut OutputBuffer, line: &ProjectedLine, width: usize) -> io::Result<usize> {
    let base = Style::for_source(line.style);
    let mut row = RowWriter::new(out, width);
    if !row.push(line.style.marker(), base)? {
        return Ok(row.remaining);
    }

    let content = line.content.as_str();
    let mut pos = 0;
    for range in &line.highlights {
        if !row.push(&content[pos..range.start], base)?
            || !row.push(&content[range.clone()], Style::HIGHLIGHT)?
        {
            return Ok(row.remaining);
        }
        pos = range.end;
    }
    row.push(&content[pos..], base)?;
    Ok(row.remaining)
}

/// Paint the field, scrolled so the cursor stays visible. Returns the
/// cursor column on screen and the columns left unpainted.
fn paint_field(out: &mut OutputBuffer, field: &FieldView, width: usize) -> io::Result<(u16, usize)> {
    let prompt_width = field.prompt.width().min(width);
    let available = width.saturating_sub(prompt_width).max(1);
    let skip = (field.cursor_column + 1).saturating_sub(available);

    let mut row = RowWriter::new(out, width);
    row.push(field.prompt, Style::PROMPT)?;
    row.push_skipping(&field.content, Style::PLAIN, skip)?;

    let column = (prompt_width + field.cursor_column - skip).min(width.saturating_sub(1));
    Ok((u16::try_from(column).unwrap_or(u16::MAX), row.remaining))
}

fn paint_status(out: &mut OutputBuffer, status: &StatusLine, width: usize) -> io::Result<usize> {
    let left = status.left();
    let right = status.right();
    let mut row = RowWriter::new(out, width);

    if left.width() + right.width() <= width {
        row.push(&left, Style::STATUS)?;
        row.pad_to(right.width(), Style::STATUS)?;
        row.push(&right, Style::STATUS)?;
    } else {
        row.push(&left, Style::STATUS)?;
        row.pad_to(0, Style::STATUS)?;
    }
    Ok(row.remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Mode;
    use crate::log::SourceStyle;

    fn line(content: &str, style: SourceStyle, highlights: Vec<std::ops::Range<usize>>) -> ProjectedLine {
        ProjectedLine {
            sequence: 1,
            content: content.into(),
            style,
            highlights,
        }
    }

    fn frame(rows: Vec<ProjectedLine>, field: Option<FieldView>) -> Frame {
        Frame {
            width: 60,
            height: 6,
            rows,
            status: StatusLine {
                mode: Mode::Normal,
                command: "make test".into(),
                running: true,
                total_lines: 2,
                shown_lines: 2,
                auto_scroll: true,
                search: String::new(),
                filter: String::new(),
            },
            field,
        }
    }

    fn screen(frame: &Frame) -> vt100::Parser {
        let mut painter = Painter::new();
        let bytes = painter.paint(frame).unwrap().to_vec();
        let mut parser = vt100::Parser::new(frame.height, frame.width, 0);
        parser.process(&bytes);
        parser
    }

    fn row_text(parser: &vt100::Parser, row: u16) -> String {
        let width = parser.screen().size().1;
        parser.screen().rows(0, width).nth(usize::from(row)).unwrap_or_default()
    }

    #[test]
    fn test_paints_rows_with_markers() {
        let parser = screen(&frame(
            vec![
                line("compiling", SourceStyle::Stdout, vec![]),
                line("warning: unused", SourceStyle::Stderr, vec![]),
                line("Started command: make test", SourceStyle::System, vec![]),
            ],
            None,
        ));
        assert_eq!(row_text(&parser, 0).trim_end(), "compiling");
        assert_eq!(row_text(&parser, 1).trim_end(), "✖ warning: unused");
        assert_eq!(row_text(&parser, 2).trim_end(), "ℹ Started command: make test");
        assert!(parser.screen().hide_cursor());
    }

    #[test]
    fn test_status_line_is_reversed_and_right_aligned() {
        let parser = screen(&frame(vec![], None));
        let status = row_text(&parser, 5);
        assert!(status.trim().starts_with("NORMAL │ make test │ running"));
        assert!(status.trim_end().ends_with("2 lines │ auto-scroll on"));
        // Left and right parts are separated by padding.
        assert!(status.contains("running    "));
        let cell = parser.screen().cell(5, 0).unwrap();
        assert!(cell.inverse());
    }

    #[test]
    fn test_highlight_cells_are_colored() {
        let parser = screen(&frame(
            vec![line("an error here", SourceStyle::Stdout, vec![3..8])],
            None,
        ));
        let screen = parser.screen();
        assert_eq!(screen.cell(0, 2).unwrap().bgcolor(), vt100::Color::Default);
        assert_ne!(screen.cell(0, 3).unwrap().bgcolor(), vt100::Color::Default);
        assert_ne!(screen.cell(0, 7).unwrap().bgcolor(), vt100::Color::Default);
        assert_eq!(screen.cell(0, 8).unwrap().bgcolor(), vt100::Color::Default);
    }

    #[test]
    fn test_long_lines_are_clipped_to_width() {
        let long = "x".repeat(100);
        let parser = screen(&frame(vec![line(&long, SourceStyle::Stdout, vec![])], None));
        assert_eq!(row_text(&parser, 0), "x".repeat(60));
        assert_eq!(row_text(&parser, 1).trim_end(), "");
    }

    #[test]
    fn test_wide_char_never_splits_at_edge() {
        let content = format!("{}日本", "a".repeat(59));
        let parser = screen(&frame(vec![line(&content, SourceStyle::Stdout, vec![])], None));
        assert_eq!(row_text(&parser, 0).trim_end(), "a".repeat(59));
    }

    #[test]
    fn test_escape_sequences_in_output_are_neutralized() {
        let parser = screen(&frame(
            vec![line("\x1b[2Jred\tend", SourceStyle::Stdout, vec![])],
            None,
        ));
        assert_eq!(row_text(&parser, 0).trim_end(), "\u{fffd}[2Jred    end");
        assert_eq!(row_text(&parser, 5).trim_start().chars().next(), Some('N'));
    }

    #[test]
    fn test_field_shows_prompt_and_cursor() {
        let parser = screen(&frame(
            vec![],
            Some(FieldView {
                prompt: "> ",
                content: "ping".into(),
                cursor_column: 4,
            }),
        ));
        assert_eq!(row_text(&parser, 4).trim_end(), "> ping");
        assert_eq!(parser.screen().cursor_position(), (4, 6));
        assert!(!parser.screen().hide_cursor());
    }

    #[test]
    fn test_long_field_scrolls_to_cursor() {
        let content = "abcdefghij".repeat(8);
        let parser = screen(&frame(
            vec![],
            Some(FieldView {
                prompt: "> ",
                content: content.clone(),
                cursor_column: content.len(),
            }),
        ));
        let row = row_text(&parser, 4);
        assert!(row.starts_with("> "));
        assert!(row.trim_end().ends_with("ghij"));
        assert_eq!(parser.screen().cursor_position(), (4, 59));
    }

    #[test]
    fn test_resize_clears_screen_once() {
        let mut painter = Painter::new();
        let first = frame(vec![], None);
        let clear = b"\x1b[2J";
        let bytes = painter.paint(&first).unwrap().to_vec();
        assert!(bytes.windows(clear.len()).any(|w| w == clear));

        let bytes = painter.paint(&first).unwrap().to_vec();
        assert!(!bytes.windows(clear.len()).any(|w| w == clear));

        let mut resized = first;
        resized.width = 80;
        let bytes = painter.paint(&resized).unwrap().to_vec();
        assert!(bytes.windows(clear.len()).any(|w| w == clear));
    }
}
