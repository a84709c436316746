//! Frame: the immutable snapshot handed to the render thread.
//!
//! The session builds one [`Frame`] per repaint from the projected view,
//! the status data and the input field. The painter only reads it.

use crate::input::{Mode, Scroll};
use crate::log::ProjectedLine;
use std::ops::Range;

/// Everything needed to paint one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Terminal width in columns.
    pub width: u16,
    /// Terminal height in rows.
    pub height: u16,
    /// Visible log rows, top to bottom.
    pub rows: Vec<ProjectedLine>,
    /// Status line data.
    pub status: StatusLine,
    /// The input field, present outside NORMAL mode.
    pub field: Option<FieldView>,
}

impl Frame {
    /// Rows available to the log area: everything except the status line
    /// and, when shown, the input field.
    pub fn log_height(height: u16, field_visible: bool) -> usize {
        let reserved = if field_visible { 2 } else { 1 };
        usize::from(height.saturating_sub(reserved))
    }
}

/// Data shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Active mode.
    pub mode: Mode,
    /// Supervised command line.
    pub command: String,
    /// Whether the child is alive.
    pub running: bool,
    /// Lines in the buffer.
    pub total_lines: usize,
    /// Lines that pass the filter.
    pub shown_lines: usize,
    /// Auto-scroll flag.
    pub auto_scroll: bool,
    /// Active search term.
    pub search: String,
    /// Active filter term.
    pub filter: String,
}

impl StatusLine {
    /// Left-aligned part: mode, command and process state.
    pub fn left(&self) -> String {
        let state = if self.running { "running" } else { "stopped" };
        format!(" {} │ {} │ {state}", self.mode, self.command)
    }

    /// Right-aligned part: terms, counts and auto-scroll.
    pub fn right(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if !self.filter.is_empty() {
            parts.push(format!("filter: {}", self.filter));
        }
        if !self.search.is_empty() {
            parts.push(format!("search: {}", self.search));
        }
        if self.shown_lines == self.total_lines {
            parts.push(format!("{} lines", self.total_lines));
        } else {
            parts.push(format!("{}/{} lines", self.shown_lines, self.total_lines));
        }
        parts.push(if self.auto_scroll { "auto-scroll on" } else { "auto-scroll off" }.to_string());
        format!("{} ", parts.join(" │ "))
    }
}

/// The input field as the painter sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    /// Prompt in front of the text.
    pub prompt: &'static str,
    /// Field content.
    pub content: String,
    /// Display column of the cursor within `content`.
    pub cursor_column: usize,
}

/// Which slice of the projected view is on screen.
///
/// While pinned the window follows the tail. Any upward scroll unpins it;
/// new output re-pins it only when auto-scroll is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    top: usize,
    pinned: bool,
}

impl Viewport {
    /// Create a viewport at the top, optionally following the tail.
    pub const fn new(pinned: bool) -> Self {
        Self { top: 0, pinned }
    }

    /// Check whether the window follows the tail.
    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Compute the visible index range for `total` rows in a log area of
    /// `height` rows, clamping the stored position.
    pub fn window(&mut self, total: usize, height: usize) -> Range<usize> {
        let max_top = total.saturating_sub(height);
        self.top = if self.pinned { max_top } else { self.top.min(max_top) };
        self.top..(self.top + height).min(total)
    }

    /// Snap to the tail on the next frame.
    pub const fn follow(&mut self) {
        self.pinned = true;
    }

    /// Stop following the tail, keeping the current position.
    pub const fn unpin(&mut self) {
        self.pinned = false;
    }

    /// Back to the first row, e.g. after the log is cleared.
    pub const fn reset(&mut self, follow: bool) {
        self.top = 0;
        self.pinned = follow;
    }

    /// Apply a scroll request. Reaching the bottom re-pins only when
    /// `auto_scroll` is on.
    pub fn scroll(&mut self, scroll: Scroll, total: usize, height: usize, auto_scroll: bool) {
        let current = self.window(total, height).start;
        let max_top = total.saturating_sub(height);
        let page = height.saturating_sub(1).max(1);
        let top = match scroll {
            Scroll::Up(rows) => current.saturating_sub(rows),
            Scroll::PageUp => current.saturating_sub(page),
            Scroll::Top => 0,
            Scroll::Down(rows) => (current + rows).min(max_top),
            Scroll::PageDown => (current + page).min(max_top),
            Scroll::Bottom => max_top,
        };
        let towards_tail = matches!(scroll, Scroll::Down(_) | Scroll::PageDown | Scroll::Bottom);
        self.top = top;
        self.pinned = auto_scroll && towards_tail && top == max_top;
    }
}
