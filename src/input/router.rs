//! Keystroke interpretation.
//!
//! [`InputRouter`] is a pure state machine: it owns the current [`Mode`]
//! and the input field, and turns each [`InputEvent`] into a list of
//! [`Action`]s. It never touches the process or the log; the session
//! executes the actions.
//!
//! ```text
//!            'i'            Enter / Esc / Ctrl+C
//!   NORMAL ───────▶ INSERT ─────────────────────▶ NORMAL
//!     │  '/'                Enter / Esc
//!     ├──────────▶ SEARCH ───────────────▶ NORMAL
//!     │  'f'                Enter / Esc
//!     └──────────▶ FILTER ───────────────▶ NORMAL
//! ```

use super::field::InputField;
use super::mode::Mode;
use crate::actor::{InputEvent, KeyCode, KeyModifiers};

/// Rows moved by Up/Down and `k`/`j`.
const LINE_STEP: usize = 1;

/// Viewport movement requested by a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Towards older lines by the given number of rows.
    Up(usize),
    /// Towards newer lines by the given number of rows.
    Down(usize),
    /// One page towards older lines.
    PageUp,
    /// One page towards newer lines.
    PageDown,
    /// First line.
    Top,
    /// Last line.
    Bottom,
}

/// Something the session must do in response to input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Deliver a line of text to the child's standard input.
    WriteInput(String),
    /// Replace the search term.
    SetSearch(String),
    /// Replace the filter term.
    SetFilter(String),
    /// Reset both search and filter terms.
    ClearTerms,
    /// Empty the log buffer.
    ClearLog,
    /// Terminate the child.
    Kill,
    /// Restart the child.
    Restart,
    /// Flip the auto-scroll flag.
    ToggleAutoScroll,
    /// Move the viewport.
    Scroll(Scroll),
    /// End the session.
    Quit,
}

/// Mode state machine plus the field it edits.
#[derive(Debug, Default)]
pub struct InputRouter {
    mode: Mode,
    field: InputField,
}

impl InputRouter {
    /// Create a router in NORMAL mode with an empty field.
    pub const fn new() -> Self {
        Self {
            mode: Mode::Normal,
            field: InputField::new(),
        }
    }

    /// The active mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The input field.
    pub const fn field(&self) -> &InputField {
        &self.field
    }

    /// Interpret one event.
    ///
    /// Resize, error and shutdown events are not keystrokes and produce no
    /// actions.
    pub fn handle(&mut self, event: &InputEvent) -> Vec<Action> {
        let actions = match event {
            InputEvent::Key { code, modifiers } => self.handle_key(*code, *modifiers),
            InputEvent::Paste(text) => self.handle_paste(text),
            InputEvent::MouseScroll { delta } => {
                let rows = usize::from(delta.unsigned_abs());
                if *delta > 0 {
                    vec![Action::Scroll(Scroll::Up(rows))]
                } else if *delta < 0 {
                    vec![Action::Scroll(Scroll::Down(rows))]
                } else {
                    Vec::new()
                }
            }
            InputEvent::Resize { .. } | InputEvent::Error(_) | InputEvent::Shutdown => Vec::new(),
        };
        if !actions.is_empty() {
            tracing::trace!(mode = %self.mode, ?actions, "input routed");
        }
        actions
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Action> {
        if modifiers.control {
            return self.handle_control(code);
        }
        match self.mode {
            Mode::Normal => self.handle_normal(code, modifiers),
            Mode::Insert | Mode::Search | Mode::Filter => self.handle_field(code, modifiers),
        }
    }

    fn handle_control(&mut self, code: KeyCode) -> Vec<Action> {
        let KeyCode::Char(c) = code else {
            return Vec::new();
        };
        match c.to_ascii_lowercase() {
            'l' => vec![Action::ClearLog],
            'k' => vec![Action::Kill],
            'r' => vec![Action::Restart],
            's' => vec![Action::ToggleAutoScroll],
            'c' if self.mode == Mode::Insert => {
                self.field.clear();
                self.enter(Mode::Normal);
                Vec::new()
            }
            'c' => vec![Action::Quit],
            _ => Vec::new(),
        }
    }

    fn handle_normal(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Action> {
        if modifiers.alt {
            return Vec::new();
        }
        match code {
            KeyCode::Char('i') => {
                self.field.clear();
                self.enter(Mode::Insert);
                Vec::new()
            }
            KeyCode::Char('/') => {
                self.field.clear();
                self.enter(Mode::Search);
                vec![Action::SetSearch(String::new())]
            }
            KeyCode::Char('f') => {
                self.field.clear();
                self.enter(Mode::Filter);
                vec![Action::SetFilter(String::new())]
            }
            KeyCode::Up | KeyCode::Char('k') => vec![Action::Scroll(Scroll::Up(LINE_STEP))],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::Scroll(Scroll::Down(LINE_STEP))],
            KeyCode::PageUp => vec![Action::Scroll(Scroll::PageUp)],
            KeyCode::PageDown => vec![Action::Scroll(Scroll::PageDown)],
            KeyCode::Home | KeyCode::Char('g') => vec![Action::Scroll(Scroll::Top)],
            KeyCode::End | KeyCode::Char('G') => vec![Action::Scroll(Scroll::Bottom)],
            _ => Vec::new(),
        }
    }

    fn handle_field(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Action> {
        let edited = match code {
            KeyCode::Esc => {
                self.field.clear();
                self.enter(Mode::Normal);
                return vec![Action::ClearTerms];
            }
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(c) if !modifiers.alt => {
                self.field.insert_char(c);
                true
            }
            KeyCode::Backspace => self.field.backspace(),
            KeyCode::Delete => self.field.delete(),
            KeyCode::Left => {
                self.field.cursor_left();
                false
            }
            KeyCode::Right => {
                self.field.cursor_right();
                false
            }
            KeyCode::Home => {
                self.field.cursor_home();
                false
            }
            KeyCode::End => {
                self.field.cursor_end();
                false
            }
            _ => false,
        };
        if edited {
            self.live_update()
        } else {
            Vec::new()
        }
    }

    fn handle_paste(&mut self, text: &str) -> Vec<Action> {
        if !self.mode.has_field() || text.is_empty() {
            return Vec::new();
        }
        self.field.insert_str(text);
        self.live_update()
    }

    fn submit(&mut self) -> Vec<Action> {
        let text = self.field.take();
        let action = match self.mode {
            Mode::Insert => Action::WriteInput(text),
            Mode::Search => Action::SetSearch(text),
            Mode::Filter => Action::SetFilter(text),
            Mode::Normal => return Vec::new(),
        };
        self.enter(Mode::Normal);
        vec![action]
    }

    /// SEARCH and FILTER terms follow the field on every edit.
    fn live_update(&self) -> Vec<Action> {
        let text = self.field.content().to_string();
        match self.mode {
            Mode::Search => vec![Action::SetSearch(text)],
            Mode::Filter => vec![Action::SetFilter(text)],
            Mode::Normal | Mode::Insert => Vec::new(),
        }
    }

    fn enter(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(from = %self.mode, to = %mode, "mode change");
            self.mode = mode;
        }
    }
}
