//! Message types for actor communication.
//!
//! These enums define the protocol between the threads in the system.

use crate::error::RiveflowError;
use crate::log::Source;
use crate::render::Frame;

/// Key codes for keyboard input.
///
/// This is a simplified subset of crossterm's `KeyCode`, covering what the
/// log viewer binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Backspace key.
    Backspace,
    /// Enter/Return key.
    Enter,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Delete key.
    Delete,
    /// Escape key.
    Esc,
}

/// Key modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    /// Control key held.
    pub control: bool,
    /// Alt/Option key held.
    pub alt: bool,
}

impl KeyModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        control: false,
        alt: false,
    };

    /// Only Control held.
    pub const CONTROL: Self = Self {
        control: true,
        alt: false,
    };
}

/// Events from the input thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    Key {
        /// The key code.
        code: KeyCode,
        /// Modifiers held during keypress.
        modifiers: KeyModifiers,
    },

    /// Mouse wheel scroll (positive = up, negative = down).
    MouseScroll {
        /// Scroll delta in lines.
        delta: i16,
    },

    /// Terminal was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },

    /// Paste event (bracketed paste).
    Paste(String),

    /// Input thread encountered an error.
    Error(String),

    /// Input thread is shutting down.
    Shutdown,
}

impl InputEvent {
    /// A plain key press without modifiers.
    pub const fn key(code: KeyCode) -> Self {
        Self::Key {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// A key press with Control held.
    pub const fn ctrl(c: char) -> Self {
        Self::Key {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }
}

/// Everything the session loop consumes.
///
/// The session is the only reader of this queue and the only writer of the
/// log buffer; every other thread hands its work over as one of these.
#[derive(Debug)]
pub enum SessionEvent {
    /// A terminal event from the input actor.
    Input(InputEvent),

    /// Request to append a line to the log.
    Append {
        /// Where the line came from.
        source: Source,
        /// Line text, without its terminator.
        content: String,
    },

    /// A queued line of input could not be written to the child.
    InputFailed(RiveflowError),

    /// A child process exited and its output has been drained.
    Exited {
        /// Spawn generation of the child.
        generation: u64,
        /// Exit code (`-signal` when killed by a signal).
        code: i32,
    },
}

/// Commands sent to the render thread.
#[derive(Debug)]
pub enum RenderCommand {
    /// Paint a complete frame.
    Draw(Box<Frame>),

    /// The terminal changed size; repaint everything next time.
    Resize {
        /// New width.
        width: u16,
        /// New height.
        height: u16,
    },

    /// Shutdown the render thread.
    Shutdown,
}
