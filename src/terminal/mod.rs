//! Terminal setup and teardown.
//!
//! [`TerminalGuard`] puts the terminal into raw mode on the alternate
//! screen and restores it when dropped, including on early returns and
//! panics that unwind through `main`.

mod output;

pub use output::OutputBuffer;

use crate::error::Result;
use crossterm::{
    cursor,
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;

/// Which terminal features the session turns on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalOptions {
    /// Use the alternate screen buffer.
    pub alternate_screen: bool,
    /// Capture the mouse wheel for scrolling.
    pub enable_mouse: bool,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            enable_mouse: false,
        }
    }
}

/// Restores the terminal on drop.
#[derive(Debug)]
pub struct TerminalGuard {
    options: TerminalOptions,
}

impl TerminalGuard {
    /// Enter raw mode and the configured screen features.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal refuses raw mode or the escape
    /// sequences cannot be written. Anything already enabled is undone.
    pub fn enter(options: TerminalOptions) -> Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, Drop undoes whatever succeeded.
        let guard = Self { options };

        let mut stdout = io::stdout();
        if options.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        if options.enable_mouse {
            execute!(stdout, EnableMouseCapture)?;
        }
        execute!(stdout, EnableBracketedPaste, cursor::Hide)?;
        tracing::debug!(?options, "terminal entered raw mode");
        Ok(guard)
    }

    /// Current terminal size as `(width, height)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be queried.
    pub fn size() -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableBracketedPaste, cursor::Show);
        if self.options.enable_mouse {
            let _ = execute!(stdout, DisableMouseCapture);
        }
        if self.options.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
        tracing::debug!("terminal restored");
    }
}
