//! Error taxonomy for the supervision core.
//!
//! Every variant except [`RiveflowError::Usage`] is recovered inside the
//! session and surfaced to the user as a system line.

use crate::log::Source;
use std::io;
use thiserror::Error;

/// Errors raised by the supervisor, the multiplexer and the session.
#[derive(Debug, Error)]
pub enum RiveflowError {
    /// The executable could not be found or is not executable.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading one of the child's output streams failed.
    #[error("error reading {stream}: {source}")]
    StreamRead {
        /// The stream that failed.
        stream: Source,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Writing to the child's input stream failed.
    #[error("failed to send input {text:?}: {reason}")]
    InputWrite {
        /// The text the user typed.
        text: String,
        /// Why the write failed.
        reason: InputWriteFailure,
    },

    /// The program was invoked without a command to supervise.
    #[error("usage: riveflow <command> [args...]")]
    Usage,

    /// Terminal setup or teardown failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

/// Why a line of typed input could not be delivered.
#[derive(Debug, Error)]
pub enum InputWriteFailure {
    /// There is no live process to write to.
    #[error("no process is running")]
    NotRunning,
    /// The child closed its input stream or the write failed.
    #[error("{0}")]
    Pipe(#[source] io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, RiveflowError>;
