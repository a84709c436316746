//! Child process supervision and output capture.
//!
//! - [`ProcessSupervisor`] spawns, terminates and restarts the one child.
//! - [`StreamMultiplexer`] drains its stdout and stderr without starving
//!   either and reports the exit code.
//! - [`LineFramer`] turns raw chunks into bounded lines.
//! - [`InputWriter`] feeds typed lines to its stdin off the session thread.

mod framer;
mod multiplexer;
mod supervisor;
mod writer;

pub use framer::{LineFramer, DEFAULT_MAX_LINE_BYTES};
pub use multiplexer::{StreamConfig, StreamMultiplexer};
pub use supervisor::{exit_code, ChildProbe, ExitReport, ProcessHandle, ProcessSupervisor};
pub use writer::InputWriter;
