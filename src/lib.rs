//! # Riveflow
//!
//! Supervise a command and read its output as a live, searchable log.
//!
//! Riveflow starts one child process, captures its stdout and stderr
//! concurrently, and shows both as a single append-only log with a
//! vim-style mode machine for searching, filtering and typing input back
//! into the process.
//!
//! ## Core Concepts
//!
//! - **Single writer**: every thread posts [`SessionEvent`]s into one queue;
//!   only the [`Session`] touches the [`LogBuffer`]
//! - **Generations**: each spawn is numbered so late exit reports from a
//!   replaced child are ignored
//! - **Pure projection**: [`project`] filters and highlights a buffer
//!   snapshot without side effects
//! - **Actor model**: input polling and painting run on their own threads
//!
//! ## Example
//!
//! ```rust,no_run
//! use riveflow::{Session, SessionConfig};
//! use std::time::Duration;
//!
//! let mut session = Session::new("echo", vec!["hello".into()], SessionConfig::default());
//! session.start();
//! while session.pump(Duration::from_millis(100)) > 0 {}
//! for line in session.buffer().snapshot() {
//!     println!("[{}] {}", line.source(), line.content());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod config;
pub mod error;
pub mod input;
pub mod log;
pub mod process;
pub mod render;
pub mod session;
pub mod terminal;
pub mod tracing_setup;

// Re-exports for convenience
pub use actor::{InputActor, InputEvent, KeyCode, KeyModifiers, RenderCommand, RendererActor, SessionEvent};
pub use config::SessionConfig;
pub use error::{InputWriteFailure, Result, RiveflowError};
pub use input::{Action, InputRouter, Mode};
pub use log::{project, LogBuffer, LogLine, ProjectedLine, Source, SourceStyle, ViewCache};
pub use process::{ProcessSupervisor, StreamConfig};
pub use render::{Frame, Painter};
pub use session::Session;
pub use terminal::{TerminalGuard, TerminalOptions};
