//! Actor Model: Message-passing concurrency around the session.
//!
//! This module implements a simple actor system using crossbeam channels:
//! - **Input Actor**: Polls terminal events, forwards them to the session
//! - **Render Actor**: Receives frames, paints and flushes them
//! - **Session**: Single consumer of every other thread's work
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    SessionEvent     ┌──────────────┐
//! │ Input Thread │ ─────────────────▶  │              │
//! └──────────────┘                     │              │
//! ┌──────────────┐    SessionEvent     │   Session    │
//! │ Multiplexer  │ ─────────────────▶  │              │
//! └──────────────┘                     │              │
//! ┌──────────────┐    RenderCommand    │              │
//! │Render Thread │ ◀─────────────────  │              │
//! └──────────────┘                     └──────────────┘
//! ```

mod input;
mod messages;
mod renderer;

pub use input::{convert_event, InputActor};
pub use messages::{InputEvent, KeyCode, KeyModifiers, RenderCommand, SessionEvent};
pub use renderer::{RenderStats, RendererActor};
