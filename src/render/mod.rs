//! Rendering adapter: frame snapshots and the crossterm painter.
//!
//! The session never paints. It builds a [`Frame`] and sends it to the
//! render actor, which runs a [`Painter`] and writes the result to the
//! terminal in one syscall.

mod frame;
mod painter;
mod style;

pub use frame::{FieldView, Frame, StatusLine, Viewport};
pub use painter::Painter;
pub use style::{Style, TextStyle};
