//! Log model: the append-only line store and its view projection.
//!
//! The [`LogBuffer`] is mutated by exactly one owner (the session loop).
//! Everything else hands lines over through the session queue and reads the
//! result through [`project`], a pure function from a buffer snapshot and the
//! current terms to the visible rows.

mod buffer;
mod line;
mod view;

pub use buffer::LogBuffer;
pub use line::{LogLine, Source};
pub use view::{find_ignore_case, project, ProjectedLine, SourceStyle, ViewCache};
