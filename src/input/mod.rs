//! Mode state machine and keystroke routing.

mod field;
mod mode;
mod router;

pub use field::InputField;
pub use mode::Mode;
pub use router::{Action, InputRouter, Scroll};
