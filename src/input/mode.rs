//! Interaction modes.

use std::fmt;

/// The active interaction mode. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Navigation and lifecycle bindings.
    #[default]
    Normal,
    /// Typed text goes to the child's standard input.
    Insert,
    /// Typed text is the search term.
    Search,
    /// Typed text is the filter term.
    Filter,
}

impl Mode {
    /// Upper-case label for the status line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Search => "SEARCH",
            Self::Filter => "FILTER",
        }
    }

    /// Prompt shown in front of the input field, `None` when the field is
    /// hidden.
    pub const fn prompt(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Insert => Some("> "),
            Self::Search => Some("/"),
            Self::Filter => Some("filter: "),
        }
    }

    /// Check whether this mode shows the input field.
    pub const fn has_field(self) -> bool {
        self.prompt().is_some()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_normal_hides_field() {
        assert!(!Mode::Normal.has_field());
        assert!(Mode::Insert.has_field());
        assert!(Mode::Search.has_field());
        assert!(Mode::Filter.has_field());
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(Mode::default(), Mode::Normal);
        assert_eq!(Mode::Filter.to_string(), "FILTER");
    }
}
