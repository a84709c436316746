//! Text styles and the palette used by the painter.

use crate::log::SourceStyle;
use bitflags::bitflags;
use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::QueueableCommand;
use std::io::{self, Write};

bitflags! {
    /// Text attributes.
    ///
    /// These can be combined using bitwise OR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextStyle: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dim/faint text
        const DIM = 0b0000_0010;
        /// Underlined text
        const UNDERLINE = 0b0000_0100;
        /// Reversed colors (fg/bg swapped)
        const REVERSED = 0b0000_1000;
    }
}

/// Colors plus attributes for one run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground, `None` for the terminal default.
    pub fg: Option<Color>,
    /// Background, `None` for the terminal default.
    pub bg: Option<Color>,
    /// Attributes.
    pub attrs: TextStyle,
}

impl Style {
    /// Terminal defaults.
    pub const PLAIN: Self = Self {
        fg: None,
        bg: None,
        attrs: TextStyle::empty(),
    };

    /// Search matches.
    pub const HIGHLIGHT: Self = Self {
        fg: Some(Color::Black),
        bg: Some(Color::Yellow),
        attrs: TextStyle::BOLD,
    };

    /// Status line.
    pub const STATUS: Self = Self {
        fg: None,
        bg: None,
        attrs: TextStyle::REVERSED,
    };

    /// Input field prompt.
    pub const PROMPT: Self = Self {
        fg: Some(Color::Cyan),
        bg: None,
        attrs: TextStyle::BOLD,
    };

    /// Style for a log line of the given class.
    pub const fn for_source(style: SourceStyle) -> Self {
        match style {
            SourceStyle::Stdout => Self::PLAIN,
            SourceStyle::Stderr => Self {
                fg: Some(Color::Red),
                bg: None,
                attrs: TextStyle::empty(),
            },
            SourceStyle::System => Self {
                fg: Some(Color::Cyan),
                bg: None,
                attrs: TextStyle::DIM,
            },
            SourceStyle::Input => Self {
                fg: Some(Color::Green),
                bg: None,
                attrs: TextStyle::BOLD,
            },
        }
    }

    /// Queue the escape sequences selecting this style, starting from a
    /// reset.
    pub fn apply<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.queue(SetAttribute(Attribute::Reset))?;
        if let Some(fg) = self.fg {
            out.queue(SetForegroundColor(fg))?;
        }
        if let Some(bg) = self.bg {
            out.queue(SetBackgroundColor(bg))?;
        }
        for (flag, attribute) in [
            (TextStyle::BOLD, Attribute::Bold),
            (TextStyle::DIM, Attribute::Dim),
            (TextStyle::UNDERLINE, Attribute::Underlined),
            (TextStyle::REVERSED, Attribute::Reverse),
        ] {
            if self.attrs.contains(flag) {
                out.queue(SetAttribute(attribute))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_only_resets() {
        let mut out = Vec::new();
        Style::PLAIN.apply(&mut out).unwrap();
        assert_eq!(out, b"\x1b[0m");
    }

    #[test]
    fn test_status_style_is_reversed() {
        let mut out = Vec::new();
        Style::STATUS.apply(&mut out).unwrap();
        assert_eq!(out, b"\x1b[0m\x1b[7m");
    }

    #[test]
    fn test_every_source_has_a_distinct_style() {
        let styles = [
            SourceStyle::Stdout,
            SourceStyle::Stderr,
            SourceStyle::System,
            SourceStyle::Input,
        ]
        .map(Style::for_source);
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
