//! View projection: filter and highlight a buffer snapshot.
//!
//! [`project`] is a pure function. Nothing here knows about terminals,
//! colors or layout; the renderer maps [`SourceStyle`] and highlight ranges
//! to whatever it paints.
//!
//! Cost is linear in the number of buffered lines. Recomputing on every
//! appended line is therefore quadratic over a long session, which is fine
//! for human-rate logs but not for very large buffers. [`ViewCache`] skips
//! recomputation when neither the buffer nor the terms changed.

use super::buffer::LogBuffer;
use super::line::{LogLine, Source};
use std::ops::Range;

/// Display class of a projected line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceStyle {
    /// Regular program output.
    Stdout,
    /// Program error output.
    Stderr,
    /// Riveflow's own messages.
    System,
    /// Echoed user input.
    Input,
}

impl SourceStyle {
    /// Gutter marker shown before the content.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Stdout => "",
            Self::Stderr => "✖ ",
            Self::System => "ℹ ",
            Self::Input => "➤ ",
        }
    }
}

impl From<Source> for SourceStyle {
    fn from(source: Source) -> Self {
        match source {
            Source::Stdout => Self::Stdout,
            Source::Stderr => Self::Stderr,
            Source::System => Self::System,
            Source::Input => Self::Input,
        }
    }
}

/// One visible row of the log view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedLine {
    /// Sequence number of the underlying log line.
    pub sequence: u64,
    /// Unmodified line content.
    pub content: String,
    /// Display class.
    pub style: SourceStyle,
    /// Byte ranges of `content` matching the search term, ascending and
    /// non-overlapping.
    pub highlights: Vec<Range<usize>>,
}

/// Compute the visible view of `lines`.
///
/// Lines whose content does not contain `filter_term` (case-insensitively)
/// are dropped; an empty filter keeps everything. Every occurrence of
/// `search_term` in a kept line becomes a highlight range; an empty search
/// term yields no ranges.
pub fn project(lines: &[LogLine], filter_term: &str, search_term: &str) -> Vec<ProjectedLine> {
    let filter = FoldedNeedle::new(filter_term);
    let search = FoldedNeedle::new(search_term);

    lines
        .iter()
        .filter(|line| filter.is_empty() || filter.find_in(line.content()).next().is_some())
        .map(|line| ProjectedLine {
            sequence: line.sequence(),
            content: line.content().to_string(),
            style: line.source().into(),
            highlights: search.find_in(line.content()).collect(),
        })
        .collect()
}

/// Byte ranges of every non-overlapping case-insensitive occurrence of
/// `needle` in `haystack`.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    FoldedNeedle::new(needle).find_in(haystack).collect()
}

/// A lowercased needle, ready for repeated searches.
struct FoldedNeedle {
    chars: Vec<char>,
}

impl FoldedNeedle {
    fn new(needle: &str) -> Self {
        Self {
            chars: needle.chars().flat_map(char::to_lowercase).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn find_in(&self, haystack: &str) -> Matches<'_> {
        Matches::new(haystack, &self.chars)
    }
}

/// Iterator over match ranges.
///
/// The haystack is folded char by char; each folded char remembers the byte
/// range of the original char it came from, so ranges always land on char
/// boundaries of the unmodified content.
struct Matches<'a> {
    folded: Vec<(char, Range<usize>)>,
    needle: &'a [char],
    pos: usize,
    last_end: usize,
}

impl<'a> Matches<'a> {
    fn new(haystack: &str, needle: &'a [char]) -> Self {
        let folded = if needle.is_empty() {
            Vec::new()
        } else {
            haystack
                .char_indices()
                .flat_map(|(start, c)| {
                    let span = start..start + c.len_utf8();
                    c.to_lowercase().map(move |lc| (lc, span.clone()))
                })
                .collect()
        };
        Self {
            folded,
            needle,
            pos: 0,
            last_end: 0,
        }
    }
}

impl Iterator for Matches<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.needle.len();
        if n == 0 {
            return None;
        }
        while self.pos + n <= self.folded.len() {
            let window = &self.folded[self.pos..self.pos + n];
            if window.iter().map(|(c, _)| c).eq(self.needle.iter()) {
                let range = window[0].1.start..window[n - 1].1.end;
                self.pos += n;
                // Multi-char foldings can map two matches onto one source char.
                if range.start < self.last_end {
                    continue;
                }
                self.last_end = range.end;
                return Some(range);
            }
            self.pos += 1;
        }
        None
    }
}

/// Memoized projection keyed on buffer revision and terms.
#[derive(Debug, Default)]
pub struct ViewCache {
    key: Option<(u64, String, String)>,
    lines: Vec<ProjectedLine>,
}

impl ViewCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the projection for the current state, recomputing if needed.
    pub fn view(&mut self, buffer: &LogBuffer, filter_term: &str, search_term: &str) -> &[ProjectedLine] {
        let fresh = matches!(
            &self.key,
            Some((revision, filter, search))
                if *revision == buffer.revision() && filter == filter_term && search == search_term
        );
        if !fresh {
            self.lines = project(buffer.snapshot(), filter_term, search_term);
            self.key = Some((
                buffer.revision(),
                filter_term.to_string(),
                search_term.to_string(),
            ));
        }
        &self.lines
    }
}
