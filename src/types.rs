/// Core domain types for srcsplice buffers, spans, and findings.
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use serde::Serialize;

/// A target file loaded into memory. Steps mutate `text`; nothing touches
/// the disk until the buffer is committed.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    /// Path the buffer was read from and will be written back to.
    pub path: PathBuf,
    /// Full text content.
    pub text: String,
}

/// A half-open byte range into a buffer. Always on char boundaries by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset range.
    pub range: Range<usize>,
}

impl Span {
    /// Span covering `start..end`.
    pub const fn new(start: usize, end: usize) -> Self {
        return Self { range: start..end };
    }
}

/// One-based line and column of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// One-based column, counted in chars.
    pub column: usize,
    /// One-based line number.
    pub line: usize,
}

impl Position {
    /// Compute the position of `offset` in `text`. Offsets past the end clamp
    /// to the end of the text.
    pub fn of(text: &str, offset: usize) -> Self {
        let clamped = offset.min(text.len());
        let before = text.get(..clamped).unwrap_or(text);
        let line = before.matches('\n').count().saturating_add(1);
        let line_start = before.rfind('\n').map_or(0, |i| return i.saturating_add(1));
        let column = before
            .get(line_start..)
            .map_or(0, |s| return s.chars().count())
            .saturating_add(1);
        return Self { column, line };
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}:{}", self.line, self.column);
    }
}

/// A structural problem found while scanning text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A run of blank lines longer than one.
    BlankRun {
        /// Number of consecutive blank lines.
        length: usize,
        /// Line of the first blank line.
        line: usize,
    },
    /// A closer that does not match the innermost open delimiter.
    Mismatched {
        /// The closer found.
        found: char,
        /// Where the closer is.
        at: Position,
        /// The opener it should have closed.
        open: char,
        /// Where that opener is.
        opened_at: Position,
    },
    /// A closer with no opener.
    StrayCloser {
        /// Where the closer is.
        at: Position,
        /// The closer found.
        found: char,
    },
    /// An opener never closed before the end of the text.
    Unclosed {
        /// Where the opener is.
        at: Position,
        /// The opener.
        open: char,
    },
    /// A string or block comment running to the end of the text.
    Unterminated {
        /// Where it starts.
        at: Position,
        /// "string" or "block comment".
        what: &'static str,
    },
}

impl Finding {
    /// Whether this finding concerns delimiter structure (as opposed to layout).
    pub const fn is_structural(&self) -> bool {
        return !matches!(self, Self::BlankRun { .. });
    }

    /// One-based line the finding points at.
    pub const fn line(&self) -> usize {
        return match self {
            Self::BlankRun { line, .. } => *line,
            Self::Mismatched { at, .. }
            | Self::StrayCloser { at, .. }
            | Self::Unclosed { at, .. }
            | Self::Unterminated { at, .. } => at.line,
        };
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::BlankRun { length, line } => {
                write!(f, "{line}: {length} consecutive blank lines")
            },
            Self::Mismatched { found, at, open, opened_at } => {
                write!(f, "{at}: `{found}` closes `{open}` opened at {opened_at}")
            },
            Self::StrayCloser { at, found } => write!(f, "{at}: unexpected `{found}`"),
            Self::Unclosed { at, open } => write!(f, "{at}: `{open}` is never closed"),
            Self::Unterminated { at, what } => write!(f, "{at}: unterminated {what}"),
        };
    }
}

/// Whether a step altered the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The buffer changed.
    Changed,
    /// The step's postcondition already held.
    Unchanged,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Changed => f.write_str("changed"),
            Self::Unchanged => f.write_str("unchanged"),
        };
    }
}
