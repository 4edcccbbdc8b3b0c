//! Delimiter balance checks over scanned text.

use std::ops::Range;

use crate::scanner::{self, Delim, opener_for};
use crate::types::{Finding, Position};

/// Why a brace scan could not produce a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanProblem {
    /// Byte offset (relative to the scanned text) where the problem is.
    pub offset: usize,
    /// Human-readable reason.
    pub reason: String,
}

/// Check that every delimiter in `text` is matched. Returns all structural
/// findings in order of appearance; an empty vector means balanced.
pub fn check(text: &str) -> Vec<Finding> {
    return check_range(text, 0..text.len());
}

/// Check the balance of `text[range]` on its own, reporting positions
/// relative to the whole of `text`. An out-of-range or non-boundary range
/// is checked as empty.
pub fn check_range(text: &str, range: Range<usize>) -> Vec<Finding> {
    let base = range.start;
    let slice = text.get(range).unwrap_or("");
    let at = |offset: usize| return Position::of(text, base.saturating_add(offset));

    let scanned = scanner::scan(slice);
    let mut findings = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();

    for event in &scanned.events {
        match event.delim {
            Delim::Open(open) => stack.push((open, event.offset)),
            Delim::Close(close) => match stack.pop() {
                None => findings.push(Finding::StrayCloser { at: at(event.offset), found: close }),
                Some((open, opened)) if open != opener_for(close) => {
                    findings.push(Finding::Mismatched {
                        found: close,
                        at: at(event.offset),
                        open,
                        opened_at: at(opened),
                    });
                },
                Some(_) => {},
            },
            Delim::Semicolon => {},
        }
    }

    for (open, offset) in stack {
        findings.push(Finding::Unclosed { at: at(offset), open });
    }
    for unterminated in scanned.unterminated {
        findings.push(Finding::Unterminated { at: at(unterminated.offset), what: unterminated.what });
    }

    return findings;
}

/// Find the end of the block that starts in `text`.
///
/// Tracks `()`, `[]` and `{}` nesting from the start of `text`. The first `{`
/// seen at depth zero opens the block; the returned offset is just past its
/// matching `}`. Braces inside a parameter list (`f({int a}) {`) are nested
/// in parens and so never mistaken for the body.
///
/// # Errors
///
/// Returns a `SpanProblem` if a `;` ends the declaration before any body
/// opens, if a closer does not match its opener, or if the text ends first.
pub fn block_end(text: &str) -> Result<usize, SpanProblem> {
    let scanned = scanner::scan(text);
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut body_open = false;

    for event in &scanned.events {
        match event.delim {
            Delim::Semicolon if stack.is_empty() && !body_open => {
                return Err(SpanProblem {
                    offset: event.offset,
                    reason: "declaration ends with `;` before any `{` body".to_string(),
                });
            },
            Delim::Semicolon => {},
            Delim::Open(open) => {
                if open == '{' && stack.is_empty() {
                    body_open = true;
                }
                stack.push((open, event.offset));
            },
            Delim::Close(close) => {
                let Some((open, opened)) = stack.pop() else {
                    return Err(SpanProblem {
                        offset: event.offset,
                        reason: format!("unexpected `{close}` before the block opens"),
                    });
                };
                if open != opener_for(close) {
                    return Err(SpanProblem {
                        offset: event.offset,
                        reason: format!(
                            "`{close}` closes `{open}` opened at {}",
                            Position::of(text, opened)
                        ),
                    });
                }
                if stack.is_empty() && body_open {
                    return Ok(event.offset.saturating_add(1));
                }
            },
        }
    }

    let reason = if body_open {
        "block is never closed".to_string()
    } else {
        "no `{` body follows the start boundary".to_string()
    };
    let offset = stack.first().map_or(0, |&(_, offset)| return offset);
    return Err(SpanProblem { offset, reason });
}
