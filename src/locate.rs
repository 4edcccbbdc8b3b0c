//! Boundary matching: find exactly one start, then the block's end.

use regex::Regex;

use crate::balance;
use crate::error::Error;
use crate::recipe::{BlockBoundary, EndBoundary};
use crate::types::{Position, SourceBuffer, Span};

/// Find the single match of `pattern` in the buffer.
///
/// # Errors
///
/// Returns `Error::PatchTargetMissing` for zero matches and
/// `Error::AmbiguousMatch` (with every match's line) for more than one.
pub fn find_unique_pattern(
    buffer: &SourceBuffer,
    step: &str,
    pattern: &Regex,
) -> Result<Span, Error> {
    let matches: Vec<Span> = pattern
        .find_iter(&buffer.text)
        .map(|m| return Span::new(m.start(), m.end()))
        .collect();
    let boundary = format!("start pattern {:?}", pattern.as_str());
    return exactly_one(buffer, step, boundary, matches);
}

/// Find the single occurrence of `literal` in the buffer.
///
/// # Errors
///
/// Returns `Error::PatchTargetMissing` for zero occurrences and
/// `Error::AmbiguousMatch` for more than one.
pub fn find_unique_literal(
    buffer: &SourceBuffer,
    step: &str,
    what: &str,
    literal: &str,
) -> Result<Span, Error> {
    let matches: Vec<Span> = buffer
        .text
        .match_indices(literal)
        .map(|(i, m)| return Span::new(i, i.saturating_add(m.len())))
        .collect();
    return exactly_one(buffer, step, format!("{what} {literal:?}"), matches);
}

/// Locate the full extent of a block: from the start of its unique start
/// match to the end of its end boundary. The span is validated to be
/// delimiter-balanced.
///
/// # Errors
///
/// Returns `Error::PatchTargetMissing` or `Error::AmbiguousMatch` for the
/// start boundary, `Error::PatchTargetMissing` for a missing end boundary,
/// and `Error::MalformedSpan` if the block is not well-formed.
pub fn locate_block(
    buffer: &SourceBuffer,
    step: &str,
    block: &BlockBoundary,
) -> Result<Span, Error> {
    let start = find_unique_pattern(buffer, step, &block.start)?;
    let text = buffer.text.as_str();

    let end = match &block.end {
        EndBoundary::Literal(literal) => text
            .get(start.range.end..)
            .and_then(|rest| return rest.find(literal.as_str()))
            .map(|i| return start.range.end.saturating_add(i).saturating_add(literal.len()))
            .ok_or_else(|| {
                return missing(buffer, step, format!("end marker {literal:?} after the start match"));
            })?,
        EndBoundary::Pattern(pattern) => pattern
            .find_at(text, start.range.end)
            .map(|m| return m.end())
            .ok_or_else(|| {
                return missing(
                    buffer,
                    step,
                    format!("end pattern {:?} after the start match", pattern.as_str()),
                );
            })?,
        EndBoundary::MatchingBrace => {
            let rest = text.get(start.range.start..).unwrap_or("");
            match balance::block_end(rest) {
                Ok(len) => start.range.start.saturating_add(len),
                Err(problem) => {
                    let offset = start.range.start.saturating_add(problem.offset);
                    return Err(Error::MalformedSpan {
                        file: buffer.path.clone(),
                        line: Position::of(text, offset).line,
                        reason: problem.reason,
                        step: step.to_string(),
                    });
                },
            }
        },
    };

    let span = Span::new(start.range.start, end);
    let findings = balance::check_range(text, span.range.clone());
    if let Some(first) = findings.first() {
        return Err(Error::MalformedSpan {
            file: buffer.path.clone(),
            line: first.line(),
            reason: format!(
                "matched block is not balanced ({} problem(s), first: {first})",
                findings.len()
            ),
            step: step.to_string(),
        });
    }

    return Ok(span);
}

/// Require exactly one match.
///
/// # Errors
///
/// Returns `Error::PatchTargetMissing` or `Error::AmbiguousMatch`.
fn exactly_one(
    buffer: &SourceBuffer,
    step: &str,
    boundary: String,
    mut matches: Vec<Span>,
) -> Result<Span, Error> {
    if matches.len() > 1 {
        let lines = matches
            .iter()
            .map(|m| return Position::of(&buffer.text, m.range.start).line)
            .collect();
        return Err(Error::AmbiguousMatch {
            boundary,
            file: buffer.path.clone(),
            lines,
            step: step.to_string(),
        });
    }
    return matches.pop().ok_or_else(|| return missing(buffer, step, boundary));
}

/// Shorthand for a `PatchTargetMissing` error.
fn missing(buffer: &SourceBuffer, step: &str, boundary: String) -> Error {
    return Error::PatchTargetMissing {
        boundary,
        file: buffer.path.clone(),
        step: step.to_string(),
    };
}
