//! The text transformations a recipe step can perform, and the runner that
//! applies a recipe's steps to an in-memory buffer.

use crate::error::Error;
use crate::locate;
use crate::recipe::{Action, BlockBoundary, Step};
use crate::types::{Finding, SourceBuffer, StepOutcome};

/// Outcome of one step, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// The step's label.
    pub label: String,
    /// Whether it changed the buffer.
    pub outcome: StepOutcome,
}

/// Apply every step in order. Stops at the first failure; the buffer may be
/// partially transformed at that point and must be discarded by the caller.
///
/// # Errors
///
/// Returns the first step error.
pub fn run(buffer: &mut SourceBuffer, steps: &[Step]) -> Result<Vec<StepReport>, Error> {
    let mut reports = Vec::with_capacity(steps.len());
    for step in steps {
        let outcome = apply(buffer, step)?;
        reports.push(StepReport { label: step.label.clone(), outcome });
    }
    return Ok(reports);
}

/// Apply a single step.
///
/// # Errors
///
/// Returns the step's boundary or span error.
pub fn apply(buffer: &mut SourceBuffer, step: &Step) -> Result<StepOutcome, Error> {
    return match &step.action {
        Action::InsertImport { anchor, line } => insert_import(buffer, &step.label, line, anchor),
        Action::NormalizeBlankLines => Ok(normalize_blank_lines(buffer)),
        Action::RemoveBlock { block } => remove_block(buffer, &step.label, block),
        Action::ReplaceBlock { block, replacement } => {
            replace_block(buffer, &step.label, block, replacement)
        },
    };
}

/// Ensure `line` is present. When absent it goes on its own line right after
/// the line containing `anchor`, using that line's terminator.
///
/// # Errors
///
/// Returns `Error::PatchTargetMissing` if the anchor is absent, or
/// `Error::AmbiguousMatch` if it occurs more than once.
pub fn insert_import(
    buffer: &mut SourceBuffer,
    step: &str,
    line: &str,
    anchor: &str,
) -> Result<StepOutcome, Error> {
    if buffer.text.contains(line) {
        return Ok(StepOutcome::Unchanged);
    }

    let anchor_span = locate::find_unique_literal(buffer, step, "anchor", anchor)?;
    let after_anchor = anchor_span.range.end;
    let newline = buffer
        .text
        .get(after_anchor..)
        .and_then(|rest| return rest.find('\n'))
        .map(|i| return after_anchor.saturating_add(i));

    match newline {
        Some(nl) => {
            let crlf = nl.checked_sub(1).and_then(|p| return buffer.text.as_bytes().get(p)) == Some(&b'\r');
            let terminator = if crlf { "\r\n" } else { "\n" };
            buffer.text.insert_str(nl.saturating_add(1), &format!("{line}{terminator}"));
        },
        None => {
            buffer.text.push('\n');
            buffer.text.push_str(line);
        },
    }

    return Ok(StepOutcome::Changed);
}

/// Replace a located block with `replacement`. The step counts as already
/// applied only when the replacement is present and the start pattern matches
/// nowhere outside it.
///
/// # Errors
///
/// Returns any error from locating the block.
pub fn replace_block(
    buffer: &mut SourceBuffer,
    step: &str,
    block: &BlockBoundary,
    replacement: &str,
) -> Result<StepOutcome, Error> {
    if is_replaced(&buffer.text, block, replacement) {
        return Ok(StepOutcome::Unchanged);
    }

    let span = locate::locate_block(buffer, step, block)?;
    buffer.text.replace_range(span.range, replacement);
    return Ok(StepOutcome::Changed);
}

/// The replacement occurs in `text` and every start match lies inside one of
/// its occurrences.
fn is_replaced(text: &str, block: &BlockBoundary, replacement: &str) -> bool {
    if replacement.is_empty() {
        return false;
    }
    let occurrences: Vec<(usize, usize)> = text
        .match_indices(replacement)
        .map(|(i, m)| return (i, i.saturating_add(m.len())))
        .collect();
    if occurrences.is_empty() {
        return false;
    }
    return block.start.find_iter(text).all(|m| {
        return occurrences.iter().any(|&(start, end)| return start <= m.start() && m.end() <= end);
    });
}

/// Delete a located block. The deletion widens to whole lines: indentation
/// before the start (when nothing else precedes it on the line) and trailing
/// whitespace plus one line break after the end.
///
/// # Errors
///
/// Returns any error from locating the block. A block that is not found is
/// always an error.
pub fn remove_block(
    buffer: &mut SourceBuffer,
    step: &str,
    block: &BlockBoundary,
) -> Result<StepOutcome, Error> {
    let span = locate::locate_block(buffer, step, block)?;
    let text = buffer.text.as_str();

    let mut start = span.range.start;
    let line_start = text
        .get(..start)
        .and_then(|before| return before.rfind('\n'))
        .map_or(0, |i| return i.saturating_add(1));
    if text.get(line_start..start).is_some_and(is_horizontal_whitespace) {
        start = line_start;
    }

    let mut end = span.range.end;
    let rest = text.get(end..).unwrap_or("");
    let trailing = rest.len().saturating_sub(rest.trim_start_matches([' ', '\t']).len());
    let after_ws = rest.get(trailing..).unwrap_or("");
    if after_ws.starts_with("\r\n") {
        end = end.saturating_add(trailing).saturating_add(2);
    } else if after_ws.starts_with('\n') || after_ws.is_empty() {
        end = end.saturating_add(trailing).saturating_add(usize::from(!after_ws.is_empty()));
    }

    buffer.text.replace_range(start..end, "");
    return Ok(StepOutcome::Changed);
}

/// Collapse every run of two or more empty lines to its first line. Lines
/// holding spaces or tabs are left alone, so whitespace inside multi-line
/// string literals survives.
pub fn normalize_blank_lines(buffer: &mut SourceBuffer) -> StepOutcome {
    let normalized = collapse_blank_lines(&buffer.text);
    if normalized == buffer.text {
        return StepOutcome::Unchanged;
    }
    buffer.text = normalized;
    return StepOutcome::Changed;
}

/// Collapse runs of empty lines to one line, keeping the first line of each
/// run as written.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = false;
    for line in text.split_inclusive('\n') {
        let blank = is_blank_line(line);
        if !(blank && previous_blank) {
            out.push_str(line);
        }
        previous_blank = blank;
    }
    return out;
}

/// Report every run of more than one blank line.
pub fn blank_runs(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut run_start = 0_usize;
    let mut run_length = 0_usize;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        if is_blank_line(line) {
            if run_length == 0 {
                run_start = index.saturating_add(1);
            }
            run_length = run_length.saturating_add(1);
            continue;
        }
        if run_length > 1 {
            findings.push(Finding::BlankRun { length: run_length, line: run_start });
        }
        run_length = 0;
    }
    if run_length > 1 {
        findings.push(Finding::BlankRun { length: run_length, line: run_start });
    }

    return findings;
}

/// An empty line, with or without its terminator.
fn is_blank_line(line: &str) -> bool {
    return line.trim_end_matches(['\n', '\r']).is_empty();
}

/// Only spaces and tabs (or nothing).
fn is_horizontal_whitespace(s: &str) -> bool {
    return s.chars().all(|c| return c == ' ' || c == '\t');
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::recipe::{EndBoundary, compile_pattern};

    fn buffer(text: &str) -> SourceBuffer {
        return SourceBuffer { path: PathBuf::from("t.dart"), text: text.to_string() };
    }

    fn braces(start: &str) -> BlockBoundary {
        return BlockBoundary { end: EndBoundary::MatchingBrace, start: compile_pattern("t", start).unwrap() };
    }

    #[test]
    fn import_inserted_after_anchor_line() {
        let mut buf = buffer("import 'dart:async';\nimport 'dart:isolate';\n\nclass A {}\n");
        let outcome = insert_import(&mut buf, "s", "import 'calc.dart';", "import 'dart:isolate';").unwrap();
        assert_eq!(outcome, StepOutcome::Changed);
        assert_eq!(
            buf.text,
            "import 'dart:async';\nimport 'dart:isolate';\nimport 'calc.dart';\n\nclass A {}\n"
        );
    }

    #[test]
    fn import_insertion_is_idempotent() {
        let mut buf = buffer("import 'dart:isolate';\nclass A {}\n");
        insert_import(&mut buf, "s", "import 'calc.dart';", "import 'dart:isolate';").unwrap();
        let once = buf.text.clone();
        let outcome = insert_import(&mut buf, "s", "import 'calc.dart';", "import 'dart:isolate';").unwrap();
        assert_eq!(outcome, StepOutcome::Unchanged);
        assert_eq!(buf.text, once);
    }

    #[test]
    fn import_present_without_anchor_is_noop() {
        let mut buf = buffer("import 'calc.dart';\n");
        let outcome = insert_import(&mut buf, "s", "import 'calc.dart';", "import 'missing';").unwrap();
        assert_eq!(outcome, StepOutcome::Unchanged);
    }

    #[test]
    fn missing_anchor_is_an_error() {
        let mut buf = buffer("import 'dart:async';\n");
        let err = insert_import(&mut buf, "step 1", "import 'calc.dart';", "import 'dart:isolate';").unwrap_err();
        assert!(matches!(err, Error::PatchTargetMissing { .. }));
        assert_eq!(buf.text, "import 'dart:async';\n");
    }

    #[test]
    fn import_after_unterminated_last_line_and_crlf() {
        let mut buf = buffer("import 'a.dart';");
        insert_import(&mut buf, "s", "import 'b.dart';", "import 'a.dart';").unwrap();
        assert_eq!(buf.text, "import 'a.dart';\nimport 'b.dart';");

        let mut buf = buffer("import 'a.dart';\r\nvoid main() {}\r\n");
        insert_import(&mut buf, "s", "import 'b.dart';", "import 'a.dart';").unwrap();
        assert_eq!(buf.text, "import 'a.dart';\r\nimport 'b.dart';\r\nvoid main() {}\r\n");
    }

    #[test]
    fn replace_block_keeps_surrounding_bytes() {
        let before = "class S {\n  int a = 1;\n\n";
        let old = "  Future<List<int>> foo() async {\n    final r = await q();\n    return bar;\n  }";
        let after = "\n\n  void keep() {}\n}\n";
        let mut buf = buffer(&format!("{before}{old}{after}"));
        let block = BlockBoundary {
            end: EndBoundary::Literal("return bar;\n  }".to_string()),
            start: compile_pattern("t", r"^  Future<List<int>> foo\(\) async \{").unwrap(),
        };
        let replacement = "  Future<List<int>> foo() async {\n    return const [];\n  }";

        replace_block(&mut buf, "s", &block, replacement).unwrap();
        assert_eq!(buf.text, format!("{before}{replacement}{after}"));

        // Already applied: the guard makes the second run a no-op.
        let outcome = replace_block(&mut buf, "s", &block, replacement).unwrap();
        assert_eq!(outcome, StepOutcome::Unchanged);
    }

    #[test]
    fn remove_block_takes_whole_lines() {
        let mut buf = buffer("class A {\n  int _a() {\n    return 1;\n  }\n  int b() => 2;\n}\n");
        remove_block(&mut buf, "s", &braces(r"int _a\(\)")).unwrap();
        assert_eq!(buf.text, "class A {\n  int b() => 2;\n}\n");
    }

    #[test]
    fn remove_block_with_zero_matches_fails() {
        let mut buf = buffer("class A {}\n");
        let err = remove_block(&mut buf, "step 2", &braces(r"int _gone\(\)")).unwrap_err();
        assert!(matches!(err, Error::PatchTargetMissing { ref step, .. } if step == "step 2"));
    }

    #[test]
    fn remove_block_at_end_of_file_without_newline() {
        let mut buf = buffer("void a() {}\nclass _Stats {\n  int n = 0;\n}");
        remove_block(&mut buf, "s", &braces(r"^class _Stats")).unwrap();
        assert_eq!(buf.text, "void a() {}\n");
    }

    #[test]
    fn normalization_collapses_runs_and_is_idempotent() {
        let input = "\n\n\na\n\n\n\r\nb\n\nc\n\n\n";
        let once = collapse_blank_lines(input);
        assert_eq!(once, "\na\n\nb\n\nc\n\n");
        assert_eq!(collapse_blank_lines(&once), once);
        assert!(blank_runs(&once).is_empty());
    }

    #[test]
    fn blank_runs_report_length_and_start() {
        let runs = blank_runs("a\n\n\n\nb\n\nc\n\n");
        assert_eq!(runs, vec![Finding::BlankRun { length: 3, line: 2 }]);
        assert_eq!(blank_runs("a\n\n\r\n"), vec![Finding::BlankRun { length: 2, line: 2 }]);
    }

    #[test]
    fn whitespace_only_lines_are_not_collapsed() {
        let input = "const banner = '''\n  \n  \n\t\n''';\n";
        assert_eq!(collapse_blank_lines(input), input);
        assert!(blank_runs(input).is_empty());
    }

    #[test]
    fn replacement_present_elsewhere_still_replaces_old_block() {
        let mut buf = buffer("class A {\n  int stub() => 0;\n  int old() {\n    return 1;\n  }\n}\n");
        let outcome = replace_block(&mut buf, "s", &braces(r"^  int old\(\)"), "  int stub() => 0;").unwrap();
        assert_eq!(outcome, StepOutcome::Changed);
        assert_eq!(buf.text, "class A {\n  int stub() => 0;\n  int stub() => 0;\n}\n");
    }

    #[test]
    fn replacement_without_old_block_or_text_is_missing() {
        let mut buf = buffer("class A {}\n");
        let err = replace_block(&mut buf, "step 3", &braces(r"^  int old\(\)"), "  int stub() => 0;").unwrap_err();
        assert!(matches!(err, Error::PatchTargetMissing { ref step, .. } if step == "step 3"));
    }
}
