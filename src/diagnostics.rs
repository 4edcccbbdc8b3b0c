use std::fmt::Write as _;
use std::path::Path;

use crate::config::CONFIG_FILE;
use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened, where, and how to fix it.
/// The failing step is always named.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::PatchTargetMissing { step, file, boundary } => {
            render_target_missing(step, file, boundary)
        },
        Error::AmbiguousMatch { step, file, boundary, lines } => {
            render_ambiguous(step, file, boundary, lines)
        },
        Error::MalformedSpan { step, file, line, reason } => {
            render_malformed_span(step, file, *line, reason)
        },
        Error::UnbalancedOutput { file, findings } => render_unbalanced_output(file, findings),
        Error::ContentMismatch { file, expected, actual } => {
            render_content_mismatch(file, expected, actual)
        },
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.

## Fix

Check the recipe's `target`. Relative targets resolve against the recipe's
directory; `--target` resolves against the working directory.
", path.display()),

        Error::RecipeNotFound { path } => format!("\
# Error: Recipe Not Found

`{}` does not exist or contains no `*.toml` recipes.
", path.display()),

        Error::RecipeInvalid { file, reason } => format!("\
# Error: Invalid Recipe

`{}`: {reason}
", file.display()),

        Error::InvalidPattern { step, pattern, source } => format!("\
# Error: Invalid Pattern

{step}: `{pattern}` is not a valid regular expression.

    {source}
"),

        Error::FileTooLarge { file, size_bytes, max_bytes } => format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).

## Fix

Raise `max_file_size` in `{CONFIG_FILE}`.
", file.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_target_missing(step: &str, file: &Path, boundary: &str) -> String {
    format!("\
# Error: Patch Target Missing

{step}: {boundary} does not occur in `{}`.

Nothing was written.

## Fix

The file may have changed since the recipe was written. Run

    srcsplice inspect {}

and update the boundary to match the current text.
", file.display(), file.display())
}

fn render_ambiguous(step: &str, file: &Path, boundary: &str, lines: &[usize]) -> String {
    let mut out = format!("\
# Error: Ambiguous Match

{step}: {boundary} matches {} times in `{}`.

## Matches

", lines.len(), file.display());
    for line in lines {
        let _ = writeln!(out, "- {}:{line}", file.display());
    }
    out.push_str("\
\n## Fix

Anchor the pattern on the full declaration, including its parameter list,
so it matches exactly once.
");
    out
}

fn render_malformed_span(step: &str, file: &Path, line: usize, reason: &str) -> String {
    format!("\
# Error: Malformed Span

{step}: the block located at `{}:{line}` is not well-formed.

    {reason}

Nothing was written.

## Fix

If the block has an explicit `end`, make sure it is the block's own closing
line and not an earlier, nested one. Or drop `end` to match the body's
closing brace automatically.
", file.display())
}

fn render_unbalanced_output(file: &Path, findings: &[String]) -> String {
    let mut out = format!("\
# Error: Unbalanced Output

Patching `{}` would leave unmatched delimiters. Nothing was written.

## Findings

", file.display());
    for finding in findings {
        let _ = writeln!(out, "- {finding}");
    }
    let _ = write!(out, "\
\n## Fix

Check that every replacement block is complete. To write anyway, set
`verify_balance = false` in `{CONFIG_FILE}`.
");
    out
}

fn render_content_mismatch(file: &Path, expected: &str, actual: &str) -> String {
    format!("\
# Error: Content Mismatch

`{}` is not the version this recipe was written for.

    expected sha256 {expected}
    actual   sha256 {actual}

## Fix

Review the recipe against the current file, then update `expected_sha256`.
", file.display())
}
