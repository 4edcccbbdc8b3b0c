//! Recipe loading: TOML parsing, validation, and pattern compilation.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use walkdir::WalkDir;

use crate::config::CONFIG_FILE;
use crate::error::Error;

/// A validated recipe: one target file and the ordered steps to apply to it.
#[derive(Debug)]
pub struct Recipe {
    /// Optional SHA-256 pin of the target content the recipe was written against.
    pub expected_sha256: Option<String>,
    /// Recipe file this was loaded from.
    pub source: PathBuf,
    /// Steps in application order.
    pub steps: Vec<Step>,
    /// Target file, resolved against the recipe's directory.
    pub target: PathBuf,
}

/// One labelled transformation.
#[derive(Debug)]
pub struct Step {
    /// What the step does.
    pub action: Action,
    /// Label used in reports and errors, e.g. `step 2 (remove_block)`.
    pub label: String,
}

/// The transformations a step can perform.
#[derive(Debug)]
pub enum Action {
    /// Ensure `line` is present, inserting it after the line holding `anchor`.
    InsertImport {
        /// Literal text identifying the insertion line.
        anchor: String,
        /// The import line to ensure.
        line: String,
    },
    /// Collapse runs of blank lines.
    NormalizeBlankLines,
    /// Delete a located block.
    RemoveBlock {
        /// Where the block is.
        block: BlockBoundary,
    },
    /// Replace a located block with literal text.
    ReplaceBlock {
        /// Where the block is.
        block: BlockBoundary,
        /// Text that takes the block's place.
        replacement: String,
    },
}

/// Start and end of a block to locate.
#[derive(Debug)]
pub struct BlockBoundary {
    /// How the block ends.
    pub end: EndBoundary,
    /// Pattern for the declaration that opens the block. Must match exactly once.
    pub start: Regex,
}

/// How the end of a block is found, searching forward from the start match.
#[derive(Debug)]
pub enum EndBoundary {
    /// First occurrence of this literal; the block ends after it.
    Literal(String),
    /// Scan delimiters to the `}` matching the declaration's body `{`.
    MatchingBrace,
    /// First match of this pattern; the block ends after it.
    Pattern(Regex),
}

/// Raw TOML structure of a recipe file.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeToml {
    #[serde(default)]
    expected_sha256: Option<String>,
    #[serde(default, rename = "step")]
    steps: Vec<StepToml>,
    target: PathBuf,
}

/// Raw TOML structure of one `[[step]]` table.
#[derive(serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum StepToml {
    InsertImport {
        after: String,
        line: String,
        #[serde(default)]
        name: Option<String>,
    },
    NormalizeBlankLines {
        #[serde(default)]
        name: Option<String>,
    },
    RemoveBlock {
        #[serde(default)]
        end: Option<String>,
        #[serde(default)]
        end_regex: Option<String>,
        #[serde(default)]
        name: Option<String>,
        start: String,
    },
    ReplaceBlock {
        #[serde(default)]
        end: Option<String>,
        #[serde(default)]
        end_regex: Option<String>,
        #[serde(default)]
        name: Option<String>,
        replacement: String,
        start: String,
    },
}

impl StepToml {
    /// The `kind` tag as written in TOML.
    const fn kind(&self) -> &'static str {
        return match self {
            Self::InsertImport { .. } => "insert_import",
            Self::NormalizeBlankLines { .. } => "normalize_blank_lines",
            Self::RemoveBlock { .. } => "remove_block",
            Self::ReplaceBlock { .. } => "replace_block",
        };
    }

    /// The user-supplied step name, if any.
    fn name(&self) -> Option<&str> {
        return match self {
            Self::InsertImport { name, .. }
            | Self::NormalizeBlankLines { name }
            | Self::RemoveBlock { name, .. }
            | Self::ReplaceBlock { name, .. } => name.as_deref(),
        };
    }
}

impl Recipe {
    /// Read and validate a recipe file.
    ///
    /// # Errors
    ///
    /// Returns `Error::RecipeNotFound` if the file doesn't exist, `Error::Io`
    /// for other read failures, `Error::TomlDe` for malformed TOML, and
    /// `Error::RecipeInvalid` or `Error::InvalidPattern` for bad steps.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RecipeNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content, path);
    }

    /// Parse recipe TOML. `source` is the recipe's own path; a relative
    /// `target` resolves against its directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe`, `Error::RecipeInvalid`, or `Error::InvalidPattern`.
    pub fn parse(content: &str, source: &Path) -> Result<Self, Error> {
        let raw: RecipeToml = toml::from_str(content)?;

        if raw.steps.is_empty() {
            return Err(invalid(source, "recipe has no [[step]] tables"));
        }
        if raw.target.as_os_str().is_empty() {
            return Err(invalid(source, "`target` is empty"));
        }

        let steps = raw
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| return compile_step(source, i.saturating_add(1), step))
            .collect::<Result<Vec<_>, _>>()?;

        let target = if raw.target.is_absolute() {
            raw.target
        } else {
            source.parent().unwrap_or(Path::new("")).join(&raw.target)
        };

        return Ok(Self {
            expected_sha256: raw.expected_sha256,
            source: source.to_path_buf(),
            steps,
            target,
        });
    }
}

/// Expand recipe arguments into recipe files. Directories are walked for
/// `*.toml` files in sorted order, skipping the project config.
///
/// # Errors
///
/// Returns `Error::RecipeNotFound` for a path that doesn't exist and
/// `Error::Io` for a directory entry that can't be read.
pub fn collect_recipe_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_file() {
            paths.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(Error::RecipeNotFound { path: input.clone() });
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input) {
            let entry = entry.map_err(|e| return Error::Io(e.into()))?;
            let is_recipe = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| return ext == "toml")
                && entry.file_name() != CONFIG_FILE;
            if is_recipe {
                found.push(entry.into_path());
            }
        }
        found.sort();

        if found.is_empty() {
            return Err(Error::RecipeNotFound { path: input.clone() });
        }
        paths.extend(found);
    }

    return Ok(paths);
}

/// Validate one raw step and compile its patterns.
///
/// # Errors
///
/// Returns `Error::RecipeInvalid` or `Error::InvalidPattern`.
fn compile_step(source: &Path, index: usize, raw: StepToml) -> Result<Step, Error> {
    let label = match raw.name() {
        Some(name) => format!("step {index} \"{name}\""),
        None => format!("step {index} ({})", raw.kind()),
    };

    let action = match raw {
        StepToml::InsertImport { after, line, .. } => {
            if line.trim().is_empty() || after.trim().is_empty() {
                return Err(invalid(source, &format!("{label}: `line` and `after` must be non-empty")));
            }
            if line.contains('\n') {
                return Err(invalid(source, &format!("{label}: `line` must be a single line")));
            }
            Action::InsertImport { anchor: after, line }
        },
        StepToml::NormalizeBlankLines { .. } => Action::NormalizeBlankLines,
        StepToml::RemoveBlock { end, end_regex, start, .. } => Action::RemoveBlock {
            block: compile_boundary(source, &label, &start, end, end_regex)?,
        },
        StepToml::ReplaceBlock { end, end_regex, replacement, start, .. } => Action::ReplaceBlock {
            block: compile_boundary(source, &label, &start, end, end_regex)?,
            replacement,
        },
    };

    return Ok(Step { action, label });
}

/// Build a block boundary from the raw start/end fields.
///
/// # Errors
///
/// Returns `Error::RecipeInvalid` for empty or conflicting boundaries, or
/// `Error::InvalidPattern` if a regex doesn't compile.
fn compile_boundary(
    source: &Path,
    label: &str,
    start: &str,
    end: Option<String>,
    end_regex: Option<String>,
) -> Result<BlockBoundary, Error> {
    if start.is_empty() {
        return Err(invalid(source, &format!("{label}: `start` is empty")));
    }

    let end = match (end, end_regex) {
        (Some(_), Some(_)) => {
            return Err(invalid(source, &format!("{label}: set `end` or `end_regex`, not both")));
        },
        (Some(literal), None) if literal.is_empty() => {
            return Err(invalid(source, &format!("{label}: `end` is empty")));
        },
        (Some(literal), None) => EndBoundary::Literal(literal),
        (None, Some(pattern)) => EndBoundary::Pattern(compile_pattern(label, &pattern)?),
        (None, None) => EndBoundary::MatchingBrace,
    };

    return Ok(BlockBoundary { end, start: compile_pattern(label, start)? });
}

/// Compile a boundary pattern. `^` and `$` anchor at line boundaries.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` if the regex doesn't compile.
pub fn compile_pattern(label: &str, pattern: &str) -> Result<Regex, Error> {
    return RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| {
            return Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
                step: label.to_string(),
            };
        });
}

/// Shorthand for a `RecipeInvalid` error.
fn invalid(source: &Path, reason: &str) -> Error {
    return Error::RecipeInvalid { file: source.to_path_buf(), reason: reason.to_string() };
}
