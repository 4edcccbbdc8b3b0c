/// Crate-level error types for srcsplice diagnostics.
use std::path::PathBuf;

/// All errors in srcsplice carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, step, or boundary that failed.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A boundary that must be unique matched more than once.
    #[error(
        "{step}: ambiguous {boundary} in {} (matches on lines {})",
        file.display(),
        lines.iter().map(|l| return l.to_string()).collect::<Vec<_>>().join(", ")
    )]
    AmbiguousMatch {
        /// Human description of the boundary, e.g. "start pattern `foo`".
        boundary: String,
        /// File being patched.
        file: PathBuf,
        /// One-based line of every match.
        lines: Vec<usize>,
        /// Label of the failing step.
        step: String,
    },

    /// The target's content hash differs from the recipe's pin.
    #[error("content mismatch: {} has sha256 {actual}, recipe expects {expected}", file.display())]
    ContentMismatch {
        /// Hash of the file as read.
        actual: String,
        /// Hash pinned in the recipe.
        expected: String,
        /// File whose content was checked.
        file: PathBuf,
    },

    /// A target file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Target file exceeds the configured size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// A boundary regex failed to compile.
    #[error("{step}: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The pattern as written in the recipe.
        pattern: String,
        /// The wrapped regex error.
        source: regex::Error,
        /// Label of the step owning the pattern.
        step: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// The located region is not a well-formed block.
    #[error("{step}: malformed span at {}:{line}: {reason}", file.display())]
    MalformedSpan {
        /// File being patched.
        file: PathBuf,
        /// One-based line where the problem was detected.
        line: usize,
        /// Description of the imbalance.
        reason: String,
        /// Label of the failing step.
        step: String,
    },

    /// An anchor or boundary did not match anywhere.
    #[error("{step}: {boundary} not found in {}", file.display())]
    PatchTargetMissing {
        /// Human description of the boundary, e.g. "anchor `import 'dart:io';`".
        boundary: String,
        /// File being patched.
        file: PathBuf,
        /// Label of the failing step.
        step: String,
    },

    /// Recipe parsed as TOML but is semantically invalid.
    #[error("invalid recipe {}: {reason}", file.display())]
    RecipeInvalid {
        /// Recipe file.
        file: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// A recipe path does not exist on disk.
    #[error("recipe not found: {}", path.display())]
    RecipeNotFound {
        /// Path to the missing recipe.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The patched text is no longer delimiter-balanced.
    #[error("patched output of {} is unbalanced: {}", file.display(), findings.join("; "))]
    UnbalancedOutput {
        /// Rendered findings, one per problem.
        findings: Vec<String>,
        /// File that would have been written.
        file: PathBuf,
    },
}

impl Error {
    /// Whether this error comes from a patch precondition rather than from
    /// configuration or the environment. Drives the process exit code.
    pub const fn is_patch_failure(&self) -> bool {
        return matches!(
            self,
            Self::AmbiguousMatch { .. }
                | Self::ContentMismatch { .. }
                | Self::MalformedSpan { .. }
                | Self::PatchTargetMissing { .. }
                | Self::UnbalancedOutput { .. }
        );
    }
}
