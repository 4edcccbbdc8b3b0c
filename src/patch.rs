//! Applying one recipe to its target: read, pin check, steps, verify, commit.

use std::path::{Path, PathBuf};

use crate::balance;
use crate::config::Config;
use crate::error::Error;
use crate::hasher;
use crate::persist;
use crate::recipe::Recipe;
use crate::steps::{self, StepReport};
use crate::types::SourceBuffer;

/// What happened to one target.
#[derive(Debug)]
pub struct PatchOutcome {
    /// Whether the patched text differs from the original.
    pub changed: bool,
    /// Per-step results in order.
    pub reports: Vec<StepReport>,
    /// The file that was (or would have been) patched.
    pub target: PathBuf,
    /// Whether the file on disk was replaced.
    pub written: bool,
}

/// Read a target file into a buffer, enforcing the size limit.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::FileTooLarge`, or `Error::Io`.
pub fn read_target(path: &Path, config: &Config) -> Result<SourceBuffer, Error> {
    let metadata = match std::fs::metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound { path: path.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(m) => m,
    };
    if metadata.len() > config.max_file_size {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            max_bytes: config.max_file_size,
            size_bytes: metadata.len(),
        });
    }

    let text = std::fs::read_to_string(path)?;
    return Ok(SourceBuffer { path: path.to_path_buf(), text });
}

/// Refuse output that is unbalanced when the input was balanced. Input that
/// was already unbalanced only earns a warning.
///
/// # Errors
///
/// Returns `Error::UnbalancedOutput` listing every finding.
pub fn verify_output(original: &str, patched: &SourceBuffer, config: &Config) -> Result<(), Error> {
    if !config.verify_balance {
        return Ok(());
    }

    let before = balance::check(original);
    if !before.is_empty() {
        eprintln!(
            "warning: {} was unbalanced before patching ({} problem(s)); skipping balance check",
            patched.path.display(),
            before.len()
        );
        return Ok(());
    }

    let after = balance::check(&patched.text);
    if after.is_empty() {
        return Ok(());
    }
    return Err(Error::UnbalancedOutput {
        findings: after.iter().map(ToString::to_string).collect(),
        file: patched.path.clone(),
    });
}

/// Apply a recipe to `target` (the recipe's own target unless overridden).
/// Nothing is written unless every step and check succeeds, and never when
/// `dry_run` is set.
///
/// # Errors
///
/// Returns read, pin, step, verification, or write errors. On error the
/// target file is unchanged.
pub fn apply_recipe(
    recipe: &Recipe,
    target: Option<&Path>,
    config: &Config,
    dry_run: bool,
) -> Result<PatchOutcome, Error> {
    let target = target.unwrap_or(recipe.target.as_path());
    let mut buffer = read_target(target, config)?;
    if let Some(expected) = &recipe.expected_sha256 {
        hasher::verify_pin(&buffer, expected)?;
    }

    let original = buffer.text.clone();
    let reports = steps::run(&mut buffer, &recipe.steps)?;
    verify_output(&original, &buffer, config)?;

    let changed = buffer.text != original;
    let written = changed && !dry_run;
    if written {
        if let Some(suffix) = &config.backup_suffix {
            persist::write_atomic(&persist::backup_path(target, suffix), &original)?;
        }
        persist::write_atomic(target, &buffer.text)?;
    }

    return Ok(PatchOutcome { changed, reports, target: target.to_path_buf(), written });
}
