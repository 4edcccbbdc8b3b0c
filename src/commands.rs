//! CLI commands: apply, check, inspect.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config;
use crate::error;
use crate::inspect;
use crate::patch::{self, PatchOutcome};
use crate::recipe::{self, Recipe};

/// Apply recipes in order. Each recipe commits on its own; the first failure
/// stops the run and leaves that recipe's target untouched.
///
/// # Errors
///
/// Returns errors from config loading, recipe loading, or patching.
pub fn apply(recipes: &[PathBuf], target: Option<&Path>, dry_run: bool) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let paths = recipe::collect_recipe_paths(recipes)?;

    if target.is_some() && paths.len() > 1 {
        return Err(error::Error::RecipeInvalid {
            file: paths.first().cloned().unwrap_or_default(),
            reason: format!("--target needs exactly one recipe, got {}", paths.len()),
        });
    }

    for path in &paths {
        let recipe = Recipe::load(path)?;
        let outcome = patch::apply_recipe(&recipe, target, &config, dry_run)?;
        print_outcome(&recipe, &outcome, dry_run);
    }

    return Ok(ExitCode::SUCCESS);
}

/// Inspect a file without modifying it. Exit 1 when anything was found.
///
/// # Errors
///
/// Returns errors from config loading or reading the file.
pub fn inspect(file: &Path, json: bool) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let report = inspect::inspect(file, &config)?;

    if json {
        inspect::print_json(&report)?;
    } else {
        inspect::print_text(&report);
    }

    if report.clean {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}

/// Print per-step results and the final status of one recipe.
fn print_outcome(recipe: &Recipe, outcome: &PatchOutcome, dry_run: bool) {
    let target = outcome.target.display();
    println!("{} -> {target}", recipe.source.display());
    for report in &outcome.reports {
        println!("  {}: {}", report.label, report.outcome);
    }

    let status = match (outcome.changed, outcome.written, dry_run) {
        (false, _, _) => "already up to date, nothing written",
        (true, _, true) => "would be patched (dry run)",
        (true, true, false) => "patched",
        (true, false, false) => "not written",
    };
    println!("{target}: {status}");
    return;
}
