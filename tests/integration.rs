use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Copy a fixture directory into a fresh temp dir so tests never touch the
/// checked-in files.
fn fixture_workspace(fixture: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let source = Path::new("tests/fixtures").join(fixture);
    for entry in std::fs::read_dir(&source).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn srcsplice(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_srcsplice"))
        .current_dir(cwd)
        .args(args)
        .output()
        .unwrap()
}

fn read(dir: &TempDir, name: &str) -> String {
    std::fs::read_to_string(dir.path().join(name)).unwrap()
}

#[test]
fn persistence_recipe_produces_expected_file() {
    let ws = fixture_workspace("persistence");

    let out = srcsplice(ws.path(), &["apply", "update_persistence.toml"]);
    assert!(out.status.success(), "apply failed: {}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(
        read(&ws, "persistence_service.dart"),
        read(&ws, "persistence_service.expected.dart")
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("step 2 \"rebuild progresses in an isolate\": changed"));
    assert!(stdout.contains("persistence_service.dart: patched"));
}

#[test]
fn second_apply_fails_loudly_and_changes_nothing() {
    let ws = fixture_workspace("persistence");
    let first = srcsplice(ws.path(), &["apply", "update_persistence.toml"]);
    assert!(first.status.success());
    let patched = read(&ws, "persistence_service.dart");

    // Import and replacement are already in place; the first removal no
    // longer finds its helper and must fail instead of passing silently.
    let second = srcsplice(ws.path(), &["apply", "update_persistence.toml"]);
    assert_eq!(second.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("Patch Target Missing"), "stderr: {stderr}");
    assert!(stderr.contains("step 3 (remove_block)"), "stderr: {stderr}");
    assert_eq!(read(&ws, "persistence_service.dart"), patched);
}

#[test]
fn removing_helpers_leaves_only_unrelated_method() {
    let ws = fixture_workspace("helpers");

    let out = srcsplice(ws.path(), &["apply", "remove_helpers.toml"]);
    assert!(out.status.success(), "apply failed: {}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(
        read(&ws, "scoring.dart"),
        "class ScoreBoard {\n\n  int total(List<int> rounds) {\n    return rounds.fold(0, (sum, r) => sum + r);\n  }\n}\n"
    );

    let inspect = srcsplice(ws.path(), &["inspect", "scoring.dart"]);
    assert!(inspect.status.success(), "inspect: {}", String::from_utf8_lossy(&inspect.stdout));
}

#[test]
fn check_and_dry_run_do_not_write() {
    let ws = fixture_workspace("helpers");
    let original = read(&ws, "scoring.dart");

    let check = srcsplice(ws.path(), &["check", "remove_helpers.toml"]);
    assert!(check.status.success());
    assert!(String::from_utf8_lossy(&check.stdout).contains("would be patched (dry run)"));

    let dry = srcsplice(ws.path(), &["apply", "--dry-run", "remove_helpers.toml"]);
    assert!(dry.status.success());
    assert_eq!(read(&ws, "scoring.dart"), original);
}

#[test]
fn ambiguous_start_reports_every_line() {
    let ws = fixture_workspace("helpers");
    std::fs::write(
        ws.path().join("ambiguous.toml"),
        "target = \"scoring.dart\"\n[[step]]\nkind = \"remove_block\"\nstart = 'return '\n",
    )
    .unwrap();
    let original = read(&ws, "scoring.dart");

    let out = srcsplice(ws.path(), &["apply", "ambiguous.toml"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Ambiguous Match"));
    assert!(stderr.contains("scoring.dart:4"));
    assert_eq!(read(&ws, "scoring.dart"), original);
}

#[test]
fn target_override_patches_another_file() {
    let ws = fixture_workspace("helpers");
    std::fs::copy(ws.path().join("scoring.dart"), ws.path().join("copy.dart")).unwrap();
    let original = read(&ws, "scoring.dart");

    let out = srcsplice(ws.path(), &["apply", "--target", "copy.dart", "remove_helpers.toml"]);
    assert!(out.status.success(), "apply failed: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(read(&ws, "scoring.dart"), original);
    assert!(!read(&ws, "copy.dart").contains("_bonusFor"));
}

#[test]
fn recipe_directory_applies_in_sorted_order() {
    let ws = tempfile::tempdir().unwrap();
    let recipes = ws.path().join("recipes");
    std::fs::create_dir(&recipes).unwrap();
    std::fs::write(ws.path().join("a.dart"), "import 'x.dart';\n").unwrap();
    std::fs::write(
        recipes.join("01_first.toml"),
        "target = \"../a.dart\"\n[[step]]\nkind = \"insert_import\"\nline = \"import 'y.dart';\"\nafter = \"import 'x.dart';\"\n",
    )
    .unwrap();
    std::fs::write(
        recipes.join("02_second.toml"),
        "target = \"../a.dart\"\n[[step]]\nkind = \"insert_import\"\nline = \"import 'z.dart';\"\nafter = \"import 'y.dart';\"\n",
    )
    .unwrap();

    let out = srcsplice(ws.path(), &["apply", "recipes"]);
    assert!(out.status.success(), "apply failed: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        std::fs::read_to_string(ws.path().join("a.dart")).unwrap(),
        "import 'x.dart';\nimport 'y.dart';\nimport 'z.dart';\n"
    );
}

#[test]
fn inspect_reports_findings_without_writing() {
    let ws = tempfile::tempdir().unwrap();
    let broken = "class GuideScreen {\n  Widget build() {\n    return CBSlidingPanel(\n  }\n}\n";
    std::fs::write(ws.path().join("guide_screen.dart"), broken).unwrap();

    let out = srcsplice(ws.path(), &["inspect", "--json", "guide_screen.dart"]);
    assert_eq!(out.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["clean"], false);
    assert_eq!(report["findings"][0]["kind"], "mismatched");
    assert_eq!(report["findings"][0]["at"]["line"], 4);
    assert_eq!(
        std::fs::read_to_string(ws.path().join("guide_screen.dart")).unwrap(),
        broken
    );
}

#[test]
fn missing_recipe_is_a_usage_error() {
    let ws = tempfile::tempdir().unwrap();
    let out = srcsplice(ws.path(), &["apply", "nope.toml"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Recipe Not Found"));
}

#[test]
fn backup_suffix_from_config_keeps_original() {
    let ws = fixture_workspace("helpers");
    std::fs::write(ws.path().join(".srcsplice.toml"), "backup_suffix = \".orig\"\n").unwrap();
    let original = read(&ws, "scoring.dart");

    let out = srcsplice(ws.path(), &["apply", "remove_helpers.toml"]);
    assert!(out.status.success());
    let backup: PathBuf = ws.path().join("scoring.dart.orig");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), original);
}
