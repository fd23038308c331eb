use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn rcompile_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rcompile"))
}

fn write(dir: &TempDir, relative: &str, content: &str) {
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(&dir, "main.js", "var greet = require('./greet');\nexports.text = greet.text;\n");
    write(&dir, "greet.js", "exports.text = 'hello';\n");
    write(&dir, "vendor/fmt.js", "exports.name = 'vendor';\n");
    write(&dir, "lib/fmt.js", "exports.name = 'lib';\n");
    write(&dir, "uses_lib.js", "exports.name = require('fmt').name;\n");
    dir
}

// ============================================================================
// BASIC BUNDLING
// ============================================================================

#[test]
fn test_bundle_to_stdout() {
    let dir = sample_project();

    rcompile_cmd()
        .current_dir(dir.path())
        .arg("main.js")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("(function () {"))
        .stdout(predicate::str::contains("__rcompile.set(\"greet.js\""))
        .stdout(predicate::str::contains("__rcompile.run(\"main.js\");"));
}

#[test]
fn test_no_input_files_fails() {
    let dir = TempDir::new().unwrap();

    rcompile_cmd()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No input files"));
}

#[test]
fn test_missing_entry_fails() {
    let dir = TempDir::new().unwrap();

    rcompile_cmd()
        .current_dir(dir.path())
        .arg("absent.js")
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.js"));
}

#[test]
fn test_missing_dependency_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir, "main.js", "require('./gone');\n");

    rcompile_cmd()
        .current_dir(dir.path())
        .arg("main.js")
        .assert()
        .failure()
        .stderr(predicate::str::contains("gone.js"));
}

// ============================================================================
// OPTIONS
// ============================================================================

#[test]
fn test_base_directory() {
    let dir = sample_project();

    rcompile_cmd()
        .arg("--base")
        .arg(dir.path())
        .arg("main.js")
        .assert()
        .success()
        .stdout(predicate::str::contains("__rcompile.run(\"main.js\");"));
}

#[test]
fn test_last_library_root_wins() {
    let dir = sample_project();

    rcompile_cmd()
        .current_dir(dir.path())
        .args(["-l", "vendor", "-l", "lib", "uses_lib.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "__rcompile.alias(\"fmt\", \"lib/fmt.js\");",
        ))
        .stdout(predicate::str::contains("vendor/fmt.js").not());
}

#[test]
fn test_comma_separated_library_roots() {
    let dir = sample_project();

    rcompile_cmd()
        .current_dir(dir.path())
        .args(["--library", "lib,vendor", "uses_lib.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "__rcompile.alias(\"fmt\", \"vendor/fmt.js\");",
        ));
}

#[test]
fn test_output_file_creates_directories() {
    let dir = sample_project();

    rcompile_cmd()
        .current_dir(dir.path())
        .args(["-o", "dist/nested/app.js", "main.js"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let bundle = fs::read_to_string(dir.path().join("dist/nested/app.js")).unwrap();
    assert!(bundle.contains("__rcompile.run(\"main.js\");"));
}

#[test]
fn test_compress_drops_blank_lines() {
    let dir = sample_project();

    let output = rcompile_cmd()
        .current_dir(dir.path())
        .args(["--compress", "main.js"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let bundle = String::from_utf8(output.stdout).unwrap();
    assert!(bundle.contains("__rcompile.run(\"main.js\");"));
    assert!(!bundle.contains("\n\n"));
    assert!(bundle.lines().all(|line| line == line.trim()));
}

#[test]
fn test_multiple_entries_are_joined_in_order() {
    let dir = sample_project();

    let output = rcompile_cmd()
        .current_dir(dir.path())
        .args(["-l", "lib", "main.js", "uses_lib.js"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let first = text.find("__rcompile.run(\"main.js\");").unwrap();
    let second = text.find("__rcompile.run(\"uses_lib.js\");").unwrap();
    assert!(first < second);
    assert!(text.contains("}).call(this);\n\n\n(function () {"));
}

#[test]
fn test_list_prints_manifest() {
    let dir = sample_project();

    let output = rcompile_cmd()
        .current_dir(dir.path())
        .args(["--list", "-l", "lib", "uses_lib.js"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        manifest,
        serde_json::json!([{
            "entry": "uses_lib.js",
            "modules": ["uses_lib.js", "lib/fmt.js"],
            "aliases": { "fmt": "lib/fmt.js" }
        }])
    );
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = sample_project();

    rcompile_cmd()
        .current_dir(dir.path())
        .args(["-v", "main.js"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiling main.js"))
        .stdout(predicate::str::contains("Compiling").not());
}

// ============================================================================
// CONFIGURATION FILE
// ============================================================================

#[test]
fn test_init_writes_config() {
    let dir = TempDir::new().unwrap();

    rcompile_cmd()
        .current_dir(dir.path())
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created rcompile.json"));

    let config = fs::read_to_string(dir.path().join("rcompile.json")).unwrap();
    assert!(config.contains("compilerOptions"));
}

#[test]
fn test_config_entries_and_options() {
    let dir = sample_project();
    write(
        &dir,
        "rcompile.json",
        r#"{
            "compilerOptions": { "library": ["vendor"], "outFile": "out/bundle.js" },
            "entries": ["uses_lib.js"]
        }"#,
    );

    rcompile_cmd().current_dir(dir.path()).assert().success();

    let bundle = fs::read_to_string(dir.path().join("out/bundle.js")).unwrap();
    assert!(bundle.contains("__rcompile.alias(\"fmt\", \"vendor/fmt.js\");"));
}

#[test]
fn test_cli_library_overrides_config() {
    let dir = sample_project();
    write(
        &dir,
        "settings.json",
        r#"{ "compilerOptions": { "library": ["vendor"] } }"#,
    );

    rcompile_cmd()
        .current_dir(dir.path())
        .args(["--project", "settings.json", "-l", "lib", "uses_lib.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"lib/fmt.js\""));
}

#[test]
fn test_invalid_config_fails() {
    let dir = sample_project();
    write(&dir, "rcompile.json", "{ nope");

    rcompile_cmd()
        .current_dir(dir.path())
        .arg("main.js")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load rcompile.json"));
}
