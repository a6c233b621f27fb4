//! Command line behavior that does not need an Android SDK.

use assert_cmd::Command;
use predicates::prelude::*;

fn bundler() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_android").unwrap();
    cmd.env_remove("KODEGEN_ANDROID_CACHE");
    cmd
}

#[test]
fn help_lists_build_options() {
    bundler()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--release"))
        .stdout(predicate::str::contains("--report"))
        .stdout(predicate::str::contains("--cache-dir"));
}

#[test]
fn missing_manifest_fails() {
    let temp = tempfile::tempdir().unwrap();
    bundler()
        .arg("--project")
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bundle.toml"));
}

#[test]
fn verbose_and_quiet_are_rejected() {
    bundler()
        .args(["--verbose", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--quiet"));
}

#[test]
fn invalid_package_is_a_configuration_error() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(
        temp.path().join("bundle.toml"),
        "[project]\npackage = \"hello\"\n",
    )
    .unwrap();

    bundler()
        .arg("--project")
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hello"));
}

#[test]
fn release_build_requires_signing_section() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(
        temp.path().join("bundle.toml"),
        "[project]\npackage = \"com.example.hello\"\n",
    )
    .unwrap();

    bundler()
        .arg("--project")
        .arg(temp.path())
        .arg("--release")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[signing]"));
}
