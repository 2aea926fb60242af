//! End-to-end runs of `sample create`, `sample test` and `sample list`.

mod common;

use common::{bin, core_script, core_scripts, stderr, stdout};
use std::fs;

#[test]
fn create_then_test_passes_for_bundled_scripts() {
    let root = tempfile::tempdir().expect("temp dir");

    let output = bin()
        .args(["sample", "create", "--samples-path"])
        .arg(root.path())
        .args(core_scripts())
        .output()
        .expect("run create");
    assert!(output.status.success(), "create failed: {}", stderr(&output));
    assert!(root.path().join("core/simple1.nwb").is_file());
    assert!(root.path().join("core/fleischmann.nwb").is_file());

    let output = bin()
        .args(["sample", "test", "--samples-path"])
        .arg(root.path())
        .args(core_scripts())
        .output()
        .expect("run test");
    assert!(output.status.success(), "test failed: {}", stderr(&output));
    assert!(stdout(&output).contains("2 sample file(s) passed"));
}

#[test]
fn test_without_samples_fails() {
    let root = tempfile::tempdir().expect("temp dir");
    let output = bin()
        .args(["sample", "test", "--samples-path"])
        .arg(root.path())
        .arg(core_script("simple1"))
        .output()
        .expect("run test");
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("sample file not found"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn second_create_keeps_existing_files() {
    let root = tempfile::tempdir().expect("temp dir");
    let script = core_script("simple1");
    let create = || {
        bin()
            .args(["sample", "create", "--samples-path"])
            .arg(root.path())
            .arg(&script)
            .output()
            .expect("run create")
    };

    assert!(create().status.success());
    let target = root.path().join("core/simple1.nwb");
    fs::write(&target, "left alone").expect("overwrite sample");

    let output = create();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Kept existing sample file"));
    assert_eq!(fs::read_to_string(&target).expect("read"), "left alone");

    let output = bin()
        .args(["sample", "create", "--overwrite", "--samples-path"])
        .arg(root.path())
        .arg(&script)
        .output()
        .expect("run create");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_ne!(fs::read_to_string(&target).expect("read"), "left alone");
}

#[test]
fn samples_root_comes_from_environment() {
    let root = tempfile::tempdir().expect("temp dir");
    let output = bin()
        .env("NWB_HEALTHSTATUS_SAMPLES", root.path())
        .args(["sample", "create"])
        .arg(core_script("simple1"))
        .output()
        .expect("run create");
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(root.path().join("core/simple1.nwb").is_file());
}

#[test]
fn unknown_script_is_rejected() {
    let root = tempfile::tempdir().expect("temp dir");
    let script = root.path().join("core").join("nonexistent.rs");
    fs::create_dir_all(script.parent().expect("parent")).expect("mkdir");
    fs::write(&script, "").expect("write script");

    let output = bin()
        .args(["sample", "create", "--samples-path"])
        .arg(root.path())
        .arg(&script)
        .output()
        .expect("run create");
    assert!(!output.status.success());
    assert!(!root.path().join("core/nonexistent.nwb").exists());
}

#[test]
fn list_reports_presence_as_json() {
    let root = tempfile::tempdir().expect("temp dir");
    let list = || {
        let output = bin()
            .args(["sample", "list", "--json", "--samples-path"])
            .arg(root.path())
            .output()
            .expect("run list");
        assert!(output.status.success(), "{}", stderr(&output));
        let listings: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("parse list json");
        listings.as_array().expect("array").clone()
    };

    let before = list();
    let cases: Vec<_> = before
        .iter()
        .map(|entry| entry["case"].as_str().expect("case").to_string())
        .collect();
    assert_eq!(cases, ["Simple1", "FleischmannLab"]);
    assert!(before.iter().all(|entry| entry["present"] == false));

    let output = bin()
        .args(["sample", "create", "--samples-path"])
        .arg(root.path())
        .arg(core_script("simple1"))
        .output()
        .expect("run create");
    assert!(output.status.success(), "{}", stderr(&output));

    let after = list();
    assert_eq!(after[0]["present"], true);
    assert_eq!(after[1]["present"], false);
}
