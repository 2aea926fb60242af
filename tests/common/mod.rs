//! Shared helpers for driving the nwb-healthstatus binary.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Generator stand-in: prints its arguments one per line, fails on `bad-image`.
const FAKE_NEURODOCKER: &str = r##"case "$*" in
  *bad-image*) echo "no such image" >&2; exit 3 ;;
esac
echo "# generated"
for arg in "$@"; do
  printf '%s\n' "$arg"
done
"##;

pub fn bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_nwb-healthstatus"));
    command
        .env_remove("NWB_HEALTHSTATUS_SAMPLES")
        .env_remove("NWB_HEALTHSTATUS_NEURODOCKER")
        .env_remove("RUST_LOG");
    command
}

/// Bundled case script of the `core` producer.
pub fn core_script(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("producers")
        .join("core")
        .join(format!("{name}.rs"))
}

pub fn core_scripts() -> Vec<PathBuf> {
    ["simple1", "fleischmann", "fleischmann_lab"]
        .iter()
        .map(|name| core_script(name))
        .collect()
}

/// Write the fake generator into `dir` and return a `--neurodocker` value running it.
pub fn fake_neurodocker(dir: &Path) -> String {
    let script = dir.join("fake-neurodocker.sh");
    fs::write(&script, FAKE_NEURODOCKER).expect("write fake generator");
    format!("sh {}", shell_words::quote(&script.display().to_string()))
}

pub fn sh_available() -> bool {
    which::which("sh").is_ok()
}

pub fn write_spec(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("environments.yaml");
    fs::write(&path, text).expect("write spec");
    path
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
