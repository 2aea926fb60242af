//! Defaults and environment overrides for CLI settings.
//!
//! Every setting resolves as: explicit flag, then environment variable, then
//! built-in default.
use anyhow::{anyhow, Result};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the samples root when `--samples-path` is absent.
pub const SAMPLES_ENV: &str = "NWB_HEALTHSTATUS_SAMPLES";
/// Overrides the generator command when `--neurodocker` is absent.
pub const NEURODOCKER_ENV: &str = "NWB_HEALTHSTATUS_NEURODOCKER";
pub const DEFAULT_NEURODOCKER: &str = "neurodocker";
pub const DEFAULT_OUTDIR: &str = "environments";
const CACHE_DIR_NAME: &str = "nwb-healthstatus";

/// Resolve the root directory holding `<producer>/<case file>` samples.
pub fn resolve_samples_root(explicit: Option<&Path>) -> Result<PathBuf> {
    samples_root_from(explicit, env::var_os(SAMPLES_ENV))
}

fn samples_root_from(explicit: Option<&Path>, from_env: Option<OsString>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(value) = from_env.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(value));
    }

    // Default to ~/.cache/nwb-healthstatus
    let cache_dir = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .ok_or_else(|| anyhow!("cannot determine cache directory"))?;
    Ok(cache_dir.join(CACHE_DIR_NAME))
}

/// Resolve the dockerfile generator command line.
pub fn resolve_generator_command(explicit: Option<&str>) -> String {
    generator_command_from(explicit, env::var(NEURODOCKER_ENV).ok())
}

fn generator_command_from(explicit: Option<&str>, from_env: Option<String>) -> String {
    explicit
        .map(|command| command.to_string())
        .or_else(|| from_env.filter(|command| !command.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_NEURODOCKER.to_string())
}
