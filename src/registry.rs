//! Compiled-in registry of case-definition scripts.
//!
//! Case scripts are the producer source files under `src/producers/`. The CLI
//! takes their paths, so a script is identified by the name of its parent
//! directory (the producer) and its file stem.
use crate::case::{Binding, Bindings};
use crate::error::HealthError;
use crate::producers;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Registered case script.
#[derive(Debug, Clone, Copy)]
pub struct CaseScript {
    pub producer: &'static str,
    pub script: &'static str,
    bindings: fn() -> Bindings,
}

impl CaseScript {
    pub fn bindings(&self) -> Bindings {
        (self.bindings)()
    }

    /// Path of the script relative to the producers root.
    pub fn rel_path(&self) -> PathBuf {
        Path::new(self.producer).join(format!("{}.rs", self.script))
    }
}

/// Script resolved from a path on the command line.
#[derive(Debug)]
pub struct LoadedScript {
    pub producer: String,
    pub script: String,
    pub bindings: Vec<(&'static str, Binding)>,
}

#[derive(Debug, Default)]
pub struct Registry {
    scripts: Vec<CaseScript>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every bundled producer.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        producers::register_all(&mut registry);
        registry
    }

    pub fn register(
        &mut self,
        producer: &'static str,
        script: &'static str,
        bindings: fn() -> Bindings,
    ) {
        self.scripts.push(CaseScript {
            producer,
            script,
            bindings,
        });
    }

    pub fn scripts(&self) -> &[CaseScript] {
        &self.scripts
    }

    /// Resolve a script path to its registered bindings.
    pub fn load(&self, path: &Path) -> Result<LoadedScript> {
        let load_error = |message: String| HealthError::DynamicLoad {
            path: path.to_path_buf(),
            message,
        };
        let resolved = path
            .canonicalize()
            .map_err(|err| load_error(err.to_string()))?;
        if !resolved.is_file() {
            return Err(load_error("not a file".to_string()).into());
        }
        let producer = resolved
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .ok_or_else(|| load_error("cannot determine producer directory".to_string()))?;
        let script = resolved
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| load_error("cannot determine script name".to_string()))?;

        let entry = self
            .scripts
            .iter()
            .find(|entry| entry.producer == producer && entry.script == script)
            .ok_or_else(|| {
                let known: Vec<_> = self
                    .scripts
                    .iter()
                    .map(|entry| entry.rel_path().display().to_string())
                    .collect();
                load_error(format!(
                    "no case script {script:?} is registered for producer {producer:?} (known: {})",
                    known.join(", ")
                ))
            })?;

        tracing::debug!(producer, script, path = %resolved.display(), "loaded case script");
        Ok(LoadedScript {
            producer: producer.to_string(),
            script: script.to_string(),
            bindings: entry.bindings(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::discover_cases;

    fn no_bindings() -> Bindings {
        vec![("helper", Binding::Item)]
    }

    #[test]
    fn load_derives_producer_from_parent_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let script = dir.path().join("acme").join("empty.rs");
        std::fs::create_dir_all(script.parent().expect("parent")).expect("mkdir");
        std::fs::write(&script, "").expect("write script");

        let mut registry = Registry::new();
        registry.register("acme", "empty", no_bindings);
        let loaded = registry.load(&script).expect("load script");
        assert_eq!(loaded.producer, "acme");
        assert_eq!(loaded.script, "empty");
        assert_eq!(discover_cases(&loaded.bindings).count(), 0);
    }

    #[test]
    fn unregistered_or_missing_scripts_fail_to_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let script = dir.path().join("acme").join("other.rs");
        std::fs::create_dir_all(script.parent().expect("parent")).expect("mkdir");
        std::fs::write(&script, "").expect("write script");

        let mut registry = Registry::new();
        registry.register("acme", "empty", no_bindings);
        for path in [script, dir.path().join("acme").join("missing.rs")] {
            let err = registry.load(&path).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<HealthError>(),
                Some(HealthError::DynamicLoad { .. })
            ));
        }
    }

    #[test]
    fn builtin_registry_resolves_bundled_sources() {
        let registry = Registry::builtin();
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join("producers");
        assert!(!registry.scripts().is_empty());
        for entry in registry.scripts() {
            let path = root.join(entry.rel_path());
            let loaded = registry.load(&path).expect("load bundled script");
            assert_eq!(loaded.producer, entry.producer);
        }
    }
}
