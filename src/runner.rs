//! Create, test and list phases over case scripts.
//!
//! Every phase walks scripts in argument order and cases in binding order.
//! The first failure aborts the whole batch.
use crate::case::{discover_cases, Binding, Created, SampleCase};
use crate::format::SampleFormat;
use crate::registry::Registry;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Files touched by a create run.
#[derive(Debug, Default, Serialize)]
pub struct CreateReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// One discovered case and the state of its sample file.
#[derive(Debug, Serialize)]
pub struct CaseListing {
    pub producer: String,
    pub script: String,
    pub case: String,
    pub extensions: Vec<String>,
    pub target: PathBuf,
    pub present: bool,
}

pub struct SampleRunner<'a> {
    registry: &'a Registry,
    format: &'a dyn SampleFormat,
    sample_root: PathBuf,
}

impl<'a> SampleRunner<'a> {
    pub fn new(registry: &'a Registry, format: &'a dyn SampleFormat, sample_root: PathBuf) -> Self {
        SampleRunner {
            registry,
            format,
            sample_root,
        }
    }

    /// Write the sample file of every case, keeping existing files unless `overwrite`.
    pub fn create(&self, scripts: &[PathBuf], overwrite: bool) -> Result<CreateReport> {
        let mut report = CreateReport::default();
        for script in scripts {
            let loaded = self.registry.load(script)?;
            let producer_dir = self.sample_root.join(&loaded.producer);
            for case_type in discover_cases(&loaded.bindings) {
                let case = instantiate(case_type.name(), case_type.instantiate())?;
                let target = case_target(&producer_dir, case.as_ref())?;
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                if !overwrite && target.exists() {
                    tracing::info!(case = case_type.name(), path = %target.display(), "sample exists, skipping");
                    report.skipped.push(target);
                    continue;
                }

                let created = case
                    .create()
                    .with_context(|| format!("create {}", case_type.name()))?;
                match created {
                    Created::Single(object) => {
                        self.format.write(&object, &target)?;
                        tracing::info!(case = case_type.name(), path = %target.display(), "wrote sample");
                        report.written.push(target);
                    }
                    Created::Artifacts(artifacts) => {
                        for artifact in artifacts {
                            let artifact =
                                artifact.with_context(|| format!("create {}", case_type.name()))?;
                            ensure_relative(&artifact.filename)?;
                            let path = producer_dir.join(&artifact.filename);
                            if !overwrite && path.exists() {
                                tracing::info!(case = case_type.name(), path = %path.display(), "sample exists, skipping");
                                report.skipped.push(path);
                                continue;
                            }
                            self.format.write(&artifact.object, &path)?;
                            tracing::info!(
                                case = case_type.name(),
                                namespace = %artifact.namespace,
                                path = %path.display(),
                                "wrote sample"
                            );
                            report.written.push(path);
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    /// Read back every case's sample file and run the case's checks on it.
    pub fn test(&self, scripts: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut tested = Vec::new();
        for script in scripts {
            let loaded = self.registry.load(script)?;
            let producer_dir = self.sample_root.join(&loaded.producer);
            for case_type in discover_cases(&loaded.bindings) {
                let case = instantiate(case_type.name(), case_type.instantiate())?;
                let target = case_target(&producer_dir, case.as_ref())?;
                let object = self.format.read(&target)?;
                case.test(&object).with_context(|| {
                    format!("{} failed on {}", case_type.name(), target.display())
                })?;
                tracing::info!(case = case_type.name(), path = %target.display(), "sample ok");
                tested.push(target);
            }
        }
        Ok(tested)
    }

    /// Describe the cases of the given scripts without touching sample files.
    pub fn list(&self, scripts: &[PathBuf]) -> Result<Vec<CaseListing>> {
        let mut listings = Vec::new();
        for script in scripts {
            let loaded = self.registry.load(script)?;
            listings.extend(self.listings_for(&loaded.producer, &loaded.script, &loaded.bindings)?);
        }
        Ok(listings)
    }

    /// Describe the cases of every registered script.
    pub fn list_registered(&self) -> Result<Vec<CaseListing>> {
        let mut listings = Vec::new();
        for entry in self.registry.scripts() {
            listings.extend(self.listings_for(entry.producer, entry.script, &entry.bindings())?);
        }
        Ok(listings)
    }

    fn listings_for(
        &self,
        producer: &str,
        script: &str,
        bindings: &[(&'static str, Binding)],
    ) -> Result<Vec<CaseListing>> {
        let producer_dir = self.sample_root.join(producer);
        let mut listings = Vec::new();
        for case_type in discover_cases(bindings) {
            let case = instantiate(case_type.name(), case_type.instantiate())?;
            let target = case_target(&producer_dir, case.as_ref())?;
            listings.push(CaseListing {
                producer: producer.to_string(),
                script: script.to_string(),
                case: case_type.name().to_string(),
                extensions: case.extensions().iter().map(|ext| ext.to_string()).collect(),
                present: target.is_file(),
                target,
            });
        }
        Ok(listings)
    }
}

fn instantiate(
    name: &str,
    constructed: Result<Box<dyn SampleCase>>,
) -> Result<Box<dyn SampleCase>> {
    constructed.with_context(|| format!("construct {name}"))
}

fn case_target(producer_dir: &Path, case: &dyn SampleCase) -> Result<PathBuf> {
    ensure_relative(case.filename())?;
    Ok(producer_dir.join(case.filename()))
}

fn ensure_relative(filename: &str) -> Result<()> {
    let path = Path::new(filename);
    let escapes = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_)));
    if filename.is_empty() || escapes {
        return Err(anyhow!(
            "case file names must be relative paths without '..' (got {filename:?})"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
