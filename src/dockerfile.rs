//! Dockerfile rendering through the external `neurodocker` generator.
//!
//! The generator's output is returned verbatim; nothing here parses or
//! validates the Dockerfile text.
use crate::error::HealthError;
use crate::spec::{Environment, Spec};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Resolved generator program plus any leading arguments from its command line.
#[derive(Debug, Clone)]
pub struct Generator {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl Generator {
    /// Parse a shell-style command line and resolve its program on `PATH`.
    pub fn from_command(command: &str) -> Result<Self> {
        let mut words = shell_words::split(command)
            .with_context(|| format!("parse generator command: {command}"))?;
        if words.is_empty() {
            return Err(anyhow!("generator command is empty"));
        }
        let program = words.remove(0);
        let resolved = which::which(&program).map_err(|err| HealthError::CommandFailed {
            command: command.to_string(),
            status: "not found".to_string(),
            output: err.to_string(),
        })?;
        Ok(Generator {
            program: resolved,
            leading_args: words,
        })
    }

    /// Run the generator for one environment and return its stdout.
    pub fn render(&self, env: &Environment) -> Result<String> {
        let mut args = self.leading_args.clone();
        args.extend(generator_args(env)?);
        let rendered = self.display(&args);
        tracing::debug!(environment = %env.name, command = %rendered, "running generator");

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|err| HealthError::CommandFailed {
                command: rendered.clone(),
                status: "spawn failed".to_string(),
                output: err.to_string(),
            })?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            elapsed_ms,
            environment = %env.name,
            stdout_bytes = output.stdout.len(),
            "generator complete"
        );

        if !output.status.success() {
            return Err(HealthError::CommandFailed {
                command: rendered,
                status: output.status.to_string(),
                output: captured_output(&output.stdout, &output.stderr),
            }
            .into());
        }
        String::from_utf8(output.stdout).context("decode generator stdout as UTF-8")
    }

    fn display(&self, args: &[String]) -> String {
        let mut words = vec![self.program.display().to_string()];
        words.extend(args.iter().cloned());
        shell_words::join(words)
    }
}

/// Generator arguments for one environment, in generator order.
pub fn generator_args(env: &Environment) -> Result<Vec<String>> {
    let mut args = vec![
        "generate".to_string(),
        "docker".to_string(),
        "--base".to_string(),
        env.base_image.clone(),
        "--pkg-manager=apt".to_string(),
    ];
    if !env.apt.is_empty() {
        args.push("--install".to_string());
        args.extend(env.apt.iter().cloned());
    }
    if !env.pip.is_empty() {
        let whitespace = Regex::new(r"\s+").context("compile whitespace pattern")?;
        let requirements: Vec<_> = env
            .pip
            .iter()
            .map(|requirement| whitespace.replace_all(requirement, "").into_owned())
            .collect();
        args.push("--miniconda".to_string());
        args.push("create_env=local".to_string());
        args.push(format!("pip_install={}", requirements.join(" ")));
    }
    if let Some(command) = env.on_startup.as_deref().filter(|command| !command.is_empty()) {
        args.push("--add-to-entrypoint".to_string());
        args.push(command.to_string());
    }
    Ok(args)
}

/// File name of the Dockerfile written for `env`.
pub fn dockerfile_name(env: &Environment) -> String {
    format!("Dockerfile.{}", env.name)
}

/// Render every environment of `spec` into `outdir`, stopping at the first failure.
pub fn write_dockerfiles(generator: &Generator, spec: &Spec, outdir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(outdir).with_context(|| format!("create {}", outdir.display()))?;
    let mut written = Vec::new();
    for env in &spec.environments {
        let text = generator.render(env)?;
        let path = outdir.join(dockerfile_name(env));
        fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(environment = %env.name, path = %path.display(), "wrote dockerfile");
        written.push(path);
    }
    Ok(written)
}

fn captured_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "dockerfile_tests.rs"]
mod tests;
