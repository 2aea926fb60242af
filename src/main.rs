use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod case;
mod cli;
mod config;
mod data;
mod dockerfile;
mod error;
mod format;
mod nwb;
mod producers;
mod registry;
mod runner;
mod spec;

use cli::{
    Command, CreateArgs, EnvironmentsCommand, ListArgs, MakeDockerfilesArgs, RootArgs,
    SampleCommand, ShowArgs, TestArgs,
};
use config::{resolve_generator_command, resolve_samples_root};
use dockerfile::{write_dockerfiles, Generator};
use format::JsonSampleFormat;
use registry::Registry;
use runner::SampleRunner;
use spec::load_spec;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Sample(SampleCommand::Create(args)) => cmd_create(args),
        Command::Sample(SampleCommand::Test(args)) => cmd_test(args),
        Command::Sample(SampleCommand::List(args)) => cmd_list(args),
        Command::Environments(EnvironmentsCommand::MakeDockerfiles(args)) => {
            cmd_make_dockerfiles(args)
        }
        Command::Environments(EnvironmentsCommand::Show(args)) => cmd_show(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_create(args: CreateArgs) -> Result<()> {
    let samples_root = resolve_samples_root(args.samples_path.as_deref())?;
    let registry = Registry::builtin();
    let runner = SampleRunner::new(&registry, &JsonSampleFormat, samples_root);
    let report = runner.create(&args.casefiles, args.overwrite)?;
    for path in &report.written {
        println!("Wrote sample file to {}", path.display());
    }
    for path in &report.skipped {
        println!("Kept existing sample file {}", path.display());
    }
    Ok(())
}

fn cmd_test(args: TestArgs) -> Result<()> {
    let samples_root = resolve_samples_root(args.samples_path.as_deref())?;
    let registry = Registry::builtin();
    let runner = SampleRunner::new(&registry, &JsonSampleFormat, samples_root);
    let tested = runner.test(&args.casefiles)?;
    for path in &tested {
        println!("ok {}", path.display());
    }
    println!("{} sample file(s) passed", tested.len());
    Ok(())
}

fn cmd_list(args: ListArgs) -> Result<()> {
    let samples_root = resolve_samples_root(args.samples_path.as_deref())?;
    let registry = Registry::builtin();
    let runner = SampleRunner::new(&registry, &JsonSampleFormat, samples_root);
    let listings = if args.casefiles.is_empty() {
        runner.list_registered()?
    } else {
        runner.list(&args.casefiles)?
    };

    if args.json {
        let text = serde_json::to_string_pretty(&listings)?;
        println!("{text}");
        return Ok(());
    }
    for listing in &listings {
        let state = if listing.present { "present" } else { "missing" };
        println!(
            "{}/{} {} -> {} ({state})",
            listing.producer,
            listing.script,
            listing.case,
            listing.target.display()
        );
    }
    Ok(())
}

fn cmd_make_dockerfiles(args: MakeDockerfilesArgs) -> Result<()> {
    let spec = load_spec(&args.specfile)?;
    let command = resolve_generator_command(args.neurodocker.as_deref());
    let generator = Generator::from_command(&command)?;
    let written = write_dockerfiles(&generator, &spec, &args.outdir)?;
    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_show(args: ShowArgs) -> Result<()> {
    let spec = load_spec(&args.specfile)?;
    let text = if args.json {
        serde_json::to_string_pretty(&spec).context("serialize spec as JSON")?
    } else {
        serde_yaml::to_string(&spec).context("serialize spec as YAML")?
    };
    println!("{}", text.trim_end());
    Ok(())
}
