//! CLI argument parsing for the sample and environment workflows.
use crate::config::DEFAULT_OUTDIR;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "nwb-healthstatus",
    version,
    about = "Create and verify NWB sample files across producers and environments",
    after_help = "Examples:\n  nwb-healthstatus sample create src/producers/core/*.rs\n  nwb-healthstatus sample test src/producers/core/*.rs\n  nwb-healthstatus sample list\n  nwb-healthstatus environments make-dockerfiles environments.yaml",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, test and list sample files
    #[command(subcommand)]
    Sample(SampleCommand),
    /// Work with the environment spec
    #[command(subcommand)]
    Environments(EnvironmentsCommand),
}

#[derive(Subcommand, Debug)]
pub enum SampleCommand {
    Create(CreateArgs),
    Test(TestArgs),
    List(ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum EnvironmentsCommand {
    MakeDockerfiles(MakeDockerfilesArgs),
    Show(ShowArgs),
}

/// Create command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write the sample file of every case in the given case scripts")]
pub struct CreateArgs {
    /// Replace sample files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Root directory of the sample files
    #[arg(long, value_name = "DIR")]
    pub samples_path: Option<PathBuf>,

    /// Case scripts, e.g. src/producers/core/simple1.rs
    #[arg(value_name = "CASEFILE")]
    pub casefiles: Vec<PathBuf>,
}

/// Test command inputs.
#[derive(Parser, Debug)]
#[command(about = "Read back sample files and run each case's checks")]
pub struct TestArgs {
    /// Root directory of the sample files
    #[arg(long, value_name = "DIR")]
    pub samples_path: Option<PathBuf>,

    /// Case scripts, e.g. src/producers/core/simple1.rs
    #[arg(value_name = "CASEFILE")]
    pub casefiles: Vec<PathBuf>,
}

/// List command inputs.
#[derive(Parser, Debug)]
#[command(about = "List discovered cases and whether their sample files exist")]
pub struct ListArgs {
    /// Root directory of the sample files
    #[arg(long, value_name = "DIR")]
    pub samples_path: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Case scripts to inspect (default: every bundled script)
    #[arg(value_name = "CASEFILE")]
    pub casefiles: Vec<PathBuf>,
}

/// Dockerfile generation inputs.
#[derive(Parser, Debug)]
#[command(about = "Render one Dockerfile per environment of a spec file")]
pub struct MakeDockerfilesArgs {
    /// Output directory for Dockerfile.<environment>
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTDIR)]
    pub outdir: PathBuf,

    /// Generator command line (default: $NWB_HEALTHSTATUS_NEURODOCKER or neurodocker)
    #[arg(long, value_name = "CMD")]
    pub neurodocker: Option<String>,

    /// Environment spec (YAML)
    #[arg(value_name = "SPECFILE")]
    pub specfile: PathBuf,
}

/// Spec inspection inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the spec with the base environment merged in")]
pub struct ShowArgs {
    /// Emit JSON instead of YAML
    #[arg(long)]
    pub json: bool,

    /// Environment spec (YAML)
    #[arg(value_name = "SPECFILE")]
    pub specfile: PathBuf,
}
