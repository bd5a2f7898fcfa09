use clap::{Args, Parser, Subcommand};
use crate::config::Preset;

#[derive(Parser)]
#[command(
    name = "sqlsweep",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_TIMESTAMP"), ")"),
    about = "Bulk SQL injection assessment driver for sqlmap"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more; -v also logs raw engine output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe targets and harvest every vulnerable one
    Scan(ScanArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Default)]
pub struct ScanArgs {
    /// Test a single URL
    #[arg(short, long, conflicts_with = "list")]
    pub url: Option<String>,

    /// File with one target URL per line (prompted for when neither --url nor --list is given)
    #[arg(short, long)]
    pub list: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Predefined settings: single (risk 3, level 5) or multi (risk 2, level 3, 30 threads)
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Engine risk (1-3)
    #[arg(long)]
    pub risk: Option<u8>,

    /// Engine level (1-5)
    #[arg(long)]
    pub level: Option<u8>,

    /// Targets scanned concurrently
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Engine threads used while dumping a table (max 10)
    #[arg(long)]
    pub dump_threads: Option<u8>,

    /// Engine output directory
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Path to sqlmap.py
    #[arg(long)]
    pub engine: Option<String>,

    /// Interpreter used to run the engine
    #[arg(long)]
    pub python: Option<String>,

    /// Per-invocation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Discard the engine's stored session before probing
    #[arg(long)]
    pub flush_session: bool,

    /// Do not pass --smart to the engine
    #[arg(long)]
    pub no_smart: bool,

    /// Print outcomes as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}
