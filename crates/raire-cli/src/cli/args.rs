use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "raire",
    version,
    about = "Store IRV audit assertions and export them with summary statistics"
)]
pub struct Cli {
    /// YAML config file (db_path, log_level, default_risk_limit)
    #[arg(long, global = true, env = "RAIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database; overrides the config file and RAIRE_DB
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store the assertion engine's result for a contest, replacing any earlier one
    Generate(GenerateArgs),
    /// Export a contest's stored assertions
    Export(ExportArgs),
    /// Show the generation summary of one contest, or of all contests
    Summary(SummaryArgs),
    /// Record audit progress for one stored assertion
    Progress(ProgressArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub contest: String,

    /// Total auditable ballots for the contest
    #[arg(long)]
    pub universe_size: i64,

    /// Candidate name, in the order the engine indexes them (repeatable)
    #[arg(long = "candidate", required = true)]
    pub candidates: Vec<String>,

    /// JSON file holding the engine's {"Ok": ...} / {"Err": ...} result
    #[arg(long)]
    pub solver_result: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long)]
    pub contest: String,

    #[arg(long = "candidate", required = true)]
    pub candidates: Vec<String>,

    /// Defaults to the configured default_risk_limit
    #[arg(long)]
    pub risk_limit: Option<f64>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Write here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SummaryArgs {
    #[arg(long)]
    pub contest: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ProgressArgs {
    #[arg(long)]
    pub contest: String,

    #[arg(long)]
    pub assertion_id: i64,

    #[arg(long)]
    pub risk: f64,

    #[arg(long, default_value_t = 0)]
    pub estimated_samples: i64,

    #[arg(long, default_value_t = 0)]
    pub optimistic_samples: i64,

    #[arg(long, default_value_t = 0)]
    pub two_vote_over: i64,

    #[arg(long, default_value_t = 0)]
    pub one_vote_over: i64,

    #[arg(long, default_value_t = 0)]
    pub other: i64,

    #[arg(long, default_value_t = 0)]
    pub one_vote_under: i64,

    #[arg(long, default_value_t = 0)]
    pub two_vote_under: i64,

    /// Only apply if the assertion is still at this version
    #[arg(long)]
    pub expected_version: Option<i64>,
}
