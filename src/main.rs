use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use pageaudit::logging::{self, LogFormat};
use pageaudit::page::Viewport;
use pageaudit::ui::OutputFormat;
use pageaudit::worker::Severity;

mod cmd;

#[derive(Parser)]
#[command(name = "pageaudit")]
#[command(version, about = "Multi-specialist AI webpage auditor")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Log line format on stderr: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit one captured page with every enabled specialist
    Audit(AuditArgs),
    /// List the available specialist workers
    Workers,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Args, Clone)]
pub struct AuditArgs {
    /// URL of the page being audited
    pub url: String,

    /// Page title
    #[arg(long)]
    pub title: Option<String>,

    /// File holding the captured DOM (HTML)
    #[arg(long)]
    pub dom: Option<PathBuf>,

    /// Screenshot file (PNG, JPEG, WebP or GIF); repeatable
    #[arg(long = "screenshot")]
    pub screenshots: Vec<PathBuf>,

    /// Viewport the page was captured at, e.g. 1280x800
    #[arg(long, default_value = "1280x800")]
    pub viewport: Viewport,

    /// Report format: text or json
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Run only these specialists (comma-separated, e.g. seo,a11y)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip all completion calls and use rule-based results
    #[arg(long)]
    pub no_ai: bool,

    /// Completion model; overrides pageaudit.toml and PAGEAUDIT_MODEL
    #[arg(long)]
    pub model: Option<String>,

    /// Per-worker timeout in seconds (0 disables)
    #[arg(long)]
    pub worker_timeout: Option<u64>,

    /// Number of top issues in the summary and text report
    #[arg(long)]
    pub top: Option<usize>,

    /// Show every issue and each worker's suggestions
    #[arg(long)]
    pub detailed: bool,

    /// Exit non-zero if any issue at or above this severity is found
    #[arg(long)]
    pub fail_on: Option<Severity>,

    /// Hide the live progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default pageaudit.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Audit(args) => cmd::cmd_audit(&cli, &project_dir, args).await?,
        Commands::Workers => cmd::cmd_workers(&project_dir)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
