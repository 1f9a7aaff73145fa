use crate::commands::{list_modules, run_analyze, run_health, AnalyzeArgs, ModulesArgs};
use clap::{Parser, Subcommand};
use tca_analysis::config::AppConfig;
use tca_analysis::error::AppError;
use tca_analysis::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "tca-analysis",
    about = "Score a company record across the configured analysis modules",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every configured module against a company record and print the aggregate
    Analyze(AnalyzeArgs),
    /// Print the module registry that an analysis would use
    Modules(ModulesArgs),
    /// Check that the external flow service is reachable
    Health,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Analyze(args) => run_analyze(&config, args).await,
        Command::Modules(args) => list_modules(&config, args),
        Command::Health => run_health(&config).await,
    }
}
