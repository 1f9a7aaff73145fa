use clap::Args;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tca_analysis::analysis::{
    CompanyDocument, CompanyRecord, FlowClient, FlowHealth, FlowTransport, HttpFlowTransport, ModuleRegistry,
    OfflineTransport, Orchestrator,
};
use tca_analysis::config::{AnalysisSettings, AppConfig};
use tca_analysis::error::AppError;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct RegistrySelection {
    /// Registry preset: comprehensive, standard, triage or medtech
    #[arg(long, conflicts_with = "modules")]
    pub(crate) preset: Option<String>,
    /// JSON file with module configurations
    #[arg(long)]
    pub(crate) modules: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Print single-line JSON instead of pretty output
    #[arg(long)]
    pub(crate) compact: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Company record as JSON; `-` reads standard input
    #[arg(long, short)]
    pub(crate) input: PathBuf,
    /// Uploaded document (`{"type": ..., "content": {...}}`) that fills fields the record lacks; repeatable
    #[arg(long = "document", value_name = "FILE")]
    pub(crate) documents: Vec<PathBuf>,
    #[command(flatten)]
    pub(crate) selection: RegistrySelection,
    /// Skip the flow service and use local fallbacks for every module
    #[arg(long)]
    pub(crate) offline: bool,
    /// Fail modules instead of falling back when the flow service errors
    #[arg(long)]
    pub(crate) strict: bool,
    /// Abort the whole analysis after this many seconds
    #[arg(long)]
    pub(crate) deadline_secs: Option<u64>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ModulesArgs {
    #[command(flatten)]
    pub(crate) selection: RegistrySelection,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

pub(crate) async fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> Result<(), AppError> {
    let mut record = read_record(&args.input)?;
    if !args.documents.is_empty() {
        let documents = read_documents(&args.documents)?;
        info!(documents = documents.len(), "merging uploaded documents into the company record");
        record.merge_documents(&documents);
    }
    let registry = resolve_registry(config, &args.selection)?;
    let deadline = args.deadline_secs.map(Duration::from_secs);
    let strict = args.strict || config.flow.strict;

    if args.offline {
        info!("running offline, every flow call uses its local fallback");
        analyze_with(config, OfflineTransport, registry, &record, strict, deadline, &args.output).await
    } else {
        let transport = HttpFlowTransport::new(&config.flow.url, config.flow.timeout)?;
        analyze_with(config, transport, registry, &record, strict, deadline, &args.output).await
    }
}

async fn analyze_with<T: FlowTransport>(
    config: &AppConfig,
    transport: T,
    registry: ModuleRegistry,
    record: &CompanyRecord,
    strict: bool,
    deadline: Option<Duration>,
    output: &OutputArgs,
) -> Result<(), AppError> {
    let client = FlowClient::new(transport, config.flow.retry_policy())
        .strict(strict)
        .with_fallback_penalty(config.flow.fallback_penalty);
    let orchestrator = Orchestrator::new(registry, client);

    let analysis = match deadline {
        Some(deadline) => orchestrator.analyze_with_deadline(record, deadline).await?,
        None => orchestrator.analyze(record).await?,
    };
    print_json(&analysis, output.compact)
}

pub(crate) fn list_modules(config: &AppConfig, args: ModulesArgs) -> Result<(), AppError> {
    let registry = resolve_registry(config, &args.selection)?;
    print_json(&registry, args.output.compact)
}

#[derive(Serialize)]
struct HealthReport<'a> {
    url: &'a str,
    #[serde(flatten)]
    health: &'a FlowHealth,
}

pub(crate) async fn run_health(config: &AppConfig) -> Result<(), AppError> {
    let transport = HttpFlowTransport::new(&config.flow.url, config.flow.timeout)?;
    report_health(config, transport).await
}

async fn report_health<T: FlowTransport>(config: &AppConfig, transport: T) -> Result<(), AppError> {
    let client = FlowClient::new(transport, config.flow.retry_policy());
    let health = client.health_check().await;
    print_json(
        &HealthReport {
            url: &config.flow.url,
            health: &health,
        },
        false,
    )?;
    match health {
        FlowHealth::Healthy => Ok(()),
        FlowHealth::Unhealthy { reason } => Err(AppError::Unhealthy(reason)),
    }
}

/// Command-line selection wins over the environment; a modules file wins over a preset.
fn resolve_registry(config: &AppConfig, selection: &RegistrySelection) -> Result<ModuleRegistry, AppError> {
    let settings = match (&selection.modules, &selection.preset) {
        (Some(path), _) => AnalysisSettings {
            preset: config.analysis.preset.clone(),
            modules_path: Some(path.clone()),
        },
        (None, Some(preset)) => AnalysisSettings {
            preset: preset.clone(),
            modules_path: None,
        },
        (None, None) => config.analysis.clone(),
    };
    Ok(settings.registry()?)
}

fn read_record(path: &Path) -> Result<CompanyRecord, AppError> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(CompanyRecord::from_json_str(&raw)?)
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<CompanyDocument>, AppError> {
    paths
        .iter()
        .map(|path| -> Result<CompanyDocument, AppError> {
            Ok(CompanyDocument::from_json_str(&std::fs::read_to_string(path)?)?)
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), AppError> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}
