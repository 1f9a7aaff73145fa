use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::aggregate::{aggregate, AggregatedAnalysis};
use super::flow::{FlowClient, FlowTransport, Sleeper, TokioSleeper};
use super::mapper::DataMapper;
use super::modules::{self, ModuleCatalog, ModuleResult};
use super::record::CompanyRecord;
use super::registry::{ModuleId, ModuleRegistry, RegistryError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("analysis did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

/// Runs every executed module concurrently for one company record and
/// aggregates the results.
pub struct Orchestrator<T, S = TokioSleeper> {
    registry: Arc<ModuleRegistry>,
    catalog: Arc<ModuleCatalog>,
    client: Arc<FlowClient<T, S>>,
}

impl<T, S> Clone for Orchestrator<T, S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            catalog: Arc::clone(&self.catalog),
            client: Arc::clone(&self.client),
        }
    }
}

impl<T: FlowTransport, S: Sleeper> Orchestrator<T, S> {
    pub fn new(registry: ModuleRegistry, client: FlowClient<T, S>) -> Self {
        Self {
            registry: Arc::new(registry),
            catalog: Arc::new(ModuleCatalog::standard()),
            client: Arc::new(client),
        }
    }

    /// Swaps the scoring implementations; configured ids without one fail as module errors.
    pub fn with_modules(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn client(&self) -> &FlowClient<T, S> {
        &self.client
    }

    pub async fn analyze(&self, record: &CompanyRecord) -> Result<AggregatedAnalysis, OrchestratorError> {
        self.analyze_with(record, Arc::clone(&self.registry)).await
    }

    /// Dropping the in-flight analysis at the deadline aborts every module task.
    pub async fn analyze_with_deadline(
        &self,
        record: &CompanyRecord,
        deadline: Duration,
    ) -> Result<AggregatedAnalysis, OrchestratorError> {
        match tokio::time::timeout(deadline, self.analyze(record)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "analysis deadline exceeded");
                Err(OrchestratorError::DeadlineExceeded(deadline))
            }
        }
    }

    /// Analyze against an explicit registry instead of the one the orchestrator was built with.
    pub async fn analyze_with(
        &self,
        record: &CompanyRecord,
        registry: Arc<ModuleRegistry>,
    ) -> Result<AggregatedAnalysis, OrchestratorError> {
        if registry.active().next().is_none() {
            return Err(RegistryError::NoActiveModules.into());
        }

        let executed = registry.executed();
        info!(
            modules = executed.len(),
            framework = %registry.framework(),
            "starting company analysis"
        );

        let mut tasks = JoinSet::new();
        for config in executed.iter().copied() {
            let Some(module) = self.catalog.get(config.id) else {
                warn!(module = %config.id, "no scoring module registered");
                continue;
            };
            let mapping = DataMapper::map(record, &config.data_mapping);
            if !mapping.issues.is_empty() {
                warn!(module = %config.id, issues = mapping.issues.len(), "input mapping reported issues");
            }
            let config = config.clone();
            let client = Arc::clone(&self.client);
            let framework = registry.framework();
            tasks.spawn(async move {
                let result = modules::execute(module.as_ref(), &config, framework, mapping, &client).await;
                (config.id, result)
            });
        }

        let mut results: BTreeMap<ModuleId, ModuleResult> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, result)) => {
                    results.insert(id, result);
                }
                Err(err) => warn!(error = %err, "module task did not complete"),
            }
        }

        for config in executed {
            results.entry(config.id).or_insert_with(|| {
                let reason = if self.catalog.contains(config.id) {
                    "module task panicked or was cancelled".to_string()
                } else {
                    format!("no scoring module registered for {}", config.id)
                };
                ModuleResult::failed(config.id, self.catalog.scale_of(config.id), reason, Vec::new())
            });
        }

        let analysis = aggregate(results, &registry, Utc::now());
        info!(
            final_score = analysis.final_score,
            confidence = analysis.confidence,
            completeness = analysis.completeness,
            status = ?analysis.status,
            failures = analysis.module_failures.len(),
            "company analysis finished"
        );
        Ok(analysis)
    }
}
