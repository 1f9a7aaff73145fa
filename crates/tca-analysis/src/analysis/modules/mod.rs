//! Scoring modules and the runner that executes one module for one record.

mod business_model;
mod financial;
mod growth;
mod investment;
mod market;
mod risk_assessment;
mod tca;
mod team;
mod technology;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::flow::{FlowClient, FlowError, FlowRequest, FlowTransport, ResultSource, Sleeper};
use super::mapper::{MappingOutcome, ValidationIssue};
use super::profile::CompanyProfile;
use super::registry::{ModuleConfiguration, ModuleId};
use super::scorecard::{round1, Framework};

pub use business_model::BusinessModelModule;
pub use financial::FinancialAnalysisModule;
pub use growth::{GrowthAssessmentModule, GrowthClass};
pub use investment::InvestmentReadinessModule;
pub use market::MarketAnalysisModule;
pub use risk_assessment::{RiskAssessmentModule, RiskReporting};
pub use tca::TcaScorecardModule;
pub use team::TeamAssessmentModule;
pub use technology::TechnologyAssessmentModule;

/// Confidence points removed per validation issue.
pub const ISSUE_CONFIDENCE_PENALTY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// 0-10
    Ten,
    /// 0-100
    Hundred,
}

impl ScoreScale {
    pub const fn max(self) -> f64 {
        match self {
            Self::Ten => 10.0,
            Self::Hundred => 100.0,
        }
    }

    pub fn clamp(self, score: f64) -> f64 {
        if score.is_finite() {
            score.clamp(0.0, self.max())
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Success,
    Fallback,
    Error,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModuleError {
    #[error("missing required data: {0}")]
    MissingData(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error(transparent)]
    Flow(#[from] FlowError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub module_id: ModuleId,
    pub status: ModuleStatus,
    pub score: f64,
    pub scale: ScoreScale,
    /// 0-10
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    pub sub_scores: BTreeMap<String, f64>,
    pub details: Value,
    #[serde(default)]
    pub validation_issues: Vec<ValidationIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleResult {
    pub fn failed(module_id: ModuleId, scale: ScoreScale, reason: String, issues: Vec<ValidationIssue>) -> Self {
        Self {
            module_id,
            status: ModuleStatus::Error,
            score: 0.0,
            scale,
            confidence: 0.0,
            band: None,
            sub_scores: BTreeMap::new(),
            details: Value::Object(Map::new()),
            validation_issues: issues,
            error: Some(reason),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ModuleStatus::Error
    }

    /// Score rescaled to 0-100 using the declared scale.
    pub fn normalized_score(&self) -> f64 {
        self.scale.clamp(self.score) * 100.0 / self.scale.max()
    }
}

/// Heuristic output before confidence and status are attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub sub_scores: BTreeMap<String, f64>,
    pub details: Map<String, Value>,
}

impl Assessment {
    pub fn sub(&mut self, key: &str, value: f64) -> f64 {
        let value = round1(value);
        self.sub_scores.insert(key.to_string(), value);
        value
    }

    pub fn detail(&mut self, key: &str, value: Value) {
        self.details.insert(key.to_string(), value);
    }

    /// Overall score as the mean of the recorded sub-scores.
    pub fn score_from_mean(&mut self) {
        if self.sub_scores.is_empty() {
            return;
        }
        let total: f64 = self.sub_scores.values().sum();
        self.score = round1(total / self.sub_scores.len() as f64);
    }
}

pub struct ModuleContext<'a> {
    pub config: &'a ModuleConfiguration,
    pub profile: &'a CompanyProfile,
    pub framework: Framework,
}

pub trait ScoringModule: Send + Sync {
    fn scale(&self) -> ScoreScale {
        ScoreScale::Ten
    }

    fn base_confidence(&self) -> f64;

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError>;

    fn flow_input(&self, ctx: &ModuleContext<'_>) -> Value {
        json!({
            "moduleId": ctx.config.id,
            "framework": ctx.framework,
            "companyData": ctx.profile,
        })
    }

    /// Folds an external payload into the heuristic assessment.
    fn merge_external(&self, _ctx: &ModuleContext<'_>, assessment: &mut Assessment, payload: &Value) {
        merge_score(assessment, payload, "score", self.scale());
        if let Some(insights) = payload.get("insights").or_else(|| payload.get("summary")) {
            assessment.detail("external_insights", insights.clone());
        }
    }
}

/// Replaces the heuristic score when the payload carries an in-range number.
pub(crate) fn merge_score(assessment: &mut Assessment, payload: &Value, key: &str, scale: ScoreScale) -> bool {
    match payload.get(key).and_then(Value::as_f64) {
        Some(score) if score.is_finite() && (0.0..=scale.max()).contains(&score) => {
            assessment.sub_scores.insert("external".to_string(), round1(score));
            assessment.score = round1(score);
            true
        }
        _ => false,
    }
}

/// Scoring implementations keyed by module id.
///
/// `standard()` holds the built-in modules; `register` adds or replaces the
/// implementation behind an id without touching the orchestrator.
#[derive(Clone)]
pub struct ModuleCatalog {
    modules: HashMap<ModuleId, Arc<dyn ScoringModule>>,
}

impl ModuleCatalog {
    pub fn empty() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        Self::empty()
            .register(ModuleId::TcaScorecard, TcaScorecardModule)
            .register(ModuleId::RiskAssessment, RiskAssessmentModule)
            .register(ModuleId::MarketAnalysis, MarketAnalysisModule)
            .register(ModuleId::TeamAssessment, TeamAssessmentModule)
            .register(ModuleId::FinancialAnalysis, FinancialAnalysisModule)
            .register(ModuleId::TechnologyAssessment, TechnologyAssessmentModule)
            .register(ModuleId::BusinessModel, BusinessModelModule)
            .register(ModuleId::GrowthAssessment, GrowthAssessmentModule)
            .register(ModuleId::InvestmentReadiness, InvestmentReadinessModule)
    }

    pub fn register<M>(mut self, id: ModuleId, module: M) -> Self
    where
        M: ScoringModule + 'static,
    {
        self.modules.insert(id, Arc::new(module));
        self
    }

    pub fn get(&self, id: ModuleId) -> Option<Arc<dyn ScoringModule>> {
        self.modules.get(&id).cloned()
    }

    /// Declared scale for `id`; unregistered ids fall back to 0-10.
    pub fn scale_of(&self, id: ModuleId) -> ScoreScale {
        self.modules
            .get(&id)
            .map_or(ScoreScale::Ten, |module| module.scale())
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&ModuleId> = self.modules.keys().collect();
        ids.sort();
        f.debug_struct("ModuleCatalog").field("modules", &ids).finish()
    }
}

/// Runs one module: typed profile, heuristic assessment, optional flow call,
/// then confidence. Never panics or returns an error; failures become an
/// error-status result.
pub async fn execute<T, S>(
    module: &dyn ScoringModule,
    config: &ModuleConfiguration,
    framework: Framework,
    mapping: MappingOutcome,
    client: &FlowClient<T, S>,
) -> ModuleResult
where
    T: FlowTransport,
    S: Sleeper,
{
    let scale = module.scale();
    let MappingOutcome { input, issues } = mapping;
    let profile = CompanyProfile::from_input(&input);
    let ctx = ModuleContext {
        config,
        profile: &profile,
        framework,
    };

    let mut assessment = match module.assess(&ctx) {
        Ok(assessment) => assessment,
        Err(err) => {
            warn!(module = %config.id, error = %err, "module assessment failed");
            return ModuleResult::failed(config.id, scale, err.to_string(), issues);
        }
    };

    let mut penalty = 0.0;
    let mut status = ModuleStatus::Success;
    if let Some(flow) = config.external_flow.as_deref() {
        let request = FlowRequest::new(flow, module.flow_input(&ctx));
        match client.invoke(&request).await {
            Ok(external) => {
                module.merge_external(&ctx, &mut assessment, &external.payload);
                penalty = external.confidence_penalty;
                if external.source == ResultSource::Fallback {
                    status = ModuleStatus::Fallback;
                }
            }
            Err(err) => {
                let err = ModuleError::from(err);
                warn!(module = %config.id, error = %err, "module flow failed");
                return ModuleResult::failed(config.id, scale, err.to_string(), issues);
            }
        }
    }

    let score = scale.clamp(assessment.score);
    let confidence = (module.base_confidence() - penalty - ISSUE_CONFIDENCE_PENALTY * issues.len() as f64)
        .clamp(0.0, 10.0);
    let band = config
        .band_for(score * 10.0 / scale.max())
        .map(str::to_string);

    debug!(
        module = %config.id,
        score,
        confidence,
        status = ?status,
        issues = issues.len(),
        "module completed"
    );

    ModuleResult {
        module_id: config.id,
        status,
        score,
        scale,
        confidence: round1(confidence),
        band,
        sub_scores: assessment.sub_scores,
        details: Value::Object(assessment.details),
        validation_issues: issues,
        error: None,
    }
}
