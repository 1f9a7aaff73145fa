//! Combines module results into one weighted assessment on 0-100.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::flags::{flags_for, mitigation_strategies, RiskFlag};
use super::mapper::ValidationIssue;
use super::modules::{ModuleResult, RiskAssessmentModule, RiskReporting};
use super::registry::{ModuleId, ModuleRegistry};
use super::risk::RiskLevel;
use super::scorecard::{round1, Framework};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Completed,
    CompletedWithErrors,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    StrongInvest,
    ProceedWithDueDiligence,
    Conditional,
    Pass,
}

impl RecommendationTier {
    pub fn from_score(final_score: f64) -> Self {
        if final_score >= 80.0 {
            Self::StrongInvest
        } else if final_score >= 70.0 {
            Self::ProceedWithDueDiligence
        } else if final_score >= 60.0 {
            Self::Conditional
        } else {
            Self::Pass
        }
    }

    /// Recommendation wording, adjusted for the overall risk level when known.
    pub fn summary(self, risk: Option<RiskLevel>) -> String {
        let base = match self {
            Self::StrongInvest => "Strong investment opportunity; proceed to term sheet",
            Self::ProceedWithDueDiligence => "Promising opportunity; proceed with standard due diligence",
            Self::Conditional => "Conditional interest; resolve identified gaps before committing",
            Self::Pass => "Pass at this time; revisit once fundamentals improve",
        };
        match risk {
            Some(RiskLevel::High) => format!("{base}. High overall risk: require mitigation plans first"),
            Some(RiskLevel::Medium) => format!("{base}. Moderate risk: monitor flagged domains"),
            Some(RiskLevel::Low) | None => base.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tier: RecommendationTier,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub overall_risk: f64,
    pub level: RiskLevel,
    pub flags: Vec<RiskFlag>,
    pub mitigation_strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleFailure {
    pub module_id: ModuleId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedAnalysis {
    pub status: AnalysisStatus,
    /// 0-100
    pub final_score: f64,
    /// Mean confidence of contributing modules, 0-10.
    pub confidence: f64,
    pub recommendation: Recommendation,
    pub framework: Framework,
    /// Modules that contributed to the final score.
    pub active_modules: Vec<ModuleId>,
    /// Sum of weights of contributing modules.
    pub total_weight: f64,
    /// Contributing modules over configured active modules, 0-1.
    pub completeness: f64,
    pub module_results: BTreeMap<ModuleId, ModuleResult>,
    pub module_failures: Vec<ModuleFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskSummary>,
    pub validation_issues: BTreeMap<ModuleId, Vec<ValidationIssue>>,
    pub generated_at: DateTime<Utc>,
}

impl AggregatedAnalysis {
    pub fn score_for(&self, id: ModuleId) -> Option<f64> {
        self.module_results.get(&id).map(|result| result.score)
    }
}

/// Weighted mean of normalized scores over active, non-error modules.
///
/// Testing modules appear in `module_results` but never contribute, and
/// active modules without a result count as failures.
pub fn aggregate(
    results: BTreeMap<ModuleId, ModuleResult>,
    registry: &ModuleRegistry,
    generated_at: DateTime<Utc>,
) -> AggregatedAnalysis {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut confidence_sum = 0.0;
    let mut active_modules = Vec::new();
    let mut module_failures = Vec::new();
    let mut active_count = 0usize;

    for config in registry.active() {
        active_count += 1;
        match results.get(&config.id) {
            Some(result) if !result.is_error() => {
                weighted_sum += result.normalized_score() * config.weight;
                total_weight += config.weight;
                confidence_sum += result.confidence;
                active_modules.push(config.id);
            }
            Some(result) => module_failures.push(ModuleFailure {
                module_id: config.id,
                reason: result
                    .error
                    .clone()
                    .unwrap_or_else(|| "module reported an error".to_string()),
            }),
            None => module_failures.push(ModuleFailure {
                module_id: config.id,
                reason: "module produced no result".to_string(),
            }),
        }
    }

    let included = active_modules.len();
    let final_score = if total_weight > 0.0 {
        round1(weighted_sum / total_weight)
    } else {
        0.0
    };
    let confidence = if included > 0 {
        round1(confidence_sum / included as f64)
    } else {
        0.0
    };
    let completeness = if active_count > 0 {
        included as f64 / active_count as f64
    } else {
        0.0
    };
    let status = if included == 0 {
        AnalysisStatus::Failed
    } else if module_failures.is_empty() {
        AnalysisStatus::Completed
    } else {
        AnalysisStatus::CompletedWithErrors
    };

    let risk = risk_summary(&results, registry);

    let tier = RecommendationTier::from_score(final_score);
    let recommendation = Recommendation {
        tier,
        summary: tier.summary(risk.as_ref().map(|risk| risk.level)),
    };

    let validation_issues = results
        .iter()
        .filter(|(_, result)| !result.validation_issues.is_empty())
        .map(|(id, result)| (*id, result.validation_issues.clone()))
        .collect();

    AggregatedAnalysis {
        status,
        final_score,
        confidence,
        recommendation,
        framework: registry.framework(),
        active_modules,
        total_weight,
        completeness,
        module_results: results,
        module_failures,
        risk,
        validation_issues,
        generated_at,
    }
}

/// Built only from a contributing risk module; a testing or failed one leaves
/// the summary and the recommendation wording untouched.
fn risk_summary(results: &BTreeMap<ModuleId, ModuleResult>, registry: &ModuleRegistry) -> Option<RiskSummary> {
    let config = registry
        .get(ModuleId::RiskAssessment)
        .filter(|config| config.is_active())?;
    let result = results
        .get(&ModuleId::RiskAssessment)
        .filter(|result| !result.is_error())?;
    let scores = RiskAssessmentModule::domain_scores(&result.sub_scores)?;
    let reporting = RiskReporting::from_config(config);
    let monitored = reporting.monitored_scores(&scores);
    Some(RiskSummary {
        overall_risk: round1(scores.overall()),
        level: scores.level(),
        flags: flags_for(&monitored),
        mitigation_strategies: if reporting.auto_mitigation {
            mitigation_strategies(&monitored)
        } else {
            Vec::new()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::modules::{ModuleStatus, ScoreScale};
    use crate::analysis::registry::Activation;
    use serde_json::json;

    fn result(id: ModuleId, score: f64, scale: ScoreScale, confidence: f64) -> ModuleResult {
        ModuleResult {
            module_id: id,
            status: ModuleStatus::Success,
            score,
            scale,
            confidence,
            band: None,
            sub_scores: BTreeMap::new(),
            details: json!({}),
            validation_issues: Vec::new(),
            error: None,
        }
    }

    fn uniform_results(registry: &ModuleRegistry) -> BTreeMap<ModuleId, ModuleResult> {
        registry
            .modules()
            .iter()
            .map(|config| {
                let module = if config.id == ModuleId::TcaScorecard {
                    result(config.id, 80.0, ScoreScale::Hundred, 8.0)
                } else {
                    result(config.id, 8.0, ScoreScale::Ten, 8.0)
                };
                (config.id, module)
            })
            .collect()
    }

    #[test]
    fn mixed_scales_combine_on_hundred() {
        let registry = ModuleRegistry::standard();
        let analysis = aggregate(uniform_results(&registry), &registry, Utc::now());

        assert_eq!(analysis.final_score, 80.0);
        assert_eq!(analysis.status, AnalysisStatus::Completed);
        assert_eq!(analysis.recommendation.tier, RecommendationTier::StrongInvest);
        assert_eq!(analysis.completeness, 1.0);
        assert_eq!(analysis.confidence, 8.0);
    }

    #[test]
    fn errored_modules_are_excluded_and_reported() {
        let registry = ModuleRegistry::standard();
        let mut results = uniform_results(&registry);
        results.insert(
            ModuleId::MarketAnalysis,
            ModuleResult::failed(ModuleId::MarketAnalysis, ScoreScale::Ten, "boom".into(), vec![]),
        );

        let analysis = aggregate(results, &registry, Utc::now());

        assert_eq!(analysis.status, AnalysisStatus::CompletedWithErrors);
        assert!(!analysis.active_modules.contains(&ModuleId::MarketAnalysis));
        assert_eq!(analysis.module_failures.len(), 1);
        assert_eq!(analysis.module_failures[0].reason, "boom");
        assert!((analysis.completeness - 8.0 / 9.0).abs() < 1e-9);
        assert!((analysis.total_weight - (18.0 - 2.0)).abs() < 1e-9);
    }

    #[test]
    fn testing_modules_never_contribute() {
        let registry = ModuleRegistry::standard()
            .with_activation(ModuleId::GrowthAssessment, Activation::Testing)
            .expect("known module");
        let mut results = uniform_results(&registry);
        results.insert(
            ModuleId::GrowthAssessment,
            result(ModuleId::GrowthAssessment, 0.5, ScoreScale::Ten, 1.0),
        );

        let analysis = aggregate(results, &registry, Utc::now());

        assert_eq!(analysis.final_score, 80.0);
        assert!(analysis.module_results.contains_key(&ModuleId::GrowthAssessment));
        assert!(!analysis.active_modules.contains(&ModuleId::GrowthAssessment));
    }

    fn high_risk_result() -> ModuleResult {
        let mut risk = result(ModuleId::RiskAssessment, 2.0, ScoreScale::Ten, 8.0);
        for domain in crate::analysis::risk::RiskDomain::ALL {
            risk.sub_scores.insert(domain.as_str().to_string(), 8.0);
        }
        risk
    }

    #[test]
    fn testing_risk_module_leaves_summary_and_wording_alone() {
        let registry = ModuleRegistry::standard()
            .with_activation(ModuleId::RiskAssessment, Activation::Testing)
            .expect("known module");
        let mut results = uniform_results(&registry);
        results.insert(ModuleId::RiskAssessment, high_risk_result());

        let analysis = aggregate(results, &registry, Utc::now());

        assert!(analysis.risk.is_none());
        assert!(!analysis.recommendation.summary.contains("risk"));

        let registry = ModuleRegistry::standard();
        let mut results = uniform_results(&registry);
        results.insert(ModuleId::RiskAssessment, high_risk_result());
        let analysis = aggregate(results, &registry, Utc::now());
        let summary = analysis.risk.expect("active risk module summarised");
        assert_eq!(summary.level, RiskLevel::High);
        assert_eq!(summary.flags.len(), 7);
        assert!(analysis.recommendation.summary.contains("High overall risk"));
    }

    #[test]
    fn no_successful_modules_fails_with_zero() {
        let registry = ModuleRegistry::standard();
        let results = registry
            .modules()
            .iter()
            .map(|config| {
                (
                    config.id,
                    ModuleResult::failed(config.id, ScoreScale::Ten, "down".into(), vec![]),
                )
            })
            .collect();

        let analysis = aggregate(results, &registry, Utc::now());

        assert_eq!(analysis.status, AnalysisStatus::Failed);
        assert_eq!(analysis.final_score, 0.0);
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.recommendation.tier, RecommendationTier::Pass);
        assert_eq!(analysis.module_failures.len(), 9);
    }

    #[test]
    fn tiers_and_risk_wording() {
        assert_eq!(RecommendationTier::from_score(80.0), RecommendationTier::StrongInvest);
        assert_eq!(RecommendationTier::from_score(79.9), RecommendationTier::ProceedWithDueDiligence);
        assert_eq!(RecommendationTier::from_score(60.0), RecommendationTier::Conditional);
        assert_eq!(RecommendationTier::from_score(59.9), RecommendationTier::Pass);

        let cautious = RecommendationTier::StrongInvest.summary(Some(RiskLevel::High));
        assert!(cautious.contains("High overall risk"));
        assert!(!RecommendationTier::StrongInvest
            .summary(Some(RiskLevel::Low))
            .contains("risk"));
    }
}
