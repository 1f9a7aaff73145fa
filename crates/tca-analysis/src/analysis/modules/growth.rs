use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{merge_score, Assessment, ModuleContext, ModuleError, ScoreScale, ScoringModule};
use crate::analysis::profile::CompanyProfile;
use crate::analysis::scorecard::scalability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthClass {
    PreGrowth,
    EarlyGrowth,
    Scaling,
    Hypergrowth,
}

impl GrowthClass {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.5 {
            Self::Hypergrowth
        } else if score >= 6.5 {
            Self::Scaling
        } else if score >= 4.5 {
            Self::EarlyGrowth
        } else {
            Self::PreGrowth
        }
    }
}

pub struct GrowthAssessmentModule;

impl ScoringModule for GrowthAssessmentModule {
    fn base_confidence(&self) -> f64 {
        7.5
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let profile = ctx.profile;
        let signals = growth_signals(profile);
        let mut assessment = Assessment::default();

        assessment.sub("trajectory", 3.0 + signals.len() as f64);
        assessment.sub("scalability", scalability(profile));
        assessment.score_from_mean();

        assessment.detail("classification", json!(GrowthClass::from_score(assessment.score)));
        assessment.detail("growth_signals", json!(signals));
        Ok(assessment)
    }

    fn merge_external(&self, _ctx: &ModuleContext<'_>, assessment: &mut Assessment, payload: &Value) {
        if merge_score(assessment, payload, "score", ScoreScale::Ten) {
            assessment.detail("classification", json!(GrowthClass::from_score(assessment.score)));
        }
        if let Some(class) = payload.get("classification") {
            assessment.detail("external_classification", class.clone());
        }
    }
}

fn growth_signals(profile: &CompanyProfile) -> Vec<&'static str> {
    let mut signals = Vec::new();
    if profile.growth.has_metrics {
        signals.push("tracked growth metrics");
    }
    if profile.financials.revenue.unwrap_or(0.0) > 0.0 {
        signals.push("revenue generating");
    }
    if profile.business_model.customer_validation {
        signals.push("validated demand");
    }
    if profile.growth.customer_acquisition.is_some() {
        signals.push("defined acquisition strategy");
    }
    if profile.growth.market_expansion.is_some() {
        signals.push("market expansion plan");
    }
    if profile.growth.product_roadmap.is_some() {
        signals.push("product roadmap");
    }
    if profile.business_model.is_recurring() {
        signals.push("recurring revenue model");
    }
    signals
}
