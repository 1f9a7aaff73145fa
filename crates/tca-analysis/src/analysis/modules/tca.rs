use serde_json::{json, Value};

use super::{merge_score, Assessment, ModuleContext, ModuleError, ScoreScale, ScoringModule};
use crate::analysis::risk::RiskDomainScores;
use crate::analysis::scorecard::{FlagColor, Framework, Scorecard};

/// Composite scorecard on 0-100.
///
/// Settings: `framework` picks the category template instead of the
/// registry's, `include_categories` (default true) keeps the per-category
/// breakdown in the details.
pub struct TcaScorecardModule;

impl TcaScorecardModule {
    fn framework(ctx: &ModuleContext<'_>) -> Result<Framework, ModuleError> {
        match ctx.config.setting_str("framework") {
            None => Ok(ctx.framework),
            Some(raw) => Framework::parse(raw).ok_or_else(|| ModuleError::InvalidValue {
                field: "settings.framework".to_string(),
                reason: format!("unknown scorecard framework '{raw}'"),
            }),
        }
    }
}

impl ScoringModule for TcaScorecardModule {
    fn scale(&self) -> ScoreScale {
        ScoreScale::Hundred
    }

    fn base_confidence(&self) -> f64 {
        8.5
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let risk = RiskDomainScores::assess(ctx.profile);
        let scorecard = Scorecard::calculate(Self::framework(ctx)?, ctx.profile, &risk);

        let mut assessment = Assessment {
            score: scorecard.composite_score,
            ..Assessment::default()
        };
        for category in &scorecard.categories {
            assessment
                .sub_scores
                .insert(category.category.key().to_string(), category.raw_score);
        }
        assessment.detail("framework", json!(scorecard.framework));
        assessment.detail("green_flags", json!(scorecard.flags(FlagColor::Green).count()));
        assessment.detail("yellow_flags", json!(scorecard.flags(FlagColor::Yellow).count()));
        assessment.detail("red_flags", json!(scorecard.flags(FlagColor::Red).count()));
        if ctx.config.setting_bool("include_categories", true) {
            assessment.detail("categories", json!(scorecard.categories));
        }
        Ok(assessment)
    }

    fn flow_input(&self, ctx: &ModuleContext<'_>) -> Value {
        json!({
            "moduleId": ctx.config.id,
            "framework": Self::framework(ctx).unwrap_or(ctx.framework),
            "companyData": ctx.profile,
        })
    }

    fn merge_external(&self, _ctx: &ModuleContext<'_>, assessment: &mut Assessment, payload: &Value) {
        if !merge_score(assessment, payload, "overall_score", self.scale()) {
            merge_score(assessment, payload, "composite_score", self.scale());
        }
        if let Some(summary) = payload.get("summary") {
            assessment.detail("external_insights", summary.clone());
        }
    }
}
