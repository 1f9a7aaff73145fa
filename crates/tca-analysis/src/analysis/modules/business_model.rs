use serde_json::json;

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::profile::BusinessModelProfile;
use crate::analysis::scorecard::business_model_viability;

pub struct BusinessModelModule;

impl ScoringModule for BusinessModelModule {
    fn base_confidence(&self) -> f64 {
        8.0
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let model = &ctx.profile.business_model;
        let mut assessment = Assessment::default();

        assessment.sub("viability", business_model_viability(ctx.profile));
        assessment.sub("market_fit", market_fit(model));
        assessment.sub("revenue_model_strength", revenue_model_strength(model));
        assessment.score_from_mean();

        assessment.detail("revenue_model", json!(model.revenue_model));
        assessment.detail("recurring_revenue", json!(model.is_recurring()));
        assessment.detail("customer_segments", json!(model.customer_segments));
        assessment.detail("channels", json!(model.channels));
        assessment.detail("customer_validation", json!(model.customer_validation));
        Ok(assessment)
    }
}

fn market_fit(model: &BusinessModelProfile) -> f64 {
    let mut score = 5.0;
    if !model.customer_segments.is_empty() {
        score += 1.0;
    }
    if !model.channels.is_empty() {
        score += 1.0;
    }
    if model.customer_validation {
        score += 1.5;
    }
    if model.value_proposition.is_some() {
        score += 0.5;
    }
    score
}

fn revenue_model_strength(model: &BusinessModelProfile) -> f64 {
    if model.is_recurring() {
        8.5
    } else if model.revenue_model.is_some() {
        6.5
    } else {
        4.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_subscription_model_is_strong() {
        let model = BusinessModelProfile {
            revenue_model: Some("subscription".to_string()),
            value_proposition: Some("Faster claims processing".to_string()),
            customer_segments: vec!["insurers".to_string()],
            channels: vec!["direct sales".to_string()],
            customer_validation: true,
        };
        assert_eq!(market_fit(&model), 9.0);
        assert_eq!(revenue_model_strength(&model), 8.5);
    }

    #[test]
    fn missing_model_is_weak() {
        let model = BusinessModelProfile::default();
        assert_eq!(market_fit(&model), 5.0);
        assert_eq!(revenue_model_strength(&model), 4.5);
    }
}
