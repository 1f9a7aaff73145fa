use serde_json::json;

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::profile::{CompanyProfile, CompetitiveIntensity};
use crate::analysis::scorecard::market_potential;

const HIGH_GROWTH_INDUSTRIES: &[&str] = &["ai", "healthcare", "fintech", "cleantech"];

/// Settings: `high_growth_industries` lists the industries with a high growth outlook.
pub struct MarketAnalysisModule;

impl ScoringModule for MarketAnalysisModule {
    fn base_confidence(&self) -> f64 {
        7.5
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let profile = ctx.profile;
        let mut assessment = Assessment::default();

        assessment.sub("market_potential", market_potential(profile));
        assessment.sub("market_size", market_size_score(profile.market.size));
        assessment.sub("competitive_position", competitive_position(profile));
        assessment.score_from_mean();

        assessment.detail("market_size", json!(profile.market.size));
        assessment.detail("competitive_intensity", json!(profile.market.competitive_intensity));
        assessment.detail("competitors", json!(profile.market.competitors));
        assessment.detail("competitive_advantages", json!(competitive_advantages(profile)));
        let high_growth = ctx
            .config
            .setting_strings("high_growth_industries")
            .unwrap_or_else(|| HIGH_GROWTH_INDUSTRIES.to_vec());
        assessment.detail("growth_outlook", json!(growth_outlook(profile, &high_growth)));
        Ok(assessment)
    }
}

fn market_size_score(size: Option<f64>) -> f64 {
    match size {
        Some(size) if size > 10_000_000_000.0 => 9.0,
        Some(size) if size > 1_000_000_000.0 => 8.0,
        Some(size) if size > 100_000_000.0 => 6.5,
        Some(_) => 5.0,
        None => 4.0,
    }
}

fn growth_outlook(profile: &CompanyProfile, high_growth: &[&str]) -> &'static str {
    if profile.industry_matches(high_growth) {
        "high"
    } else if profile.market.size.unwrap_or(0.0) > 1_000_000_000.0 {
        "moderate"
    } else {
        "uncertain"
    }
}

fn competitive_position(profile: &CompanyProfile) -> f64 {
    let mut score = match profile.market.competitive_intensity {
        CompetitiveIntensity::Low => 8.0,
        CompetitiveIntensity::Medium => 6.5,
        CompetitiveIntensity::High => 4.5,
        CompetitiveIntensity::Unrecognized => 6.0,
    };
    score += 0.5 * competitive_advantages(profile).len() as f64;
    score.min(10.0)
}

fn competitive_advantages(profile: &CompanyProfile) -> Vec<&'static str> {
    let mut advantages = Vec::new();
    if !profile.technology.patents.is_empty() {
        advantages.push("Intellectual property portfolio");
    }
    if !profile.team.founders.is_empty() {
        advantages.push("Experienced founding team");
    }
    if profile.business_model.customer_validation {
        advantages.push("Validated customer demand");
    }
    advantages
}
