use serde_json::json;

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::profile::{CompanyProfile, DevelopmentStage};
use crate::analysis::risk::{RiskDomain, RiskDomainScores};
use crate::analysis::scorecard::{scalability, technology_innovation};

const IP_TYPES: &[&str] = &["patents", "trade_secrets"];

/// Settings: `ip_types` lists the protection kinds that count toward IP strength.
pub struct TechnologyAssessmentModule;

impl ScoringModule for TechnologyAssessmentModule {
    fn base_confidence(&self) -> f64 {
        7.5
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let profile = ctx.profile;
        let risk = RiskDomainScores::assess(profile);
        let mut assessment = Assessment::default();

        assessment.sub("innovation", technology_innovation(profile));
        let ip_types = ctx
            .config
            .setting_strings("ip_types")
            .unwrap_or_else(|| IP_TYPES.to_vec());
        assessment.sub("ip_strength", ip_strength(profile, &ip_types));
        assessment.sub("maturity", 11.0 - risk.get(RiskDomain::Technology));
        assessment.sub("scalability", scalability(profile));
        assessment.score_from_mean();

        assessment.detail("development_stage", json!(profile.technology.development_stage));
        assessment.detail("technology_stack", json!(profile.technology.stack));
        assessment.detail("patent_count", json!(profile.technology.patents.len()));
        assessment.detail("feasibility", json!(feasibility(profile.technology.development_stage)));
        assessment.detail("development_risks", json!(development_risks(profile)));
        Ok(assessment)
    }
}

fn feasibility(stage: DevelopmentStage) -> &'static str {
    match stage {
        DevelopmentStage::Concept | DevelopmentStage::Unrecognized => "unproven",
        DevelopmentStage::Prototype | DevelopmentStage::Mvp => "demonstrated",
        DevelopmentStage::Beta | DevelopmentStage::Production => "proven",
    }
}

fn ip_strength(profile: &CompanyProfile, ip_types: &[&str]) -> f64 {
    let technology = &profile.technology;
    let mut score = 4.0;
    if ip_types.contains(&"patents") && !technology.patents.is_empty() {
        score += 2.0 + 0.5 * technology.patents.len().min(4) as f64;
    }
    if ip_types.contains(&"trade_secrets") && !technology.trade_secrets.is_empty() {
        score += 1.0;
    }
    score
}

fn development_risks(profile: &CompanyProfile) -> Vec<&'static str> {
    let mut risks = Vec::new();
    if matches!(
        profile.technology.development_stage,
        DevelopmentStage::Concept | DevelopmentStage::Prototype | DevelopmentStage::Unrecognized
    ) {
        risks.push("Technology not yet validated with a working product");
    }
    if profile.technology.patents.is_empty() && profile.technology.trade_secrets.is_empty() {
        risks.push("No protected intellectual property");
    }
    let has_technical_lead = profile
        .team
        .members()
        .any(|person| person.role_mentions(&["cto", "engineer", "tech"]));
    if !has_technical_lead {
        risks.push("No identified technical leadership");
    }
    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::registry::{ModuleId, ModuleRegistry};
    use crate::analysis::scorecard::Framework;

    #[test]
    fn patents_and_secrets_raise_ip_strength() {
        let mut profile = CompanyProfile::default();
        assert_eq!(ip_strength(&profile, IP_TYPES), 4.0);

        profile.technology.patents = vec!["US-1".into(), "US-2".into()];
        profile.technology.trade_secrets = vec!["training pipeline".into()];
        assert_eq!(ip_strength(&profile, IP_TYPES), 8.0);
        assert_eq!(ip_strength(&profile, &["trade_secrets"]), 5.0);
    }

    #[test]
    fn ip_types_setting_limits_protection_kinds() {
        let registry = ModuleRegistry::standard();
        let mut config = registry.get(ModuleId::TechnologyAssessment).expect("technology").clone();
        config.settings.insert("ip_types".to_string(), json!(["patents"]));
        let mut profile = CompanyProfile::default();
        profile.technology.trade_secrets = vec!["training pipeline".into()];

        let assessment = TechnologyAssessmentModule
            .assess(&ModuleContext {
                config: &config,
                profile: &profile,
                framework: Framework::General,
            })
            .expect("technology assessed");
        assert_eq!(assessment.sub_scores["ip_strength"], 4.0);
    }

    #[test]
    fn concept_stage_company_lists_development_risks() {
        let risks = development_risks(&CompanyProfile::default());
        assert_eq!(risks.len(), 3);
        assert_eq!(feasibility(DevelopmentStage::default()), "unproven");
        assert_eq!(feasibility(DevelopmentStage::Mvp), "demonstrated");
    }
}
