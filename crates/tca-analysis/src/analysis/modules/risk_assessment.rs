use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::flags::{flags_for, mitigation_strategies};
use crate::analysis::registry::ModuleConfiguration;
use crate::analysis::risk::{RiskDomain, RiskDomainScores, MAX_DOMAIN_SCORE};
use crate::analysis::scorecard::round1;

/// Scores `10 - overall_risk` so that a safer company contributes more.
/// Sub-scores carry the raw per-domain risk values.
pub struct RiskAssessmentModule;

/// What the risk details report, read from the module settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReporting {
    /// Domains whose flags and strategies are reported; every domain is still scored.
    pub monitored: Vec<RiskDomain>,
    pub auto_mitigation: bool,
}

impl RiskReporting {
    /// `risk_domains` narrows the monitored domains, `auto_mitigation` toggles strategies.
    /// Unknown domain names are ignored.
    pub fn from_config(config: &ModuleConfiguration) -> Self {
        let monitored = match config.setting_strings("risk_domains") {
            Some(names) => names.into_iter().filter_map(RiskDomain::parse).collect(),
            None => RiskDomain::ALL.to_vec(),
        };
        Self {
            monitored,
            auto_mitigation: config.setting_bool("auto_mitigation", true),
        }
    }

    pub fn monitored_scores(&self, scores: &RiskDomainScores) -> RiskDomainScores {
        scores.restricted_to(&self.monitored)
    }
}

impl RiskAssessmentModule {
    /// Domain scores recovered from a module result's sub-scores.
    pub fn domain_scores(sub_scores: &BTreeMap<String, f64>) -> Option<RiskDomainScores> {
        let values: Vec<(RiskDomain, f64)> = sub_scores
            .iter()
            .filter_map(|(key, value)| RiskDomain::parse(key).map(|domain| (domain, *value)))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(RiskDomainScores::from_values(values))
        }
    }

    fn fill(assessment: &mut Assessment, scores: &RiskDomainScores, reporting: &RiskReporting) {
        let overall = scores.overall();
        assessment.sub_scores.retain(|key, _| RiskDomain::parse(key).is_none());
        for (domain, score) in scores.iter() {
            assessment.sub_scores.insert(domain.as_str().to_string(), round1(score));
        }
        assessment.score = round1(MAX_DOMAIN_SCORE - overall);
        assessment.detail("overall_risk", json!(round1(overall)));
        assessment.detail("risk_level", json!(scores.level()));

        let monitored = reporting.monitored_scores(scores);
        assessment.detail("flags", json!(flags_for(&monitored)));
        if reporting.auto_mitigation {
            assessment.detail("mitigation_strategies", json!(mitigation_strategies(&monitored)));
        } else {
            assessment.details.remove("mitigation_strategies");
        }
    }
}

impl ScoringModule for RiskAssessmentModule {
    fn base_confidence(&self) -> f64 {
        8.0
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let mut assessment = Assessment::default();
        let reporting = RiskReporting::from_config(ctx.config);
        Self::fill(&mut assessment, &RiskDomainScores::assess(ctx.profile), &reporting);
        Ok(assessment)
    }

    fn merge_external(&self, ctx: &ModuleContext<'_>, assessment: &mut Assessment, payload: &Value) {
        let Some(domains) = payload.get("risk_domains").and_then(Value::as_object) else {
            return;
        };
        let values: Vec<(RiskDomain, f64)> = domains
            .iter()
            .filter_map(|(key, value)| Some((RiskDomain::parse(key)?, value.as_f64()?)))
            .collect();
        if values.is_empty() {
            return;
        }
        let reporting = RiskReporting::from_config(ctx.config);
        Self::fill(assessment, &RiskDomainScores::from_values(values), &reporting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::profile::CompanyProfile;
    use crate::analysis::registry::{ModuleId, ModuleRegistry};
    use crate::analysis::risk::RiskLevel;
    use crate::analysis::scorecard::Framework;

    fn risky_profile() -> CompanyProfile {
        let mut profile = CompanyProfile::default();
        profile.financials.runway_months = Some(3.0);
        profile.team.size = Some(2);
        profile.industry = Some("fintech".to_string());
        profile
    }

    #[test]
    fn score_is_inverse_of_overall_risk() {
        let registry = ModuleRegistry::standard();
        let config = registry.get(ModuleId::RiskAssessment).expect("risk");
        let profile = risky_profile();
        let ctx = ModuleContext {
            config,
            profile: &profile,
            framework: Framework::General,
        };

        let assessment = RiskAssessmentModule.assess(&ctx).expect("risk assessed");
        let overall = assessment.details["overall_risk"].as_f64().expect("overall");
        assert!((assessment.score - (10.0 - overall)).abs() < 0.11);
        assert_eq!(assessment.sub_scores.len(), 7);
        assert_eq!(assessment.details["risk_level"], json!(RiskLevel::High));
        assert_eq!(assessment.details["flags"].as_array().map(Vec::len), Some(7));

        let recovered = RiskAssessmentModule::domain_scores(&assessment.sub_scores).expect("domains");
        assert_eq!(recovered.get(RiskDomain::Financial), 8.0);
    }

    #[test]
    fn settings_narrow_reported_domains_and_disable_mitigation() {
        let registry = ModuleRegistry::standard();
        let mut config = registry.get(ModuleId::RiskAssessment).expect("risk").clone();
        config
            .settings
            .insert("risk_domains".to_string(), json!(["financial", "team", "weather"]));
        config.settings.insert("auto_mitigation".to_string(), json!(false));
        let profile = risky_profile();
        let ctx = ModuleContext {
            config: &config,
            profile: &profile,
            framework: Framework::General,
        };

        let assessment = RiskAssessmentModule.assess(&ctx).expect("risk assessed");
        assert_eq!(assessment.sub_scores.len(), 7);
        let flags = assessment.details["flags"].as_array().expect("flags");
        let domains: Vec<&str> = flags.iter().filter_map(|flag| flag["domain"].as_str()).collect();
        assert_eq!(domains, ["team", "financial"]);
        assert!(!assessment.details.contains_key("mitigation_strategies"));
    }

    #[test]
    fn external_domains_replace_local_ones() {
        let registry = ModuleRegistry::standard();
        let profile = CompanyProfile::default();
        let ctx = ModuleContext {
            config: registry.get(ModuleId::RiskAssessment).expect("risk"),
            profile: &profile,
            framework: Framework::General,
        };
        let mut assessment = Assessment::default();
        RiskAssessmentModule.merge_external(
            &ctx,
            &mut assessment,
            &json!({"risk_domains": {"market": 2, "technology": 2, "team": 2, "financial": 2,
                "regulatory": 2, "competitive": 2, "execution": 2, "weather": 9}}),
        );
        assert_eq!(assessment.score, 8.0);
        assert_eq!(assessment.sub_scores.len(), 7);
    }
}
