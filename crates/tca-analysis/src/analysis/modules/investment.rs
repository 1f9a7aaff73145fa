use serde_json::json;

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::profile::CompanyProfile;

const READINESS_BASE: f64 = 4.0;
const READINESS_SPAN: f64 = 6.0;

/// Settings: `readiness_criteria` selects which investor criteria are checked.
/// Unknown criterion keys are ignored.
pub struct InvestmentReadinessModule;

impl ScoringModule for InvestmentReadinessModule {
    fn base_confidence(&self) -> f64 {
        8.0
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let profile = ctx.profile;
        let selected = ctx.config.setting_strings("readiness_criteria");
        let (met, gaps) = criteria(profile, selected.as_deref());
        let mut assessment = Assessment::default();

        let checked = met.len() + gaps.len();
        let mut readiness = READINESS_BASE;
        if checked > 0 {
            readiness += READINESS_SPAN * met.len() as f64 / checked as f64;
        }
        if profile.financials.runway_months.is_some_and(|runway| runway < 6.0) {
            readiness -= 1.0;
        }
        assessment.sub("readiness", readiness);
        assessment.score_from_mean();

        assessment.detail("criteria_met", json!(met));
        assessment.detail("gaps", json!(gaps));
        assessment.detail("funding_requirements", json!(profile.investment.funding_requirements));
        Ok(assessment)
    }
}

/// Investor criteria, split into met and unmet. `None` checks all six.
fn criteria(profile: &CompanyProfile, selected: Option<&[&str]>) -> (Vec<&'static str>, Vec<&'static str>) {
    let investment = &profile.investment;
    let checks = [
        ("funding_requirements", "funding requirements stated", investment.funding_requirements.is_some()),
        ("use_of_funds", "use of funds defined", investment.use_of_funds.is_some()),
        ("exit_strategy", "exit strategy articulated", investment.exit_strategy.is_some()),
        ("comparable_exits", "comparable exits identified", !investment.comparable_exits.is_empty()),
        ("ip_protection", "intellectual property protected", !profile.technology.patents.is_empty()),
        ("market_validation", "customer demand validated", profile.business_model.customer_validation),
    ];

    let mut met = Vec::new();
    let mut gaps = Vec::new();
    for (key, criterion, satisfied) in checks {
        if selected.is_some_and(|keys| !keys.contains(&key)) {
            continue;
        }
        if satisfied {
            met.push(criterion);
        } else {
            gaps.push(criterion);
        }
    }
    (met, gaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::registry::{ModuleId, ModuleRegistry};
    use crate::analysis::scorecard::Framework;

    #[test]
    fn fully_prepared_company_reaches_ten() {
        let mut profile = CompanyProfile::default();
        profile.investment.funding_requirements = Some(2_000_000.0);
        profile.investment.use_of_funds = Some("hiring".into());
        profile.investment.exit_strategy = Some("strategic acquisition".into());
        profile.investment.comparable_exits = vec!["Initech".into()];
        profile.technology.patents = vec!["US-1".into()];
        profile.business_model.customer_validation = true;

        let registry = ModuleRegistry::standard();
        let assessment = InvestmentReadinessModule
            .assess(&ModuleContext {
                config: registry.get(ModuleId::InvestmentReadiness).expect("investment"),
                profile: &profile,
                framework: Framework::General,
            })
            .expect("assessed");
        assert_eq!(assessment.score, 10.0);
        assert_eq!(assessment.details["gaps"], json!([]));
    }

    #[test]
    fn unprepared_company_lists_all_gaps() {
        let (met, gaps) = criteria(&CompanyProfile::default(), None);
        assert!(met.is_empty());
        assert_eq!(gaps.len(), 6);
    }

    #[test]
    fn readiness_counts_only_selected_criteria() {
        let registry = ModuleRegistry::standard();
        let mut config = registry.get(ModuleId::InvestmentReadiness).expect("investment").clone();
        config.settings.insert(
            "readiness_criteria".to_string(),
            json!(["funding_requirements", "exit_strategy", "board_seats"]),
        );
        let mut profile = CompanyProfile::default();
        profile.investment.funding_requirements = Some(500_000.0);

        let assessment = InvestmentReadinessModule
            .assess(&ModuleContext {
                config: &config,
                profile: &profile,
                framework: Framework::General,
            })
            .expect("assessed");
        // 4 + 6 * 1/2
        assert_eq!(assessment.score, 7.0);
        assert_eq!(assessment.details["gaps"], json!(["exit strategy articulated"]));
    }
}
