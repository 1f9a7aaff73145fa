use serde_json::{json, Map, Value};

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::profile::TeamProfile;
use crate::analysis::scorecard::{round1, team_capability};

const TECH_ROLES: &[&str] = &["cto", "tech", "engineer", "architect"];
const BUSINESS_ROLES: &[&str] = &["ceo", "coo", "business", "sales", "commercial"];
const MAX_COMPLETENESS: f64 = 9.0;

/// Settings: `weight_distribution` weighs the founders, key_personnel and
/// advisors groups for the `composition_coverage` detail.
pub struct TeamAssessmentModule;

impl ScoringModule for TeamAssessmentModule {
    fn base_confidence(&self) -> f64 {
        8.0
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let team = &ctx.profile.team;
        let (completeness, missing_roles) = completeness(team);
        let mut assessment = Assessment::default();

        assessment.sub("capability", team_capability(ctx.profile));
        assessment.sub("completeness", completeness * 10.0 / MAX_COMPLETENESS);
        assessment.sub("leadership_experience", leadership_experience(team));
        assessment.score_from_mean();

        assessment.detail("team_size", json!(team.size));
        assessment.detail("founder_count", json!(team.founders.len()));
        assessment.detail("key_personnel_count", json!(team.key_personnel.len()));
        assessment.detail("advisor_count", json!(team.advisors.len()));
        assessment.detail("missing_roles", json!(missing_roles));
        if let Some(weights) = ctx.config.setting("weight_distribution").and_then(Value::as_object) {
            assessment.detail("composition_coverage", json!(composition_coverage(team, weights)));
        }
        assessment.detail(
            "founder_experience",
            json!(team
                .founders
                .iter()
                .filter_map(|founder| founder.background.as_deref())
                .collect::<Vec<_>>()),
        );
        Ok(assessment)
    }
}

/// Founders 3, key personnel 2, technical lead 2, business lead 2.
fn completeness(team: &TeamProfile) -> (f64, Vec<&'static str>) {
    let mut score = 0.0;
    let mut missing = Vec::new();

    if team.founders.is_empty() {
        missing.push("founders");
    } else {
        score += 3.0;
    }
    if team.key_personnel.is_empty() {
        missing.push("key_personnel");
    } else {
        score += 2.0;
    }
    if team.members().any(|person| person.role_mentions(TECH_ROLES)) {
        score += 2.0;
    } else {
        missing.push("technical_lead");
    }
    if team.members().any(|person| person.role_mentions(BUSINESS_ROLES)) {
        score += 2.0;
    } else {
        missing.push("business_lead");
    }
    (score, missing)
}

/// Share of the configured group weights whose group is staffed. Groups the
/// profile cannot observe, such as culture, never count.
fn composition_coverage(team: &TeamProfile, weights: &Map<String, Value>) -> f64 {
    let total: f64 = weights.values().filter_map(Value::as_f64).filter(|w| *w > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let staffed: f64 = weights
        .iter()
        .filter(|(group, _)| match group.as_str() {
            "founders" => !team.founders.is_empty(),
            "key_personnel" => !team.key_personnel.is_empty(),
            "advisors" => !team.advisors.is_empty(),
            _ => false,
        })
        .filter_map(|(_, weight)| weight.as_f64())
        .filter(|w| *w > 0.0)
        .sum();
    round1(staffed / total)
}

fn leadership_experience(team: &TeamProfile) -> f64 {
    let experienced = team
        .members()
        .filter(|person| person.background_mentions(&["led", "managed", "founded", "exit", "director"]))
        .count();
    (5.0 + 1.5 * experienced as f64).min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::profile::{CompanyProfile, Person};
    use crate::analysis::registry::{ModuleId, ModuleRegistry};
    use crate::analysis::scorecard::Framework;

    fn person(role: &str, background: &str) -> Person {
        Person {
            name: Some(role.to_string()),
            role: Some(role.to_string()),
            background: Some(background.to_string()),
        }
    }

    #[test]
    fn complete_team_has_no_missing_roles() {
        let mut profile = CompanyProfile::default();
        profile.team.size = Some(10);
        profile.team.founders = vec![person("CEO", "Founded two companies, one exit")];
        profile.team.key_personnel = vec![person("CTO", "Led platform engineering")];

        let (score, missing) = completeness(&profile.team);
        assert_eq!(score, MAX_COMPLETENESS);
        assert!(missing.is_empty());

        let registry = ModuleRegistry::standard();
        let assessment = TeamAssessmentModule
            .assess(&ModuleContext {
                config: registry.get(ModuleId::TeamAssessment).expect("team"),
                profile: &profile,
                framework: Framework::General,
            })
            .expect("team assessed");
        // capability 7 + 1 + 1 + 0.5, completeness 10, leadership 5 + 3
        assert_eq!(assessment.sub_scores["capability"], 9.5);
        assert_eq!(assessment.sub_scores["completeness"], 10.0);
        assert_eq!(assessment.sub_scores["leadership_experience"], 8.0);
        assert_eq!(assessment.score, 9.2);
        // founders 0.4 + key personnel 0.3 of 1.0; no advisors
        assert_eq!(assessment.details["composition_coverage"], json!(0.7));
    }

    #[test]
    fn empty_team_lists_every_gap() {
        let (score, missing) = completeness(&TeamProfile::default());
        assert_eq!(score, 0.0);
        assert_eq!(missing, vec!["founders", "key_personnel", "technical_lead", "business_lead"]);
    }
}
