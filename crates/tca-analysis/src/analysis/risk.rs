//! Rule-based risk scoring across seven fixed domains.
//!
//! Every domain score is clamped to 1.0..=10.0; higher means riskier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::profile::{CompanyProfile, CompetitiveIntensity, DevelopmentStage};

pub const DOMAIN_BASELINE: f64 = 5.0;
pub const MIN_DOMAIN_SCORE: f64 = 1.0;
pub const MAX_DOMAIN_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDomain {
    Market,
    Technology,
    Team,
    Financial,
    Regulatory,
    Competitive,
    Execution,
}

impl RiskDomain {
    pub const ALL: [RiskDomain; 7] = [
        RiskDomain::Market,
        RiskDomain::Technology,
        RiskDomain::Team,
        RiskDomain::Financial,
        RiskDomain::Regulatory,
        RiskDomain::Competitive,
        RiskDomain::Execution,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Technology => "technology",
            Self::Team => "team",
            Self::Financial => "financial",
            Self::Regulatory => "regulatory",
            Self::Competitive => "competitive",
            Self::Execution => "execution",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str() == raw.trim().to_ascii_lowercase())
    }
}

impl fmt::Display for RiskDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            Self::High
        } else if score >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-domain risk scores for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskDomainScores(BTreeMap<RiskDomain, f64>);

impl RiskDomainScores {
    pub fn assess(profile: &CompanyProfile) -> Self {
        let scores = RiskDomain::ALL
            .into_iter()
            .map(|domain| (domain, clamp_domain(domain_score(domain, profile))))
            .collect();
        Self(scores)
    }

    /// Builds scores from arbitrary domain values, clamping each and filling
    /// absent domains with the baseline.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (RiskDomain, f64)>,
    {
        let mut scores: BTreeMap<RiskDomain, f64> = RiskDomain::ALL
            .into_iter()
            .map(|domain| (domain, DOMAIN_BASELINE))
            .collect();
        for (domain, value) in values {
            if value.is_finite() {
                scores.insert(domain, clamp_domain(value));
            }
        }
        Self(scores)
    }

    /// Only the listed domains, without baseline filling.
    pub fn restricted_to(&self, domains: &[RiskDomain]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(domain, _)| domains.contains(domain))
                .map(|(domain, score)| (*domain, *score))
                .collect(),
        )
    }

    pub fn get(&self, domain: RiskDomain) -> f64 {
        self.0.get(&domain).copied().unwrap_or(DOMAIN_BASELINE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskDomain, f64)> + '_ {
        self.0.iter().map(|(domain, score)| (*domain, *score))
    }

    pub fn overall(&self) -> f64 {
        if self.0.is_empty() {
            return DOMAIN_BASELINE;
        }
        self.0.values().sum::<f64>() / self.0.len() as f64
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.overall())
    }
}

fn clamp_domain(score: f64) -> f64 {
    score.clamp(MIN_DOMAIN_SCORE, MAX_DOMAIN_SCORE)
}

fn domain_score(domain: RiskDomain, profile: &CompanyProfile) -> f64 {
    match domain {
        RiskDomain::Market => market_risk(profile),
        RiskDomain::Technology => technology_risk(profile),
        RiskDomain::Team => team_risk(profile),
        RiskDomain::Financial => financial_risk(profile),
        RiskDomain::Regulatory => regulatory_risk(profile),
        RiskDomain::Competitive => competitive_risk(profile),
        RiskDomain::Execution => execution_risk(profile),
    }
}

fn market_risk(profile: &CompanyProfile) -> f64 {
    let mut score = DOMAIN_BASELINE;
    match profile.market.competitive_intensity {
        CompetitiveIntensity::High => score += 2.0,
        CompetitiveIntensity::Low => score -= 1.0,
        _ => {}
    }
    if profile.market.size.unwrap_or(0.0) > 1_000_000_000.0 {
        score -= 1.0;
    }
    score
}

fn technology_risk(profile: &CompanyProfile) -> f64 {
    match profile.technology.development_stage {
        DevelopmentStage::Concept => 8.0,
        DevelopmentStage::Prototype => 6.5,
        DevelopmentStage::Mvp => 5.0,
        DevelopmentStage::Beta => 3.5,
        DevelopmentStage::Production => 2.0,
        DevelopmentStage::Unrecognized => 7.0,
    }
}

fn team_risk(profile: &CompanyProfile) -> f64 {
    let mut score = DOMAIN_BASELINE;
    let size = profile.team.headcount();
    if size < 3 {
        score += 2.0;
    } else if size > 50 {
        score += 1.0;
    }

    if profile.team.founders.is_empty() {
        score += 3.0;
    } else if profile
        .team
        .founders
        .iter()
        .any(|founder| founder.background_mentions(&["exit"]))
    {
        score -= 2.0;
    }
    score
}

fn financial_risk(profile: &CompanyProfile) -> f64 {
    let mut score = DOMAIN_BASELINE;
    let runway = profile.financials.runway_months.unwrap_or(0.0);
    if runway < 6.0 {
        score += 3.0;
    } else if runway < 12.0 {
        score += 2.0;
    } else if runway > 24.0 {
        score -= 1.0;
    }
    score
}

fn regulatory_risk(profile: &CompanyProfile) -> f64 {
    if profile.industry_matches(&["healthcare", "fintech", "banking", "pharmaceutical"]) {
        7.0
    } else if profile.industry_matches(&["food", "automotive", "energy"]) {
        5.0
    } else {
        3.0
    }
}

fn competitive_risk(profile: &CompanyProfile) -> f64 {
    match profile.market.competitive_intensity {
        CompetitiveIntensity::Low => 3.0,
        CompetitiveIntensity::Medium => 6.0,
        CompetitiveIntensity::High => 8.5,
        CompetitiveIntensity::Unrecognized => 6.0,
    }
}

fn execution_risk(profile: &CompanyProfile) -> f64 {
    let mut score = match profile.technology.development_stage {
        DevelopmentStage::Concept => 8.0,
        DevelopmentStage::Prototype => 6.0,
        DevelopmentStage::Mvp => 5.0,
        DevelopmentStage::Beta => 4.0,
        DevelopmentStage::Production => 3.0,
        DevelopmentStage::Unrecognized => 7.0,
    };
    if profile
        .team
        .founders
        .iter()
        .any(|founder| founder.background_mentions(&["startup", "founder", "entrepreneur"]))
    {
        score -= 1.5;
    }
    score
}
