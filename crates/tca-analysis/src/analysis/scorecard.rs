//! Weighted category scorecard producing a 0-100 composite.
//!
//! Category raw scores live on 1-10. The composite is
//! `round1(sum(raw * weight) * 10)` where the template weights sum to 1.0.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::profile::{CompanyProfile, CompetitiveIntensity, DevelopmentStage};
use super::risk::{RiskDomain, RiskDomainScores};

pub const GREEN_THRESHOLD: f64 = 8.0;
pub const YELLOW_THRESHOLD: f64 = 6.5;
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Which category set and weighting the scorecard uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// Five-category core scorecard.
    Core,
    #[default]
    General,
    Medtech,
}

impl Framework {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "core" => Some(Self::Core),
            "general" => Some(Self::General),
            "medtech" => Some(Self::Medtech),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::General => "general",
            Self::Medtech => "medtech",
        }
    }

    pub const fn weights(self) -> &'static [(ScorecardCategory, f64)] {
        match self {
            Self::Core => CORE_WEIGHTS,
            Self::General => GENERAL_WEIGHTS,
            Self::Medtech => MEDTECH_WEIGHTS,
        }
    }

    pub fn validate(self) -> Result<(), ScorecardWeightError> {
        let mut total = 0.0;
        for (category, weight) in self.weights() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ScorecardWeightError::InvalidWeight {
                    framework: self,
                    category: *category,
                    weight: *weight,
                });
            }
            total += weight;
        }
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ScorecardWeightError::BadTotal {
                framework: self,
                total,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScorecardWeightError {
    #[error("{framework} scorecard weights sum to {total}, expected 1.0")]
    BadTotal { framework: Framework, total: f64 },
    #[error("{framework} scorecard weight for {category:?} is invalid: {weight}")]
    InvalidWeight {
        framework: Framework,
        category: ScorecardCategory,
        weight: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorecardCategory {
    Leadership,
    ProductMarketFit,
    TeamStrength,
    TechnologyIp,
    BusinessModel,
    Financials,
    BusinessModelFinancials,
    GoToMarket,
    CompetitionMoat,
    MarketPotential,
    Traction,
    Scalability,
    RiskAssessment,
    ExitPotential,
    Regulatory,
}

impl ScorecardCategory {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Leadership => "leadership",
            Self::ProductMarketFit => "product_market_fit",
            Self::TeamStrength => "team_strength",
            Self::TechnologyIp => "technology_ip",
            Self::BusinessModel => "business_model",
            Self::Financials => "financials",
            Self::BusinessModelFinancials => "business_model_financials",
            Self::GoToMarket => "go_to_market",
            Self::CompetitionMoat => "competition_moat",
            Self::MarketPotential => "market_potential",
            Self::Traction => "traction",
            Self::Scalability => "scalability",
            Self::RiskAssessment => "risk_assessment",
            Self::ExitPotential => "exit_potential",
            Self::Regulatory => "regulatory",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Leadership => "Leadership",
            Self::ProductMarketFit => "Product-Market Fit",
            Self::TeamStrength => "Team Strength",
            Self::TechnologyIp => "Technology & IP",
            Self::BusinessModel => "Business Model",
            Self::Financials => "Financials",
            Self::BusinessModelFinancials => "Business Model & Financials",
            Self::GoToMarket => "Go-to-Market",
            Self::CompetitionMoat => "Competition & Moat",
            Self::MarketPotential => "Market Potential",
            Self::Traction => "Traction",
            Self::Scalability => "Scalability",
            Self::RiskAssessment => "Risk Assessment",
            Self::ExitPotential => "Exit Potential",
            Self::Regulatory => "Regulatory",
        }
    }
}

const CORE_WEIGHTS: &[(ScorecardCategory, f64)] = &[
    (ScorecardCategory::MarketPotential, 0.20),
    (ScorecardCategory::TechnologyIp, 0.15),
    (ScorecardCategory::TeamStrength, 0.25),
    (ScorecardCategory::BusinessModel, 0.20),
    (ScorecardCategory::Financials, 0.20),
];

const GENERAL_WEIGHTS: &[(ScorecardCategory, f64)] = &[
    (ScorecardCategory::Leadership, 0.20),
    (ScorecardCategory::ProductMarketFit, 0.20),
    (ScorecardCategory::TeamStrength, 0.10),
    (ScorecardCategory::TechnologyIp, 0.10),
    (ScorecardCategory::BusinessModelFinancials, 0.10),
    (ScorecardCategory::GoToMarket, 0.10),
    (ScorecardCategory::CompetitionMoat, 0.05),
    (ScorecardCategory::MarketPotential, 0.05),
    (ScorecardCategory::Traction, 0.05),
    (ScorecardCategory::Scalability, 0.025),
    (ScorecardCategory::RiskAssessment, 0.025),
    (ScorecardCategory::ExitPotential, 0.0),
];

const MEDTECH_WEIGHTS: &[(ScorecardCategory, f64)] = &[
    (ScorecardCategory::Leadership, 0.15),
    (ScorecardCategory::Regulatory, 0.15),
    (ScorecardCategory::ProductMarketFit, 0.15),
    (ScorecardCategory::TeamStrength, 0.10),
    (ScorecardCategory::TechnologyIp, 0.10),
    (ScorecardCategory::Financials, 0.10),
    (ScorecardCategory::GoToMarket, 0.05),
    (ScorecardCategory::CompetitionMoat, 0.05),
    (ScorecardCategory::MarketPotential, 0.05),
    (ScorecardCategory::Traction, 0.10),
    (ScorecardCategory::Scalability, 0.0),
    (ScorecardCategory::RiskAssessment, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagColor {
    Green,
    Yellow,
    Red,
}

impl FlagColor {
    pub fn from_raw(raw: f64) -> Self {
        if raw >= GREEN_THRESHOLD {
            Self::Green
        } else if raw >= YELLOW_THRESHOLD {
            Self::Yellow
        } else {
            Self::Red
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ScorecardCategory,
    pub raw_score: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub flag: FlagColor,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub framework: Framework,
    pub categories: Vec<CategoryScore>,
    pub composite_score: f64,
}

impl Scorecard {
    /// Scores every template category from the profile and its risk assessment.
    pub fn calculate(framework: Framework, profile: &CompanyProfile, risk: &RiskDomainScores) -> Self {
        Self::from_raw_scores(framework, |category| raw_score(category, profile, risk))
    }

    /// Builds a scorecard from externally supplied raw scores (clamped to 1-10).
    pub fn from_raw_scores<F>(framework: Framework, mut score_of: F) -> Self
    where
        F: FnMut(ScorecardCategory) -> f64,
    {
        let categories: Vec<CategoryScore> = framework
            .weights()
            .iter()
            .map(|(category, weight)| {
                let raw = clamp_raw(score_of(*category));
                let flag = FlagColor::from_raw(raw);
                CategoryScore {
                    category: *category,
                    raw_score: raw,
                    weight: *weight,
                    weighted_score: raw * weight,
                    flag,
                    notes: note_for(*category, raw, flag),
                }
            })
            .collect();

        let composite_score = round1(
            categories
                .iter()
                .map(|category| category.weighted_score)
                .sum::<f64>()
                * 10.0,
        );

        Self {
            framework,
            categories,
            composite_score,
        }
    }

    pub fn category(&self, category: ScorecardCategory) -> Option<&CategoryScore> {
        self.categories.iter().find(|entry| entry.category == category)
    }

    pub fn flags(&self, color: FlagColor) -> impl Iterator<Item = &CategoryScore> {
        self.categories.iter().filter(move |entry| entry.flag == color)
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn clamp_raw(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(1.0, 10.0)
    } else {
        1.0
    }
}

fn note_for(category: ScorecardCategory, raw: f64, flag: FlagColor) -> String {
    let verdict = match flag {
        FlagColor::Green => "strength",
        FlagColor::Yellow => "acceptable with follow-up",
        FlagColor::Red => "needs attention",
    };
    format!("{} scored {raw:.1}/10: {verdict}", category.label())
}

fn raw_score(category: ScorecardCategory, profile: &CompanyProfile, risk: &RiskDomainScores) -> f64 {
    match category {
        ScorecardCategory::MarketPotential => market_potential(profile),
        ScorecardCategory::TechnologyIp => technology_innovation(profile),
        ScorecardCategory::TeamStrength => team_capability(profile),
        ScorecardCategory::BusinessModel => business_model_viability(profile),
        ScorecardCategory::Financials => financial_health(profile),
        ScorecardCategory::BusinessModelFinancials => {
            (business_model_viability(profile) + financial_health(profile)) / 2.0
        }
        ScorecardCategory::Leadership => leadership(profile),
        ScorecardCategory::ProductMarketFit => product_market_fit(profile),
        ScorecardCategory::GoToMarket => go_to_market(profile),
        ScorecardCategory::CompetitionMoat => competition_moat(profile),
        ScorecardCategory::Traction => traction(profile),
        ScorecardCategory::Scalability => scalability(profile),
        ScorecardCategory::RiskAssessment => 11.0 - risk.overall(),
        ScorecardCategory::ExitPotential => exit_potential(profile),
        ScorecardCategory::Regulatory => regulatory_readiness(profile, risk),
    }
}

pub(crate) fn market_potential(profile: &CompanyProfile) -> f64 {
    let mut score = 7.5;
    if profile.industry_matches(&["ai", "healthcare", "fintech", "cleantech"]) {
        score += 1.0;
    }
    if profile.market.size.unwrap_or(0.0) > 1_000_000_000.0 {
        score += 0.5;
    }
    score
}

pub(crate) fn technology_innovation(profile: &CompanyProfile) -> f64 {
    let mut score = match profile.technology.development_stage {
        DevelopmentStage::Concept => 5.0,
        DevelopmentStage::Prototype => 6.5,
        DevelopmentStage::Mvp => 7.5,
        DevelopmentStage::Beta => 8.0,
        DevelopmentStage::Production => 8.5,
        DevelopmentStage::Unrecognized => 6.0,
    };
    if !profile.technology.patents.is_empty() {
        score += 0.5;
    }
    score
}

pub(crate) fn team_capability(profile: &CompanyProfile) -> f64 {
    let mut score = 7.0;
    let size = profile.team.headcount();
    if (5..=20).contains(&size) {
        score += 1.0;
    } else if size < 3 {
        score -= 1.5;
    }
    if !profile.team.founders.is_empty() {
        score += 1.0;
        if profile
            .team
            .founders
            .iter()
            .any(|founder| founder.background_mentions(&["exit"]))
        {
            score += 0.5;
        }
    }
    score
}

pub(crate) fn business_model_viability(profile: &CompanyProfile) -> f64 {
    let mut score = 7.0;
    if profile.business_model.is_recurring() {
        score += 0.5;
    }
    if profile.business_model.customer_validation {
        score += 1.0;
    }
    score
}

pub(crate) fn financial_health(profile: &CompanyProfile) -> f64 {
    let financials = &profile.financials;
    let revenue = financials.revenue.unwrap_or(0.0);
    let runway = financials.runway_months.unwrap_or(0.0);
    let burn = financials.burn_rate.unwrap_or(0.0);

    let mut score = 6.0;
    if revenue > 0.0 {
        score += 1.5;
    }
    if runway >= 18.0 {
        score += 1.0;
    } else if runway < 6.0 {
        score -= 2.0;
    }
    if burn > 0.0 && revenue > 0.0 && burn / revenue < 1.5 {
        score += 0.5;
    }
    score
}

fn leadership(profile: &CompanyProfile) -> f64 {
    let mut score = 6.0;
    let founders = &profile.team.founders;
    if !founders.is_empty() {
        score += 1.0;
    }
    if profile.team.members().any(|person| {
        person.background_mentions(&["led", "managed", "founded", "director", "vp"])
    }) {
        score += 1.5;
    }
    if founders
        .iter()
        .any(|founder| founder.background_mentions(&["exit", "acquired", "sold"]))
    {
        score += 1.0;
    }
    if !profile.team.advisors.is_empty() {
        score += 0.5;
    }
    score
}

fn product_market_fit(profile: &CompanyProfile) -> f64 {
    let mut score = match profile.technology.development_stage {
        DevelopmentStage::Concept => 4.0,
        DevelopmentStage::Prototype => 5.5,
        DevelopmentStage::Mvp => 6.5,
        DevelopmentStage::Beta => 7.5,
        DevelopmentStage::Production => 8.0,
        DevelopmentStage::Unrecognized => 5.0,
    };
    if profile.business_model.customer_validation {
        score += 1.5;
    }
    score
}

fn go_to_market(profile: &CompanyProfile) -> f64 {
    let model = &profile.business_model;
    let mut score = 5.5;
    if !model.customer_segments.is_empty() {
        score += 1.0;
    }
    if !model.channels.is_empty() {
        score += 1.0;
    }
    if model.customer_validation {
        score += 1.0;
    }
    if model.value_proposition.is_some() {
        score += 0.5;
    }
    score
}

fn competition_moat(profile: &CompanyProfile) -> f64 {
    let mut score = match profile.market.competitive_intensity {
        CompetitiveIntensity::Low => 8.0,
        CompetitiveIntensity::Medium => 6.5,
        CompetitiveIntensity::High => 5.0,
        CompetitiveIntensity::Unrecognized => 6.0,
    };
    if !profile.technology.patents.is_empty() {
        score += 1.0;
    }
    if !profile.technology.trade_secrets.is_empty() {
        score += 0.5;
    }
    score
}

fn traction(profile: &CompanyProfile) -> f64 {
    let mut score = 5.0;
    if profile.financials.revenue.unwrap_or(0.0) > 0.0 {
        score += 2.0;
    }
    if profile.business_model.customer_validation {
        score += 1.5;
    }
    if profile.growth.has_metrics {
        score += 1.0;
    }
    score
}

pub(crate) fn scalability(profile: &CompanyProfile) -> f64 {
    let mut score = 6.0;
    let cloud_native = profile.technology.stack.as_deref().is_some_and(|stack| {
        let stack = stack.to_lowercase();
        ["aws", "azure", "gcp", "cloud", "kubernetes"]
            .iter()
            .any(|needle| stack.contains(needle))
    });
    if cloud_native {
        score += 1.5;
    }
    if profile.business_model.is_recurring() {
        score += 1.0;
    }
    if profile.team.headcount() >= 5 {
        score += 0.5;
    }
    score
}

fn exit_potential(profile: &CompanyProfile) -> f64 {
    let mut score = 5.0;
    if profile.investment.exit_strategy.is_some() {
        score += 1.5;
    }
    if !profile.investment.comparable_exits.is_empty() {
        score += 1.0;
    }
    if profile.market.size.unwrap_or(0.0) > 1_000_000_000.0 {
        score += 1.0;
    }
    if profile
        .team
        .founders
        .iter()
        .any(|founder| founder.background_mentions(&["exit"]))
    {
        score += 1.0;
    }
    score
}

fn regulatory_readiness(profile: &CompanyProfile, risk: &RiskDomainScores) -> f64 {
    let mut score = 11.0 - risk.get(RiskDomain::Regulatory);
    if profile.regulatory_status.is_some() {
        score += 1.0;
    }
    score
}
