use serde::{Deserialize, Serialize};

use super::risk::{RiskDomain, RiskDomainScores};

/// Domains at or above this score get a concrete mitigation strategy.
pub const MITIGATION_THRESHOLD: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Low,
    Medium,
    High,
}

impl FlagSeverity {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            Self::High
        } else if score >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub domain: RiskDomain,
    pub severity: FlagSeverity,
    pub score: f64,
    pub description: String,
    pub mitigation: String,
}

/// One flag per domain, ordered by domain.
pub fn flags_for(scores: &RiskDomainScores) -> Vec<RiskFlag> {
    scores
        .iter()
        .map(|(domain, score)| {
            let severity = FlagSeverity::from_score(score);
            RiskFlag {
                domain,
                severity,
                score,
                description: format!("{domain} risk is {} ({score:.1}/10)", severity_label(severity)),
                mitigation: mitigation_for(domain).to_string(),
            }
        })
        .collect()
}

/// Mitigation strategies for every domain scoring at least [`MITIGATION_THRESHOLD`].
pub fn mitigation_strategies(scores: &RiskDomainScores) -> Vec<String> {
    scores
        .iter()
        .filter(|(_, score)| *score >= MITIGATION_THRESHOLD)
        .map(|(domain, _)| strategy_for(domain).to_string())
        .collect()
}

fn severity_label(severity: FlagSeverity) -> &'static str {
    match severity {
        FlagSeverity::Low => "low",
        FlagSeverity::Medium => "elevated",
        FlagSeverity::High => "high",
    }
}

fn mitigation_for(domain: RiskDomain) -> &'static str {
    match domain {
        RiskDomain::Market => "Conduct thorough market research and validation",
        RiskDomain::Technology => "Implement robust testing and development processes",
        RiskDomain::Team => "Strengthen team with key hires and advisors",
        RiskDomain::Financial => "Secure additional funding and optimize burn rate",
        RiskDomain::Regulatory => "Engage regulatory experts and ensure compliance",
        RiskDomain::Competitive => "Develop strong competitive moats and differentiation",
        RiskDomain::Execution => "Improve operational processes and project management",
    }
}

fn strategy_for(domain: RiskDomain) -> &'static str {
    match domain {
        RiskDomain::Market => "Validate demand with paid pilots before scaling go-to-market spend",
        RiskDomain::Technology => "Stage technical milestones and fund an independent architecture review",
        RiskDomain::Team => "Recruit experienced operators for open leadership roles and add an advisory board",
        RiskDomain::Financial => "Extend runway to at least 18 months through bridge financing or cost reduction",
        RiskDomain::Regulatory => "Map the regulatory pathway and budget for compliance counsel",
        RiskDomain::Competitive => "Invest in defensible IP and exclusive channel partnerships",
        RiskDomain::Execution => "Introduce milestone-based planning with monthly board reporting",
    }
}
