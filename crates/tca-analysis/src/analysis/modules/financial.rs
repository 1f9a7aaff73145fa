use serde_json::{json, Map, Value};

use super::{Assessment, ModuleContext, ModuleError, ScoringModule};
use crate::analysis::profile::{fields, FinancialProfile};
use crate::analysis::risk::{RiskDomain, RiskDomainScores};
use crate::analysis::scorecard::{financial_health, round1};

/// Months of burn a raise should cover.
const FUNDING_HORIZON_MONTHS: f64 = 24.0;

/// Local-only financial analysis; never calls the flow service.
///
/// Settings: `projection_periods` lists the month horizons for `funding_projections`.
pub struct FinancialAnalysisModule;

impl ScoringModule for FinancialAnalysisModule {
    fn base_confidence(&self) -> f64 {
        8.5
    }

    fn assess(&self, ctx: &ModuleContext<'_>) -> Result<Assessment, ModuleError> {
        let financials = &ctx.profile.financials;
        validate(financials)?;

        let mut assessment = Assessment::default();
        assessment.sub("financial_health", financial_health(ctx.profile));
        assessment.sub("runway", runway_score(financials.runway_months.unwrap_or(0.0)));
        assessment.sub("burn_efficiency", burn_efficiency(financials));
        assessment.score_from_mean();

        let risk = RiskDomainScores::assess(ctx.profile);
        assessment.detail("revenue", json!(financials.revenue));
        assessment.detail("burn_rate", json!(financials.burn_rate));
        assessment.detail("runway_months", json!(financials.runway_months));
        assessment.detail("burn_multiple", json!(burn_multiple(financials).map(round1)));
        assessment.detail("funding_rounds", json!(financials.funding_rounds));
        assessment.detail(
            "funding_requirement",
            json!(financials.burn_rate.map(|burn| burn * FUNDING_HORIZON_MONTHS)),
        );
        if let Some(burn) = financials.burn_rate {
            let projections: Map<String, Value> = ctx
                .config
                .setting_numbers("projection_periods")
                .into_iter()
                .filter(|months| *months > 0.0)
                .map(|months| (format!("{months}"), json!(burn * months)))
                .collect();
            assessment.detail("funding_projections", Value::Object(projections));
        }
        assessment.detail("financial_risk", json!(risk.get(RiskDomain::Financial)));
        Ok(assessment)
    }
}

fn validate(financials: &FinancialProfile) -> Result<(), ModuleError> {
    if !financials.has_figures() {
        return Err(ModuleError::MissingData(
            "financial_data needs at least one of revenue, burn_rate or runway_months".to_string(),
        ));
    }
    let checks = [
        (fields::REVENUE, financials.revenue),
        (fields::BURN_RATE, financials.burn_rate),
        (fields::RUNWAY_MONTHS, financials.runway_months),
        (fields::EXPENSES, financials.expenses),
    ];
    for (field, value) in checks {
        if let Some(value) = value.filter(|value| *value < 0.0) {
            return Err(ModuleError::InvalidValue {
                field: field.to_string(),
                reason: format!("must not be negative, got {value}"),
            });
        }
    }
    Ok(())
}

fn runway_score(runway: f64) -> f64 {
    if runway >= 24.0 {
        9.0
    } else if runway >= 18.0 {
        8.0
    } else if runway >= 12.0 {
        6.5
    } else if runway >= 6.0 {
        5.0
    } else {
        3.0
    }
}

fn burn_multiple(financials: &FinancialProfile) -> Option<f64> {
    let revenue = financials.revenue.filter(|revenue| *revenue > 0.0)?;
    let burn = financials.burn_rate.filter(|burn| *burn > 0.0)?;
    Some(burn / revenue)
}

fn burn_efficiency(financials: &FinancialProfile) -> f64 {
    let revenue = financials.revenue.unwrap_or(0.0);
    match burn_multiple(financials) {
        Some(multiple) if multiple < 1.0 => 9.0,
        Some(multiple) if multiple < 1.5 => 7.5,
        Some(multiple) if multiple < 3.0 => 5.5,
        Some(_) => 3.5,
        None if revenue > 0.0 => 9.0,
        None => 3.0,
    }
}
