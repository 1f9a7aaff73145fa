//! Deterministic local results used when the flow service is unavailable.

use serde_json::{json, Value};

use super::{flows, FlowRequest};
use crate::analysis::flags::{flags_for, mitigation_strategies};
use crate::analysis::profile::CompanyProfile;
use crate::analysis::risk::RiskDomainScores;
use crate::analysis::scorecard::{Framework, Scorecard};

pub fn fallback_payload(request: &FlowRequest) -> Value {
    match request.flow_name.as_str() {
        flows::TCA_SCORECARD => match profile_from(request) {
            Some(profile) => scorecard_payload(&profile, framework_from(request)),
            None => marker(request),
        },
        flows::RISK_FLAGS => match profile_from(request) {
            Some(profile) => risk_payload(&profile),
            None => marker(request),
        },
        _ => marker(request),
    }
}

fn profile_from(request: &FlowRequest) -> Option<CompanyProfile> {
    request
        .input
        .get("companyData")
        .and_then(|data| serde_json::from_value(data.clone()).ok())
}

fn framework_from(request: &FlowRequest) -> Framework {
    request
        .input
        .get("framework")
        .and_then(Value::as_str)
        .and_then(Framework::parse)
        .unwrap_or_default()
}

fn scorecard_payload(profile: &CompanyProfile, framework: Framework) -> Value {
    let risk = RiskDomainScores::assess(profile);
    let scorecard = Scorecard::calculate(framework, profile, &risk);
    json!({
        "overall_score": scorecard.composite_score,
        "framework": framework,
        "categories": scorecard.categories,
        "source": "fallback",
    })
}

fn risk_payload(profile: &CompanyProfile) -> Value {
    let scores = RiskDomainScores::assess(profile);
    json!({
        "risk_domains": scores,
        "overall_risk": scores.overall(),
        "risk_level": scores.level(),
        "flags": flags_for(&scores),
        "mitigation_strategies": mitigation_strategies(&scores),
        "source": "fallback",
    })
}

fn marker(request: &FlowRequest) -> Value {
    json!({
        "status": "fallback",
        "flow": request.flow_name,
        "message": format!("{} unavailable; local heuristics used", request.flow_name),
    })
}
