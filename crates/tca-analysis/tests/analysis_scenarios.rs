use serde_json::json;
use std::collections::BTreeMap;
use tca_analysis::analysis::scorecard::ScorecardCategory;
use tca_analysis::analysis::{
    aggregate, Activation, AnalysisStatus, CompanyDocument, CompanyRecord, FlowClient, Framework, ModuleId, ModuleRegistry,
    ModuleResult, ModuleStatus, OfflineTransport, Orchestrator, RetryPolicy, RiskLevel, ScoreScale, Scorecard,
};

fn offline_orchestrator(registry: ModuleRegistry) -> Orchestrator<OfflineTransport> {
    let client = FlowClient::new(OfflineTransport, RetryPolicy::new(0, Default::default()));
    Orchestrator::new(registry, client)
}

fn established_company() -> CompanyRecord {
    CompanyRecord::from_value(json!({
        "company_name": "Northwind Diagnostics",
        "industry": "Healthcare",
        "funding_stage": "Series A",
        "development_stage": "production",
        "market_size": 4_500_000_000u64,
        "market_data": { "competitive_intensity": "medium", "competitors": "Acme, Globex" },
        "technology_stack": "Rust, Kubernetes, AWS",
        "patents": ["US-1001", "US-1002"],
        "team_size": 24,
        "team_data": {
            "founders": [
                { "name": "Ada", "role": "CEO", "background": "Founded and exited a diagnostics startup" },
                { "name": "Lin", "role": "CTO", "background": "Led imaging platform engineering" }
            ],
            "key_personnel": [{ "name": "Sam", "role": "VP Sales", "background": "Managed enterprise sales" }]
        },
        "financial_data": { "revenue": 2_400_000, "burn_rate": 1_200_000, "runway_months": 22 },
        "revenue_model": "subscription",
        "customer_validation": true
    }))
    .expect("object record")
}

#[tokio::test]
async fn tiny_team_without_founders_maxes_team_risk() {
    let record = CompanyRecord::from_value(json!({ "company_name": "Two Person Co", "team_size": 2 }))
        .expect("object record");
    let analysis = offline_orchestrator(ModuleRegistry::standard())
        .analyze(&record)
        .await
        .expect("analysis runs");

    let risk = &analysis.module_results[&ModuleId::RiskAssessment];
    assert_eq!(risk.sub_scores["team"], 10.0);
}

#[tokio::test]
async fn short_runway_with_burn_raises_financial_risk() {
    let record = CompanyRecord::from_value(json!({
        "company_name": "Burning Bright",
        "financial_data": { "burn_rate": 150_000, "runway_months": 3 }
    }))
    .expect("object record");
    let analysis = offline_orchestrator(ModuleRegistry::standard())
        .analyze(&record)
        .await
        .expect("analysis runs");

    let risk = &analysis.module_results[&ModuleId::RiskAssessment];
    assert!(risk.sub_scores["financial"] >= 8.0);
    let summary = analysis.risk.as_ref().expect("risk summary");
    assert!(summary
        .mitigation_strategies
        .iter()
        .any(|strategy| strategy.contains("runway")));
}

#[tokio::test]
async fn inactive_module_contributes_no_weight() {
    let registry = ModuleRegistry::standard()
        .with_activation(ModuleId::MarketAnalysis, Activation::Inactive)
        .expect("known module");
    let expected_weight: f64 = registry.active().map(|module| module.weight).sum();

    let analysis = offline_orchestrator(registry)
        .analyze(&established_company())
        .await
        .expect("analysis runs");

    assert!(!analysis.active_modules.contains(&ModuleId::MarketAnalysis));
    assert!(!analysis.module_results.contains_key(&ModuleId::MarketAnalysis));
    assert!((analysis.total_weight - expected_weight).abs() < 1e-9);
    assert_eq!(analysis.status, AnalysisStatus::Completed);
}

#[test]
fn uniform_category_scores_give_exact_composite() {
    let scorecard = Scorecard::from_raw_scores(Framework::General, |_| 8.0);
    assert_eq!(scorecard.composite_score, 80.0);
    assert!(scorecard.category(ScorecardCategory::TeamStrength).is_some());
}

#[test]
fn uniform_module_scores_give_exact_final_score() {
    let registry = ModuleRegistry::standard();
    let results: BTreeMap<ModuleId, ModuleResult> = registry
        .active()
        .map(|config| {
            let (scale, score) = if config.id == ModuleId::TcaScorecard {
                (ScoreScale::Hundred, 80.0)
            } else {
                (ScoreScale::Ten, 8.0)
            };
            let mut result = ModuleResult::failed(config.id, scale, String::new(), Vec::new());
            result.status = ModuleStatus::Success;
            result.error = None;
            result.score = score;
            result.confidence = 7.0;
            (config.id, result)
        })
        .collect();

    let analysis = aggregate(results, &registry, chrono::Utc::now());
    assert_eq!(analysis.final_score, 80.0);
    assert_eq!(analysis.confidence, 7.0);
    assert_eq!(analysis.completeness, 1.0);
}

#[tokio::test]
async fn missing_financials_fail_only_that_module() {
    let record = CompanyRecord::from_value(json!({
        "company_name": "Stealth Labs",
        "industry": "ai",
        "team_size": 5
    }))
    .expect("object record");
    let registry = ModuleRegistry::standard();
    let financial_weight = registry.get(ModuleId::FinancialAnalysis).expect("financial").weight;
    let all_weight: f64 = registry.active().map(|module| module.weight).sum();

    let analysis = offline_orchestrator(registry)
        .analyze(&record)
        .await
        .expect("analysis runs");

    assert_eq!(analysis.status, AnalysisStatus::CompletedWithErrors);
    assert_eq!(analysis.module_failures.len(), 1);
    assert_eq!(analysis.module_failures[0].module_id, ModuleId::FinancialAnalysis);
    assert!(analysis.module_results[&ModuleId::FinancialAnalysis].is_error());
    assert!((analysis.total_weight - (all_weight - financial_weight)).abs() < 1e-9);
    assert!(analysis.completeness < 1.0);
    assert!((0.0..=100.0).contains(&analysis.final_score));
}

#[tokio::test]
async fn offline_runs_are_deterministic() {
    let orchestrator = offline_orchestrator(ModuleRegistry::standard());
    let record = established_company();

    let first = orchestrator.analyze(&record).await.expect("first run");
    let second = orchestrator.analyze(&record).await.expect("second run");

    assert_eq!(first.module_results, second.module_results);
    assert_eq!(first.final_score, second.final_score);
    assert_eq!(first.recommendation, second.recommendation);
    assert!(first
        .module_results
        .values()
        .filter(|result| !result.is_error())
        .all(|result| matches!(result.status, ModuleStatus::Success | ModuleStatus::Fallback)));
}

#[tokio::test]
async fn established_company_scores_above_a_bare_record() {
    let orchestrator = offline_orchestrator(ModuleRegistry::standard());
    let strong = orchestrator.analyze(&established_company()).await.expect("strong run");
    let bare = CompanyRecord::from_value(json!({ "company_name": "Bare", "financial_data": { "revenue": 1 } }))
        .expect("object record");
    let weak = orchestrator.analyze(&bare).await.expect("weak run");

    assert!(strong.final_score > weak.final_score);
    assert_eq!(strong.framework, Framework::General);
    let risk = strong.risk.expect("risk summary");
    assert_ne!(risk.level, RiskLevel::High);
}

#[tokio::test]
async fn uploaded_financials_let_the_financial_module_run() {
    let mut record = CompanyRecord::from_value(json!({ "company_name": "Deck Only", "industry": "fintech" }))
        .expect("object record");
    let orchestrator = offline_orchestrator(ModuleRegistry::standard());
    let before = orchestrator.analyze(&record).await.expect("analysis runs");
    assert!(before.module_results[&ModuleId::FinancialAnalysis].is_error());

    let financials = CompanyDocument::from_json_str(
        r#"{"type": "financial_model", "content": {"revenue": 800000, "burn_rate": 60000, "runway_months": 20}}"#,
    )
    .expect("document");
    record.merge_documents(&[financials]);

    let after = orchestrator.analyze(&record).await.expect("analysis runs");
    let financial = &after.module_results[&ModuleId::FinancialAnalysis];
    assert_eq!(financial.status, ModuleStatus::Success);
    assert_eq!(financial.details["runway_months"], json!(20.0));
}

#[tokio::test]
async fn json_registry_settings_reach_the_scorecard() {
    let registry = ModuleRegistry::from_json_str(
        r#"[{
            "id": "tca_scorecard", "name": "TCA", "category": "core", "weight": 3.0,
            "settings": {"framework": "core"}
        }]"#,
    )
    .expect("registry");

    let analysis = offline_orchestrator(registry)
        .analyze(&established_company())
        .await
        .expect("analysis runs");

    let tca = &analysis.module_results[&ModuleId::TcaScorecard];
    assert_eq!(tca.details["framework"], "core");
    assert!(tca.sub_scores.len() >= 5);
    assert_eq!(analysis.framework, Framework::General);
}
