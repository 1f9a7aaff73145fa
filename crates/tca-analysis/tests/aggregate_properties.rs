use proptest::prelude::*;
use std::collections::BTreeMap;
use tca_analysis::analysis::modules::ModuleCatalog;
use tca_analysis::analysis::{
    aggregate, Activation, AnalysisStatus, ModuleId, ModuleRegistry, ModuleResult, ModuleStatus,
};

#[derive(Debug, Clone)]
struct ModuleCase {
    activation: Activation,
    weight: f64,
    /// Fraction of the module's maximum score.
    score: f64,
    failed: bool,
}

fn activation() -> impl Strategy<Value = Activation> {
    prop_oneof![
        3 => Just(Activation::Active),
        1 => Just(Activation::Inactive),
        1 => Just(Activation::Testing),
    ]
}

fn module_case() -> impl Strategy<Value = ModuleCase> {
    (activation(), 0.1f64..=5.0, 0.0f64..=1.0, prop::bool::weighted(0.2)).prop_map(
        |(activation, weight, score, failed)| ModuleCase {
            activation,
            weight,
            score,
            failed,
        },
    )
}

fn build(cases: &[ModuleCase]) -> (ModuleRegistry, BTreeMap<ModuleId, ModuleResult>) {
    let catalog = ModuleCatalog::standard();
    let mut registry = ModuleRegistry::standard();
    let mut results = BTreeMap::new();
    for (id, case) in ModuleId::ALL.into_iter().zip(cases) {
        registry = registry
            .with_activation(id, case.activation)
            .and_then(|registry| registry.with_weight(id, case.weight))
            .expect("valid module settings");

        if case.activation == Activation::Inactive {
            continue;
        }
        let scale = catalog.scale_of(id);
        let mut result = ModuleResult::failed(id, scale, "scripted failure".to_string(), Vec::new());
        if !case.failed {
            result.status = ModuleStatus::Success;
            result.error = None;
            result.score = case.score * scale.max();
            result.confidence = 6.0;
        }
        results.insert(id, result);
    }
    (registry, results)
}

proptest! {
    #[test]
    fn final_score_stays_in_range_and_counts_only_contributing_weight(
        cases in prop::collection::vec(module_case(), ModuleId::ALL.len())
    ) {
        let (registry, results) = build(&cases);
        let expected_weight: f64 = registry
            .active()
            .filter(|config| results.get(&config.id).is_some_and(|result| !result.is_error()))
            .map(|config| config.weight)
            .sum();

        let analysis = aggregate(results, &registry, chrono::Utc::now());

        prop_assert!((0.0..=100.0).contains(&analysis.final_score));
        prop_assert!((analysis.total_weight - expected_weight).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&analysis.completeness));
        for id in &analysis.active_modules {
            let config = registry.get(*id).expect("configured");
            prop_assert_eq!(config.activation, Activation::Active);
        }
        if analysis.active_modules.is_empty() {
            prop_assert_eq!(analysis.status, AnalysisStatus::Failed);
            prop_assert_eq!(analysis.final_score, 0.0);
        }
    }

    #[test]
    fn testing_modules_never_move_the_score(
        cases in prop::collection::vec(module_case(), ModuleId::ALL.len()),
        testing_score in 0.0f64..=1.0,
    ) {
        let (registry, mut results) = build(&cases);
        let baseline = aggregate(results.clone(), &registry, chrono::Utc::now());

        for config in registry.modules().iter().filter(|config| config.activation == Activation::Testing) {
            if let Some(result) = results.get_mut(&config.id) {
                result.status = ModuleStatus::Success;
                result.error = None;
                result.score = testing_score * result.scale.max();
            }
        }
        let changed = aggregate(results, &registry, chrono::Utc::now());

        prop_assert_eq!(baseline.final_score, changed.final_score);
        prop_assert_eq!(baseline.total_weight, changed.total_weight);
        prop_assert_eq!(baseline.active_modules, changed.active_modules);
    }
}
