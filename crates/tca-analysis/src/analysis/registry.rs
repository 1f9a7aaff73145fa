//! Module registry: which analysis modules exist, how they are weighted, and
//! how each one reads the company record.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use super::flow::flows;
use super::mapper::{DataMappingRule, ValueKind};
use super::profile::fields;
use super::scorecard::{Framework, ScorecardWeightError};

pub const MAX_MODULE_WEIGHT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    TcaScorecard,
    RiskAssessment,
    MarketAnalysis,
    TeamAssessment,
    FinancialAnalysis,
    TechnologyAssessment,
    BusinessModel,
    GrowthAssessment,
    InvestmentReadiness,
}

impl ModuleId {
    pub const ALL: [ModuleId; 9] = [
        ModuleId::TcaScorecard,
        ModuleId::RiskAssessment,
        ModuleId::MarketAnalysis,
        ModuleId::TeamAssessment,
        ModuleId::FinancialAnalysis,
        ModuleId::TechnologyAssessment,
        ModuleId::BusinessModel,
        ModuleId::GrowthAssessment,
        ModuleId::InvestmentReadiness,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TcaScorecard => "tca_scorecard",
            Self::RiskAssessment => "risk_assessment",
            Self::MarketAnalysis => "market_analysis",
            Self::TeamAssessment => "team_assessment",
            Self::FinancialAnalysis => "financial_analysis",
            Self::TechnologyAssessment => "technology_assessment",
            Self::BusinessModel => "business_model",
            Self::GrowthAssessment => "growth_assessment",
            Self::InvestmentReadiness => "investment_readiness",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a configured module runs and whether it counts toward the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Active,
    Inactive,
    /// Runs and is reported, but never weighted.
    Testing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    Core,
    Analysis,
    Strategic,
    Compliance,
}

/// Ordered score bands on a 0-10 scale, e.g. `excellent >= 8.5`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub label: String,
    pub min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfiguration {
    pub id: ModuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ModuleCategory,
    #[serde(default)]
    pub activation: Activation,
    pub weight: f64,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub data_mapping: Vec<DataMappingRule>,
    #[serde(default)]
    pub thresholds: Vec<ScoreBand>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Named external flow this module may call; `None` keeps it fully local.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_flow: Option<String>,
}

impl ModuleConfiguration {
    pub fn is_active(&self) -> bool {
        self.activation == Activation::Active
    }

    pub fn is_executed(&self) -> bool {
        matches!(self.activation, Activation::Active | Activation::Testing)
    }

    /// Band label for a score already normalized to 0-10.
    pub fn band_for(&self, score: f64) -> Option<&str> {
        let mut bands: Vec<&ScoreBand> = self.thresholds.iter().collect();
        bands.sort_by(|a, b| b.min.total_cmp(&a.min));
        bands
            .into_iter()
            .find(|band| score >= band.min)
            .map(|band| band.label.as_str())
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn setting_bool(&self, key: &str, default: bool) -> bool {
        self.setting(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.setting(key).and_then(Value::as_str)
    }

    /// String entries of a list setting; `None` when the key is absent or not a list.
    pub fn setting_strings(&self, key: &str) -> Option<Vec<&str>> {
        self.setting(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    /// Numeric entries of a list setting; non-numbers are skipped.
    pub fn setting_numbers(&self, key: &str) -> Vec<f64> {
        self.setting(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("module registry is empty")]
    Empty,
    #[error("module {id} has invalid weight {weight}; expected 0 < weight <= 5")]
    InvalidWeight { id: ModuleId, weight: f64 },
    #[error("module {0} is configured more than once")]
    DuplicateModule(ModuleId),
    #[error("unknown analysis preset '{0}' (expected comprehensive, triage or medtech)")]
    UnknownPreset(String),
    #[error("module {0} is not configured")]
    UnknownModule(ModuleId),
    #[error("no module is active")]
    NoActiveModules,
    #[error(transparent)]
    Scorecard(#[from] ScorecardWeightError),
    #[error("failed to read module configuration {path}: {message}")]
    Load { path: String, message: String },
}

/// A registry file is either a bare list of modules or an object that also
/// names the scorecard framework.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Modules(Vec<ModuleConfiguration>),
    Full {
        #[serde(default)]
        framework: Framework,
        modules: Vec<ModuleConfiguration>,
    },
}

impl RegistryFile {
    fn into_registry(self) -> Result<ModuleRegistry, RegistryError> {
        match self {
            Self::Modules(modules) => ModuleRegistry::new(Framework::default(), modules),
            Self::Full { framework, modules } => ModuleRegistry::new(framework, modules),
        }
    }
}

/// Validated set of module configurations plus the scorecard framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRegistry {
    framework: Framework,
    modules: Vec<ModuleConfiguration>,
}

impl ModuleRegistry {
    pub fn new(framework: Framework, modules: Vec<ModuleConfiguration>) -> Result<Self, RegistryError> {
        if modules.is_empty() {
            return Err(RegistryError::Empty);
        }
        framework.validate()?;

        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.id) {
                return Err(RegistryError::DuplicateModule(module.id));
            }
            if !module.weight.is_finite() || module.weight <= 0.0 || module.weight > MAX_MODULE_WEIGHT {
                return Err(RegistryError::InvalidWeight {
                    id: module.id,
                    weight: module.weight,
                });
            }
        }

        Ok(Self { framework, modules })
    }

    /// Every module active, general scorecard.
    pub fn standard() -> Self {
        Self {
            framework: Framework::General,
            modules: standard_modules(),
        }
    }

    pub fn preset(name: &str) -> Result<Self, RegistryError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "comprehensive" | "standard" => Ok(Self::standard()),
            "triage" | "quick" => {
                let mut modules = standard_modules();
                for module in &mut modules {
                    if matches!(module.id, ModuleId::MarketAnalysis | ModuleId::TechnologyAssessment) {
                        module.activation = Activation::Inactive;
                    }
                }
                Self::new(Framework::Core, modules)
            }
            "medtech" => Self::new(Framework::Medtech, standard_modules()),
            other => Err(RegistryError::UnknownPreset(other.to_string())),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(raw).map_err(|err| RegistryError::Load {
            path: "<inline>".to_string(),
            message: err.to_string(),
        })?;
        file.into_registry()
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let load_error = |message: String| RegistryError::Load {
            path: path.display().to_string(),
            message,
        };
        let raw = fs::read_to_string(path).map_err(|err| load_error(err.to_string()))?;
        let file: RegistryFile = serde_json::from_str(&raw).map_err(|err| load_error(err.to_string()))?;
        file.into_registry()
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn modules(&self) -> &[ModuleConfiguration] {
        &self.modules
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleConfiguration> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &ModuleConfiguration> {
        self.modules.iter().filter(|module| module.is_active())
    }

    /// Active and testing modules, highest priority first.
    pub fn executed(&self) -> Vec<&ModuleConfiguration> {
        let mut modules: Vec<&ModuleConfiguration> =
            self.modules.iter().filter(|module| module.is_executed()).collect();
        modules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        modules
    }

    pub fn with_activation(mut self, id: ModuleId, activation: Activation) -> Result<Self, RegistryError> {
        let module = self
            .modules
            .iter_mut()
            .find(|module| module.id == id)
            .ok_or(RegistryError::UnknownModule(id))?;
        module.activation = activation;
        Ok(self)
    }

    pub fn with_weight(mut self, id: ModuleId, weight: f64) -> Result<Self, RegistryError> {
        let module = self
            .modules
            .iter_mut()
            .find(|module| module.id == id)
            .ok_or(RegistryError::UnknownModule(id))?;
        module.weight = weight;
        Self::new(self.framework, self.modules)
    }

    pub fn with_framework(mut self, framework: Framework) -> Result<Self, RegistryError> {
        framework.validate()?;
        self.framework = framework;
        Ok(self)
    }
}

fn band(label: &str, min: f64) -> ScoreBand {
    ScoreBand {
        label: label.to_string(),
        min,
    }
}

fn settings(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn rule(source: &str, target: &str, kind: ValueKind) -> DataMappingRule {
    DataMappingRule::new(source, target, kind)
}

fn company_rules() -> Vec<DataMappingRule> {
    vec![
        rule("company_name", fields::COMPANY_NAME, ValueKind::String)
            .required()
            .with_default(json!("Unknown company")),
        rule("industry", fields::INDUSTRY, ValueKind::String)
            .required()
            .with_default(json!("general"))
            .with_transform("lowercase"),
        rule("funding_stage", fields::STAGE, ValueKind::String)
            .required()
            .with_default(json!("seed"))
            .with_transform("lowercase"),
    ]
}

fn market_rules() -> Vec<DataMappingRule> {
    vec![
        rule("market_size", fields::MARKET_SIZE, ValueKind::Float),
        rule("market_data.competitive_intensity", fields::COMPETITIVE_INTENSITY, ValueKind::String)
            .with_transform("lowercase"),
        rule("market_data.competitors", fields::COMPETITORS, ValueKind::Any).with_transform("split_list"),
        rule("target_market", fields::TARGET_MARKET, ValueKind::String),
    ]
}

fn technology_rules() -> Vec<DataMappingRule> {
    vec![
        rule("development_stage", fields::DEVELOPMENT_STAGE, ValueKind::String).with_transform("lowercase"),
        rule("technology_stack", fields::TECHNOLOGY_STACK, ValueKind::String),
        rule("patents", fields::PATENTS, ValueKind::Any).with_transform("split_list"),
    ]
}

fn team_rules() -> Vec<DataMappingRule> {
    vec![
        rule("team_size", fields::TEAM_SIZE, ValueKind::Integer),
        rule("team_data.founders", fields::FOUNDERS, ValueKind::List),
        rule("team_data.key_personnel", fields::KEY_PERSONNEL, ValueKind::List),
    ]
}

fn financial_rules() -> Vec<DataMappingRule> {
    vec![
        rule("financial_data.revenue", fields::REVENUE, ValueKind::Float),
        rule("financial_data.burn_rate", fields::BURN_RATE, ValueKind::Float),
        rule("financial_data.runway_months", fields::RUNWAY_MONTHS, ValueKind::Float),
    ]
}

fn business_model_rules() -> Vec<DataMappingRule> {
    vec![
        rule("revenue_model", fields::REVENUE_MODEL, ValueKind::String).with_transform("lowercase"),
        rule("customer_validation", fields::CUSTOMER_VALIDATION, ValueKind::Boolean),
    ]
}

fn rules(groups: Vec<Vec<DataMappingRule>>, extra: Vec<DataMappingRule>) -> Vec<DataMappingRule> {
    groups.into_iter().flatten().chain(extra).collect()
}

fn standard_modules() -> Vec<ModuleConfiguration> {
    vec![
        ModuleConfiguration {
            id: ModuleId::TcaScorecard,
            name: "TCA Scorecard".to_string(),
            description: "Weighted category scorecard producing the 0-100 composite".to_string(),
            category: ModuleCategory::Core,
            activation: Activation::Active,
            weight: 3.0,
            priority: 10,
            data_mapping: rules(
                vec![
                    company_rules(),
                    market_rules(),
                    technology_rules(),
                    team_rules(),
                    financial_rules(),
                    business_model_rules(),
                ],
                vec![
                    rule("trade_secrets", fields::TRADE_SECRETS, ValueKind::Any).with_transform("split_list"),
                    rule("team_data.advisors", fields::ADVISORS, ValueKind::List),
                    rule("value_proposition", fields::VALUE_PROPOSITION, ValueKind::String),
                    rule("customer_segments", fields::CUSTOMER_SEGMENTS, ValueKind::Any)
                        .with_transform("split_list"),
                    rule("distribution_channels", fields::DISTRIBUTION_CHANNELS, ValueKind::Any)
                        .with_transform("split_list"),
                    rule("growth_metrics", fields::GROWTH_METRICS, ValueKind::Any),
                    rule("exit_strategy", fields::EXIT_STRATEGY, ValueKind::String),
                    rule("comparable_exits", fields::COMPARABLE_EXITS, ValueKind::Any)
                        .with_transform("split_list"),
                    rule("regulatory_status", fields::REGULATORY_STATUS, ValueKind::String),
                ],
            ),
            thresholds: vec![band("excellent", 8.5), band("good", 7.0), band("fair", 5.5)],
            settings: settings(json!({ "include_categories": true })),
            external_flow: Some(flows::TCA_SCORECARD.to_string()),
        },
        ModuleConfiguration {
            id: ModuleId::RiskAssessment,
            name: "Risk Assessment".to_string(),
            description: "Seven-domain risk scoring with flags and mitigations".to_string(),
            category: ModuleCategory::Core,
            activation: Activation::Active,
            weight: 2.5,
            priority: 9,
            data_mapping: rules(
                vec![company_rules(), market_rules(), technology_rules(), team_rules(), financial_rules()],
                vec![],
            ),
            thresholds: vec![band("low_risk", 7.0), band("moderate_risk", 5.0), band("elevated_risk", 3.0)],
            settings: settings(json!({
                "risk_domains": ["market", "technology", "team", "financial", "regulatory", "competitive", "execution"],
                "auto_mitigation": true
            })),
            external_flow: Some(flows::RISK_FLAGS.to_string()),
        },
        ModuleConfiguration {
            id: ModuleId::MarketAnalysis,
            name: "Market Analysis".to_string(),
            description: "Market size, growth potential and competitive position".to_string(),
            category: ModuleCategory::Analysis,
            activation: Activation::Active,
            weight: 2.0,
            priority: 7,
            data_mapping: rules(
                vec![company_rules(), market_rules()],
                vec![
                    rule("patents", fields::PATENTS, ValueKind::Any).with_transform("split_list"),
                    rule("team_data.founders", fields::FOUNDERS, ValueKind::List),
                    rule("customer_validation", fields::CUSTOMER_VALIDATION, ValueKind::Boolean),
                ],
            ),
            thresholds: vec![band("attractive", 8.0), band("viable", 6.0), band("limited", 4.0)],
            settings: settings(json!({
                "high_growth_industries": ["ai", "healthcare", "fintech", "cleantech"]
            })),
            external_flow: Some(flows::BENCHMARK_COMPARISON.to_string()),
        },
        ModuleConfiguration {
            id: ModuleId::TeamAssessment,
            name: "Team Assessment".to_string(),
            description: "Founder quality, team completeness and leadership".to_string(),
            category: ModuleCategory::Analysis,
            activation: Activation::Active,
            weight: 2.0,
            priority: 8,
            data_mapping: rules(
                vec![company_rules(), team_rules()],
                vec![rule("team_data.advisors", fields::ADVISORS, ValueKind::List)],
            ),
            thresholds: vec![band("strong", 8.0), band("adequate", 6.0), band("gaps", 4.0)],
            settings: settings(json!({
                "weight_distribution": {"founders": 0.4, "key_personnel": 0.3, "advisors": 0.2, "culture": 0.1}
            })),
            external_flow: Some(flows::TEAM_ASSESSMENT.to_string()),
        },
        ModuleConfiguration {
            id: ModuleId::FinancialAnalysis,
            name: "Financial Analysis".to_string(),
            description: "Runway, burn efficiency and revenue health".to_string(),
            category: ModuleCategory::Analysis,
            activation: Activation::Active,
            weight: 2.0,
            priority: 8,
            data_mapping: rules(
                vec![company_rules(), financial_rules()],
                vec![
                    rule("financial_data.expenses", fields::EXPENSES, ValueKind::Float),
                    rule("financial_data.funding_history", fields::FUNDING_HISTORY, ValueKind::List),
                ],
            ),
            thresholds: vec![band("healthy", 8.0), band("stable", 6.0), band("strained", 4.0)],
            settings: settings(json!({ "projection_periods": [12, 24, 36] })),
            external_flow: None,
        },
        ModuleConfiguration {
            id: ModuleId::TechnologyAssessment,
            name: "Technology Assessment".to_string(),
            description: "Technical maturity, IP position and development risk".to_string(),
            category: ModuleCategory::Analysis,
            activation: Activation::Active,
            weight: 1.5,
            priority: 6,
            data_mapping: rules(
                vec![company_rules(), technology_rules(), team_rules()],
                vec![rule("trade_secrets", fields::TRADE_SECRETS, ValueKind::Any).with_transform("split_list")],
            ),
            thresholds: vec![band("advanced", 8.0), band("developing", 6.0), band("early", 4.0)],
            settings: settings(json!({ "ip_types": ["patents", "trade_secrets"] })),
            external_flow: None,
        },
        ModuleConfiguration {
            id: ModuleId::BusinessModel,
            name: "Business Model".to_string(),
            description: "Revenue model viability and strategic fit".to_string(),
            category: ModuleCategory::Strategic,
            activation: Activation::Active,
            weight: 1.5,
            priority: 6,
            data_mapping: rules(
                vec![company_rules(), business_model_rules()],
                vec![
                    rule("value_proposition", fields::VALUE_PROPOSITION, ValueKind::String),
                    rule("customer_segments", fields::CUSTOMER_SEGMENTS, ValueKind::Any)
                        .with_transform("split_list"),
                    rule("distribution_channels", fields::DISTRIBUTION_CHANNELS, ValueKind::Any)
                        .with_transform("split_list"),
                ],
            ),
            thresholds: vec![band("strong_fit", 8.0), band("moderate_fit", 6.0), band("weak_fit", 4.0)],
            settings: Map::new(),
            external_flow: Some(flows::STRATEGIC_FIT.to_string()),
        },
        ModuleConfiguration {
            id: ModuleId::GrowthAssessment,
            name: "Growth Assessment".to_string(),
            description: "Growth trajectory classification and scalability".to_string(),
            category: ModuleCategory::Strategic,
            activation: Activation::Active,
            weight: 1.5,
            priority: 5,
            data_mapping: rules(
                vec![company_rules(), business_model_rules()],
                vec![
                    rule("growth_metrics", fields::GROWTH_METRICS, ValueKind::Any),
                    rule("customer_acquisition", fields::CUSTOMER_ACQUISITION, ValueKind::String),
                    rule("market_expansion", fields::MARKET_EXPANSION, ValueKind::String),
                    rule("product_roadmap", fields::PRODUCT_ROADMAP, ValueKind::String),
                    rule("financial_data.revenue", fields::REVENUE, ValueKind::Float),
                    rule("technology_stack", fields::TECHNOLOGY_STACK, ValueKind::String),
                    rule("team_size", fields::TEAM_SIZE, ValueKind::Integer),
                ],
            ),
            thresholds: vec![band("hypergrowth", 8.5), band("scaling", 6.5), band("early_growth", 4.5)],
            settings: Map::new(),
            external_flow: Some(flows::GROWTH_CLASSIFIER.to_string()),
        },
        ModuleConfiguration {
            id: ModuleId::InvestmentReadiness,
            name: "Investment Readiness".to_string(),
            description: "Gap analysis against investor expectations".to_string(),
            category: ModuleCategory::Compliance,
            activation: Activation::Active,
            weight: 2.0,
            priority: 4,
            data_mapping: rules(
                vec![company_rules()],
                vec![
                    rule("funding_requirements", fields::FUNDING_REQUIREMENTS, ValueKind::Float),
                    rule("use_of_funds", fields::USE_OF_FUNDS, ValueKind::String),
                    rule("exit_strategy", fields::EXIT_STRATEGY, ValueKind::String),
                    rule("comparable_exits", fields::COMPARABLE_EXITS, ValueKind::Any)
                        .with_transform("split_list"),
                    rule("patents", fields::PATENTS, ValueKind::Any).with_transform("split_list"),
                    rule("customer_validation", fields::CUSTOMER_VALIDATION, ValueKind::Boolean),
                    rule("team_data.founders", fields::FOUNDERS, ValueKind::List),
                    rule("financial_data.runway_months", fields::RUNWAY_MONTHS, ValueKind::Float),
                ],
            ),
            thresholds: vec![band("ready", 8.0), band("nearly_ready", 6.0), band("not_ready", 0.0)],
            settings: settings(json!({
                "readiness_criteria": [
                    "funding_requirements",
                    "use_of_funds",
                    "exit_strategy",
                    "comparable_exits",
                    "ip_protection",
                    "market_validation"
                ]
            })),
            external_flow: Some(flows::GAP_ANALYSIS.to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_all_modules_active() {
        let registry = ModuleRegistry::standard();
        assert_eq!(registry.modules().len(), ModuleId::ALL.len());
        assert_eq!(registry.active().count(), ModuleId::ALL.len());
        assert_eq!(registry.framework(), Framework::General);
        ModuleRegistry::new(registry.framework(), registry.modules().to_vec()).expect("standard validates");

        let tca = registry.get(ModuleId::TcaScorecard).expect("tca configured");
        assert_eq!(tca.weight, 3.0);
        assert_eq!(tca.external_flow.as_deref(), Some(flows::TCA_SCORECARD));
        assert!(registry
            .get(ModuleId::FinancialAnalysis)
            .is_some_and(|module| module.external_flow.is_none()));
    }

    #[test]
    fn triage_preset_disables_market_and_technology() {
        let registry = ModuleRegistry::preset("triage").expect("preset");
        assert_eq!(registry.framework(), Framework::Core);
        let active: Vec<ModuleId> = registry.active().map(|module| module.id).collect();
        assert_eq!(active.len(), 7);
        assert!(!active.contains(&ModuleId::MarketAnalysis));
        assert!(!active.contains(&ModuleId::TechnologyAssessment));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert_eq!(
            ModuleRegistry::preset("yolo"),
            Err(RegistryError::UnknownPreset("yolo".to_string()))
        );
    }

    #[test]
    fn validation_rejects_bad_configurations() {
        assert_eq!(ModuleRegistry::new(Framework::General, vec![]), Err(RegistryError::Empty));

        let mut modules = standard_modules();
        modules.push(modules[0].clone());
        assert_eq!(
            ModuleRegistry::new(Framework::General, modules),
            Err(RegistryError::DuplicateModule(ModuleId::TcaScorecard))
        );

        let error = ModuleRegistry::standard()
            .with_weight(ModuleId::GrowthAssessment, 7.5)
            .expect_err("weight above maximum");
        assert!(matches!(error, RegistryError::InvalidWeight { weight, .. } if weight == 7.5));

        let error = ModuleRegistry::standard()
            .with_weight(ModuleId::GrowthAssessment, 0.0)
            .expect_err("zero weight");
        assert!(matches!(error, RegistryError::InvalidWeight { .. }));
    }

    #[test]
    fn testing_modules_execute_but_are_not_active() {
        let registry = ModuleRegistry::standard()
            .with_activation(ModuleId::GrowthAssessment, Activation::Testing)
            .expect("known module")
            .with_activation(ModuleId::BusinessModel, Activation::Inactive)
            .expect("known module");

        let executed: Vec<ModuleId> = registry.executed().iter().map(|module| module.id).collect();
        assert!(executed.contains(&ModuleId::GrowthAssessment));
        assert!(!executed.contains(&ModuleId::BusinessModel));
        assert_eq!(executed.first(), Some(&ModuleId::TcaScorecard));
        assert!(registry.active().all(|module| module.id != ModuleId::GrowthAssessment));
    }

    #[test]
    fn loads_registry_from_json() {
        let raw = r#"{
            "framework": "medtech",
            "modules": [
                {
                    "id": "risk_assessment",
                    "name": "Risk",
                    "category": "core",
                    "weight": 2.5,
                    "external_flow": "generateRiskFlagsAndMitigation",
                    "data_mapping": [
                        {"source": "industry", "target": "company.industry", "kind": "string", "required": true, "default_value": "general"}
                    ]
                },
                {"id": "financial_analysis", "name": "Financial", "category": "analysis", "weight": 2.0, "activation": "testing"}
            ]
        }"#;

        let registry = ModuleRegistry::from_json_str(raw).expect("valid registry");
        assert_eq!(registry.framework(), Framework::Medtech);
        assert_eq!(registry.active().count(), 1);
        assert_eq!(registry.executed().len(), 2);
        assert_eq!(
            registry
                .get(ModuleId::RiskAssessment)
                .map(|module| module.data_mapping.len()),
            Some(1)
        );
    }

    #[test]
    fn loads_bare_module_list() {
        let raw = r#"[{"id": "team_assessment", "name": "Team", "category": "analysis", "weight": 2.0}]"#;
        let registry = ModuleRegistry::from_json_str(raw).expect("valid registry");
        assert_eq!(registry.framework(), Framework::General);
        assert_eq!(registry.modules().len(), 1);

        let error = ModuleRegistry::from_json_str("[]").expect_err("empty list");
        assert_eq!(error, RegistryError::Empty);
    }

    #[test]
    fn settings_are_read_from_standard_and_json_configs() {
        let registry = ModuleRegistry::standard();
        let risk = registry.get(ModuleId::RiskAssessment).expect("risk");
        assert!(risk.setting_bool("auto_mitigation", false));
        assert_eq!(risk.setting_strings("risk_domains").map(|domains| domains.len()), Some(7));
        let financial = registry.get(ModuleId::FinancialAnalysis).expect("financial");
        assert_eq!(financial.setting_numbers("projection_periods"), vec![12.0, 24.0, 36.0]);

        let raw = r#"[{
            "id": "tca_scorecard", "name": "TCA", "category": "core", "weight": 3.0,
            "settings": {"framework": "core", "include_categories": false}
        }]"#;
        let registry = ModuleRegistry::from_json_str(raw).expect("valid registry");
        let tca = registry.get(ModuleId::TcaScorecard).expect("tca");
        assert_eq!(tca.setting_str("framework"), Some("core"));
        assert!(!tca.setting_bool("include_categories", true));
        assert_eq!(tca.setting_strings("framework"), None);
        assert!(tca.setting_numbers("missing").is_empty());
    }

    #[test]
    fn bands_are_matched_from_the_top() {
        let registry = ModuleRegistry::standard();
        let tca = registry.get(ModuleId::TcaScorecard).expect("tca");
        assert_eq!(tca.band_for(9.0), Some("excellent"));
        assert_eq!(tca.band_for(7.0), Some("good"));
        assert_eq!(tca.band_for(2.0), None);
    }
}
