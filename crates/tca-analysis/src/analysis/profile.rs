use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mapper::ModuleInput;

/// Canonical target paths written by mapping rules and read by [`CompanyProfile`].
pub mod fields {
    pub const COMPANY_NAME: &str = "company.name";
    pub const INDUSTRY: &str = "company.industry";
    pub const STAGE: &str = "company.stage";
    pub const REGULATORY_STATUS: &str = "compliance.regulatory_status";

    pub const MARKET_SIZE: &str = "market.size";
    pub const COMPETITIVE_INTENSITY: &str = "market.competitive_intensity";
    pub const COMPETITORS: &str = "market.competitors";
    pub const TARGET_MARKET: &str = "market.target";

    pub const DEVELOPMENT_STAGE: &str = "technology.development_stage";
    pub const TECHNOLOGY_STACK: &str = "technology.stack";
    pub const PATENTS: &str = "ip.patents";
    pub const TRADE_SECRETS: &str = "ip.trade_secrets";

    pub const TEAM_SIZE: &str = "team.size";
    pub const FOUNDERS: &str = "team.founders";
    pub const KEY_PERSONNEL: &str = "team.key_personnel";
    pub const ADVISORS: &str = "team.advisors";

    pub const REVENUE: &str = "financials.revenue";
    pub const EXPENSES: &str = "financials.expenses";
    pub const BURN_RATE: &str = "financials.burn_rate";
    pub const RUNWAY_MONTHS: &str = "financials.runway";
    pub const FUNDING_HISTORY: &str = "financials.funding_history";

    pub const REVENUE_MODEL: &str = "business_model.revenue_model";
    pub const VALUE_PROPOSITION: &str = "business_model.value_proposition";
    pub const CUSTOMER_SEGMENTS: &str = "business_model.customer_segments";
    pub const DISTRIBUTION_CHANNELS: &str = "business_model.channels";
    pub const CUSTOMER_VALIDATION: &str = "business_model.customer_validation";

    pub const GROWTH_METRICS: &str = "growth.metrics";
    pub const CUSTOMER_ACQUISITION: &str = "growth.customer_acquisition";
    pub const MARKET_EXPANSION: &str = "growth.market_expansion";
    pub const PRODUCT_ROADMAP: &str = "growth.product_roadmap";

    pub const FUNDING_REQUIREMENTS: &str = "investment.funding_requirements";
    pub const USE_OF_FUNDS: &str = "investment.use_of_funds";
    pub const EXIT_STRATEGY: &str = "investment.exit_strategy";
    pub const COMPARABLE_EXITS: &str = "investment.comparable_exits";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    /// Records without a development stage are scored as concept-stage companies.
    #[default]
    Concept,
    Prototype,
    Mvp,
    Beta,
    Production,
    Unrecognized,
}

impl DevelopmentStage {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "concept" | "idea" => Self::Concept,
            "prototype" => Self::Prototype,
            "mvp" => Self::Mvp,
            "beta" => Self::Beta,
            "production" | "launched" | "ga" => Self::Production,
            _ => Self::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitiveIntensity {
    Low,
    #[default]
    Medium,
    High,
    Unrecognized,
}

impl CompetitiveIntensity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" | "moderate" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Person {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self {
                name: Some(name.clone()),
                ..Self::default()
            }),
            Value::Object(fields) => {
                let text = |key: &str| {
                    fields
                        .get(key)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .filter(|text| !text.trim().is_empty())
                };
                Some(Self {
                    name: text("name"),
                    role: text("role").or_else(|| text("title")),
                    background: text("background").or_else(|| text("experience")),
                })
            }
            _ => None,
        }
    }

    pub fn background_mentions(&self, needles: &[&str]) -> bool {
        self.background
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|background| needles.iter().any(|needle| background.contains(needle)))
    }

    pub fn role_mentions(&self, needles: &[&str]) -> bool {
        self.role
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|role| needles.iter().any(|needle| role.contains(needle)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketProfile {
    pub size: Option<f64>,
    pub competitive_intensity: CompetitiveIntensity,
    pub competitors: Vec<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnologyProfile {
    pub development_stage: DevelopmentStage,
    pub stack: Option<String>,
    pub patents: Vec<String>,
    pub trade_secrets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub size: Option<u32>,
    pub founders: Vec<Person>,
    pub key_personnel: Vec<Person>,
    pub advisors: Vec<Person>,
}

impl TeamProfile {
    pub fn members(&self) -> impl Iterator<Item = &Person> {
        self.founders.iter().chain(self.key_personnel.iter())
    }

    pub fn headcount(&self) -> u32 {
        self.size.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub revenue: Option<f64>,
    pub expenses: Option<f64>,
    pub burn_rate: Option<f64>,
    pub runway_months: Option<f64>,
    pub funding_rounds: usize,
}

impl FinancialProfile {
    pub fn has_figures(&self) -> bool {
        self.revenue.is_some() || self.burn_rate.is_some() || self.runway_months.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessModelProfile {
    pub revenue_model: Option<String>,
    pub value_proposition: Option<String>,
    pub customer_segments: Vec<String>,
    pub channels: Vec<String>,
    pub customer_validation: bool,
}

impl BusinessModelProfile {
    pub fn is_recurring(&self) -> bool {
        self.revenue_model.as_deref().is_some_and(|model| {
            let model = model.to_lowercase();
            ["subscription", "saas", "marketplace"]
                .iter()
                .any(|needle| model.contains(needle))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthProfile {
    pub has_metrics: bool,
    pub customer_acquisition: Option<String>,
    pub market_expansion: Option<String>,
    pub product_roadmap: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentProfile {
    pub funding_requirements: Option<f64>,
    pub use_of_funds: Option<String>,
    pub exit_strategy: Option<String>,
    pub comparable_exits: Vec<String>,
}

/// Typed view of a company assembled from one module's mapped input.
///
/// Every field is optional or defaulted; a module only sees the attributes
/// its own mapping rules produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub stage: Option<String>,
    pub regulatory_status: Option<String>,
    pub market: MarketProfile,
    pub technology: TechnologyProfile,
    pub team: TeamProfile,
    pub financials: FinancialProfile,
    pub business_model: BusinessModelProfile,
    pub growth: GrowthProfile,
    pub investment: InvestmentProfile,
}

impl CompanyProfile {
    pub fn from_input(input: &ModuleInput) -> Self {
        Self {
            name: input.text(fields::COMPANY_NAME),
            industry: input.text(fields::INDUSTRY).map(|industry| industry.to_lowercase()),
            stage: input.text(fields::STAGE),
            regulatory_status: input.text(fields::REGULATORY_STATUS),
            market: MarketProfile {
                size: input.number(fields::MARKET_SIZE),
                competitive_intensity: input
                    .text(fields::COMPETITIVE_INTENSITY)
                    .map(|raw| CompetitiveIntensity::parse(&raw))
                    .unwrap_or_default(),
                competitors: strings(input.list(fields::COMPETITORS)),
                target: input.text(fields::TARGET_MARKET),
            },
            technology: TechnologyProfile {
                development_stage: input
                    .text(fields::DEVELOPMENT_STAGE)
                    .map(|raw| DevelopmentStage::parse(&raw))
                    .unwrap_or_default(),
                stack: input.text(fields::TECHNOLOGY_STACK),
                patents: strings(input.list(fields::PATENTS)),
                trade_secrets: strings(input.list(fields::TRADE_SECRETS)),
            },
            team: TeamProfile {
                size: input
                    .number(fields::TEAM_SIZE)
                    .filter(|size| *size >= 0.0)
                    .map(|size| size as u32),
                founders: people(input.list(fields::FOUNDERS)),
                key_personnel: people(input.list(fields::KEY_PERSONNEL)),
                advisors: people(input.list(fields::ADVISORS)),
            },
            financials: FinancialProfile {
                revenue: input.number(fields::REVENUE),
                expenses: input.number(fields::EXPENSES),
                burn_rate: input.number(fields::BURN_RATE),
                runway_months: input.number(fields::RUNWAY_MONTHS),
                funding_rounds: input.list(fields::FUNDING_HISTORY).len(),
            },
            business_model: BusinessModelProfile {
                revenue_model: input.text(fields::REVENUE_MODEL),
                value_proposition: input.text(fields::VALUE_PROPOSITION),
                customer_segments: strings(input.list(fields::CUSTOMER_SEGMENTS)),
                channels: strings(input.list(fields::DISTRIBUTION_CHANNELS)),
                customer_validation: input.flag(fields::CUSTOMER_VALIDATION).unwrap_or(false),
            },
            growth: GrowthProfile {
                has_metrics: input.contains(fields::GROWTH_METRICS),
                customer_acquisition: input.text(fields::CUSTOMER_ACQUISITION),
                market_expansion: input.text(fields::MARKET_EXPANSION),
                product_roadmap: input.text(fields::PRODUCT_ROADMAP),
            },
            investment: InvestmentProfile {
                funding_requirements: input.number(fields::FUNDING_REQUIREMENTS),
                use_of_funds: input.text(fields::USE_OF_FUNDS),
                exit_strategy: input.text(fields::EXIT_STRATEGY),
                comparable_exits: strings(input.list(fields::COMPARABLE_EXITS)),
            },
        }
    }

    pub fn industry_matches(&self, needles: &[&str]) -> bool {
        self.industry
            .as_deref()
            .is_some_and(|industry| needles.iter().any(|needle| industry.contains(needle)))
    }
}

fn strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Object(fields) => fields
                .get("name")
                .or_else(|| fields.get("title"))
                .and_then(Value::as_str)
                .map(str::to_string),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

fn people(items: &[Value]) -> Vec<Person> {
    items.iter().filter_map(Person::from_value).collect()
}
