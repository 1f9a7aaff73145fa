//! Declarative mapping from a raw company record into per-module inputs.
//!
//! Mapping never fails: every problem is recorded as a [`ValidationIssue`]
//! and the caller decides whether partial input is good enough.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::record::{kind_name, CompanyRecord};

/// Value shape a mapping rule expects at its source path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    Any,
    String,
    Float,
    Integer,
    Boolean,
    List,
    Object,
}

impl ValueKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Object => "object",
        }
    }

    fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (Self::Any, value) => Some(value),
            (Self::String, Value::String(text)) => Some(Value::String(text)),
            (Self::String, Value::Number(number)) => Some(Value::String(number.to_string())),
            (Self::String, Value::Bool(flag)) => Some(Value::String(flag.to_string())),
            (Self::Float, value) => as_f64(&value).and_then(float_value),
            (Self::Integer, value) => as_f64(&value)
                .filter(|number| number.is_finite())
                .map(|number| Value::Number(Number::from(number.trunc() as i64))),
            (Self::Boolean, value) => as_bool(&value).map(Value::Bool),
            (Self::List, Value::Array(items)) => Some(Value::Array(items)),
            (Self::Object, Value::Object(fields)) => Some(Value::Object(fields)),
            _ => None,
        }
    }
}

/// Named, deterministic conversion applied after a value is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    ToNumber,
    ToInteger,
    ToBool,
    Lowercase,
    Trim,
    SplitList,
}

impl Transform {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "to_number" | "number" | "float" => Some(Self::ToNumber),
            "to_integer" | "integer" | "int" => Some(Self::ToInteger),
            "to_bool" | "bool" | "boolean" => Some(Self::ToBool),
            "lowercase" | "lower" => Some(Self::Lowercase),
            "trim" => Some(Self::Trim),
            "split_list" | "split" => Some(Self::SplitList),
            _ => None,
        }
    }

    fn apply(self, value: Value) -> Option<Value> {
        match self {
            Self::ToNumber => ValueKind::Float.coerce(value),
            Self::ToInteger => ValueKind::Integer.coerce(value),
            Self::ToBool => ValueKind::Boolean.coerce(value),
            Self::Lowercase => match value {
                Value::String(text) => Some(Value::String(text.to_lowercase())),
                other => Some(other),
            },
            Self::Trim => match value {
                Value::String(text) => Some(Value::String(text.trim().to_string())),
                other => Some(other),
            },
            Self::SplitList => match value {
                Value::String(text) => Some(Value::Array(
                    text.split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(|item| Value::String(item.to_string()))
                        .collect(),
                )),
                Value::Array(items) => Some(Value::Array(items)),
                _ => None,
            },
        }
    }
}

/// One declarative rule: where to read, where to write, and how to treat gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMappingRule {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: ValueKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

impl DataMappingRule {
    pub fn new(source: &str, target: &str, kind: ValueKind) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            required: false,
            default_value: None,
            transform: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_transform(mut self, name: &str) -> Self {
        self.transform = Some(name.to_string());
        self
    }
}

/// Non-fatal problem found while mapping a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingRequired {
        target: String,
    },
    TypeMismatch {
        target: String,
        expected: String,
        found: String,
    },
    UnknownTransform {
        target: String,
        transform: String,
    },
    TransformFailed {
        target: String,
        transform: String,
    },
}

impl ValidationIssue {
    pub fn target(&self) -> &str {
        match self {
            Self::MissingRequired { target }
            | Self::TypeMismatch { target, .. }
            | Self::UnknownTransform { target, .. }
            | Self::TransformFailed { target, .. } => target,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { target } => {
                write!(f, "missing required field {target} with no default")
            }
            Self::TypeMismatch {
                target,
                expected,
                found,
            } => write!(f, "{target}: expected {expected}, found {found}"),
            Self::UnknownTransform { target, transform } => {
                write!(f, "{target}: unknown transform '{transform}'")
            }
            Self::TransformFailed { target, transform } => {
                write!(f, "{target}: transform '{transform}' could not convert value")
            }
        }
    }
}

/// Mapped fields keyed by target path, already coerced to their declared kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleInput {
    fields: BTreeMap<String, Value>,
}

impl ModuleInput {
    pub fn get(&self, target: &str) -> Option<&Value> {
        self.fields.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.fields.contains_key(target)
    }

    pub fn text(&self, target: &str) -> Option<String> {
        match self.get(target)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn number(&self, target: &str) -> Option<f64> {
        self.get(target).and_then(as_f64)
    }

    pub fn flag(&self, target: &str) -> Option<bool> {
        self.get(target).and_then(as_bool)
    }

    pub fn list(&self, target: &str) -> &[Value] {
        match self.get(target) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn insert(&mut self, target: &str, value: Value) {
        self.fields.insert(target.to_string(), value);
    }
}

impl FromIterator<(String, Value)> for ModuleInput {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Result of mapping one record against one rule set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingOutcome {
    pub input: ModuleInput,
    pub issues: Vec<ValidationIssue>,
}

pub struct DataMapper;

impl DataMapper {
    pub fn map(record: &CompanyRecord, rules: &[DataMappingRule]) -> MappingOutcome {
        let mut outcome = MappingOutcome::default();

        for rule in rules {
            let resolved = record
                .lookup(&rule.source)
                .filter(|value| !is_empty(value))
                .cloned()
                .and_then(|value| convert(rule, value, &mut outcome.issues));

            match resolved {
                Some(value) => outcome.input.insert(&rule.target, value),
                None if rule.required => match &rule.default_value {
                    Some(default) => outcome.input.insert(&rule.target, default.clone()),
                    None => outcome.issues.push(ValidationIssue::MissingRequired {
                        target: rule.target.clone(),
                    }),
                },
                None => {}
            }
        }

        outcome
    }
}

fn convert(rule: &DataMappingRule, value: Value, issues: &mut Vec<ValidationIssue>) -> Option<Value> {
    let found = kind_name(&value);
    let value = match rule.kind.coerce(value) {
        Some(value) => value,
        None => {
            issues.push(ValidationIssue::TypeMismatch {
                target: rule.target.clone(),
                expected: rule.kind.label().to_string(),
                found: found.to_string(),
            });
            return None;
        }
    };

    let Some(name) = rule.transform.as_deref() else {
        return Some(value);
    };

    let Some(transform) = Transform::from_name(name) else {
        issues.push(ValidationIssue::UnknownTransform {
            target: rule.target.clone(),
            transform: name.to_string(),
        });
        return Some(value);
    };

    match transform.apply(value).filter(|value| !is_empty(value)) {
        Some(value) => Some(value),
        None => {
            issues.push(ValidationIssue::TransformFailed {
                target: rule.target.clone(),
                transform: name.to_string(),
            });
            None
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '_'))
                .collect();
            cleaned.parse::<f64>().ok().filter(|number| number.is_finite())
        }
        _ => None,
    }
}

pub(crate) fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn float_value(number: f64) -> Option<Value> {
    Number::from_f64(number).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> CompanyRecord {
        CompanyRecord::from_value(value).expect("object record")
    }

    #[test]
    fn maps_nested_sources_to_targets() {
        let rules = vec![
            DataMappingRule::new("financial_data.runway_months", "financials.runway", ValueKind::Integer),
            DataMappingRule::new("company_name", "company.name", ValueKind::String),
        ];
        let outcome = DataMapper::map(
            &record(json!({"company_name": "Acme", "financial_data": {"runway_months": "14"}})),
            &rules,
        );

        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.input.number("financials.runway"), Some(14.0));
        assert_eq!(outcome.input.text("company.name").as_deref(), Some("Acme"));
    }

    #[test]
    fn required_fields_fall_back_to_defaults() {
        let rules = vec![DataMappingRule::new("funding_stage", "company.stage", ValueKind::String)
            .required()
            .with_default(json!("seed"))];
        let outcome = DataMapper::map(&record(json!({"funding_stage": "  "})), &rules);

        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.input.text("company.stage").as_deref(), Some("seed"));
    }

    #[test]
    fn missing_required_without_default_is_recorded_and_processing_continues() {
        let rules = vec![
            DataMappingRule::new("industry", "company.industry", ValueKind::String).required(),
            DataMappingRule::new("team_size", "team.size", ValueKind::Integer),
        ];
        let outcome = DataMapper::map(&record(json!({"team_size": 4})), &rules);

        assert_eq!(
            outcome.issues,
            vec![ValidationIssue::MissingRequired {
                target: "company.industry".to_string()
            }]
        );
        assert_eq!(outcome.input.number("team.size"), Some(4.0));
    }

    #[test]
    fn optional_missing_fields_are_omitted() {
        let rules = vec![DataMappingRule::new("patents", "ip.patents", ValueKind::List)];
        let outcome = DataMapper::map(&record(json!({"patents": []})), &rules);

        assert!(outcome.issues.is_empty());
        assert!(!outcome.input.contains("ip.patents"));
    }

    #[test]
    fn unknown_transform_is_an_issue_not_a_crash() {
        let rules = vec![DataMappingRule::new("industry", "company.industry", ValueKind::String)
            .with_transform("reverse_words")];
        let outcome = DataMapper::map(&record(json!({"industry": "FinTech"})), &rules);

        assert!(matches!(
            outcome.issues.as_slice(),
            [ValidationIssue::UnknownTransform { transform, .. }] if transform == "reverse_words"
        ));
        assert_eq!(outcome.input.text("company.industry").as_deref(), Some("FinTech"));
    }

    #[test]
    fn transforms_are_applied() {
        let rules = vec![
            DataMappingRule::new("industry", "company.industry", ValueKind::String)
                .with_transform("lowercase"),
            DataMappingRule::new("segments", "business_model.customer_segments", ValueKind::Any)
                .with_transform("split_list"),
            DataMappingRule::new("market_size", "market.size", ValueKind::Any)
                .with_transform("to_number"),
        ];
        let outcome = DataMapper::map(
            &record(json!({
                "industry": "HealthCare AI",
                "segments": "hospitals, clinics,,",
                "market_size": "$2,500,000,000"
            })),
            &rules,
        );

        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.input.text("company.industry").as_deref(), Some("healthcare ai"));
        assert_eq!(outcome.input.list("business_model.customer_segments").len(), 2);
        assert_eq!(outcome.input.number("market.size"), Some(2_500_000_000.0));
    }

    #[test]
    fn uncoercible_values_are_type_mismatches() {
        let rules = vec![
            DataMappingRule::new("team_size", "team.size", ValueKind::Integer)
                .required()
                .with_default(json!(1)),
        ];
        let outcome = DataMapper::map(&record(json!({"team_size": "a handful"})), &rules);

        assert!(matches!(
            outcome.issues.as_slice(),
            [ValidationIssue::TypeMismatch { expected, found, .. }]
                if expected == "integer" && found == "string"
        ));
        assert_eq!(outcome.input.number("team.size"), Some(1.0));
    }
}
