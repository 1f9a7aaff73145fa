use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::CompanyDocument;

/// Raw, loosely structured company attributes supplied by the caller.
///
/// The record is only ever read by the data mapper; scoring modules see the
/// typed [`CompanyProfile`](super::profile::CompanyProfile) built from the
/// mapped input instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyRecord(Map<String, Value>);

impl CompanyRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(RecordError::NotAnObject(kind_name(&other))),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Resolve a dot-separated path by walking nested objects.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.').filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(fields) => fields.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Fills fields the record lacks from uploaded documents.
    ///
    /// Values already in the record always win; null counts as missing and
    /// nested objects merge key by key. Between documents, later ones win.
    pub fn merge_documents(&mut self, documents: &[CompanyDocument]) {
        let mut extracted = Map::new();
        for document in documents {
            overlay(&mut extracted, document.extracted_fields());
        }
        fill_missing(&mut self.0, extracted);
    }
}

fn overlay(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(incoming) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => overlay(existing, incoming),
                _ => {
                    target.insert(key, Value::Object(incoming));
                }
            },
            value => {
                target.insert(key, value);
            }
        }
    }
}

fn fill_missing(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(Value::Object(existing)) => {
                if let Value::Object(incoming) = value {
                    fill_missing(existing, incoming);
                }
            }
            None | Some(Value::Null) => {
                target.insert(key, value);
            }
            Some(_) => {}
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("company record must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("company record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("company document must be an object with a `type`: {0}")]
    InvalidDocument(#[source] serde_json::Error),
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
