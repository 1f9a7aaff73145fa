//! Uploaded company documents and the record fields they contribute.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::record::RecordError;

const PITCH_FIELDS: &[&str] = &["company_name", "industry", "value_proposition", "market_size"];
const FINANCIAL_FIELDS: &[&str] = &["revenue", "expenses", "burn_rate", "runway_months"];
const TEAM_FIELDS: &[&str] = &["founders", "key_personnel", "advisors"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pitch,
    Financial,
    Team,
}

impl DocumentKind {
    /// Classifies a declared type such as `pitch_deck` or `financials.xlsx`.
    pub fn classify(declared: &str) -> Option<Self> {
        let declared = declared.to_ascii_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|needle| declared.contains(needle));
        if mentions(&["pitch", "presentation"]) {
            Some(Self::Pitch)
        } else if mentions(&["financial", "excel"]) {
            Some(Self::Financial)
        } else if mentions(&["team", "org"]) {
            Some(Self::Team)
        } else {
            None
        }
    }
}

/// One uploaded document, e.g. `{"type": "pitch_deck", "content": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDocument {
    #[serde(rename = "type")]
    pub declared_type: String,
    #[serde(default)]
    pub content: Map<String, Value>,
}

impl CompanyDocument {
    pub fn new(declared_type: impl Into<String>, content: Map<String, Value>) -> Self {
        Self {
            declared_type: declared_type.into(),
            content,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RecordError> {
        serde_json::from_str(raw).map_err(RecordError::InvalidDocument)
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::classify(&self.declared_type)
    }

    /// Record fields this document supplies, laid out the way company records
    /// are: pitch fields at the top level, financial figures under
    /// `financial_data`, people under `team_data` and `team_size` at the top.
    /// Absent and null values are never extracted.
    pub fn extracted_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self.kind() {
            Some(DocumentKind::Pitch) => fields = self.pick(PITCH_FIELDS),
            Some(DocumentKind::Financial) => {
                nest(&mut fields, "financial_data", self.pick(FINANCIAL_FIELDS));
            }
            Some(DocumentKind::Team) => {
                nest(&mut fields, "team_data", self.pick(TEAM_FIELDS));
                fields.extend(self.pick(&["team_size"]));
            }
            None => warn!(declared_type = %self.declared_type, "unrecognised document type ignored"),
        }
        fields
    }

    fn pick(&self, keys: &[&str]) -> Map<String, Value> {
        keys.iter()
            .filter_map(|key| {
                self.content
                    .get(*key)
                    .filter(|value| !value.is_null())
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }
}

fn nest(fields: &mut Map<String, Value>, key: &str, inner: Map<String, Value>) {
    if !inner.is_empty() {
        fields.insert(key.to_string(), Value::Object(inner));
    }
}
