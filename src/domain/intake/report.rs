//! Structured subjective-assessment report and its parser.
//!
//! The oracle is asked for bare JSON but routinely wraps it in code fences or
//! adds a sentence around it. Parsing strips fences once, isolates the first
//! balanced JSON object and validates the fixed shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::prompts::UNKNOWN_MARKER;

/// Maximum accepted size of a raw report reply (64KB).
pub const MAX_REPORT_LENGTH: usize = 64 * 1024;

/// Key the report's narrative was stored under by earlier clients.
const LEGACY_NARRATIVE_KEY: &str = "SOAP_S_Section";

/// Terminal artifact of a completed interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub summary_of_complaints: String,
    pub symptom_timeline: String,
    pub key_risk_factors: Vec<String>,
    pub clinical_patterns: String,
    pub red_flags: Vec<String>,
    pub narrative_section: String,
}

/// Why an oracle reply could not be turned into a report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report reply is empty")]
    Empty,

    #[error("report reply too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("report reply contains no JSON object")]
    NoJsonObject,

    #[error("report JSON is malformed: {0}")]
    Malformed(String),

    #[error("report is missing required field: {0}")]
    MissingField(&'static str),

    #[error("report field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

impl StructuredReport {
    /// Parses a raw oracle reply into a report.
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        if raw.len() > MAX_REPORT_LENGTH {
            return Err(ReportError::TooLong {
                max: MAX_REPORT_LENGTH,
                actual: raw.len(),
            });
        }

        let stripped = strip_code_fences(raw);
        if stripped.is_empty() {
            return Err(ReportError::Empty);
        }

        let json = extract_json_object(&stripped).ok_or(ReportError::NoJsonObject)?;
        let value: Value =
            serde_json::from_str(json).map_err(|e| ReportError::Malformed(e.to_string()))?;

        Self::from_value(&value)
    }

    /// Validates an already-decoded JSON value against the report shape.
    pub fn from_value(value: &Value) -> Result<Self, ReportError> {
        let obj = value.as_object().ok_or(ReportError::WrongType {
            field: "report",
            expected: "a JSON object",
        })?;

        let narrative_key = if obj.contains_key("narrative_section") {
            "narrative_section"
        } else {
            LEGACY_NARRATIVE_KEY
        };

        Ok(Self {
            summary_of_complaints: text_field(obj, "summary_of_complaints")?,
            symptom_timeline: text_field(obj, "symptom_timeline")?,
            key_risk_factors: list_field(obj, "key_risk_factors")?,
            clinical_patterns: text_field(obj, "clinical_patterns")?,
            red_flags: list_field(obj, "red_flags")?,
            narrative_section: text_field_as(obj, narrative_key, "narrative_section")?,
        })
    }

    /// Returns true if the report lists any red flag.
    pub fn has_red_flags(&self) -> bool {
        !self.red_flags.is_empty()
    }
}

/// Removes markdown code-fence markers, mirroring what oracles tend to add.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Returns the first balanced `{...}` span in `s`.
fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn text_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, ReportError> {
    text_field_as(obj, field, field)
}

fn text_field_as(
    obj: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<String, ReportError> {
    match obj.get(key) {
        None => Err(ReportError::MissingField(field)),
        Some(Value::Null) => Ok(UNKNOWN_MARKER.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(UNKNOWN_MARKER.to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ReportError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn list_field(obj: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, ReportError> {
    let wrong_type = || ReportError::WrongType {
        field,
        expected: "a list of strings",
    };

    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.trim().to_string()]),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) => Some(Ok(s.trim().to_string())),
                _ => Some(Err(wrong_type())),
            })
            .collect(),
        Some(_) => Err(wrong_type()),
    }
}
