//! Wire types for the keigo analysis API.
//!
//! The API takes `{"answer": "..."}` and replies with `{"response": "..."}`,
//! where the `response` string is itself a JSON document describing the
//! analysis.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Request body sent to the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// The text entered by the user, sent as-is.
    pub answer: String,
}

/// Outer body of a 200 reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    /// JSON-encoded analysis. Absent or `null` means an empty object.
    #[serde(default)]
    pub response: Option<String>,
}

impl Envelope {
    /// The nested analysis document, defaulting to `{}`.
    pub fn payload(&self) -> &str {
        self.response.as_deref().unwrap_or("{}")
    }
}

/// Structured analysis decoded from the envelope's `response` string.
///
/// Every field is optional; the renderer substitutes placeholders for
/// whatever the API leaves out. Field values keep whatever JSON type the API
/// sent so they can be shown as they arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_validity_of_keigo: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_analysis_of_keigo: Option<FieldValue>,
    #[serde(default, deserialize_with = "object_or_default")]
    pub keigo_count: KeigoCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keigo_analysis: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<FieldValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvement_tips: Vec<FieldValue>,
}

impl AnalysisResponse {
    /// Decode the nested analysis document.
    ///
    /// Only a JSON object is accepted; serde would otherwise happily map an
    /// array onto the struct positionally.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(payload)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("analysis payload is not a JSON object"));
        }
        serde_json::from_value(value)
    }
}

/// Per-form keigo counts. Missing counts render as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeigoCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teineigo: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sonkeigo: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kenjougo: Option<FieldValue>,
}

/// A value from the analysis document, displayed the way the API sent it.
///
/// Strings print verbatim, booleans as `True`/`False`, numbers and nested
/// containers as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValue(pub Value);

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Null => f.write_str("None"),
            other => write!(f, "{}", other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue(Value::String(text.to_string()))
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        FieldValue(Value::Bool(flag))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue(Value::from(n))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `keigo_count` must be an object when present; `null` counts as absent.
fn object_or_default<'de, D>(deserializer: D) -> Result<KeigoCount, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(KeigoCount::default()),
        Some(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        Some(_) => Err(serde::de::Error::custom("keigo_count is not a JSON object")),
    }
}
