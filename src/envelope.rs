//! Response envelope shared by every route.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// `{ success, data?, count?, summary?, params?, message?, error? }`.
///
/// Failure envelopes never carry `data`. `error` is only filled in when
/// the host runs in development mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// `Some(Null)` renders `"summary": null`, `None` leaves it out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Route-specific top-level fields, e.g. `years`.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Envelope {
    pub fn success(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            summary: None,
            params: None,
            message: None,
            error: None,
            extra: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            summary: None,
            params: None,
            message: Some(message.into()),
            error: None,
            extra: Map::new(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_summary(mut self, summary: JsonValue) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_params(mut self, params: JsonValue) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying error text. Only meaningful on failures.
    pub fn with_error(mut self, detail: Option<String>) -> Self {
        if !self.success {
            self.error = detail;
        }
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}
