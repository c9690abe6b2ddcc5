//! Scalar, row and result-set model shared by the resolver, the invoker and
//! the shaper.
//!
//! Values coming back from a procedure are kept typed until the shaper turns
//! them into JSON. Temporal values serialize as UTC ISO-8601 strings with
//! millisecond precision, which is what API consumers already parse.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

const ISO_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A single column value returned by a procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view used by the aggregator. Text is not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Text used when a column value becomes an object key.
    pub fn key_text(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(v) => v.to_string(),
            Scalar::Int(v) => v.to_string(),
            Scalar::Float(v) => v.to_string(),
            Scalar::Text(v) => v.clone(),
            other => match other.to_json() {
                JsonValue::String(s) => s,
                value => value.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Scalar::Null => JsonValue::Null,
            Scalar::Bool(v) => JsonValue::Bool(*v),
            Scalar::Int(v) => JsonValue::from(*v),
            // Non-finite floats have no JSON form.
            Scalar::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Scalar::Text(v) => JsonValue::String(v.clone()),
            Scalar::Date(d) => {
                JsonValue::String(d.and_time(NaiveTime::MIN).format(ISO_MILLIS).to_string())
            }
            Scalar::Time(t) => {
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
                JsonValue::String(epoch.and_time(*t).format(ISO_MILLIS).to_string())
            }
            Scalar::DateTime(dt) => JsonValue::String(dt.format(ISO_MILLIS).to_string()),
            Scalar::DateTimeOffset(dt) => {
                JsonValue::String(dt.naive_utc().format(ISO_MILLIS).to_string())
            }
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// One row: columns in the order the procedure produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Scalar)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Looks a column up by name. Missing columns read as `Null`, matching
    /// how an absent property reads on the consumer side.
    pub fn get(&self, column: &str) -> &Scalar {
        static NULL: Scalar = Scalar::Null;
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .unwrap_or(&NULL)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns verbatim, as a JSON object.
    pub fn to_json(&self) -> JsonValue {
        let mut object = serde_json::Map::with_capacity(self.columns.len());
        for (name, value) in &self.columns {
            object.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(object)
    }
}

impl FromIterator<(String, Scalar)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// An ordered sequence of rows from one procedure result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.rows.iter().map(Row::to_json).collect())
    }
}

impl From<Vec<Row>> for ResultSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Row> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
