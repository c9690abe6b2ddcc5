//! Parameter Resolver.
//!
//! Turns the raw inbound map (query string or JSON body) into a typed
//! [`ParameterSet`] following a per-route list of [`ParamSpec`]s. Defaulting
//! and strictness are declared per parameter so that routes which silently
//! fall back and routes which reject bad input can live side by side.
//!
//! Resolution runs in two passes: every required parameter is checked for
//! presence first, then each value is coerced. A parameter counts as absent
//! when it is missing, `null`, an empty string, or (in a JSON body) `0` or
//! `false`.

use std::collections::HashMap;

use chrono::Datelike;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Raised before any invocation when inbound parameters are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Inbound name of the offending parameter.
    pub param: &'static str,
    /// Client-facing message.
    pub message: String,
}

impl ValidationError {
    pub fn new(param: &'static str, message: impl Into<String>) -> Self {
        Self {
            param,
            message: message.into(),
        }
    }
}

/// Remote type a parameter is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// 32-bit `INT`.
    Int,
    /// 64-bit `BIGINT`.
    BigInt,
    /// `NVARCHAR(max_len)`.
    Text { max_len: usize },
}

/// What an absent (or leniently invalid) optional parameter resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Bound as `NULL`. A parsed zero also collapses to `NULL`: both mean
    /// "no filter".
    Null,
    /// Bound as `0`, the other spelling of "no filter".
    Zero,
    /// Bound as the current calendar year.
    CurrentYear,
    /// Not bound at all, leaving the procedure's own default in force.
    Omit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required(&'static str),
    Optional(Fallback),
}

/// How a present value that fails coercion is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnInvalid {
    /// 400 with this message.
    Reject(&'static str),
    /// Treated as absent.
    Fallback,
}

/// Declaration of one expected parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    key: &'static str,
    bind: &'static str,
    echo: &'static str,
    ty: ParamType,
    requirement: Requirement,
    on_invalid: OnInvalid,
    numbers_only: bool,
}

impl ParamSpec {
    fn new(key: &'static str, bind: &'static str, ty: ParamType) -> Self {
        Self {
            key,
            bind,
            echo: key,
            ty,
            requirement: Requirement::Optional(Fallback::Null),
            on_invalid: OnInvalid::Fallback,
            numbers_only: false,
        }
    }

    /// `INT` parameter read from `key` and bound as `@bind`.
    pub fn int(key: &'static str, bind: &'static str) -> Self {
        Self::new(key, bind, ParamType::Int)
    }

    /// `BIGINT` parameter read from `key` and bound as `@bind`.
    pub fn bigint(key: &'static str, bind: &'static str) -> Self {
        Self::new(key, bind, ParamType::BigInt)
    }

    /// `NVARCHAR(max_len)` parameter read from `key` and bound as `@bind`.
    pub fn text(key: &'static str, bind: &'static str, max_len: usize) -> Self {
        Self::new(key, bind, ParamType::Text { max_len })
    }

    pub fn required(mut self, message: &'static str) -> Self {
        self.requirement = Requirement::Required(message);
        self
    }

    pub fn or_null(mut self) -> Self {
        self.requirement = Requirement::Optional(Fallback::Null);
        self
    }

    pub fn or_zero(mut self) -> Self {
        self.requirement = Requirement::Optional(Fallback::Zero);
        self
    }

    pub fn or_current_year(mut self) -> Self {
        self.requirement = Requirement::Optional(Fallback::CurrentYear);
        self
    }

    pub fn or_omit(mut self) -> Self {
        self.requirement = Requirement::Optional(Fallback::Omit);
        self
    }

    /// Reject present-but-invalid values with `message`.
    pub fn strict(mut self, message: &'static str) -> Self {
        self.on_invalid = OnInvalid::Reject(message);
        self
    }

    /// Numeric body fields must arrive as JSON numbers, not numeric strings.
    pub fn numbers_only(mut self) -> Self {
        self.numbers_only = true;
        self
    }

    /// Name under which the resolved value is echoed back in `params`.
    pub fn echo_as(mut self, name: &'static str) -> Self {
        self.echo = name;
        self
    }

}

/// Typed value ready to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(Option<i32>),
    BigInt(Option<i64>),
    Text {
        value: Option<String>,
        max_len: usize,
    },
}

impl SqlValue {
    fn null_of(ty: ParamType) -> Self {
        match ty {
            ParamType::Int => SqlValue::Int(None),
            ParamType::BigInt => SqlValue::BigInt(None),
            ParamType::Text { max_len } => SqlValue::Text {
                value: None,
                max_len,
            },
        }
    }

    fn number_of(ty: ParamType, value: i64) -> Option<Self> {
        match ty {
            ParamType::Int => i32::try_from(value).ok().map(|v| SqlValue::Int(Some(v))),
            ParamType::BigInt => Some(SqlValue::BigInt(Some(value))),
            ParamType::Text { max_len } => Some(SqlValue::Text {
                value: Some(value.to_string()),
                max_len,
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            SqlValue::Int(None) | SqlValue::BigInt(None) | SqlValue::Text { value: None, .. }
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => v.map(i64::from),
            SqlValue::BigInt(v) => *v,
            SqlValue::Text { .. } => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Int(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
            SqlValue::BigInt(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
            SqlValue::Text { value, .. } => value
                .as_ref()
                .map(|s| JsonValue::String(s.clone()))
                .unwrap_or(JsonValue::Null),
        }
    }
}

/// One parameter to bind on the procedure call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    pub name: &'static str,
    pub value: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    key: &'static str,
    echo: &'static str,
    bind: &'static str,
    value: SqlValue,
    omitted: bool,
}

/// Ordered, typed parameters for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: Vec<Resolved>,
}

impl ParameterSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parameters to bind, in declaration order. Omitted ones are skipped.
    pub fn bound(&self) -> Vec<BoundParam> {
        self.values
            .iter()
            .filter(|r| !r.omitted)
            .map(|r| BoundParam {
                name: r.bind,
                value: r.value.clone(),
            })
            .collect()
    }

    /// Resolved value by inbound key.
    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.values.iter().find(|r| r.key == key).map(|r| &r.value)
    }

    /// Resolved values keyed by echo name, for the `params` envelope field.
    pub fn echo(&self) -> JsonValue {
        let mut object = serde_json::Map::new();
        for resolved in &self.values {
            object.insert(resolved.echo.to_string(), resolved.value.to_json());
        }
        JsonValue::Object(object)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Inbound parameters as received.
#[derive(Debug, Clone)]
pub enum RawInput {
    Query(HashMap<String, String>),
    Body(serde_json::Map<String, JsonValue>),
}

impl Default for RawInput {
    fn default() -> Self {
        RawInput::Query(HashMap::new())
    }
}

impl RawInput {
    pub fn query<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RawInput::Query(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn body(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => RawInput::Body(map),
            _ => RawInput::Body(serde_json::Map::new()),
        }
    }

    fn lookup(&self, key: &str) -> Option<Raw<'_>> {
        match self {
            RawInput::Query(map) => map.get(key).map(|s| Raw::Text(s.as_str())),
            RawInput::Body(map) => map.get(key).map(Raw::Json),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Raw<'a> {
    Text(&'a str),
    Json(&'a JsonValue),
}

impl Raw<'_> {
    fn is_blank(&self) -> bool {
        match self {
            Raw::Text(s) => s.is_empty(),
            Raw::Json(JsonValue::Null) => true,
            Raw::Json(JsonValue::String(s)) => s.is_empty(),
            Raw::Json(JsonValue::Bool(b)) => !b,
            Raw::Json(JsonValue::Number(n)) => n.as_f64() == Some(0.0),
            Raw::Json(_) => false,
        }
    }
}

enum Coerced {
    Value(SqlValue),
    Invalid,
}

/// Resolve `input` against `specs`.
pub fn resolve(specs: &[ParamSpec], input: &RawInput) -> Result<ParameterSet, ValidationError> {
    for spec in specs {
        if let Requirement::Required(message) = spec.requirement {
            let present = input.lookup(spec.key).is_some_and(|raw| !raw.is_blank());
            if !present {
                return Err(ValidationError::new(spec.key, message));
            }
        }
    }

    let mut values = Vec::with_capacity(specs.len());
    for spec in specs {
        values.push(resolve_one(spec, input.lookup(spec.key))?);
    }
    Ok(ParameterSet { values })
}

fn resolve_one(spec: &ParamSpec, raw: Option<Raw<'_>>) -> Result<Resolved, ValidationError> {
    let raw = raw.filter(|r| !r.is_blank());

    let coerced = match raw {
        Some(raw) => Some(coerce(spec, raw)?),
        None => None,
    };

    let value = match coerced {
        Some(Coerced::Value(value)) => Some(value),
        Some(Coerced::Invalid) => match (spec.on_invalid, spec.requirement) {
            (OnInvalid::Reject(message), _) => {
                return Err(ValidationError::new(spec.key, message));
            }
            // An unusable required value is no value at all.
            (OnInvalid::Fallback, Requirement::Required(message)) => {
                return Err(ValidationError::new(spec.key, message));
            }
            (OnInvalid::Fallback, Requirement::Optional(_)) => None,
        },
        None => None,
    };

    let fallback = match spec.requirement {
        Requirement::Optional(fallback) => fallback,
        // Presence was checked in the first pass.
        Requirement::Required(message) => {
            return value
                .map(|value| Resolved {
                    key: spec.key,
                    echo: spec.echo,
                    bind: spec.bind,
                    value,
                    omitted: false,
                })
                .ok_or_else(|| ValidationError::new(spec.key, message));
        }
    };

    let (value, omitted) = match value {
        Some(value) if fallback == Fallback::Null && value.as_i64() == Some(0) => {
            (SqlValue::null_of(spec.ty), false)
        }
        Some(value) => (value, false),
        None => match fallback {
            Fallback::Null => (SqlValue::null_of(spec.ty), false),
            Fallback::Omit => (SqlValue::null_of(spec.ty), true),
            Fallback::Zero => (zero_or_null(spec.ty), false),
            Fallback::CurrentYear => (
                SqlValue::number_of(spec.ty, i64::from(chrono::Local::now().year()))
                    .unwrap_or_else(|| SqlValue::null_of(spec.ty)),
                false,
            ),
        },
    };

    Ok(Resolved {
        key: spec.key,
        echo: spec.echo,
        bind: spec.bind,
        value,
        omitted,
    })
}

/// Whole JSON numbers written as floats (`2024.0`). Fractions and values
/// outside the `i64` range are not numbers for binding purposes.
fn integral(f: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn zero_or_null(ty: ParamType) -> SqlValue {
    SqlValue::number_of(ty, 0).unwrap_or_else(|| SqlValue::null_of(ty))
}

fn coerce(spec: &ParamSpec, raw: Raw<'_>) -> Result<Coerced, ValidationError> {
    match spec.ty {
        ParamType::Int | ParamType::BigInt => {
            let parsed = match raw {
                Raw::Text(s) => parse_leading_int(s),
                Raw::Json(JsonValue::Number(n)) => {
                    n.as_i64().or_else(|| n.as_f64().and_then(integral))
                }
                Raw::Json(JsonValue::String(s)) if !spec.numbers_only => parse_leading_int(s),
                Raw::Json(_) => None,
            };
            Ok(parsed
                .and_then(|n| SqlValue::number_of(spec.ty, n))
                .map(Coerced::Value)
                .unwrap_or(Coerced::Invalid))
        }
        ParamType::Text { max_len } => {
            let text = match raw {
                Raw::Text(s) => Some(s.to_string()),
                Raw::Json(JsonValue::String(s)) => Some(s.clone()),
                Raw::Json(JsonValue::Number(n)) if spec.on_invalid == OnInvalid::Fallback => {
                    Some(n.to_string())
                }
                Raw::Json(_) => None,
            };
            match text {
                Some(text) if text.chars().count() > max_len => Err(ValidationError::new(
                    spec.key,
                    format!(
                        "El parámetro \"{}\" no puede exceder {} caracteres.",
                        spec.key, max_len
                    ),
                )),
                Some(text) => Ok(Coerced::Value(SqlValue::Text {
                    value: Some(text),
                    max_len,
                })),
                None => Ok(Coerced::Invalid),
            }
        }
    }
}

/// Leading-integer parse: optional whitespace and sign, then digits up to
/// the first non-digit. `"12abc"` is 12; `"abc"` has no value.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
