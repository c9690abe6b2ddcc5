//! Declarative route descriptions.
//!
//! A [`Route`] is configuration data: the procedure to call, the parameters
//! it takes, how its result sets are shaped and what an empty result means.
//! [`Facade::execute`](crate::Facade::execute) is the one execution path
//! every route goes through.

use serde_json::Value as JsonValue;

use crate::aggregate::Aggregate;
use crate::params::{ParamSpec, ParameterSet};
use crate::shape::Shape;
use crate::value::Row;

pub const DB_ERROR: &str = "Error al consultar la base de datos";
pub const NO_DATA: &str = "No se encontraron datos para los parámetros especificados";

/// What a call that produced no rows turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnEmpty {
    /// 404 with this message.
    NotFound(&'static str),
    /// 200 with an empty list and this informational message.
    EmptyOk(&'static str),
}

/// Whether a summary is computed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Only when the named parameter resolved to the unfiltered sentinel
    /// (`0` or `null`).
    Unfiltered(&'static str),
}

impl Condition {
    fn holds(self, params: &ParameterSet) -> bool {
        match self {
            Condition::Unfiltered(key) => params
                .get(key)
                .is_none_or(|value| value.is_null() || value.as_i64() == Some(0)),
        }
    }
}

/// Named aggregates reported under `summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub fields: Vec<(&'static str, Aggregate)>,
    pub when: Option<Condition>,
}

impl Summary {
    pub fn new(fields: impl IntoIterator<Item = (&'static str, Aggregate)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            when: None,
        }
    }

    /// Report `summary: null` unless `condition` holds.
    pub fn when(mut self, condition: Condition) -> Self {
        self.when = Some(condition);
        self
    }

    pub(crate) fn evaluate(&self, rows: &[Row], params: &ParameterSet) -> JsonValue {
        if self.when.is_some_and(|condition| !condition.holds(params)) {
            return JsonValue::Null;
        }
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(name, aggregate)| (name.to_string(), aggregate.evaluate(rows)))
                .collect(),
        )
    }
}

/// Rejection raised from the content of an otherwise successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unauthorized(&'static str),
    NotFound(&'static str),
}

/// Inspects one column of the first row and rejects on known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub column: &'static str,
    pub rules: Vec<(&'static str, Rejection)>,
}

impl Guard {
    pub fn on(column: &'static str) -> Self {
        Self {
            column,
            rules: Vec::new(),
        }
    }

    pub fn reject(mut self, value: &'static str, rejection: Rejection) -> Self {
        self.rules.push((value, rejection));
        self
    }

    pub(crate) fn check(&self, row: &Row) -> Option<Rejection> {
        let value = row.get(self.column).key_text();
        self.rules
            .iter()
            .find(|(expected, _)| *expected == value)
            .map(|(_, rejection)| *rejection)
    }
}

/// One HTTP route expressed as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub procedure: &'static str,
    pub params: Vec<ParamSpec>,
    pub data: Shape,
    /// Result set whose row count is reported as `count`.
    pub count: Option<usize>,
    pub summary: Option<Summary>,
    /// Top-level fields next to `data`, computed over the first result set.
    pub extras: Vec<(&'static str, Aggregate)>,
    pub echo_params: bool,
    pub on_empty: OnEmpty,
    pub guard: Option<Guard>,
    pub failure: &'static str,
}

impl Route {
    /// Rows verbatim, 404 with the common message when empty.
    pub fn new(path: &'static str, procedure: &'static str) -> Self {
        Self {
            path,
            procedure,
            params: Vec::new(),
            data: Shape::Rows,
            count: None,
            summary: None,
            extras: Vec::new(),
            echo_params: false,
            on_empty: OnEmpty::NotFound(NO_DATA),
            guard: None,
            failure: DB_ERROR,
        }
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    pub fn data(mut self, shape: Shape) -> Self {
        self.data = shape;
        self
    }

    /// Report the row count of the first result set.
    pub fn counted(self) -> Self {
        self.count_set(0)
    }

    pub fn count_set(mut self, set: usize) -> Self {
        self.count = Some(set);
        self
    }

    pub fn summary(mut self, summary: Summary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn extra(mut self, name: &'static str, aggregate: Aggregate) -> Self {
        self.extras.push((name, aggregate));
        self
    }

    pub fn echo_params(mut self) -> Self {
        self.echo_params = true;
        self
    }

    pub fn not_found(mut self, message: &'static str) -> Self {
        self.on_empty = OnEmpty::NotFound(message);
        self
    }

    pub fn empty_ok(mut self, message: &'static str) -> Self {
        self.on_empty = OnEmpty::EmptyOk(message);
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn failure(mut self, message: &'static str) -> Self {
        self.failure = message;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{RawInput, resolve};
    use serde_json::json;

    #[test]
    fn conditional_summary_only_when_unfiltered() {
        let specs = [ParamSpec::int("codigoRegion", "CodigoRegion").or_zero()];
        let summary = Summary::new([("total", Aggregate::Sum("Total"))])
            .when(Condition::Unfiltered("codigoRegion"));
        let rows = vec![Row::new().with("Total", 2), Row::new().with("Total", 3)];

        let all = resolve(&specs, &RawInput::query([("codigoRegion", "0")])).unwrap();
        assert_eq!(summary.evaluate(&rows, &all), json!({ "total": 5 }));

        let one = resolve(&specs, &RawInput::query([("codigoRegion", "5")])).unwrap();
        assert_eq!(summary.evaluate(&rows, &one), JsonValue::Null);
    }

    #[test]
    fn guard_matches_exact_values() {
        let guard = Guard::on("Mensaje")
            .reject("Clave incorrecta", Rejection::Unauthorized("Clave incorrecta"))
            .reject("Usuario no encontrado", Rejection::NotFound("Usuario no encontrado"));

        let wrong = Row::new().with("Mensaje", "Clave incorrecta");
        assert_eq!(
            guard.check(&wrong),
            Some(Rejection::Unauthorized("Clave incorrecta"))
        );
        assert_eq!(guard.check(&Row::new().with("Nombre", "Ana")), None);
    }
}
