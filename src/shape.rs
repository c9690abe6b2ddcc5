//! Result Shaper.
//!
//! A [`Shape`] is a declarative description of how the result sets of one
//! procedure call become the `data` payload: which columns are renamed to
//! which fields, whether the route promises a list or a single object,
//! which positional result set feeds which named slot, and how flat rows
//! are grouped.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::aggregate::{Aggregate, Precision, percentage, sum};
use crate::value::{ResultSet, Row};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("procedure returned {returned} result sets, result set {wanted} was expected")]
    MissingResultSet { wanted: usize, returned: usize },
}

/// `column` of the source row exposed as `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub column: &'static str,
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }

    fn read(&self, row: &Row) -> JsonValue {
        row.get(self.column).to_json()
    }
}

fn fields(pairs: &[(&'static str, &'static str)]) -> Vec<Field> {
    pairs
        .iter()
        .map(|(name, column)| Field::new(name, column))
        .collect()
}

fn project(row: &Row, fields: &[Field]) -> JsonValue {
    JsonValue::Object(
        fields
            .iter()
            .map(|field| (field.name.to_string(), field.read(row)))
            .collect(),
    )
}

/// Map inside each group: `key` column → `value` column, last write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nested {
    pub name: &'static str,
    pub key: &'static str,
    pub value: &'static str,
}

/// Ratio computed from two summed fields of a rollup group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRatio {
    pub name: &'static str,
    pub part: &'static str,
    pub total: &'static str,
    pub precision: Precision,
}

/// A named slot of an object payload, fed by a positional result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: &'static str,
    pub set: usize,
    pub shape: Shape,
}

impl Member {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, set: 0, shape }
    }

    /// Read from the `set`-th result set instead of the first one.
    pub fn from_set(mut self, set: usize) -> Self {
        self.set = set;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Every row verbatim, as a list.
    Rows,
    /// The first row verbatim, as an object.
    FirstRow,
    /// Every row projected onto `fields`, as a list.
    Each(Vec<Field>),
    /// The first row projected onto `fields`, as an object.
    First(Vec<Field>),
    /// Rows grouped by `key` into an object keyed by the key's value. The
    /// first row of a group supplies `fields`; later rows only merge into
    /// the `nested` maps.
    GroupBy {
        key: &'static str,
        fields: Vec<Field>,
        nested: Vec<Nested>,
    },
    /// Rows grouped by `key` into a list of `{label, Σ sums..., ratio}`,
    /// groups in first-occurrence order.
    Rollup {
        key: &'static str,
        label: &'static str,
        sums: Vec<Field>,
        ratio: Option<GroupRatio>,
    },
    /// A single summary value.
    Aggregate(Aggregate),
    /// An object of named slots.
    Object(Vec<Member>),
}

impl Shape {
    pub fn each(pairs: &[(&'static str, &'static str)]) -> Self {
        Shape::Each(fields(pairs))
    }

    pub fn first(pairs: &[(&'static str, &'static str)]) -> Self {
        Shape::First(fields(pairs))
    }

    pub fn column(column: &'static str) -> Self {
        Shape::Aggregate(Aggregate::First(column))
    }

    pub fn object(members: impl IntoIterator<Item = Member>) -> Self {
        Shape::Object(members.into_iter().collect())
    }

    /// Render the payload from the result sets of one call.
    pub fn render(&self, sets: &[ResultSet]) -> Result<JsonValue, ShapeError> {
        self.render_from(sets, 0)
    }

    fn render_from(&self, sets: &[ResultSet], set: usize) -> Result<JsonValue, ShapeError> {
        if let Shape::Object(members) = self {
            let mut object = Map::with_capacity(members.len());
            for member in members {
                object.insert(
                    member.name.to_string(),
                    member.shape.render_from(sets, member.set)?,
                );
            }
            return Ok(JsonValue::Object(object));
        }

        let rows = sets
            .get(set)
            .map(ResultSet::rows)
            .ok_or(ShapeError::MissingResultSet {
                wanted: set,
                returned: sets.len(),
            })?;
        Ok(self.render_rows(rows))
    }

    fn render_rows(&self, rows: &[Row]) -> JsonValue {
        match self {
            Shape::Rows => JsonValue::Array(rows.iter().map(Row::to_json).collect()),
            Shape::FirstRow => rows.first().map(Row::to_json).unwrap_or(JsonValue::Null),
            Shape::Each(fields) => {
                JsonValue::Array(rows.iter().map(|row| project(row, fields)).collect())
            }
            Shape::First(fields) => rows
                .first()
                .map(|row| project(row, fields))
                .unwrap_or(JsonValue::Null),
            Shape::GroupBy {
                key,
                fields,
                nested,
            } => group_by(rows, key, fields, nested),
            Shape::Rollup {
                key,
                label,
                sums,
                ratio,
            } => rollup(rows, key, label, sums, ratio.as_ref()),
            Shape::Aggregate(aggregate) => aggregate.evaluate(rows),
            // Handled in `render_from`.
            Shape::Object(_) => JsonValue::Null,
        }
    }
}

fn group_by(rows: &[Row], key: &str, fields: &[Field], nested: &[Nested]) -> JsonValue {
    let mut groups = Map::new();
    for row in rows {
        let group = groups
            .entry(row.get(key).key_text())
            .or_insert_with(|| {
                let mut object = match project(row, fields) {
                    JsonValue::Object(object) => object,
                    _ => Map::new(),
                };
                for map in nested {
                    object.insert(map.name.to_string(), JsonValue::Object(Map::new()));
                }
                JsonValue::Object(object)
            });

        for map in nested {
            if let Some(JsonValue::Object(inner)) = group.get_mut(map.name) {
                inner.insert(row.get(map.key).key_text(), row.get(map.value).to_json());
            }
        }
    }
    JsonValue::Object(groups)
}

fn rollup(
    rows: &[Row],
    key: &str,
    label: &'static str,
    sums: &[Field],
    ratio: Option<&GroupRatio>,
) -> JsonValue {
    let mut groups: Vec<(String, Vec<&Row>)> = Vec::new();
    for row in rows {
        let name = row.get(key).key_text();
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, members)) => members.push(row),
            None => groups.push((name, vec![row])),
        }
    }

    let items = groups
        .into_iter()
        .map(|(name, members)| {
            let mut object = Map::with_capacity(sums.len() + 2);
            object.insert(label.to_string(), JsonValue::String(name));
            for field in sums {
                let total = sum(members.iter().map(|row| row.get(field.column)));
                object.insert(field.name.to_string(), total);
            }
            if let Some(ratio) = ratio {
                let numeric = |name: &str| object.get(name).and_then(JsonValue::as_f64);
                let value = match (numeric(ratio.part), numeric(ratio.total)) {
                    (Some(part), Some(total)) => percentage(part, total, ratio.precision),
                    _ => JsonValue::Null,
                };
                object.insert(ratio.name.to_string(), value);
            }
            JsonValue::Object(object)
        })
        .collect();
    JsonValue::Array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn migrantes() -> Vec<ResultSet> {
        vec![
            ResultSet::new(vec![
                Row::new()
                    .with("TotalNinosMigrantes", 120)
                    .with("TotalJardinesConMigrantes", 14),
            ]),
            ResultSet::new(vec![
                Row::new().with("NacionalidadPO", "Venezolana").with("TotalNinos", 70),
                Row::new().with("NacionalidadPO", "Peruana").with("TotalNinos", 30),
                Row::new().with("NacionalidadPO", "Haitiana").with("TotalNinos", 20),
            ]),
        ]
    }

    #[test]
    fn positional_sets_fill_named_slots() {
        let shape = Shape::object([
            Member::new(
                "totales",
                Shape::first(&[
                    ("totalNinosMigrantes", "TotalNinosMigrantes"),
                    ("totalJardinesConMigrantes", "TotalJardinesConMigrantes"),
                ]),
            ),
            Member::new(
                "detallePorNacionalidad",
                Shape::each(&[("nacionalidad", "NacionalidadPO"), ("totalNinos", "TotalNinos")]),
            )
            .from_set(1),
        ]);

        let data = shape.render(&migrantes()).unwrap();
        assert_eq!(
            data["totales"],
            json!({ "totalNinosMigrantes": 120, "totalJardinesConMigrantes": 14 })
        );
        assert_eq!(data["detallePorNacionalidad"].as_array().unwrap().len(), 3);
        assert_eq!(
            data["detallePorNacionalidad"][0],
            json!({ "nacionalidad": "Venezolana", "totalNinos": 70 })
        );
    }

    #[test]
    fn missing_declared_set_is_an_error() {
        let shape = Shape::object([Member::new("resumen", Shape::FirstRow).from_set(1)]);
        let err = shape
            .render(&[ResultSet::new(vec![Row::new().with("a", 1)])])
            .unwrap_err();
        assert_eq!(
            err,
            ShapeError::MissingResultSet {
                wanted: 1,
                returned: 1
            }
        );
    }

    #[test]
    fn first_row_is_an_object_not_a_list() {
        let sets = vec![ResultSet::new(vec![
            Row::new().with("Saldo", 10),
            Row::new().with("Saldo", 20),
        ])];
        assert_eq!(Shape::FirstRow.render(&sets).unwrap(), json!({ "Saldo": 10 }));
        assert_eq!(
            Shape::Rows.render(&sets).unwrap(),
            json!([{ "Saldo": 10 }, { "Saldo": 20 }])
        );
    }

    #[test]
    fn group_by_merges_later_rows_into_first_group() {
        let rows = vec![
            Row::new()
                .with("Comuna", "Arica")
                .with("NombreRegion", "Arica y Parinacota")
                .with("NacionalidadPO", "Peruana")
                .with("Total", 5),
            Row::new()
                .with("Comuna", "Iquique")
                .with("NombreRegion", "Tarapacá")
                .with("NacionalidadPO", "Boliviana")
                .with("Total", 3),
            Row::new()
                .with("Comuna", "Arica")
                .with("NombreRegion", "ignored")
                .with("NacionalidadPO", "Boliviana")
                .with("Total", 2),
        ];
        let shape = Shape::GroupBy {
            key: "Comuna",
            fields: vec![Field::new("nombreRegion", "NombreRegion")],
            nested: vec![Nested {
                name: "nacionalidades",
                key: "NacionalidadPO",
                value: "Total",
            }],
        };

        let data = shape.render(&[ResultSet::new(rows)]).unwrap();
        assert_eq!(
            data.to_string(),
            r#"{"Arica":{"nombreRegion":"Arica y Parinacota","nacionalidades":{"Peruana":5,"Boliviana":2}},"Iquique":{"nombreRegion":"Tarapacá","nacionalidades":{"Boliviana":3}}}"#
        );
    }

    #[test]
    fn rollup_sums_and_guards_ratio() {
        let rows = vec![
            Row::new()
                .with("TipoEstablecimiento", "JUNJI")
                .with("TotalJardines", 3)
                .with("ConReconocimiento", 1),
            Row::new()
                .with("TipoEstablecimiento", "VTF")
                .with("TotalJardines", 0)
                .with("ConReconocimiento", 0),
            Row::new()
                .with("TipoEstablecimiento", "JUNJI")
                .with("TotalJardines", 1)
                .with("ConReconocimiento", 1),
        ];
        let shape = Shape::Rollup {
            key: "TipoEstablecimiento",
            label: "tipoEstablecimiento",
            sums: vec![
                Field::new("totalJardines", "TotalJardines"),
                Field::new("conReconocimiento", "ConReconocimiento"),
            ],
            ratio: Some(GroupRatio {
                name: "porcentaje",
                part: "conReconocimiento",
                total: "totalJardines",
                precision: Precision::Whole,
            }),
        };

        let data = shape.render(&[ResultSet::new(rows)]).unwrap();
        assert_eq!(
            data,
            json!([
                { "tipoEstablecimiento": "JUNJI", "totalJardines": 4, "conReconocimiento": 2, "porcentaje": 50 },
                { "tipoEstablecimiento": "VTF", "totalJardines": 0, "conReconocimiento": 0, "porcentaje": null }
            ])
        );
    }
}
