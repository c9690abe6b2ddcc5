//! Aggregator: in-process summaries over returned rows.
//!
//! Every ratio is guarded. A zero (or non-numeric) denominator yields JSON
//! `null`, never `NaN` or an infinity.

use serde_json::Value as JsonValue;

use crate::value::{Row, Scalar};

/// Rounding applied to a derived ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Nearest integer, halves rounding up.
    Whole,
    /// `n` decimals, rendered as a number.
    Fixed(u32),
    /// `n` decimals, rendered as a string (`"12.50"`).
    FixedText(u32),
}

impl Precision {
    pub fn apply(self, value: f64) -> JsonValue {
        if !value.is_finite() {
            return JsonValue::Null;
        }
        match self {
            Precision::Whole => json_number((value + 0.5).floor()),
            Precision::Fixed(decimals) => json_number(round_to(value, decimals)),
            Precision::FixedText(decimals) => {
                JsonValue::String(format!("{:.*}", decimals as usize, round_to(value, decimals)))
            }
        }
    }
}

/// Where a ratio operand comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Σ of a column across every row.
    Sum(&'static str),
    /// A column of the first row.
    First(&'static str),
}

impl Operand {
    fn evaluate(self, rows: &[Row]) -> Option<f64> {
        match self {
            Operand::Sum(column) => Some(sum_f64(rows, column)),
            Operand::First(column) => rows.first().and_then(|row| row.get(column).as_f64()),
        }
    }
}

/// A summary value derived from rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// Σ column.
    Sum(&'static str),
    /// Σ value grouped by key, keys in first-occurrence order.
    SumBy {
        key: &'static str,
        value: &'static str,
    },
    /// Σ(value × weight) / Σ weight.
    WeightedAverage {
        value: &'static str,
        weight: &'static str,
        decimals: u32,
    },
    /// part / total × 100.
    Percentage {
        part: Operand,
        total: Operand,
        precision: Precision,
    },
    /// Distinct values of a column, first-occurrence order.
    Distinct(&'static str),
    /// A column of the first row, verbatim.
    First(&'static str),
}

impl Aggregate {
    pub fn evaluate(&self, rows: &[Row]) -> JsonValue {
        match self {
            Aggregate::Sum(column) => sum(rows.iter().map(|row| row.get(column))),
            Aggregate::SumBy { key, value } => {
                let mut groups: Vec<(String, Vec<&Scalar>)> = Vec::new();
                for row in rows {
                    let group = row.get(key).key_text();
                    match groups.iter_mut().find(|(name, _)| *name == group) {
                        Some((_, values)) => values.push(row.get(value)),
                        None => groups.push((group, vec![row.get(value)])),
                    }
                }
                JsonValue::Object(
                    groups
                        .into_iter()
                        .map(|(name, values)| (name, sum(values.into_iter())))
                        .collect(),
                )
            }
            Aggregate::WeightedAverage {
                value,
                weight,
                decimals,
            } => {
                let (weighted, weights) = rows.iter().fold((0.0, 0.0), |(acc, w), row| {
                    let v = row.get(value).as_f64().unwrap_or(0.0);
                    let k = row.get(weight).as_f64().unwrap_or(0.0);
                    (acc + v * k, w + k)
                });
                ratio(weighted, weights)
                    .map(|avg| Precision::Fixed(*decimals).apply(avg))
                    .unwrap_or(JsonValue::Null)
            }
            Aggregate::Percentage {
                part,
                total,
                precision,
            } => match (part.evaluate(rows), total.evaluate(rows)) {
                (Some(part), Some(total)) => percentage(part, total, *precision),
                _ => JsonValue::Null,
            },
            Aggregate::Distinct(column) => {
                let mut seen: Vec<&Scalar> = Vec::new();
                for row in rows {
                    let value = row.get(column);
                    if !seen.contains(&value) {
                        seen.push(value);
                    }
                }
                JsonValue::Array(seen.into_iter().map(Scalar::to_json).collect())
            }
            Aggregate::First(column) => rows
                .first()
                .map(|row| row.get(column).to_json())
                .unwrap_or(JsonValue::Null),
        }
    }
}

/// `part / total × 100` under `precision`; `null` when `total` is zero.
pub fn percentage(part: f64, total: f64, precision: Precision) -> JsonValue {
    ratio(part * 100.0, total)
        .map(|value| precision.apply(value))
        .unwrap_or(JsonValue::Null)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    Some(numerator / denominator).filter(|value| value.is_finite())
}

pub(crate) fn sum_f64(rows: &[Row], column: &str) -> f64 {
    rows.iter()
        .filter_map(|row| row.get(column).as_f64())
        .sum()
}

/// Σ that stays integral while every addend is.
pub(crate) fn sum<'a>(values: impl Iterator<Item = &'a Scalar>) -> JsonValue {
    let mut integral: i64 = 0;
    let mut float: f64 = 0.0;
    let mut is_float = false;
    for value in values {
        match value {
            Scalar::Int(v) => match integral.checked_add(*v) {
                Some(next) => integral = next,
                None => {
                    is_float = true;
                    float += *v as f64;
                }
            },
            other => {
                if let Some(v) = other.as_f64() {
                    is_float = true;
                    float += v;
                }
            }
        }
    }
    if is_float {
        json_number(float + integral as f64)
    } else {
        JsonValue::from(integral)
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Whole floats render without a fractional part.
pub(crate) fn json_number(value: f64) -> JsonValue {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        JsonValue::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn needs() -> Vec<Row> {
        vec![
            Row::new().with("CategoriaNEE", "Permanente").with("Cantidad", 4),
            Row::new().with("CategoriaNEE", "Transitoria").with("Cantidad", 3),
            Row::new().with("CategoriaNEE", "Permanente").with("Cantidad", 2),
        ]
    }

    #[test]
    fn sum_stays_integral() {
        assert_eq!(Aggregate::Sum("Cantidad").evaluate(&needs()), json!(9));
        assert_eq!(Aggregate::Sum("Cantidad").evaluate(&[]), json!(0));
    }

    #[test]
    fn sum_ignores_nulls_and_mixes_floats() {
        let rows = vec![
            Row::new().with("x", 1),
            Row::new().with("x", Scalar::Null),
            Row::new().with("x", 0.5),
        ];
        assert_eq!(Aggregate::Sum("x").evaluate(&rows), json!(1.5));
    }

    #[test]
    fn sum_by_key_keeps_first_occurrence_order() {
        let value = Aggregate::SumBy {
            key: "CategoriaNEE",
            value: "Cantidad",
        }
        .evaluate(&needs());
        assert_eq!(value.to_string(), r#"{"Permanente":6,"Transitoria":3}"#);
    }

    #[test]
    fn weighted_average_with_zero_weight_is_null() {
        let agg = Aggregate::WeightedAverage {
            value: "PromedioSatisfaccion",
            weight: "TotalJardines",
            decimals: 1,
        };
        let rows = vec![
            Row::new().with("PromedioSatisfaccion", 6.0).with("TotalJardines", 1),
            Row::new().with("PromedioSatisfaccion", 5.0).with("TotalJardines", 3),
        ];
        assert_eq!(agg.evaluate(&rows), json!(5.3));

        let zero = vec![Row::new().with("PromedioSatisfaccion", 6.0).with("TotalJardines", 0)];
        assert_eq!(agg.evaluate(&zero), JsonValue::Null);
        assert_eq!(agg.evaluate(&[]), JsonValue::Null);
    }

    #[test]
    fn percentage_precisions() {
        assert_eq!(percentage(1.0, 3.0, Precision::Whole), json!(33));
        assert_eq!(percentage(1.0, 2.0, Precision::Whole), json!(50));
        assert_eq!(percentage(1.0, 8.0, Precision::Whole), json!(13));
        assert_eq!(percentage(1.0, 3.0, Precision::Fixed(2)), json!(33.33));
        assert_eq!(percentage(1.0, 8.0, Precision::FixedText(2)), json!("12.50"));
    }

    #[test]
    fn percentage_with_zero_denominator_is_null() {
        for precision in [Precision::Whole, Precision::Fixed(2), Precision::FixedText(2)] {
            assert_eq!(percentage(5.0, 0.0, precision), JsonValue::Null);
        }

        let rows = vec![Row::new().with("TotalGeneral", 0).with("Total", 4)];
        let agg = Aggregate::Percentage {
            part: Operand::Sum("Total"),
            total: Operand::First("TotalGeneral"),
            precision: Precision::FixedText(2),
        };
        assert_eq!(agg.evaluate(&rows), JsonValue::Null);
    }

    #[test]
    fn distinct_values_in_first_occurrence_order() {
        let rows = vec![
            Row::new().with("Ano", 2024),
            Row::new().with("Ano", 2023),
            Row::new().with("Ano", 2024),
        ];
        assert_eq!(Aggregate::Distinct("Ano").evaluate(&rows), json!([2024, 2023]));
    }
}
