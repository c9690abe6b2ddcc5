//! Marshalling between the façade's value model and TDS column data.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use sgi::{BoundParam, ResultSet, Row, Scalar, SqlValue};
use tiberius::{ColumnData, FromSql, ToSql};

/// Bound parameter in its TDS form.
pub(crate) struct Param<'a>(pub &'a SqlValue);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> ColumnData<'_> {
        match self.0 {
            SqlValue::Int(value) => ColumnData::I32(*value),
            SqlValue::BigInt(value) => ColumnData::I64(*value),
            SqlValue::Text { value, .. } => ColumnData::String(value.as_deref().map(Cow::Borrowed)),
        }
    }
}

/// `EXEC <procedure> @Name = @P1, ...`, positional placeholders in bind order.
pub(crate) fn exec_statement(procedure: &str, params: &[BoundParam]) -> String {
    let mut sql = format!("EXEC {procedure}");
    for (idx, param) in params.iter().enumerate() {
        let sep = if idx == 0 { " " } else { ", " };
        let _ = write!(sql, "{sep}@{} = @P{}", param.name, idx + 1);
    }
    sql
}

/// Groups a TDS item stream into result sets. Every column metadata token
/// opens a new set, so a set with no rows keeps its position.
#[derive(Debug)]
pub(crate) struct SetCollector<R> {
    sets: Vec<Vec<R>>,
}

impl<R> Default for SetCollector<R> {
    fn default() -> Self {
        Self { sets: Vec::new() }
    }
}

impl<R> SetCollector<R> {
    pub(crate) fn metadata(&mut self) {
        self.sets.push(Vec::new());
    }

    pub(crate) fn row(&mut self, row: R) {
        match self.sets.last_mut() {
            Some(set) => set.push(row),
            None => self.sets.push(vec![row]),
        }
    }

    pub(crate) fn finish(self) -> Vec<Vec<R>> {
        self.sets
    }
}

pub(crate) fn result_sets(sets: Vec<Vec<tiberius::Row>>) -> Vec<ResultSet> {
    sets.into_iter()
        .map(|rows| rows.into_iter().map(row).collect())
        .collect()
}

fn row(row: tiberius::Row) -> Row {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    names.into_iter().zip(row).map(|(name, data)| (name, scalar(data))).collect()
}

fn scalar(data: ColumnData<'static>) -> Scalar {
    match data {
        ColumnData::U8(v) => v.map(i64::from).into(),
        ColumnData::I16(v) => v.map(i64::from).into(),
        ColumnData::I32(v) => v.map(i64::from).into(),
        ColumnData::I64(v) => v.into(),
        ColumnData::F32(v) => v.map(f64::from).into(),
        ColumnData::F64(v) => v.into(),
        ColumnData::Bit(v) => v.into(),
        ColumnData::String(v) => v.map(Cow::into_owned).into(),
        ColumnData::Guid(v) => v.map(|guid| guid.to_string()).into(),
        ColumnData::Numeric(v) => v.map(f64::from).into(),
        ColumnData::Binary(v) => v.map(|bytes| hex(&bytes)).into(),
        ColumnData::Xml(v) => v.map(|xml| xml.into_owned().into_string()).into(),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(&data, Scalar::DateTime)
        }
        ColumnData::Date(_) => temporal::<NaiveDate>(&data, Scalar::Date),
        ColumnData::Time(_) => temporal::<NaiveTime>(&data, Scalar::Time),
        ColumnData::DateTimeOffset(_) => {
            temporal::<DateTime<FixedOffset>>(&data, Scalar::DateTimeOffset)
        }
    }
}

fn temporal<'a, T>(data: &'a ColumnData<'static>, wrap: fn(T) -> Scalar) -> Scalar
where
    T: FromSql<'a>,
{
    match T::from_sql(data) {
        Ok(Some(value)) => wrap(value),
        _ => Scalar::Null,
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
