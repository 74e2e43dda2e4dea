use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::Value;
use tokio_postgres::Row;
use tokio_postgres::types::Type;

/// Column names plus row values as JSON, the shape every query result
/// takes on its way to the UI.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryOutput {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Convert tokio-postgres rows into a `QueryOutput`, mapping PostgreSQL
/// types to JSON values. Unknown types fall back to their text form,
/// and any value that refuses conversion becomes null rather than
/// failing the whole result.
pub fn rows_to_output(rows: &[Row]) -> QueryOutput {
    let Some(first) = rows.first() else {
        return QueryOutput::default();
    };

    let columns: Vec<String> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut out_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(columns.len());
        for (idx, col) in row.columns().iter().enumerate() {
            values.push(cell_to_value(row, idx, col.type_()));
        }
        out_rows.push(values);
    }

    QueryOutput {
        columns,
        rows: out_rows,
    }
}

fn cell_to_value(row: &Row, idx: usize, pg_type: &Type) -> Value {
    match *pg_type {
        Type::BOOL => match row.try_get::<_, Option<bool>>(idx) {
            Ok(Some(v)) => Value::Bool(v),
            _ => Value::Null,
        },
        Type::INT2 => int_value(row.try_get::<_, Option<i16>>(idx).ok().flatten().map(i64::from)),
        Type::INT4 => int_value(row.try_get::<_, Option<i32>>(idx).ok().flatten().map(i64::from)),
        Type::INT8 => int_value(row.try_get::<_, Option<i64>>(idx).ok().flatten()),
        Type::FLOAT4 => float_value(
            row.try_get::<_, Option<f32>>(idx)
                .ok()
                .flatten()
                .map(f64::from),
        ),
        Type::FLOAT8 => float_value(row.try_get::<_, Option<f64>>(idx).ok().flatten()),
        Type::NUMERIC => {
            let decimal = row.try_get::<_, Option<Decimal>>(idx).ok().flatten();
            float_value(decimal.and_then(|d| d.to_f64()))
        }
        Type::DATE => match row.try_get::<_, Option<NaiveDate>>(idx) {
            Ok(Some(d)) => Value::String(d.format("%Y-%m-%d").to_string()),
            _ => Value::Null,
        },
        Type::TIMESTAMP => match row.try_get::<_, Option<NaiveDateTime>>(idx) {
            Ok(Some(ts)) => Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            _ => Value::Null,
        },
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(Some(s)) => Value::String(s),
            Ok(None) => Value::Null,
            Err(_) => {
                // Last resort for types without a FromSql<String> impl
                if let Ok(Some(v)) = row.try_get::<_, Option<i64>>(idx) {
                    int_value(Some(v))
                } else if let Ok(Some(v)) = row.try_get::<_, Option<f64>>(idx) {
                    float_value(Some(v))
                } else {
                    Value::Null
                }
            }
        },
    }
}

fn int_value(v: Option<i64>) -> Value {
    match v {
        Some(n) => Value::Number(n.into()),
        None => Value::Null,
    }
}

fn float_value(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows_produce_empty_output() {
        let out = rows_to_output(&[]);
        assert!(out.columns.is_empty());
        assert!(out.rows.is_empty());
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn test_float_value_rejects_nan() {
        assert_eq!(float_value(Some(f64::NAN)), Value::Null);
        assert_eq!(float_value(Some(2.5)), serde_json::json!(2.5));
        assert_eq!(float_value(None), Value::Null);
    }
}
