use std::error::Error;
use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tokio_postgres::types::{FromSql, Kind, Type};
use tokio_postgres::{Row, Statement};

use crate::error::TemplateError;
use crate::results::ResultSet;
use crate::types::RowValues;

type BoxError = Box<dyn Error + Sync + Send>;

/// Build a result set using the prepared statement's columns.
///
/// Column names come from the statement rather than the first row, so a query that
/// returns no rows still reports its columns.
///
/// # Errors
/// Returns `TemplateError::ExecutionError` if a value cannot be extracted.
pub fn build_result_set(stmt: &Statement, rows: &[Row]) -> Result<ResultSet, TemplateError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        values.push(row_values);
    }

    Ok(ResultSet::from_rows(column_names, values))
}

/// Extracts a `RowValues` from a `tokio_postgres` row at the given index.
///
/// # Errors
/// Returns `TemplateError::ExecutionError` if the column's wire value is malformed.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, TemplateError> {
    let val: Option<ColumnValue> = row.try_get(idx).map_err(|e| {
        TemplateError::ExecutionError(format!(
            "column {idx} of type {} cannot be read: {e}",
            row.columns()[idx].type_().name()
        ))
    })?;
    Ok(val.map_or(RowValues::Null, |v| v.0))
}

/// A column value of any Postgres type.
///
/// Types with a natural `RowValues` counterpart map onto it. `numeric`, `uuid`,
/// `time`, `interval` and `date` become their Postgres text form, arrays become
/// JSON arrays, and a type this crate knows nothing about is kept as text when its
/// wire bytes are UTF-8 and as a blob otherwise.
struct ColumnValue(RowValues);

impl<'a> FromSql<'a> for ColumnValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match ty.name() {
            "int2" => RowValues::Int(i64::from(i16::from_sql(ty, raw)?)),
            "int4" => RowValues::Int(i64::from(i32::from_sql(ty, raw)?)),
            "int8" => RowValues::Int(i64::from_sql(ty, raw)?),
            "oid" => RowValues::Int(i64::from(u32::from_sql(ty, raw)?)),
            "char" => RowValues::Int(i64::from(i8::from_sql(ty, raw)?)),
            "float4" => RowValues::Float(f64::from(f32::from_sql(ty, raw)?)),
            "float8" => RowValues::Float(f64::from_sql(ty, raw)?),
            "bool" => RowValues::Bool(bool::from_sql(ty, raw)?),
            "timestamp" => RowValues::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            "timestamptz" => RowValues::Timestamp(
                chrono::DateTime::<chrono::Utc>::from_sql(ty, raw)?.naive_utc(),
            ),
            "date" => RowValues::Text(NaiveDate::from_sql(ty, raw)?.to_string()),
            "time" => RowValues::Text(NaiveTime::from_sql(ty, raw)?.to_string()),
            "json" | "jsonb" => RowValues::JSON(Value::from_sql(ty, raw)?),
            "bytea" => RowValues::Blob(Vec::<u8>::from_sql(ty, raw)?),
            "numeric" => RowValues::Text(decode_numeric(raw)?),
            "uuid" => RowValues::Text(decode_uuid(raw)?),
            "interval" => RowValues::Text(decode_interval(raw)?),
            _ => match ty.kind() {
                Kind::Domain(inner) => return ColumnValue::from_sql(inner, raw),
                Kind::Array(_) => {
                    let items: Vec<Option<ColumnValue>> = Vec::from_sql(ty, raw)?;
                    let items = items
                        .into_iter()
                        .map(|item| item.map_or(Ok(Value::Null), |v| serde_json::to_value(v.0)))
                        .collect::<Result<Vec<_>, _>>()?;
                    RowValues::JSON(Value::Array(items))
                }
                // text, varchar, bpchar, name, enums and other text-encoded types
                _ => match std::str::from_utf8(raw) {
                    Ok(text) => RowValues::Text(text.to_string()),
                    Err(_) => RowValues::Blob(raw.to_vec()),
                },
            },
        };
        Ok(ColumnValue(value))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn read_pair(raw: &[u8], at: usize) -> Result<[u8; 2], BoxError> {
    raw.get(at..at + 2)
        .map(|b| [b[0], b[1]])
        .ok_or_else(|| "truncated value".into())
}

fn read_i16(raw: &[u8], at: usize) -> Result<i16, BoxError> {
    read_pair(raw, at).map(i16::from_be_bytes)
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render a binary `numeric` (base-10000 digit groups) as decimal text, keeping
/// the column's display scale.
fn decode_numeric(raw: &[u8]) -> Result<String, BoxError> {
    let ndigits = usize::try_from(read_i16(raw, 0)?)?;
    let weight = read_i16(raw, 2)?;
    let sign = u16::from_be_bytes(read_pair(raw, 4)?);
    let dscale = usize::try_from(read_i16(raw, 6)?)?;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|i| read_i16(raw, 8 + 2 * i))
        .collect::<Result<Vec<_>, _>>()?;
    // Digit group `i` carries weight `weight - i`.
    let digit_at = |idx: i32| -> i16 {
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };
    let weight = i32::from(weight);

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for idx in 0..=weight {
            if idx == 0 {
                write!(out, "{}", digit_at(idx))?;
            } else {
                write!(out, "{:04}", digit_at(idx))?;
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut idx = weight + 1;
        while fraction.len() < dscale {
            write!(fraction, "{:04}", digit_at(idx))?;
            idx += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

fn decode_uuid(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 16 {
        return Err(format!("invalid uuid length {}", raw.len()).into());
    }
    let mut out = String::with_capacity(36);
    for (i, byte) in raw.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        write!(out, "{byte:02x}")?;
    }
    Ok(out)
}

/// Render a binary `interval` (microseconds, days, months) the way Postgres
/// prints it by default, e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn decode_interval(raw: &[u8]) -> Result<String, BoxError> {
    let bytes: [u8; 16] = raw
        .try_into()
        .map_err(|_| format!("invalid interval length {}", raw.len()))?;
    let micros = i64::from_be_bytes(bytes[0..8].try_into()?);
    let days = i32::from_be_bytes(bytes[8..12].try_into()?);
    let months = i32::from_be_bytes(bytes[12..16].try_into()?);

    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    for (n, unit, units) in [(years, "year", "years"), (months, "mon", "mons"), (days, "day", "days")] {
        if n != 0 {
            parts.push(format!("{n} {}", if n.abs() == 1 { unit } else { units }));
        }
    }

    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let total = micros.unsigned_abs();
        let (secs, frac) = (total / 1_000_000, total % 1_000_000);
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if frac != 0 {
            let digits = format!("{frac:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }
    Ok(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(weight: i16, sign: u16, dscale: i16, digits: &[i16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&i16::try_from(digits.len()).unwrap().to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn numeric_renders_as_decimal_text() {
        assert_eq!(decode_numeric(&numeric(0, 0, 1, &[12, 5000])).unwrap(), "12.5");
        assert_eq!(decode_numeric(&numeric(-1, 0, 3, &[10])).unwrap(), "0.001");
        assert_eq!(decode_numeric(&numeric(1, 0, 0, &[1])).unwrap(), "10000");
        assert_eq!(
            decode_numeric(&numeric(1, NUMERIC_NEG, 2, &[12, 3456, 7800])).unwrap(),
            "-123456.78"
        );
        // AVG over integers comes back with a wide display scale.
        assert_eq!(
            decode_numeric(&numeric(0, 0, 20, &[2, 5000])).unwrap(),
            "2.50000000000000000000"
        );
        assert_eq!(decode_numeric(&numeric(0, 0, 0, &[])).unwrap(), "0");
        assert_eq!(decode_numeric(&numeric(0, NUMERIC_NAN, 0, &[])).unwrap(), "NaN");
    }

    #[test]
    fn truncated_numeric_is_an_error() {
        let mut raw = numeric(0, 0, 1, &[12, 5000]);
        raw.truncate(10);
        assert!(decode_numeric(&raw).is_err());
    }

    #[test]
    fn uuid_renders_hyphenated() {
        let raw: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            decode_uuid(&raw).unwrap(),
            "00010203-0405-0607-0809-0a0b0c0d0e0f"
        );
        assert!(decode_uuid(&raw[..15]).is_err());
    }

    fn interval(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = micros.to_be_bytes().to_vec();
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    #[test]
    fn interval_renders_like_postgres() {
        let hms = (4 * 3600 + 5 * 60 + 6) * 1_000_000;
        assert_eq!(
            decode_interval(&interval(hms + 500_000, 3, 14)).unwrap(),
            "1 year 2 mons 3 days 04:05:06.5"
        );
        assert_eq!(decode_interval(&interval(0, 1, 0)).unwrap(), "1 day");
        assert_eq!(decode_interval(&interval(0, 0, 0)).unwrap(), "00:00:00");
        assert_eq!(decode_interval(&interval(-90_000_000, 0, 0)).unwrap(), "-00:01:30");
    }

    #[test]
    fn unlisted_types_fall_back_to_text_or_blob() {
        let text = ColumnValue::from_sql(&Type::TEXT, b"hello").unwrap();
        assert_eq!(text.0, RowValues::Text("hello".into()));
        let xml = ColumnValue::from_sql(&Type::XML, b"<a/>").unwrap();
        assert_eq!(xml.0, RowValues::Text("<a/>".into()));
        let opaque = ColumnValue::from_sql(&Type::TS_VECTOR, &[0xff, 0xfe]).unwrap();
        assert_eq!(opaque.0, RowValues::Blob(vec![0xff, 0xfe]));
        let uuid = ColumnValue::from_sql(&Type::UUID, &[0xab; 16]).unwrap();
        assert_eq!(
            uuid.0,
            RowValues::Text("abababab-abab-abab-abab-abababababab".into())
        );
        assert!(ColumnValue::accepts(&Type::NUMERIC));
    }
}
