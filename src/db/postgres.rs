//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx. Each client owns a single connection.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgValueFormat};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{
    Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef,
};
use std::time::Instant;
use tracing::{debug, warn};

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a new connection. No retries are attempted.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let mut options = PgConnectOptions::new()
            .host(config.host.as_deref().unwrap_or("localhost"))
            .port(config.port);
        if let Some(database) = &config.database {
            options = options.database(database);
        }
        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| DashboardError::connection(e.to_string()))?;

        debug!("Opened connection to {}", config.display_string());
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DashboardError::connection("connection already closed"))?;
        let start = Instant::now();

        // Preparing first gives column metadata even when no rows come back.
        let statement = (&mut *conn)
            .prepare(sql)
            .await
            .map_err(|e| DashboardError::query(format_query_error(e)))?;

        let columns: Vec<ColumnInfo> = statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();

        let rows: Vec<PgRow> = statement
            .query()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DashboardError::query(format_query_error(e)))?;

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| DashboardError::connection(e.to_string()))?;
        }
        Ok(())
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Values the typed decoders cannot represent (NUMERIC beyond `Decimal`'s range
/// or NaN, unknown types) are rebuilt from the raw wire bytes rather than dropped.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    decode_value(row, index, type_name).unwrap_or_else(|e| {
        debug!("Falling back to raw value for column {} ({}): {}", index, type_name, e);
        raw_value(row, index, type_name)
    })
}

fn decode_value(
    row: &PgRow,
    index: usize,
    type_name: &str,
) -> std::result::Result<Value, sqlx::Error> {
    let value: Value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.into(),
        "INT2" | "SMALLINT" => row.try_get::<Option<i16>, _>(index)?.into(),
        "INT4" | "INT" | "INTEGER" => row.try_get::<Option<i32>, _>(index)?.into(),
        "INT8" | "BIGINT" => row.try_get::<Option<i64>, _>(index)?.into(),
        "FLOAT4" | "REAL" => row.try_get::<Option<f32>, _>(index)?.into(),
        "FLOAT8" | "DOUBLE PRECISION" => row.try_get::<Option<f64>, _>(index)?.into(),

        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(index)?
            .map(|v| Value::Decimal(v.to_string()))
            .unwrap_or_default(),

        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| Value::Timestamp(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or_default(),

        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|v| Value::Timestamp(v.to_rfc3339()))
            .unwrap_or_default(),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|v| Value::Timestamp(v.to_string()))
            .unwrap_or_default(),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map(|v| Value::Timestamp(v.to_string()))
            .unwrap_or_default(),

        "INTERVAL" => row
            .try_get::<Option<PgInterval>, _>(index)?
            .map(|v| Value::String(format_interval(&v)))
            .unwrap_or_default(),

        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)?
            .map(|v| Value::String(v.to_string()))
            .unwrap_or_default(),

        "JSON" | "JSONB" => row.try_get::<Option<JsonValue>, _>(index)?.into(),

        "BYTEA" => row.try_get::<Option<Vec<u8>>, _>(index)?.into(),

        "BOOL[]" => json_array(row.try_get::<Option<Vec<Option<bool>>>, _>(index)?),
        "INT2[]" => json_array(row.try_get::<Option<Vec<Option<i16>>>, _>(index)?),
        "INT4[]" => json_array(row.try_get::<Option<Vec<Option<i32>>>, _>(index)?),
        "INT8[]" => json_array(row.try_get::<Option<Vec<Option<i64>>>, _>(index)?),
        "FLOAT4[]" => json_array(row.try_get::<Option<Vec<Option<f32>>>, _>(index)?),
        "FLOAT8[]" => json_array(row.try_get::<Option<Vec<Option<f64>>>, _>(index)?),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            json_array(row.try_get::<Option<Vec<Option<String>>>, _>(index)?)
        }
        "NUMERIC[]" => json_array(
            row.try_get::<Option<Vec<Option<Decimal>>>, _>(index)?
                .map(|items| {
                    items
                        .into_iter()
                        .map(|d| d.map(|d| d.to_string()))
                        .collect::<Vec<_>>()
                }),
        ),

        // For all other types, try to get as string
        _ => row.try_get::<Option<String>, _>(index)?.into(),
    };

    Ok(value)
}

/// Wraps a decoded array as a nested JSON array.
fn json_array<T: Into<JsonValue>>(items: Option<Vec<Option<T>>>) -> Value {
    items
        .map(|items| {
            Value::Json(JsonValue::Array(
                items
                    .into_iter()
                    .map(|item| item.map_or(JsonValue::Null, Into::into))
                    .collect(),
            ))
        })
        .unwrap_or_default()
}

/// Rebuilds a value from its raw bytes when no typed decoder applies.
fn raw_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw,
        Err(e) => {
            warn!("Cannot read column {} ({}): {}", index, type_name, e);
            return Value::Null;
        }
    };

    let binary = raw.format() == PgValueFormat::Binary;
    let bytes = match raw.as_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Cannot read column {} ({}): {}", index, type_name, e);
            return Value::Null;
        }
    };

    if binary && type_name.eq_ignore_ascii_case("NUMERIC") {
        if let Some(text) = numeric_text(bytes) {
            return Value::Decimal(text);
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) if !text.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            if type_name.eq_ignore_ascii_case("NUMERIC") {
                Value::Decimal(text.to_string())
            } else {
                Value::String(text.to_string())
            }
        }
        _ => Value::Bytes(bytes.to_vec()),
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Renders a NUMERIC in PostgreSQL's binary format as its exact decimal text.
///
/// The layout is `ndigits`, `weight`, `sign`, `dscale` (16 bits each, big endian)
/// followed by `ndigits` base-10000 digits. Returns `None` on malformed input.
fn numeric_text(bytes: &[u8]) -> Option<String> {
    let word = |i: usize| -> Option<u16> {
        let b = bytes.get(i * 2..i * 2 + 2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    };

    let ndigits = word(0)? as usize;
    let weight = word(1)? as i16 as i64;
    let sign = word(2)?;
    let dscale = word(3)? as usize;

    match sign {
        NUMERIC_NAN => return Some("NaN".to_string()),
        NUMERIC_PINF => return Some("Infinity".to_string()),
        NUMERIC_NINF => return Some("-Infinity".to_string()),
        0 | NUMERIC_NEG => {}
        _ => return None,
    }

    let digits = (0..ndigits)
        .map(|i| word(4 + i).filter(|&d| d < 10_000))
        .collect::<Option<Vec<u16>>>()?;
    let digit = |i: i64| -> u16 {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }

    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&digit(0).to_string());
        for i in 1..=weight {
            text.push_str(&format!("{:04}", digit(i)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit(i)));
            i += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Some(text)
}

/// Formats an interval as an ISO-8601 duration, e.g. `P1Y2M3DT4H5M6.5S`.
fn format_interval(interval: &PgInterval) -> String {
    let mut text = String::from("P");
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        text.push_str(&format!("{years}Y"));
    }
    if months != 0 {
        text.push_str(&format!("{months}M"));
    }
    if interval.days != 0 {
        text.push_str(&format!("{}D", interval.days));
    }

    let micros = interval.microseconds;
    if micros != 0 || text.len() == 1 {
        let negative = micros < 0;
        let micros = micros.unsigned_abs();
        let (hours, minutes) = (micros / 3_600_000_000, micros / 60_000_000 % 60);
        let (seconds, fraction) = (micros / 1_000_000 % 60, micros % 1_000_000);
        let sign = if negative { "-" } else { "" };

        text.push('T');
        if hours != 0 {
            text.push_str(&format!("{sign}{hours}H"));
        }
        if minutes != 0 {
            text.push_str(&format!("{sign}{minutes}M"));
        }
        if seconds != 0 || fraction != 0 || (hours == 0 && minutes == 0) {
            text.push_str(&format!("{sign}{seconds}"));
            if fraction != 0 {
                let fraction = format!("{fraction:06}");
                text.push('.');
                text.push_str(fraction.trim_end_matches('0'));
            }
            text.push('S');
        }
    }

    text
}

/// Formats a query error as the server reported it, with detail and hint lines.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = db_error.message().to_string();

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\nDETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\nHINT: ");
            result.push_str(hint);
        }
    }

    result
}
