use log::debug;
use serde_json::{Map, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row, TypeInfo};

/// Fully materialized result of one statement.
#[derive(Clone, Debug, Default)]
pub struct QueryOutput {
    /// Column names in statement order. Empty when the statement produced no
    /// rows (row objects alone cannot preserve order).
    pub columns: Vec<String>,
    /// One JSON object per returned row, capped at `max_rows` when set.
    pub rows: Vec<Map<String, Value>>,
    /// Rows the statement actually produced, before the cap.
    pub total_rows: usize,
    pub truncated: bool,
}

/// Run one statement and decode every row to JSON. `max_rows` of zero means
/// no cap. DML and DDL statements come back with zero rows.
pub async fn run_query(
    pool: &MySqlPool,
    sql: &str,
    max_rows: usize,
) -> Result<QueryOutput, sqlx::Error> {
    let rows = sqlx::query(sql).fetch_all(pool).await?;
    Ok(rows_to_output(rows, max_rows))
}

/// Reduce a driver error to the message the client sees. Database-level
/// errors carry the server's own text; everything else uses the error's
/// display form.
pub fn driver_message(err: &sqlx::Error) -> String {
    let message = match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    };
    if message.trim().is_empty() {
        "Database query failed".to_string()
    } else {
        message
    }
}

/// Row metadata is shared per statement, so the first row's column list is
/// the statement's column list.
pub(crate) fn rows_to_output(rows: Vec<MySqlRow>, max_rows: usize) -> QueryOutput {
    let total_rows = rows.len();
    let columns: Vec<String> = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let keep = if max_rows == 0 {
        total_rows
    } else {
        total_rows.min(max_rows)
    };

    let mut out = Vec::with_capacity(keep);
    for row in rows.iter().take(keep) {
        out.push(row_to_object(row));
    }

    QueryOutput {
        columns,
        rows: out,
        total_rows,
        truncated: keep < total_rows,
    }
}

fn row_to_object(row: &MySqlRow) -> Map<String, Value> {
    let mut object = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name().to_ascii_uppercase();
        let value = decode_cell(row, idx, column.name(), &type_name);
        object.insert(column.name().to_string(), value);
    }
    object
}

// Decode one cell by the driver's advertised type name, case-insensitive.
// Numbers stay numbers, NULL stays null; DECIMAL is kept as an exact string
// because JSON doubles would round it.
fn decode_cell(row: &MySqlRow, idx: usize, column_name: &str, t: &str) -> Value {
    match t {
        // Integer types
        "TINYINT" => match row.try_get::<Option<i8>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "SMALLINT" => match row.try_get::<Option<i16>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "MEDIUMINT" | "INT" | "INTEGER" => match row.try_get::<Option<i32>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "BIGINT" => match row.try_get::<Option<i64>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },

        // Unsigned integer types
        "TINYINT UNSIGNED" => match row.try_get::<Option<u8>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "SMALLINT UNSIGNED" => match row.try_get::<Option<u16>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "INTEGER UNSIGNED" => {
            match row.try_get::<Option<u32>, _>(idx) {
                Ok(Some(val)) => Value::from(val),
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            }
        }
        "BIGINT UNSIGNED" => match row.try_get::<Option<u64>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            // Try signed before the generic fallback; values above i64::MAX
            // are rare outside auto-increment edge cases
            Err(_) => match row.try_get::<Option<i64>, _>(idx) {
                Ok(Some(val)) => Value::from(val),
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            },
        },

        // Floating point types; serde_json turns NaN and infinity into null
        "FLOAT" => match row.try_get::<Option<f32>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "DOUBLE" | "REAL" => match row.try_get::<Option<f64>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },

        // Decimal types kept exact as strings
        "DECIMAL" | "NUMERIC" | "NEWDECIMAL" => {
            if let Ok(Some(val)) = row.try_get::<Option<rust_decimal::Decimal>, _>(idx) {
                Value::String(val.to_string())
            } else if let Ok(Some(val)) = row.try_get::<Option<String>, _>(idx) {
                Value::String(val)
            } else if let Ok(Some(val)) = row.try_get::<Option<f64>, _>(idx) {
                Value::from(val)
            } else if decodes_to_null(row, idx) {
                Value::Null
            } else {
                decode_fallback(row, idx, column_name, t)
            }
        }

        // String types
        "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        | "VAR_STRING" | "STRING" => match row.try_get::<Option<String>, _>(idx) {
            Ok(Some(val)) => Value::String(val),
            Ok(None) => Value::Null,
            // Some collations surface these as bytes
            Err(_) => match row.try_get::<Option<Vec<u8>>, _>(idx) {
                Ok(Some(bytes)) => bytes_to_json(bytes),
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            },
        },

        // Binary types
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            match row.try_get::<Option<Vec<u8>>, _>(idx) {
                Ok(Some(val)) => bytes_to_json(val),
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            }
        }

        "BIT" => match row.try_get::<Option<Vec<u8>>, _>(idx) {
            Ok(Some(bytes)) => bit_to_number(&bytes),
            Ok(None) => Value::Null,
            Err(_) => match row.try_get::<Option<u64>, _>(idx) {
                Ok(Some(val)) => Value::from(val),
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            },
        },

        // Date and time types rendered in MySQL's own text form
        "DATE" => match row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            Ok(Some(val)) => Value::String(val.to_string()),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "TIME" => match row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
            Ok(Some(val)) => Value::String(val.to_string()),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
        "DATETIME" | "TIMESTAMP" => {
            if let Ok(Some(val)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
                Value::String(val.to_string())
            } else if let Ok(Some(val)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            {
                Value::String(val.to_rfc3339())
            } else if let Ok(Some(val)) = row.try_get::<Option<String>, _>(idx) {
                Value::String(val)
            } else if decodes_to_null(row, idx) {
                Value::Null
            } else {
                decode_fallback(row, idx, column_name, t)
            }
        }
        "YEAR" => match row.try_get::<Option<i16>, _>(idx) {
            Ok(Some(val)) => Value::from(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },

        // Boolean type
        "BOOLEAN" | "BOOL" => match row.try_get::<Option<bool>, _>(idx) {
            Ok(Some(val)) => Value::Bool(val),
            Ok(None) => Value::Null,
            Err(_) => match row.try_get::<Option<i8>, _>(idx) {
                Ok(Some(val)) => Value::Bool(val != 0),
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            },
        },

        // JSON columns arrive as text; pass structured values through when
        // they parse, raw text when they do not
        "JSON" => match row.try_get::<Option<String>, _>(idx) {
            Ok(Some(val)) => parse_json_text(val),
            Ok(None) => Value::Null,
            Err(_) => match row.try_get::<Option<Vec<u8>>, _>(idx) {
                Ok(Some(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => parse_json_text(text),
                    Err(err) => bytes_to_json(err.into_bytes()),
                },
                Ok(None) => Value::Null,
                Err(_) => decode_fallback(row, idx, column_name, t),
            },
        },

        // Default
        _ => match row.try_get::<Option<String>, _>(idx) {
            Ok(Some(val)) => Value::String(val),
            Ok(None) => Value::Null,
            Err(_) => decode_fallback(row, idx, column_name, t),
        },
    }
}

/// Distinguish "NULL cell" from "undecodable cell" for types whose natural
/// decode failed: a NULL decodes as `None` under any compatible type.
fn decodes_to_null(row: &MySqlRow, idx: usize) -> bool {
    matches!(row.try_get::<Option<Vec<u8>>, _>(idx), Ok(None))
        || matches!(row.try_get::<Option<String>, _>(idx), Ok(None))
}

// Index-first fallback when the advertised type refuses its natural decode.
fn decode_fallback(row: &MySqlRow, idx: usize, column_name: &str, type_name: &str) -> Value {
    if let Ok(Some(val)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(val);
    }
    if let Ok(Some(val)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return bytes_to_json(val);
    }
    if let Ok(Some(val)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<Option<u64>, _>(idx) {
        return Value::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<Option<f64>, _>(idx) {
        return Value::from(val);
    }
    if let Ok(Some(val)) = row.try_get::<Option<rust_decimal::Decimal>, _>(idx) {
        return Value::String(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return Value::String(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return Value::String(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
        return Value::String(val.to_string());
    }
    debug!(
        "no decode for column '{}' of type {}, returning null",
        column_name, type_name
    );
    Value::Null
}

/// Treat bytes as text when they are mostly printable.
pub fn looks_textual(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }
    let mut printable = 0usize;
    for &b in bytes {
        if (0x20..=0x7E).contains(&b) || b == b'\n' || b == b'\r' || b == b'\t' {
            printable += 1;
        }
    }
    (printable as f32) / (bytes.len() as f32) > 0.85
}

/// Textual bytes become strings, anything else is rendered as hex.
/// Trailing NULs are MySQL BINARY padding and get trimmed first.
pub fn bytes_to_json(bytes: Vec<u8>) -> Value {
    let mut b = bytes;
    while matches!(b.last(), Some(0)) {
        b.pop();
    }
    if b.is_empty() {
        return Value::String(String::new());
    }

    if looks_textual(&b) {
        Value::String(String::from_utf8_lossy(&b).into_owned())
    } else {
        Value::String(format!("0x{}", hex::encode_upper(&b)))
    }
}

/// MySQL sends BIT as a big-endian byte string at most eight bytes wide.
pub fn bit_to_number(bytes: &[u8]) -> Value {
    if bytes.len() > 8 {
        return Value::String(format!("0x{}", hex::encode_upper(bytes)));
    }
    let mut acc: u64 = 0;
    for &b in bytes {
        acc = (acc << 8) | u64::from(b);
    }
    Value::from(acc)
}

pub fn parse_json_text(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}
