use anyhow::Result;
use chrono::Local;
use serde_json::Value;

use crate::driver_mysql::QueryOutput;

/// Render a result set as CSV, header row first. An empty result produces an
/// empty file rather than a lone header line.
pub fn csv_bytes(output: &QueryOutput) -> Result<Vec<u8>> {
    if output.columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&output.columns)?;
    for row in &output.rows {
        let record: Vec<String> = output
            .columns
            .iter()
            .map(|column| cell_text(row.get(column).unwrap_or(&Value::Null)))
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("csv writer: {}", err))?;
    Ok(bytes)
}

/// NULL cells become empty fields; nested JSON values keep their compact
/// JSON spelling.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn export_filename(database: &str) -> String {
    format!("{}_{}.csv", database, Local::now().format("%Y%m%d_%H%M%S"))
}
