// ABOUTME: docs-table-ref command - Export column reference CSV files
// ABOUTME: Writes one CSV per documented table with column names, types and descriptions

use super::{validate_name, Session};
use crate::postgres::schema::{list_columns, ColumnInfo};
use crate::views::documented_tables;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_OUTPUT_DIR: &str = "docs/definitions";

const HEADERS: [&str; 3] = ["Column Name", "Data Type", "Description"];

/// Collapse `timestamp with(out) time zone` into `timestamp`
pub fn display_type(data_type: &str) -> &str {
    if data_type.contains("timestamp") {
        "timestamp"
    } else {
        data_type
    }
}

/// Write the CSV reference of one table
pub fn write_table_reference<W: io::Write>(writer: W, columns: &[ColumnInfo]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    writer.write_record(HEADERS)?;
    for column in columns {
        writer.write_record([
            column.name.as_str(),
            display_type(&column.data_type),
            column.description.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Create or update the CSV files in `output_dir` from the schema of the view `name`
pub async fn docs_table_ref(session: &Session, name: &str, output_dir: &Path) -> Result<()> {
    let schema = validate_name(&session.client, name).await?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for table in documented_tables() {
        let columns = list_columns(&session.client, &schema, &table).await?;
        if columns.is_empty() {
            tracing::warn!("⚠ {} has no columns in {}; was it built?", table, schema);
        }

        let path = output_dir.join(format!("{}.csv", table));
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_table_reference(file, &columns)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("✓ Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str, description: Option<&str>) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_display_type() {
        assert_eq!(display_type("timestamp without time zone"), "timestamp");
        assert_eq!(display_type("timestamp with time zone"), "timestamp");
        assert_eq!(display_type("jsonb"), "jsonb");
    }

    #[test]
    fn test_write_table_reference() {
        let columns = vec![
            column("id", "bigint", Some("Unique id, per release type")),
            column("created_at", "timestamp without time zone", None),
        ];

        let mut output = Vec::new();
        write_table_reference(&mut output, &columns).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Column Name,Data Type,Description\n\
             id,bigint,\"Unique id, per release type\"\n\
             created_at,timestamp,\n"
        );
    }
}
