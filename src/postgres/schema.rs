// ABOUTME: Schema introspection helpers for view schemas
// ABOUTME: Discovers view_data_ schemas, tables, collections and column metadata

use crate::utils::{qualified_name, quote_identifiers, SCHEMA_PREFIX};
use anyhow::{Context, Result};
use tokio_postgres::GenericClient;

/// Kind of relation reported by `information_schema.tables`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    View,
}

impl RelationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RelationKind::Table => "TABLE",
            RelationKind::View => "VIEW",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NoteInfo {
    pub note: String,
    pub created_at: String,
}

/// List all view schemas, ordered by name
pub async fn list_view_schemas<C: GenericClient>(client: &C) -> Result<Vec<String>> {
    let pattern = format!("{}%", SCHEMA_PREFIX.replace('_', "\\_"));
    let rows = client
        .query(
            "SELECT schema_name::text
             FROM information_schema.schemata
             WHERE schema_name LIKE $1
             ORDER BY schema_name",
            &[&pattern],
        )
        .await
        .context("Failed to list view schemas")?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

pub async fn schema_exists<C: GenericClient>(client: &C, schema: &str) -> Result<bool> {
    let row = client
        .query_opt(
            "SELECT 1 FROM information_schema.schemata WHERE schema_name = $1",
            &[&schema],
        )
        .await
        .with_context(|| format!("Failed to check whether schema {} exists", schema))?;

    Ok(row.is_some())
}

/// Whether `schema.name` is a table or a view, or `None` if it doesn't exist
pub async fn relation_kind<C: GenericClient>(
    client: &C,
    schema: &str,
    name: &str,
) -> Result<Option<RelationKind>> {
    let row = client
        .query_opt(
            "SELECT table_type::text
             FROM information_schema.tables
             WHERE table_schema = $1 AND table_name = $2",
            &[&schema, &name],
        )
        .await
        .with_context(|| format!("Failed to look up {}.{}", schema, name))?;

    Ok(row.map(|row| {
        let table_type: String = row.get(0);
        if table_type == "VIEW" {
            RelationKind::View
        } else {
            RelationKind::Table
        }
    }))
}

/// Set the search path for the rest of the session
pub async fn set_search_path<C: GenericClient>(client: &C, schemas: &[&str]) -> Result<()> {
    client
        .batch_execute(&format!("SET search_path = {}", quote_identifiers(schemas)))
        .await
        .context("Failed to set search path")
}

/// Return the IDs from `ids` that are absent from the `collection` table
pub async fn missing_collections<C: GenericClient>(client: &C, ids: &[i32]) -> Result<Vec<i32>> {
    let rows = client
        .query("SELECT id FROM collection WHERE id = ANY($1)", &[&ids])
        .await
        .context("Failed to query collection table")?;

    let found: Vec<i32> = rows.iter().map(|row| row.get(0)).collect();
    let mut missing: Vec<i32> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    missing.sort_unstable();
    missing.dedup();
    Ok(missing)
}

/// Collection IDs recorded in a view schema
pub async fn selected_collections<C: GenericClient>(client: &C, schema: &str) -> Result<Vec<i32>> {
    let query = format!(
        "SELECT id FROM {} ORDER BY id",
        qualified_name(schema, "selected_collections")
    );
    let rows = client
        .query(query.as_str(), &[])
        .await
        .with_context(|| format!("Failed to read selected collections of {}", schema))?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

pub async fn notes<C: GenericClient>(client: &C, schema: &str) -> Result<Vec<NoteInfo>> {
    let query = format!(
        "SELECT note, to_char(created_at, 'YYYY-MM-DD HH24:MI:SS')
         FROM {}
         ORDER BY created_at",
        qualified_name(schema, "note")
    );
    let rows = client
        .query(query.as_str(), &[])
        .await
        .with_context(|| format!("Failed to read notes of {}", schema))?;

    Ok(rows
        .iter()
        .map(|row| NoteInfo {
            note: row.get(0),
            created_at: row.get::<_, Option<String>>(1).unwrap_or_default(),
        })
        .collect())
}

/// Columns of a table with their types and comments, in ordinal order
pub async fn list_columns<C: GenericClient>(
    client: &C,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnInfo>> {
    let rows = client
        .query(
            "SELECT
                isc.column_name::text,
                isc.data_type::text,
                pg_catalog.col_description(
                    format('%I.%I', isc.table_schema, isc.table_name)::regclass::oid,
                    isc.ordinal_position
                )
             FROM information_schema.columns isc
             WHERE isc.table_schema = $1 AND LOWER(isc.table_name) = LOWER($2)
             ORDER BY isc.ordinal_position",
            &[&schema, &table],
        )
        .await
        .with_context(|| format!("Failed to list columns of {}.{}", schema, table))?;

    Ok(rows
        .iter()
        .map(|row| ColumnInfo {
            name: row.get(0),
            data_type: row.get(1),
            description: row.get(2),
        })
        .collect())
}
