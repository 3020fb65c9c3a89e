// ABOUTME: delete-view command - Drop a view schema
// ABOUTME: CASCADE drops every table, view and function in the schema

use super::{validate_name, Session};
use crate::utils::quote_identifier;
use anyhow::{Context, Result};

/// Drop the schema of the view `name`
///
/// # Errors
///
/// Returns a usage error if the schema doesn't exist.
pub async fn delete_view(session: &Session, name: &str) -> Result<()> {
    let schema = validate_name(&session.client, name).await?;

    let statement = format!("DROP SCHEMA {} CASCADE", quote_identifier(&schema));
    session
        .client
        .batch_execute(&statement)
        .await
        .with_context(|| format!("Failed to drop schema {}", schema))?;

    tracing::info!("{}", statement);
    Ok(())
}
