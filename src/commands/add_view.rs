// ABOUTME: add-view command - Create a schema summarizing one or more collections
// ABOUTME: Records the collections and a note, then optionally builds the summaries

use super::{validate_collections, Session};
use crate::error::Error;
use crate::postgres;
use crate::utils::{qualified_name, quote_identifier, schema_name};
use crate::views;
use anyhow::{Context, Result};

/// Views of more collections than this must be named explicitly
pub const MAX_UNNAMED_COLLECTIONS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct AddViewOptions {
    /// Custom name; `view_data_` is prepended to form the schema name
    pub name: Option<String>,
    /// Skip refresh-views, field-counts and correct-user-permissions
    pub dontbuild: bool,
    pub tables_only: bool,
    pub threads: usize,
}

/// The view name: the custom name if given, else `collection_<sorted ids>`
pub fn view_name(collections: &[i32], name: Option<&str>) -> Result<String, Error> {
    if let Some(name) = name.filter(|name| !name.is_empty()) {
        return Ok(name.to_string());
    }

    if collections.len() > MAX_UNNAMED_COLLECTIONS {
        return Err(Error::usage(
            "--name is required for more than 5 collections",
        ));
    }

    let mut ids = collections.to_vec();
    ids.sort_unstable();
    let ids: Vec<String> = ids.iter().map(i32::to_string).collect();
    Ok(format!("collection_{}", ids.join("_")))
}

/// Create a schema containing summary tables about one or more collections
///
/// This command:
/// 1. Validates the collection IDs and derives the view name
/// 2. Creates the schema with `selected_collections` and `note` tables
/// 3. Unless `dontbuild`, runs refresh-views, field-counts and
///    correct-user-permissions
///
/// # Arguments
///
/// * `collections` - Comma-separated collection IDs
/// * `note` - The creator's name and a description of the purpose
///
/// # Errors
///
/// Returns a usage error if the IDs are not integers or don't exist, or if
/// more than 5 collections are given without a name. Returns an error if the
/// schema already exists or any build step fails.
pub async fn add_view(
    session: &mut Session,
    collections: &str,
    note: &str,
    options: AddViewOptions,
) -> Result<()> {
    let collections = validate_collections(&session.client, collections).await?;
    let name = view_name(&collections, options.name.as_deref())?;
    let schema = schema_name(&name);

    let transaction = session.client.transaction().await?;

    transaction
        .batch_execute(&format!("CREATE SCHEMA {}", quote_identifier(&schema)))
        .await
        .with_context(|| format!("Failed to create schema {}", schema))?;

    transaction
        .batch_execute(&format!(
            "CREATE TABLE {} (id INTEGER PRIMARY KEY)",
            qualified_name(&schema, "selected_collections")
        ))
        .await
        .context("Failed to create selected_collections table")?;
    let insert_collections = format!(
        "INSERT INTO {} (id) SELECT unnest($1::integer[])",
        qualified_name(&schema, "selected_collections")
    );
    transaction
        .execute(insert_collections.as_str(), &[&collections])
        .await
        .context("Failed to record selected collections")?;

    transaction
        .batch_execute(&format!(
            "CREATE TABLE {} (id SERIAL, note TEXT NOT NULL, created_at TIMESTAMP WITHOUT TIME ZONE)",
            qualified_name(&schema, "note")
        ))
        .await
        .context("Failed to create note table")?;
    let insert_note = format!(
        "INSERT INTO {} (note, created_at) VALUES ($1, now() AT TIME ZONE 'UTC')",
        qualified_name(&schema, "note")
    );
    transaction
        .execute(insert_note.as_str(), &[&note])
        .await
        .context("Failed to record note")?;

    transaction
        .batch_execute(&format!(
            "ANALYZE {}",
            qualified_name(&schema, "selected_collections")
        ))
        .await?;

    transaction
        .commit()
        .await
        .context("Failed to commit new view schema")?;

    tracing::info!("Added {}", name);

    if options.dontbuild {
        return Ok(());
    }

    let mut message = format!("Running refresh-views {}", name);
    if options.tables_only {
        message.push_str(" --tables-only");
    }
    tracing::info!("{}", message);
    views::refresh_views(&mut session.client, &schema, false, options.tables_only).await?;

    let mut message = format!("Running field-counts {}", name);
    if options.threads != 1 {
        message.push_str(&format!(" --threads {}", options.threads));
    }
    tracing::info!("{}", message);
    views::field_counts(
        &session.client,
        &session.database_uri,
        &schema,
        false,
        options.threads,
    )
    .await?;

    tracing::info!("Running correct-user-permissions");
    postgres::correct_user_permissions(&mut session.client).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_name_from_sorted_ids() {
        assert_eq!(view_name(&[3, 1, 2], None).unwrap(), "collection_1_2_3");
        assert_eq!(view_name(&[7], None).unwrap(), "collection_7");
    }

    #[test]
    fn test_view_name_custom() {
        let ids: Vec<i32> = (1..=10).collect();
        assert_eq!(view_name(&ids, Some("everything")).unwrap(), "everything");
    }

    #[test]
    fn test_view_name_requires_name_for_many_collections() {
        let ids: Vec<i32> = (1..=6).collect();
        let err = view_name(&ids, None).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "--name is required for more than 5 collections"
        );

        let ids: Vec<i32> = (1..=5).collect();
        assert_eq!(view_name(&ids, None).unwrap(), "collection_1_2_3_4_5");
    }
}
