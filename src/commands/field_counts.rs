// ABOUTME: field-counts command - Create, re-create or remove the field_counts table
// ABOUTME: Requires refresh-views to have created release_summary_with_data

use super::{validate_name, Session};
use crate::error::Error;
use crate::postgres::schema::relation_kind;
use crate::views;
use anyhow::Result;

/// Create (or re-create) the field_counts table in the schema of the view `name`
///
/// # Errors
///
/// Returns a usage error if the schema doesn't exist or has no
/// `release_summary_with_data` relation.
pub async fn field_counts(
    session: &Session,
    name: &str,
    remove: bool,
    threads: usize,
) -> Result<()> {
    let schema = validate_name(&session.client, name).await?;

    if relation_kind(&session.client, &schema, "release_summary_with_data")
        .await?
        .is_none()
    {
        return Err(Error::usage(
            "release_summary_with_data table not found. Run refresh-views first.",
        )
        .into());
    }

    views::field_counts(
        &session.client,
        &session.database_uri,
        &schema,
        remove,
        threads,
    )
    .await
}
