// ABOUTME: refresh-views command - Create, re-create or remove summary tables
// ABOUTME: Thin wrapper validating the view name before running the scripts

use super::{validate_name, Session};
use crate::views;
use anyhow::Result;

/// Create (or re-create) the summary tables in the schema of the view `name`
pub async fn refresh_views(
    session: &mut Session,
    name: &str,
    remove: bool,
    tables_only: bool,
) -> Result<()> {
    let schema = validate_name(&session.client, name).await?;
    views::refresh_views(&mut session.client, &schema, remove, tables_only).await
}
