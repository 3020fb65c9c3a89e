// ABOUTME: correct-user-permissions command - Grant read-only users access to view schemas
// ABOUTME: Delegates to the privilege grants in the postgres module

use super::Session;
use crate::postgres;
use anyhow::Result;

/// Grant the users in `views.read_only_user` the USAGE privilege on the
/// public, views and view schemas, and the SELECT privilege on their tables
pub async fn correct_user_permissions(session: &mut Session) -> Result<()> {
    let granted = postgres::correct_user_permissions(&mut session.client).await?;
    if granted == 0 {
        tracing::warn!("⚠ No users found in views.read_only_user");
    }
    Ok(())
}
