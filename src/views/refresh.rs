// ABOUTME: Creates, re-creates or removes the summary tables in a view schema
// ABOUTME: Runs each SQL script in its own transaction, dropping its relations first

use crate::postgres::schema::{relation_kind, set_search_path};
use crate::utils::qualified_name;
use crate::views::scripts::{Script, SCRIPTS};
use anyhow::{Context, Result};
use std::time::Instant;
use tokio_postgres::{Client, GenericClient};

/// Run the script library against `schema`
///
/// With `remove`, only drops the relations the scripts create, in reverse
/// order. Otherwise each script's relations are dropped and the script is run
/// again, so the command is safe to repeat. With `tables_only`, views are
/// created as tables.
///
/// # Errors
///
/// Returns an error if a script fails; relations built by earlier scripts
/// are kept, and the failing script's transaction is rolled back.
pub async fn refresh_views(
    client: &mut Client,
    schema: &str,
    remove: bool,
    tables_only: bool,
) -> Result<()> {
    set_search_path(&*client, &[schema, "public"]).await?;

    if remove {
        let transaction = client.transaction().await?;
        for script in SCRIPTS.iter().rev() {
            drop_relations(&transaction, schema, script).await?;
        }
        transaction
            .commit()
            .await
            .context("Failed to commit removal of summary tables")?;
        tracing::info!("✓ Removed summary tables from {}", schema);
        return Ok(());
    }

    let total = SCRIPTS.len();
    for (idx, script) in SCRIPTS.iter().enumerate() {
        tracing::info!("Running {} ({}/{})", script.name, idx + 1, total);
        let started = Instant::now();

        let transaction = client.transaction().await?;
        drop_relations(&transaction, schema, script).await?;
        transaction
            .batch_execute(&script.sql(tables_only))
            .await
            .with_context(|| format!("Failed to run {}.sql in {}", script.name, schema))?;
        transaction
            .commit()
            .await
            .with_context(|| format!("Failed to commit {}.sql", script.name))?;

        tracing::info!(
            "✓ {} completed in {:.1}s",
            script.name,
            started.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Drop the relations `script` creates, as tables or views, whichever exists
async fn drop_relations<C: GenericClient>(client: &C, schema: &str, script: &Script) -> Result<()> {
    for name in script.created_relations().iter().rev() {
        if let Some(kind) = relation_kind(client, schema, name).await? {
            let statement = format!(
                "DROP {} IF EXISTS {} CASCADE",
                kind.keyword(),
                qualified_name(schema, name)
            );
            tracing::debug!("{}", statement);
            client
                .batch_execute(&statement)
                .await
                .with_context(|| format!("Failed to drop {}.{}", schema, name))?;
        }
    }
    Ok(())
}
