// ABOUTME: Builds the field_counts table of a view schema
// ABOUTME: Counts JSON paths per collection, with one connection per collection in flight

use crate::postgres::connect;
use crate::postgres::schema::{selected_collections, set_search_path};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tokio_postgres::Client;

pub const FIELD_COUNTS_TABLE: &str = "field_counts";

const CREATE_TABLE: &str = "
    CREATE TABLE field_counts (
        collection_id bigint,
        release_type text,
        path text,
        object_property bigint,
        array_count bigint,
        distinct_releases bigint
    );

    COMMENT ON COLUMN field_counts.collection_id IS 'id from the kingfisher collection table';
    COMMENT ON COLUMN field_counts.release_type IS 'Either release, compiled_release or record';
    COMMENT ON COLUMN field_counts.path IS 'JSON path of the field, with object keys separated by a slash';
    COMMENT ON COLUMN field_counts.object_property IS 'Number of times the path appears as an object property';
    COMMENT ON COLUMN field_counts.array_count IS 'Number of times the path appears as an array item';
    COMMENT ON COLUMN field_counts.distinct_releases IS 'Number of distinct releases in which the path appears';
";

const INSERT_COUNTS: &str = "
    INSERT INTO field_counts
    SELECT
        collection_id,
        release_type,
        path,
        sum(object_property) AS object_property,
        sum(array_item) AS array_count,
        count(DISTINCT id) AS distinct_releases
    FROM
        release_summary_with_data
        CROSS JOIN flatten(data)
    WHERE
        collection_id = $1
    GROUP BY
        collection_id,
        release_type,
        path
";

/// Number of collections processed concurrently, between 1 and `collections`
pub fn worker_count(threads: usize, collections: usize) -> usize {
    threads.min(collections).max(1)
}

/// Create (or re-create) the `field_counts` table in `schema`
///
/// Each collection in `selected_collections` is counted on its own
/// connection opened from `database_uri`, with at most `threads` collections
/// in flight. With `remove`, only drops the table.
///
/// # Errors
///
/// Returns an error if the table cannot be created, or if counting fails for
/// any collection. Counts of the other collections are kept.
pub async fn field_counts(
    client: &Client,
    database_uri: &str,
    schema: &str,
    remove: bool,
    threads: usize,
) -> Result<()> {
    set_search_path(client, &[schema, "public"]).await?;

    client
        .batch_execute("DROP TABLE IF EXISTS field_counts")
        .await
        .context("Failed to drop field_counts table")?;

    if remove {
        tracing::info!("✓ Removed field_counts from {}", schema);
        return Ok(());
    }

    client
        .batch_execute(CREATE_TABLE)
        .await
        .context("Failed to create field_counts table")?;

    let collections = selected_collections(client, schema).await?;
    let workers = worker_count(threads, collections.len());
    tracing::info!(
        "Counting fields for {} collection(s) (concurrency: {})",
        collections.len(),
        workers
    );

    let progress = ProgressBar::new(collections.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let results: Vec<(i32, Result<u64>)> = stream::iter(collections)
        .map(|collection_id| {
            let pb = progress.clone();
            async move {
                let started = Instant::now();
                let result = count_collection(database_uri, schema, collection_id).await;
                pb.inc(1);
                pb.set_message(format!(
                    "Counted collection {} in {:.1}s",
                    collection_id,
                    started.elapsed().as_secs_f64()
                ));
                (collection_id, result)
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    progress.finish_with_message("Field counts complete");

    let mut failures = 0;
    for (collection_id, result) in results {
        match result {
            Ok(rows) => tracing::info!("  ✓ Collection {}: {} paths", collection_id, rows),
            Err(e) => {
                tracing::error!("  ✗ Collection {}: {:#}", collection_id, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("Field counts failed for {} collection(s)", failures);
    }

    client
        .batch_execute("ANALYZE field_counts")
        .await
        .context("Failed to analyze field_counts")?;

    Ok(())
}

async fn count_collection(database_uri: &str, schema: &str, collection_id: i32) -> Result<u64> {
    let worker = connect(database_uri)
        .await
        .with_context(|| format!("Failed to connect for collection {}", collection_id))?;
    set_search_path(&worker, &[schema, "public"]).await?;

    worker
        .execute(INSERT_COUNTS, &[&collection_id])
        .await
        .with_context(|| format!("Failed to count fields of collection {}", collection_id))
}
