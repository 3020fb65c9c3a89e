// ABOUTME: Utility functions shared by commands
// ABOUTME: Provides identifier quoting, schema naming, and retry logic

use anyhow::Result;
use std::time::Duration;

/// Prefix of every schema managed by this tool.
pub const SCHEMA_PREFIX: &str = "view_data_";

/// Schema name for a view name, e.g. `collection_1_2` -> `view_data_collection_1_2`
pub fn schema_name(name: &str) -> String {
    format!("{}{}", SCHEMA_PREFIX, name)
}

/// View name for a schema name, the inverse of [`schema_name`]
pub fn view_name(schema: &str) -> &str {
    schema.strip_prefix(SCHEMA_PREFIX).unwrap_or(schema)
}

/// Quote an SQL identifier (schema, table, role name)
///
/// Wraps the identifier in double quotes and doubles any embedded double
/// quotes, so the result is always a single identifier token.
///
/// # Examples
///
/// ```
/// # use ocdskingfisher_views::utils::quote_identifier;
/// assert_eq!(quote_identifier("view_data_x"), "\"view_data_x\"");
/// assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quote a schema-qualified relation name, e.g. `"view_data_x"."note"`
pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_identifier(schema), quote_identifier(name))
}

/// Quote and comma-join a list of identifiers
pub fn quote_identifiers<S: AsRef<str>>(identifiers: &[S]) -> String {
    identifiers
        .iter()
        .map(|identifier| quote_identifier(identifier.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Retry a function with exponential backoff
///
/// Executes an async operation with automatic retry on failure. Each retry doubles
/// the delay (exponential backoff) to handle transient failures gracefully.
///
/// # Arguments
///
/// * `operation` - Async function to retry (FnMut returning Future\<Output = Result\<T\>\>)
/// * `max_retries` - Maximum number of retry attempts (0 = no retries, just initial attempt)
/// * `initial_delay` - Delay before first retry (doubles each subsequent retry)
///
/// # Returns
///
/// Returns the successful result or the last error after all retries exhausted.
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                last_error = Some(e);

                if attempt < max_retries {
                    tracing::warn!(
                        "Operation failed (attempt {}/{}), retrying in {:?}...",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Operation failed after retries")))
}
