// ABOUTME: Command implementations for managing view schemas
// ABOUTME: Exports one function per CLI subcommand plus shared input validation

pub mod add_view;
pub mod correct_user_permissions;
pub mod delete_view;
pub mod docs_table_ref;
pub mod field_counts;
pub mod list_views;
pub mod refresh_views;

pub use add_view::{add_view, AddViewOptions};
pub use correct_user_permissions::correct_user_permissions;
pub use delete_view::delete_view;
pub use docs_table_ref::docs_table_ref;
pub use field_counts::field_counts;
pub use list_views::list_views;
pub use refresh_views::refresh_views;

use crate::error::Error;
use crate::postgres::schema::{missing_collections, schema_exists};
use crate::utils::schema_name;
use anyhow::Result;
use tokio_postgres::Client;

/// A database connection plus the URI it was opened from
///
/// The URI is kept so commands can open additional connections, one per
/// collection, for field counting.
pub struct Session {
    pub database_uri: String,
    pub client: Client,
}

impl Session {
    pub fn new(database_uri: String, client: Client) -> Self {
        Session {
            database_uri,
            client,
        }
    }
}

/// Parse comma-separated collection IDs
pub fn parse_collection_ids(value: &str) -> Result<Vec<i32>, Error> {
    value
        .split(',')
        .map(|id| id.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::usage("Collection IDs must be integers"))
}

/// Parse collection IDs and check they exist in the `collection` table
pub async fn validate_collections(client: &Client, value: &str) -> Result<Vec<i32>> {
    let ids = parse_collection_ids(value)?;

    let missing = missing_collections(client, &ids).await?;
    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(i32::to_string).collect();
        return Err(Error::usage(format!(
            "Collection IDs {{{}}} not found",
            missing.join(", ")
        ))
        .into());
    }

    Ok(ids)
}

/// Map a view name to its schema, checking the schema exists
pub async fn validate_name(client: &Client, name: &str) -> Result<String> {
    let schema = schema_name(name);

    if !schema_exists(client, &schema).await? {
        return Err(Error::usage(format!("SQL schema \"{}\" not found", schema)).into());
    }

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_ids() {
        assert_eq!(parse_collection_ids("1").unwrap(), vec![1]);
        assert_eq!(parse_collection_ids("3,1, 2").unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_parse_collection_ids_rejects_non_integers() {
        for value in ["a", "1,b", "", "1,,2", "1.5"] {
            let err = parse_collection_ids(value).unwrap_err();
            assert_eq!(err.to_string(), "Collection IDs must be integers");
        }
    }
}
