// ABOUTME: Grants read-only users access to the public, views and view schemas
// ABOUTME: Users are listed in the views.read_only_user table

use crate::postgres::schema::list_view_schemas;
use crate::utils::quote_identifiers;
use anyhow::{Context, Result};
use tokio_postgres::{Client, GenericClient};

/// Users that should be granted read-only access
pub async fn read_only_users<C: GenericClient>(client: &C) -> Result<Vec<String>> {
    let rows = client
        .query("SELECT username::text FROM views.read_only_user", &[])
        .await
        .context("Failed to query views.read_only_user")?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// The GRANT statements for one user
///
/// USAGE on `public`, `views` and every view schema; SELECT on all tables in
/// `public`, on `views.mapping_sheets`, and on all tables in every view schema.
pub fn grant_statements(user: &str, schemas: &[String]) -> Vec<String> {
    let user = quote_identifiers(&[user]);
    let mut statements = vec![
        format!("GRANT USAGE ON SCHEMA public, views TO {}", user),
        format!("GRANT SELECT ON ALL TABLES IN SCHEMA public TO {}", user),
        format!("GRANT SELECT ON TABLE views.mapping_sheets TO {}", user),
    ];

    if !schemas.is_empty() {
        let schemas = quote_identifiers(schemas);
        statements.push(format!("GRANT USAGE ON SCHEMA {} TO {}", schemas, user));
        statements.push(format!(
            "GRANT SELECT ON ALL TABLES IN SCHEMA {} TO {}",
            schemas, user
        ));
    }

    statements
}

/// Grant every read-only user access to all view schemas
///
/// Runs in one transaction. Returns the number of users granted.
pub async fn correct_user_permissions(client: &mut Client) -> Result<usize> {
    let transaction = client.transaction().await?;

    let schemas = list_view_schemas(&transaction).await?;
    let users = read_only_users(&transaction).await?;

    for user in &users {
        for statement in grant_statements(user, &schemas) {
            transaction
                .batch_execute(&statement)
                .await
                .with_context(|| format!("Failed to grant privileges to {}", user))?;
        }
        tracing::info!("✓ Granted read-only access to {}", user);
    }

    transaction
        .commit()
        .await
        .context("Failed to commit privilege grants")?;

    Ok(users.len())
}
