// ABOUTME: list-views command - Print each view schema with its collections and notes
// ABOUTME: Output goes to stdout so it can be piped

use super::Session;
use crate::postgres::schema::{list_view_schemas, notes, selected_collections, NoteInfo};
use crate::utils::view_name;
use anyhow::Result;

/// Format one view schema's listing
pub fn format_view(schema: &str, collections: &[i32], notes: &[NoteInfo]) -> String {
    let mut lines = vec![
        "-----".to_string(),
        format!("Name: {}", view_name(schema)),
        format!("Schema: {}", schema),
    ];
    lines.extend(collections.iter().map(|id| format!("Collection ID: {}", id)));
    lines.extend(
        notes
            .iter()
            .map(|note| format!("Note: {} ({})", note.note, note.created_at)),
    );
    lines.join("\n")
}

/// List the view schemas, with collection IDs and creators' notes
pub async fn list_views(session: &Session) -> Result<()> {
    for schema in list_view_schemas(&session.client).await? {
        let collections = selected_collections(&session.client, &schema).await?;
        let notes = notes(&session.client, &schema).await?;
        println!("{}", format_view(&schema, &collections, &notes));
    }
    Ok(())
}
