// ABOUTME: PostgreSQL utilities module
// ABOUTME: Exports connection management, introspection and privilege grants

pub mod connection;
pub mod privileges;
pub mod schema;

pub use connection::{connect, connect_with_retry};
pub use privileges::correct_user_permissions;
pub use schema::{list_view_schemas, schema_exists};
