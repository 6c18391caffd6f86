//! User entity model.
//!
//! User identities live in the fronting gateway; this table only
//! materializes the ids and display names the rest of the schema
//! references.

use serde::Serialize;
use sqlx::FromRow;

use hearth_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub display_name: String,
    pub created_at: Timestamp,
}
