//! Repository for the `users` table.

use sqlx::PgPool;

use hearth_core::types::DbId;

use crate::models::user::User;

/// Provides user materialization and lookup.
pub struct UserRepo;

impl UserRepo {
    /// Materialize a gateway-issued identity. Re-ensuring an existing id
    /// is a no-op that leaves the stored display name untouched.
    pub async fn ensure(
        pool: &PgPool,
        user_id: DbId,
        display_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, display_name) VALUES ($1, $2) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch a user by id.
    pub async fn get(pool: &PgPool, user_id: DbId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, display_name, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
