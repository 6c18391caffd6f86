//! Route definitions for the `/triggers` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::trigger;
use crate::state::AppState;

/// Routes for alarm triggers.
///
/// ```text
/// GET    /rooms/{room_id}/triggers         -> list_active
/// POST   /triggers/{trigger_id}/dismiss    -> dismiss_trigger
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room_id}/triggers", get(trigger::list_active))
        .route(
            "/triggers/{trigger_id}/dismiss",
            post(trigger::dismiss_trigger),
        )
}
