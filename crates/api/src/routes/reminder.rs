//! Route definitions for the `/reminders` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::reminder;
use crate::state::AppState;

/// Routes for reminders.
///
/// ```text
/// POST   /rooms/{room_id}/reminders       -> create_reminder
/// GET    /rooms/{room_id}/reminders       -> list_reminders
/// POST   /reminders/{reminder_id}/done    -> mark_done
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms/{room_id}/reminders",
            post(reminder::create_reminder).get(reminder::list_reminders),
        )
        .route("/reminders/{reminder_id}/done", post(reminder::mark_done))
}
