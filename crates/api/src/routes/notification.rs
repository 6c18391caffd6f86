//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /notifications                 -> list_notifications
/// GET    /notifications/unread-count    -> unread_count
/// POST   /notifications/read-all        -> mark_all_read
/// POST   /notifications/{id}/read       -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notification::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notification::unread_count),
        )
        .route("/notifications/read-all", post(notification::mark_all_read))
        .route("/notifications/{id}/read", post(notification::mark_read))
}
