//! Route definitions for the `/alarms` resource.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::alarm;
use crate::state::AppState;

/// Routes for alarms.
///
/// ```text
/// POST   /rooms/{room_id}/alarms        -> create_alarm
/// GET    /rooms/{room_id}/alarms        -> list_alarms
/// PUT    /alarms/{alarm_id}             -> update_alarm
/// POST   /alarms/{alarm_id}/deactivate  -> deactivate_alarm
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rooms/{room_id}/alarms",
            post(alarm::create_alarm).get(alarm::list_alarms),
        )
        .route("/alarms/{alarm_id}", put(alarm::update_alarm))
        .route(
            "/alarms/{alarm_id}/deactivate",
            post(alarm::deactivate_alarm),
        )
}
