pub mod alarm;
pub mod health;
pub mod notification;
pub mod reminder;
pub mod room;
pub mod trigger;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                    WebSocket push channel
///
/// /rooms                                 create
/// /rooms/join                            join by invite code
/// /rooms/{room_id}                       get
/// /rooms/{room_id}/members               list members
///
/// /rooms/{room_id}/alarms                create, list
/// /alarms/{alarm_id}                     update
/// /alarms/{alarm_id}/deactivate          deactivate
///
/// /rooms/{room_id}/triggers              list ringing triggers
/// /triggers/{trigger_id}/dismiss         conditional dismissal
///
/// /rooms/{room_id}/reminders             create, list
/// /reminders/{reminder_id}/done          mark done
///
/// /notifications                         list
/// /notifications/unread-count            unread count
/// /notifications/read-all                mark all read
/// /notifications/{id}/read               mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(room::router())
        .merge(alarm::router())
        .merge(trigger::router())
        .merge(reminder::router())
        .merge(notification::router())
}
