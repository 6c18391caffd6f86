//! Route definitions for the `/rooms` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::room;
use crate::state::AppState;

/// Routes mounted at `/rooms`.
///
/// ```text
/// POST   /rooms                    -> create_room
/// POST   /rooms/join               -> join_room
/// GET    /rooms/{room_id}          -> get_room
/// GET    /rooms/{room_id}/members  -> list_members
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(room::create_room))
        .route("/rooms/join", post(room::join_room))
        .route("/rooms/{room_id}", get(room::get_room))
        .route("/rooms/{room_id}/members", get(room::list_members))
}
