//! Handlers for the `/rooms` resource.

use axum::extract::{Path, State};
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::invite::generate_invite_code;
use hearth_core::types::DbId;
use hearth_db::models::room::{CreateRoom, JoinRoom, Room};
use hearth_db::models::user::User;
use hearth_db::repositories::{RoomRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_member;
use crate::middleware::Identity;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/rooms
///
/// Create a room with a fresh invite code; the creator becomes its first
/// member.
pub async fn create_room(
    identity: Identity,
    State(state): State<AppState>,
    Json(input): Json<CreateRoom>,
) -> AppResult<Json<DataResponse<Room>>> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Room name must not be empty".to_string(),
        )));
    }

    UserRepo::ensure(&state.pool, identity.user_id, &identity.display_name).await?;

    let invite_code = generate_invite_code();
    let room = RoomRepo::create(&state.pool, name, &invite_code, identity.user_id).await?;

    tracing::info!(room_id = room.id, created_by = identity.user_id, "Room created");

    Ok(Json(DataResponse { data: room }))
}

/// POST /api/v1/rooms/join
///
/// Join a room by invite code. Joining a room twice is a no-op.
pub async fn join_room(
    identity: Identity,
    State(state): State<AppState>,
    Json(input): Json<JoinRoom>,
) -> AppResult<Json<DataResponse<Room>>> {
    let room = RoomRepo::find_by_invite(&state.pool, input.invite_code.trim())
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown invite code".to_string()))?;

    UserRepo::ensure(&state.pool, identity.user_id, &identity.display_name).await?;
    RoomRepo::add_member(&state.pool, room.id, identity.user_id).await?;

    tracing::info!(room_id = room.id, user_id = identity.user_id, "User joined room");

    Ok(Json(DataResponse { data: room }))
}

/// GET /api/v1/rooms/{room_id}
pub async fn get_room(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Room>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let room = RoomRepo::get(&state.pool, room_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Room",
            id: room_id,
        }))?;

    Ok(Json(DataResponse { data: room }))
}

/// GET /api/v1/rooms/{room_id}/members
pub async fn list_members(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let members = RoomRepo::members(&state.pool, room_id).await?;

    Ok(Json(DataResponse { data: members }))
}
