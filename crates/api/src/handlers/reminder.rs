//! Handlers for the `/reminders` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::types::DbId;
use hearth_db::models::reminder::{CreateReminder, Reminder};
use hearth_db::repositories::ReminderRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_member;
use crate::middleware::Identity;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/rooms/{room_id}/reminders
pub async fn create_reminder(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
    Json(input): Json<CreateReminder>,
) -> AppResult<Json<DataResponse<Reminder>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Reminder title must not be empty".to_string(),
        )));
    }

    let reminder =
        ReminderRepo::create(&state.pool, room_id, title, input.due_at, identity.user_id).await?;

    tracing::info!(reminder_id = reminder.id, room_id, "Reminder created");

    Ok(Json(DataResponse { data: reminder }))
}

/// GET /api/v1/rooms/{room_id}/reminders
pub async fn list_reminders(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Reminder>>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let reminders = ReminderRepo::list_for_room(&state.pool, room_id).await?;

    Ok(Json(DataResponse { data: reminders }))
}

/// POST /api/v1/reminders/{reminder_id}/done
///
/// Marking an already-done reminder done again is a no-op, not an error.
pub async fn mark_done(
    identity: Identity,
    State(state): State<AppState>,
    Path(reminder_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let room_id = ReminderRepo::room_id(&state.pool, reminder_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reminder",
            id: reminder_id,
        }))?;
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    ReminderRepo::mark_done(&state.pool, reminder_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
