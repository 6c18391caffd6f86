//! Handlers for the `/alarms` resource.
//!
//! Creation binds the creating client's device as the alarm's owning
//! device: the `x-device-id` header value is stored once and never
//! migrates automatically. An alarm created from a client with no device
//! identifier yet has no owning device and rings silently everywhere.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::recurrence::validate_schedule;
use hearth_core::types::DbId;
use hearth_db::models::alarm::{Alarm, CreateAlarm, UpdateAlarm};
use hearth_db::repositories::AlarmRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_member;
use crate::middleware::Identity;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/rooms/{room_id}/alarms
pub async fn create_alarm(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
    Json(input): Json<CreateAlarm>,
) -> AppResult<Json<DataResponse<Alarm>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;
    validate_schedule(input.ring_at_minutes, input.days)?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Alarm title must not be empty".to_string(),
        )));
    }

    let alarm = AlarmRepo::create(
        &state.pool,
        room_id,
        title,
        input.ring_at_minutes,
        input.days,
        identity.user_id,
        identity.device_id.as_deref(),
    )
    .await?;

    tracing::info!(
        alarm_id = alarm.id,
        room_id,
        owner_device = ?alarm.owner_device_id,
        "Alarm created"
    );

    Ok(Json(DataResponse { data: alarm }))
}

/// GET /api/v1/rooms/{room_id}/alarms
pub async fn list_alarms(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Alarm>>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let alarms = AlarmRepo::list_for_room(&state.pool, room_id).await?;

    Ok(Json(DataResponse { data: alarms }))
}

/// PUT /api/v1/alarms/{alarm_id}
///
/// Partial update; absent fields keep their current value. Any room
/// member may edit, matching the dismissal semantics.
pub async fn update_alarm(
    identity: Identity,
    State(state): State<AppState>,
    Path(alarm_id): Path<DbId>,
    Json(input): Json<UpdateAlarm>,
) -> AppResult<Json<DataResponse<Alarm>>> {
    let existing = AlarmRepo::get(&state.pool, alarm_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Alarm",
            id: alarm_id,
        }))?;
    ensure_member(&state.pool, existing.room_id, identity.user_id).await?;

    let ring_at_minutes = input.ring_at_minutes.unwrap_or(existing.ring_at_minutes);
    let days = input.days.unwrap_or(existing.days);
    validate_schedule(ring_at_minutes, days)?;

    let alarm = AlarmRepo::update(&state.pool, alarm_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Alarm",
            id: alarm_id,
        }))?;

    Ok(Json(DataResponse { data: alarm }))
}

/// POST /api/v1/alarms/{alarm_id}/deactivate
///
/// The normal-flow alternative to deletion: the alarm stops firing but
/// its history (and any still-ringing trigger) remains.
pub async fn deactivate_alarm(
    identity: Identity,
    State(state): State<AppState>,
    Path(alarm_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let existing = AlarmRepo::get(&state.pool, alarm_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Alarm",
            id: alarm_id,
        }))?;
    ensure_member(&state.pool, existing.room_id, identity.user_id).await?;

    AlarmRepo::deactivate(&state.pool, alarm_id).await?;
    tracing::info!(alarm_id, by_user = identity.user_id, "Alarm deactivated");

    Ok(StatusCode::NO_CONTENT)
}
