//! Handlers for the `/triggers` resource.
//!
//! Dismissal is the correctness-critical endpoint: the repository's
//! conditional update guarantees that among any set of concurrent
//! dismissal attempts exactly one is applied. A request that loses the
//! race still returns 200 with `applied: false`; clients treat that as
//! confirmation the alarm is already stopped.

use axum::extract::{Path, State};
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::kinds::{EVENT_ALARM_DISMISSED, NOTIFY_ALARM_DISMISSED};
use hearth_core::types::DbId;
use hearth_db::models::trigger::ActiveTrigger;
use hearth_db::repositories::{AlarmRepo, NotificationRepo, RoomRepo, TriggerRepo};
use hearth_events::RoomEvent;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_member;
use crate::middleware::Identity;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for a dismissal attempt.
#[derive(Debug, Serialize)]
pub struct DismissResponse {
    /// Whether this request performed the `ringing -> dismissed`
    /// transition. `false` means someone else already had.
    pub applied: bool,
}

/// GET /api/v1/rooms/{room_id}/triggers
///
/// The room's currently ringing triggers, joined with the alarm fields a
/// client needs to resolve its ring role.
pub async fn list_active(
    identity: Identity,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ActiveTrigger>>>> {
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let triggers = TriggerRepo::active_for_room(&state.pool, room_id).await?;

    Ok(Json(DataResponse { data: triggers }))
}

/// POST /api/v1/triggers/{trigger_id}/dismiss
///
/// Any room member may dismiss, the creator included; both get the same
/// semantics.
pub async fn dismiss_trigger(
    identity: Identity,
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DismissResponse>>> {
    let room_id = TriggerRepo::room_id(&state.pool, trigger_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        }))?;
    ensure_member(&state.pool, room_id, identity.user_id).await?;

    let applied = TriggerRepo::dismiss(&state.pool, trigger_id, identity.user_id).await?;

    if applied {
        fan_out_dismissal(&state, trigger_id, room_id, identity.user_id).await;
    } else {
        tracing::debug!(trigger_id, "Dismissal lost the race, already dismissed");
    }

    Ok(Json(DataResponse {
        data: DismissResponse { applied },
    }))
}

/// Notify room members and publish `alarm.dismissed`.
///
/// Runs only on the single request that won the conditional update, so
/// downstream consumers see exactly one dismissal per trigger. Failures
/// here are logged, not surfaced: the dismissal itself already happened.
async fn fan_out_dismissal(state: &AppState, trigger_id: DbId, room_id: DbId, by_user: DbId) {
    let alarm = match TriggerRepo::get(&state.pool, trigger_id).await {
        Ok(Some(trigger)) => AlarmRepo::get(&state.pool, trigger.alarm_id).await,
        Ok(None) => Ok(None),
        Err(e) => Err(e),
    };
    let alarm = match alarm {
        Ok(Some(alarm)) => alarm,
        Ok(None) => {
            tracing::error!(trigger_id, "Dismissed trigger has no alarm row");
            return;
        }
        Err(e) => {
            tracing::error!(trigger_id, error = %e, "Failed to load alarm for dismissal fan-out");
            return;
        }
    };

    let body = format!("Alarm \"{}\" was dismissed", alarm.title);
    let members = match RoomRepo::member_ids(&state.pool, room_id).await {
        Ok(members) => members,
        Err(e) => {
            tracing::error!(room_id, error = %e, "Failed to list members for dismissal fan-out");
            Vec::new()
        }
    };
    for user_id in members {
        if let Err(e) = NotificationRepo::create(
            &state.pool,
            user_id,
            room_id,
            NOTIFY_ALARM_DISMISSED,
            &body,
            Some(trigger_id),
            None,
        )
        .await
        {
            tracing::error!(user_id, trigger_id, error = %e, "Failed to create notification");
        }
    }

    state.event_bus.publish(
        RoomEvent::new(EVENT_ALARM_DISMISSED)
            .with_room(room_id)
            .with_actor(by_user)
            .with_payload(serde_json::json!({
                "trigger_id": trigger_id,
                "alarm_id": alarm.id,
                "alarm_title": alarm.title,
                "dismissed_by": by_user,
            })),
    );

    tracing::info!(trigger_id, room_id, by_user, "Alarm dismissed");
}
