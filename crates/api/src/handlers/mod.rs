//! Request handlers, one module per resource.

pub mod alarm;
pub mod notification;
pub mod reminder;
pub mod room;
pub mod trigger;

use hearth_core::error::CoreError;
use hearth_core::types::DbId;
use hearth_db::repositories::RoomRepo;
use hearth_db::DbPool;

use crate::error::{AppError, AppResult};

/// Reject callers that are not members of the room.
///
/// Membership is the whole authorization model: any member may read a
/// room's resources and dismiss its alarms; non-members may do nothing.
pub(crate) async fn ensure_member(pool: &DbPool, room_id: DbId, user_id: DbId) -> AppResult<()> {
    if RoomRepo::is_member(pool, room_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(format!(
            "User {user_id} is not a member of room {room_id}"
        ))))
    }
}
