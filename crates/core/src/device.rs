//! Owning-device role resolution.
//!
//! An alarm binds at most one device as its owner at creation time; only
//! that device, connected as the alarm's creator, produces sound and
//! vibration. Everyone else (other devices of the creator included)
//! observes silently. The resolution is a pure comparison so the session
//! runtime can take the result as a constructor argument instead of
//! reading device storage mid-algorithm.

use crate::types::DbId;

/// The role a connected client plays for one ring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingRole {
    /// Entitled to sound and vibration, and to the auto-dismiss timer.
    Owner,
    /// Silent; may still dismiss.
    Observer,
}

impl RingRole {
    pub fn is_owner(self) -> bool {
        matches!(self, RingRole::Owner)
    }
}

/// Resolve the ring role for a connecting client.
///
/// `Owner` iff the client's user is the alarm's creator, the alarm has a
/// stored owner device id, and it equals the client's device id. The
/// device id may resolve asynchronously on first client load, so callers
/// re-invoke this whenever any input changes.
pub fn resolve_ring_role(
    user_id: DbId,
    device_id: &str,
    alarm_created_by: DbId,
    owner_device_id: Option<&str>,
) -> RingRole {
    let owns = user_id == alarm_created_by
        && owner_device_id.is_some_and(|owner| owner == device_id);
    if owns {
        RingRole::Owner
    } else {
        RingRole::Observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_on_owning_device_is_owner() {
        let role = resolve_ring_role(1, "dev-A", 1, Some("dev-A"));
        assert_eq!(role, RingRole::Owner);
    }

    #[test]
    fn creator_on_other_device_is_observer() {
        let role = resolve_ring_role(1, "dev-B", 1, Some("dev-A"));
        assert_eq!(role, RingRole::Observer);
    }

    #[test]
    fn other_user_on_owning_device_is_observer() {
        // Same physical device id, different account: still an observer.
        let role = resolve_ring_role(2, "dev-A", 1, Some("dev-A"));
        assert_eq!(role, RingRole::Observer);
    }

    #[test]
    fn alarm_without_owner_device_has_no_owner() {
        let role = resolve_ring_role(1, "dev-A", 1, None);
        assert_eq!(role, RingRole::Observer);
    }
}
