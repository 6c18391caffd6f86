//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod alarm_repo;
pub mod event_repo;
pub mod notification_repo;
pub mod reminder_repo;
pub mod room_repo;
pub mod trigger_repo;
pub mod user_repo;

pub use alarm_repo::AlarmRepo;
pub use event_repo::EventRepo;
pub use notification_repo::NotificationRepo;
pub use reminder_repo::ReminderRepo;
pub use room_repo::RoomRepo;
pub use trigger_repo::TriggerRepo;
pub use user_repo::UserRepo;
