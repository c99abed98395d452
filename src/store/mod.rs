//! Persistence boundary.
//!
//! Services never talk to the database directly; they go through [`Store`],
//! which mirrors the table and procedure contracts the application relies on.
//! [`PgStore`] is the production backend, [`MemoryStore`] keeps the same
//! semantics in process.

pub mod memory;
pub mod postgres;

use crate::error::AppResult;
use crate::models::{
    AcademicReportModel, InboxEntry, MessageModel, NewAcademicReport, NewMessage,
    NewNotification, NewTutoringSession, NewUser, NotificationModel, Role, StudentProfileModel,
    TutoringSessionModel, UserModel,
};
use async_trait::async_trait;
use sea_orm::prelude::DateTime;
use std::sync::Arc;

pub use memory::{MemoryStore, StoreOp};
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> AppResult<UserModel>;

    async fn find_user(&self, id: i32) -> AppResult<Option<UserModel>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>>;

    async fn any_user_with_role(&self, role: Role) -> AppResult<bool>;

    /// Insert or replace the profile keyed by `profile.user_id`.
    async fn save_student_profile(
        &self,
        profile: StudentProfileModel,
    ) -> AppResult<StudentProfileModel>;

    async fn find_student_profile(&self, user_id: i32) -> AppResult<Option<StudentProfileModel>>;

    /// Create a notification and return the stored row (unread, `read_at` empty).
    async fn insert_notification(&self, notification: NewNotification)
        -> AppResult<NotificationModel>;

    /// Newest first, at most `limit` rows.
    async fn list_notifications(&self, user_id: i32, limit: u64)
        -> AppResult<Vec<NotificationModel>>;

    async fn count_unread_notifications(&self, user_id: i32) -> AppResult<u64>;

    async fn find_notification(&self, id: i32) -> AppResult<Option<NotificationModel>>;

    async fn unread_notification_ids(&self, user_id: i32) -> AppResult<Vec<i32>>;

    /// Flip one unread notification to read and stamp `read_at` in the same
    /// statement. Returns the number of rows changed, so a repeat returns 0.
    async fn mark_notification_read(&self, id: i32, at: DateTime) -> AppResult<u64>;

    async fn insert_message(&self, message: NewMessage) -> AppResult<MessageModel>;

    /// Messages addressed to `user_id`, newest first, with the sender's display name.
    async fn list_inbox(&self, user_id: i32, limit: u64) -> AppResult<Vec<InboxEntry>>;

    async fn find_message(&self, id: i32) -> AppResult<Option<MessageModel>>;

    async fn mark_message_read(&self, id: i32, at: DateTime) -> AppResult<u64>;

    async fn insert_academic_report(
        &self,
        report: NewAcademicReport,
    ) -> AppResult<AcademicReportModel>;

    async fn insert_tutoring_session(
        &self,
        session: NewTutoringSession,
    ) -> AppResult<TutoringSessionModel>;

    async fn ping(&self) -> bool;
}

pub(crate) fn now() -> DateTime {
    chrono::Utc::now().naive_utc()
}

/// Display name used when the sender row has disappeared.
pub(crate) const UNKNOWN_SENDER: &str = "Usuario desconocido";
