use super::{now, Store, UNKNOWN_SENDER};
use crate::error::{AppError, AppResult};
use crate::models::{
    academic_report::SubjectList, tutoring_session::StudentIds, AcademicReportModel, InboxEntry,
    MessageModel, NewAcademicReport, NewMessage, NewNotification, NewTutoringSession, NewUser,
    NotificationModel, Role, StudentProfileModel, TutoringSessionModel, UserModel,
};
use async_trait::async_trait;
use sea_orm::prelude::DateTime;
use sea_orm::DbErr;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertNotification,
    ListNotifications,
    CountUnread,
    FindNotification,
    MarkNotificationRead,
    InsertMessage,
    ListInbox,
    InsertAcademicReport,
    InsertTutoringSession,
    FindStudentProfile,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, UserModel>,
    students: BTreeMap<i32, StudentProfileModel>,
    notifications: BTreeMap<i32, NotificationModel>,
    messages: BTreeMap<i32, MessageModel>,
    reports: BTreeMap<i32, AcademicReportModel>,
    sessions: BTreeMap<i32, TutoringSessionModel>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Faults {
    calls: HashMap<StoreOp, usize>,
    nth: HashSet<(StoreOp, usize)>,
    always: HashSet<StoreOp>,
    read_behind_next_find: Option<DateTime>,
}

/// In-process [`Store`] with the same read/unread semantics as [`super::PgStore`].
///
/// Used by the test suites and by `STORE_BACKEND=memory`. Individual
/// operations can be told to fail, either on their n-th call or every time.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` call (1-based, counted from now on) to `op` fail.
    pub fn fail_nth(&self, op: StoreOp, nth: usize) {
        let mut faults = self.lock_faults();
        let seen = faults.calls.get(&op).copied().unwrap_or(0);
        faults.nth.insert((op, seen + nth));
    }

    pub fn fail_always(&self, op: StoreOp) {
        self.lock_faults().always.insert(op);
    }

    pub fn heal(&self, op: StoreOp) {
        let mut faults = self.lock_faults();
        faults.always.remove(&op);
        faults.nth.retain(|(o, _)| *o != op);
    }

    /// Let another writer mark the row read at `at` right after the next
    /// `find_notification` returned it, so the caller holds a stale copy.
    pub fn mark_read_behind_next_find(&self, at: DateTime) {
        self.lock_faults().read_behind_next_find = Some(at);
    }

    /// How many times `op` has been attempted, failed attempts included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock_faults().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn notification_count(&self) -> usize {
        self.lock_tables().notifications.len()
    }

    pub fn message_count(&self) -> usize {
        self.lock_tables().messages.len()
    }

    pub fn all_notifications(&self) -> Vec<NotificationModel> {
        self.lock_tables().notifications.values().cloned().collect()
    }

    fn check(&self, op: StoreOp) -> AppResult<()> {
        let mut faults = self.lock_faults();
        let count = faults.calls.entry(op).or_insert(0);
        *count += 1;
        let call = *count;
        if faults.always.contains(&op) || faults.nth.remove(&(op, call)) {
            tracing::debug!(?op, call, "injected store failure");
            return Err(AppError::Database(DbErr::Custom(format!(
                "injected failure on {op:?} call {call}"
            ))));
        }
        Ok(())
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime, i32)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> AppResult<UserModel> {
        let mut tables = self.lock_tables();
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Database(DbErr::Custom(format!(
                "duplicate key value violates unique constraint: email {}",
                new_user.email
            ))));
        }
        let id = tables.next_id();
        let user = UserModel {
            id,
            email: new_user.email,
            full_name: new_user.full_name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i32) -> AppResult<Option<UserModel>> {
        Ok(self.lock_tables().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        Ok(self
            .lock_tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn any_user_with_role(&self, role: Role) -> AppResult<bool> {
        Ok(self.lock_tables().users.values().any(|u| u.role == role))
    }

    async fn save_student_profile(
        &self,
        mut profile: StudentProfileModel,
    ) -> AppResult<StudentProfileModel> {
        profile.updated_at = now();
        self.lock_tables()
            .students
            .insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn find_student_profile(&self, user_id: i32) -> AppResult<Option<StudentProfileModel>> {
        self.check(StoreOp::FindStudentProfile)?;
        Ok(self.lock_tables().students.get(&user_id).cloned())
    }

    async fn insert_notification(
        &self,
        new: NewNotification,
    ) -> AppResult<NotificationModel> {
        self.check(StoreOp::InsertNotification)?;
        let mut tables = self.lock_tables();
        let id = tables.next_id();
        let row = NotificationModel {
            id,
            user_id: new.user_id,
            kind: new.kind(),
            title: new.title,
            body: new.body,
            is_read: false,
            created_at: now(),
            read_at: None,
            priority: new.priority,
            payload: new.payload,
        };
        tables.notifications.insert(id, row.clone());
        Ok(row)
    }

    async fn list_notifications(
        &self,
        user_id: i32,
        limit: u64,
    ) -> AppResult<Vec<NotificationModel>> {
        self.check(StoreOp::ListNotifications)?;
        let mut rows: Vec<_> = self
            .lock_tables()
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn count_unread_notifications(&self, user_id: i32) -> AppResult<u64> {
        self.check(StoreOp::CountUnread)?;
        Ok(self
            .lock_tables()
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn find_notification(&self, id: i32) -> AppResult<Option<NotificationModel>> {
        self.check(StoreOp::FindNotification)?;
        let interleaved = self.lock_faults().read_behind_next_find.take();
        let mut tables = self.lock_tables();
        let found = tables.notifications.get(&id).cloned();
        if let (Some(at), Some(row)) = (interleaved, tables.notifications.get_mut(&id)) {
            if !row.is_read {
                row.is_read = true;
                row.read_at = Some(at);
            }
        }
        Ok(found)
    }

    async fn unread_notification_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        let mut rows: Vec<_> = self
            .lock_tables()
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .map(|n| (n.created_at, n.id))
            .collect();
        newest_first(&mut rows, |r| *r);
        Ok(rows.into_iter().map(|(_, id)| id).collect())
    }

    async fn mark_notification_read(&self, id: i32, at: DateTime) -> AppResult<u64> {
        self.check(StoreOp::MarkNotificationRead)?;
        let mut tables = self.lock_tables();
        match tables.notifications.get_mut(&id) {
            Some(row) if !row.is_read => {
                row.is_read = true;
                row.read_at = Some(at);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_message(&self, new: NewMessage) -> AppResult<MessageModel> {
        self.check(StoreOp::InsertMessage)?;
        let mut tables = self.lock_tables();
        let id = tables.next_id();
        let row = MessageModel {
            id,
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            subject: new.subject,
            body: new.body,
            is_read: false,
            sent_at: now(),
            read_at: None,
            conversation: new.conversation,
        };
        tables.messages.insert(id, row.clone());
        Ok(row)
    }

    async fn list_inbox(&self, user_id: i32, limit: u64) -> AppResult<Vec<InboxEntry>> {
        self.check(StoreOp::ListInbox)?;
        let tables = self.lock_tables();
        let mut rows: Vec<_> = tables
            .messages
            .values()
            .filter(|m| m.recipient_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |m| (m.sent_at, m.id));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(rows
            .into_iter()
            .map(|message| {
                let sender_name = tables
                    .users
                    .get(&message.sender_id)
                    .map(|u| u.full_name.clone())
                    .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
                InboxEntry {
                    message,
                    sender_name,
                }
            })
            .collect())
    }

    async fn find_message(&self, id: i32) -> AppResult<Option<MessageModel>> {
        Ok(self.lock_tables().messages.get(&id).cloned())
    }

    async fn mark_message_read(&self, id: i32, at: DateTime) -> AppResult<u64> {
        let mut tables = self.lock_tables();
        match tables.messages.get_mut(&id) {
            Some(row) if !row.is_read => {
                row.is_read = true;
                row.read_at = Some(at);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_academic_report(
        &self,
        new: NewAcademicReport,
    ) -> AppResult<AcademicReportModel> {
        self.check(StoreOp::InsertAcademicReport)?;
        let mut tables = self.lock_tables();
        let id = tables.next_id();
        let row = AcademicReportModel {
            id,
            student_id: new.student_id,
            tutor_id: new.tutor_id,
            parcial: new.parcial,
            subjects: SubjectList(new.subjects),
            created_at: now(),
        };
        tables.reports.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_tutoring_session(
        &self,
        new: NewTutoringSession,
    ) -> AppResult<TutoringSessionModel> {
        self.check(StoreOp::InsertTutoringSession)?;
        let mut tables = self.lock_tables();
        let id = tables.next_id();
        let row = TutoringSessionModel {
            id,
            tutor_id: new.tutor_id,
            title: new.title,
            scheduled_at: new.scheduled_at,
            kind: new.kind,
            student_ids: StudentIds(new.student_ids),
            created_at: now(),
        };
        tables.sessions.insert(id, row.clone());
        Ok(row)
    }

    async fn ping(&self) -> bool {
        true
    }
}
