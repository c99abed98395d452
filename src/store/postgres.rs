use super::{now, Store, UNKNOWN_SENDER};
use crate::error::AppResult;
use crate::models::{
    academic_report, message, notification, student, tutoring_session, user, AcademicReportModel,
    InboxEntry, Message, MessageModel, NewAcademicReport, NewMessage, NewNotification,
    NewTutoringSession, NewUser, Notification, NotificationModel, Role, StudentProfile,
    StudentProfileModel, TutoringSessionModel, User, UserModel,
};
use async_trait::async_trait;
use sea_orm::prelude::DateTime;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Postgres takes LIMIT as a signed bigint; anything past it means no limit.
fn row_limit(limit: u64) -> Option<u64> {
    (limit <= i64::MAX as u64).then_some(limit)
}

#[derive(Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, new_user: NewUser) -> AppResult<UserModel> {
        let model = user::ActiveModel {
            email: Set(new_user.email),
            full_name: Set(new_user.full_name),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            created_at: Set(now()),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_user(&self, id: i32) -> AppResult<Option<UserModel>> {
        Ok(User::find_by_id(id).one(&self.db).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    async fn any_user_with_role(&self, role: Role) -> AppResult<bool> {
        let found = User::find()
            .filter(user::Column::Role.eq(role))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn save_student_profile(
        &self,
        profile: StudentProfileModel,
    ) -> AppResult<StudentProfileModel> {
        let exists = StudentProfile::find_by_id(profile.user_id)
            .one(&self.db)
            .await?
            .is_some();

        let active = student::ActiveModel {
            user_id: Set(profile.user_id),
            tutor_id: Set(profile.tutor_id),
            semester: Set(profile.semester),
            social_service_completed: Set(profile.social_service_completed),
            internship_completed: Set(profile.internship_completed),
            failed_subjects_count: Set(profile.failed_subjects_count),
            updated_at: Set(now()),
        };

        let saved = if exists {
            active.update(&self.db).await?
        } else {
            active.insert(&self.db).await?
        };
        Ok(saved)
    }

    async fn find_student_profile(&self, user_id: i32) -> AppResult<Option<StudentProfileModel>> {
        Ok(StudentProfile::find_by_id(user_id).one(&self.db).await?)
    }

    async fn insert_notification(
        &self,
        new: NewNotification,
    ) -> AppResult<NotificationModel> {
        let model = notification::ActiveModel {
            user_id: Set(new.user_id),
            kind: Set(new.kind()),
            title: Set(new.title),
            body: Set(new.body),
            is_read: Set(false),
            created_at: Set(now()),
            read_at: Set(None),
            priority: Set(new.priority),
            payload: Set(new.payload),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn list_notifications(
        &self,
        user_id: i32,
        limit: u64,
    ) -> AppResult<Vec<NotificationModel>> {
        Ok(Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(row_limit(limit))
            .all(&self.db)
            .await?)
    }

    async fn count_unread_notifications(&self, user_id: i32) -> AppResult<u64> {
        Ok(Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?)
    }

    async fn find_notification(&self, id: i32) -> AppResult<Option<NotificationModel>> {
        Ok(Notification::find_by_id(id).one(&self.db).await?)
    }

    async fn unread_notification_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        Ok(Notification::find()
            .select_only()
            .column(notification::Column::Id)
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .order_by_desc(notification::Column::CreatedAt)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?)
    }

    async fn mark_notification_read(&self, id: i32, at: DateTime) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(at))
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn insert_message(&self, new: NewMessage) -> AppResult<MessageModel> {
        let model = message::ActiveModel {
            sender_id: Set(new.sender_id),
            recipient_id: Set(new.recipient_id),
            subject: Set(new.subject),
            body: Set(new.body),
            is_read: Set(false),
            sent_at: Set(now()),
            read_at: Set(None),
            conversation: Set(new.conversation),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn list_inbox(&self, user_id: i32, limit: u64) -> AppResult<Vec<InboxEntry>> {
        let rows = Message::find()
            .filter(message::Column::RecipientId.eq(user_id))
            .order_by_desc(message::Column::SentAt)
            .order_by_desc(message::Column::Id)
            .limit(row_limit(limit))
            .find_also_related(User)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(message, sender)| InboxEntry {
                message,
                sender_name: sender
                    .map(|u| u.full_name)
                    .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            })
            .collect())
    }

    async fn find_message(&self, id: i32) -> AppResult<Option<MessageModel>> {
        Ok(Message::find_by_id(id).one(&self.db).await?)
    }

    async fn mark_message_read(&self, id: i32, at: DateTime) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(message::Column::IsRead, Expr::value(true))
            .col_expr(message::Column::ReadAt, Expr::value(at))
            .filter(message::Column::Id.eq(id))
            .filter(message::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn insert_academic_report(
        &self,
        new: NewAcademicReport,
    ) -> AppResult<AcademicReportModel> {
        let model = academic_report::ActiveModel {
            student_id: Set(new.student_id),
            tutor_id: Set(new.tutor_id),
            parcial: Set(new.parcial),
            subjects: Set(academic_report::SubjectList(new.subjects)),
            created_at: Set(now()),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn insert_tutoring_session(
        &self,
        new: NewTutoringSession,
    ) -> AppResult<TutoringSessionModel> {
        let model = tutoring_session::ActiveModel {
            tutor_id: Set(new.tutor_id),
            title: Set(new.title),
            scheduled_at: Set(new.scheduled_at),
            kind: Set(new.kind),
            student_ids: Set(tutoring_session::StudentIds(new.student_ids)),
            created_at: Set(now()),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn ping(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}
