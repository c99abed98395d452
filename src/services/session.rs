use crate::{
    error::{AppError, AppResult},
    models::{
        NewNotification, NewTutoringSession, NotificationModel, NotificationPayload, Priority,
        Role, SessionKind, TutoringSessionModel,
    },
    services::notification::NotificationService,
    store::SharedStore,
};
use sea_orm::prelude::DateTime;
use std::collections::HashSet;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_STUDENTS: usize = 50;

#[derive(Debug, Clone)]
pub struct ScheduleSession {
    pub title: String,
    pub scheduled_at: DateTime,
    pub kind: SessionKind,
    pub student_ids: Vec<i32>,
}

impl ScheduleSession {
    /// Invited students with duplicates removed, first occurrence wins.
    fn normalized_students(&self) -> AppResult<Vec<i32>> {
        let mut seen = HashSet::with_capacity(self.student_ids.len());
        let mut students: Vec<i32> = Vec::with_capacity(self.student_ids.len());
        for &id in &self.student_ids {
            if id <= 0 {
                return Err(AppError::validation(format!("invalid student id {id}")));
            }
            if seen.insert(id) {
                students.push(id);
            }
        }
        if students.len() > MAX_STUDENTS {
            return Err(AppError::validation(format!(
                "a session takes at most {MAX_STUDENTS} students"
            )));
        }

        match (self.kind, students.len()) {
            (_, 0) => Err(AppError::validation("at least one student is required")),
            (SessionKind::Individual, n) if n > 1 => Err(AppError::validation(
                "an individual session has exactly one student",
            )),
            _ => Ok(students),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledSession {
    pub session: TutoringSessionModel,
    pub notified: Vec<NotificationModel>,
}

pub struct SessionService {
    store: SharedStore,
    notifications: NotificationService,
}

impl SessionService {
    pub fn new(store: SharedStore, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn schedule(
        &self,
        tutor_id: i32,
        request: ScheduleSession,
    ) -> AppResult<ScheduledSession> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        let students = request.normalized_students()?;

        for &id in &students {
            match self.store.find_user(id).await? {
                Some(user) if user.role == Role::Alumno => {}
                _ => {
                    return Err(AppError::validation(format!("user {id} is not a student")));
                }
            }
        }

        let session = self
            .store
            .insert_tutoring_session(NewTutoringSession {
                tutor_id,
                title,
                scheduled_at: request.scheduled_at,
                kind: request.kind,
                student_ids: students.clone(),
            })
            .await?;

        let when = session.scheduled_at.format("%Y-%m-%d %H:%M").to_string();
        let mut notified = Vec::with_capacity(students.len());
        for student_id in students {
            let sent = self
                .notifications
                .notify_or_log(NewNotification {
                    user_id: student_id,
                    title: "Sesión de tutoría programada".to_string(),
                    body: format!("{} el {}", session.title, when),
                    priority: Priority::Normal,
                    payload: NotificationPayload::SessionScheduled {
                        session_id: session.id,
                        tutor_id,
                        scheduled_at: session.scheduled_at,
                    },
                })
                .await;
            notified.extend(sent);
        }

        tracing::info!(
            session_id = session.id,
            tutor_id,
            invited = session.student_ids.0.len(),
            notified = notified.len(),
            "tutoring session scheduled"
        );

        Ok(ScheduledSession { session, notified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, NotificationKind};
    use crate::store::{MemoryStore, Store, StoreOp};
    use crate::websocket::hub::NotificationHub;
    use std::sync::Arc;

    async fn user(store: &MemoryStore, email: &str, role: Role) -> i32 {
        store
            .insert_user(NewUser {
                email: email.into(),
                full_name: email.into(),
                password_hash: String::new(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    async fn setup() -> (Arc<MemoryStore>, SessionService, i32, i32, i32) {
        let store = Arc::new(MemoryStore::new());
        let tutor = user(&store, "tutor@uni.mx", Role::Profesor).await;
        let ana = user(&store, "ana@uni.mx", Role::Alumno).await;
        let beto = user(&store, "beto@uni.mx", Role::Alumno).await;
        let notifications = NotificationService::new(store.clone(), NotificationHub::new());
        let service = SessionService::new(store.clone(), notifications);
        (store, service, tutor, ana, beto)
    }

    fn request(kind: SessionKind, student_ids: Vec<i32>) -> ScheduleSession {
        ScheduleSession {
            title: "Revisión de avance".into(),
            scheduled_at: crate::store::now(),
            kind,
            student_ids,
        }
    }

    #[tokio::test]
    async fn every_invited_student_is_notified_once() {
        let (store, service, tutor, ana, beto) = setup().await;

        let scheduled = service
            .schedule(tutor, request(SessionKind::Group, vec![ana, beto, ana]))
            .await
            .unwrap();

        assert_eq!(scheduled.session.student_ids.0, vec![ana, beto]);
        assert_eq!(scheduled.notified.len(), 2);
        assert!(scheduled
            .notified
            .iter()
            .all(|n| n.kind == NotificationKind::SessionScheduled && n.priority == Priority::Normal));
        assert_eq!(store.notification_count(), 2);
    }

    #[tokio::test]
    async fn individual_sessions_take_exactly_one_student() {
        let (store, service, tutor, ana, beto) = setup().await;
        let result = service
            .schedule(tutor, request(SessionKind::Individual, vec![ana, beto]))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .schedule(tutor, request(SessionKind::Group, vec![]))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.calls(StoreOp::InsertTutoringSession), 0);
    }

    #[tokio::test]
    async fn oversized_invite_lists_are_rejected_up_front() {
        let (store, service, tutor, ana, _) = setup().await;
        let too_many: Vec<i32> = (1..=MAX_STUDENTS as i32 + 1).collect();
        let result = service
            .schedule(tutor, request(SessionKind::Group, too_many))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.calls(StoreOp::InsertTutoringSession), 0);

        // repeats collapse before the size check
        let repeated = vec![ana; MAX_STUDENTS * 3];
        let scheduled = service
            .schedule(tutor, request(SessionKind::Group, repeated))
            .await
            .unwrap();
        assert_eq!(scheduled.session.student_ids.0, vec![ana]);
    }

    #[tokio::test]
    async fn only_students_can_be_invited() {
        let (store, service, tutor, ana, _) = setup().await;
        let result = service
            .schedule(tutor, request(SessionKind::Group, vec![ana, tutor]))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.notification_count(), 0);
    }

    #[tokio::test]
    async fn a_lost_notification_does_not_cancel_the_session() {
        let (store, service, tutor, ana, beto) = setup().await;
        store.fail_nth(StoreOp::InsertNotification, 1);
        let scheduled = service
            .schedule(tutor, request(SessionKind::Group, vec![ana, beto]))
            .await
            .unwrap();
        assert_eq!(scheduled.notified.len(), 1);
        assert_eq!(scheduled.notified[0].user_id, beto);
    }
}
