use crate::{
    error::{AppError, AppResult},
    models::{
        AcademicReportModel, NewAcademicReport, NewNotification, NotificationModel,
        NotificationPayload, Priority,
    },
    services::notification::NotificationService,
    store::SharedStore,
};

pub const MAX_SUBJECTS: usize = 20;

#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub parcial: String,
    pub subjects: Vec<String>,
}

impl SubmitReport {
    /// Trimmed, non-blank subject names in submission order.
    fn normalized(&self) -> AppResult<(String, Vec<String>)> {
        let parcial = self.parcial.trim().to_string();
        if parcial.is_empty() {
            return Err(AppError::validation("parcial must not be empty"));
        }

        let subjects: Vec<String> = self
            .subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if subjects.is_empty() {
            return Err(AppError::validation("at least one subject is required"));
        }
        if subjects.len() > MAX_SUBJECTS {
            return Err(AppError::validation(format!(
                "at most {MAX_SUBJECTS} subjects per report"
            )));
        }

        Ok((parcial, subjects))
    }
}

#[derive(Debug, Clone)]
pub struct SubmittedReport {
    pub report: AcademicReportModel,
    pub tutor_notification: Option<NotificationModel>,
    pub confirmation: Option<NotificationModel>,
}

pub struct AcademicReportService {
    store: SharedStore,
    notifications: NotificationService,
}

impl AcademicReportService {
    pub fn new(store: SharedStore, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Record the failed subjects a student reports for a parcial, then tell
    /// their tutor and confirm back to the student. The three writes are
    /// independent; a lost notification does not undo the report.
    pub async fn submit(&self, student_id: i32, request: SubmitReport) -> AppResult<SubmittedReport> {
        let (parcial, subjects) = request.normalized()?;

        let student = self
            .store
            .find_user(student_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let tutor_id = self
            .store
            .find_student_profile(student_id)
            .await?
            .and_then(|p| p.tutor_id);

        let report = self
            .store
            .insert_academic_report(NewAcademicReport {
                student_id,
                tutor_id,
                parcial: parcial.clone(),
                subjects: subjects.clone(),
            })
            .await?;

        let tutor_notification = match tutor_id {
            Some(tutor_id) => {
                self.notifications
                    .notify_or_log(NewNotification {
                        user_id: tutor_id,
                        title: format!("Reporte académico de {}", student.full_name),
                        body: format!(
                            "{} reportó materias reprobadas en el parcial {}: {}",
                            student.full_name,
                            parcial,
                            subjects.join(", ")
                        ),
                        priority: Priority::High,
                        payload: NotificationPayload::AcademicReport {
                            report_id: report.id,
                            student_id,
                            parcial: parcial.clone(),
                            subjects: subjects.clone(),
                        },
                    })
                    .await
            }
            None => {
                tracing::warn!(student_id, report_id = report.id, "student has no assigned tutor");
                None
            }
        };

        let confirmation = self
            .notifications
            .notify_or_log(NewNotification {
                user_id: student_id,
                title: "Reporte enviado".to_string(),
                body: format!(
                    "Tu reporte del parcial {} con {} materia(s) fue registrado.",
                    parcial,
                    subjects.len()
                ),
                priority: Priority::Normal,
                payload: NotificationPayload::ReportConfirmation {
                    report_id: report.id,
                    parcial,
                },
            })
            .await;

        tracing::info!(
            student_id,
            report_id = report.id,
            tutor_notified = tutor_notification.is_some(),
            "academic report submitted"
        );

        Ok(SubmittedReport {
            report,
            tutor_notification,
            confirmation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, NotificationKind, Role, StudentProfileModel};
    use crate::store::{MemoryStore, Store, StoreOp};
    use crate::websocket::hub::NotificationHub;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: AcademicReportService,
        tutor: i32,
        student: i32,
    }

    async fn fixture(assign_tutor: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let tutor = store
            .insert_user(NewUser {
                email: "tutor@uni.mx".into(),
                full_name: "Dr. Ramírez".into(),
                password_hash: String::new(),
                role: Role::Profesor,
            })
            .await
            .unwrap()
            .id;
        let student = store
            .insert_user(NewUser {
                email: "sofia@uni.mx".into(),
                full_name: "Sofía Torres".into(),
                password_hash: String::new(),
                role: Role::Alumno,
            })
            .await
            .unwrap()
            .id;
        store
            .save_student_profile(StudentProfileModel {
                user_id: student,
                tutor_id: assign_tutor.then_some(tutor),
                semester: 3,
                social_service_completed: false,
                internship_completed: false,
                failed_subjects_count: 0,
                updated_at: crate::store::now(),
            })
            .await
            .unwrap();

        let notifications = NotificationService::new(store.clone(), NotificationHub::new());
        let service = AcademicReportService::new(store.clone(), notifications);
        Fixture {
            store,
            service,
            tutor,
            student,
        }
    }

    fn calculo_fisica() -> SubmitReport {
        SubmitReport {
            parcial: "2".into(),
            subjects: vec!["Cálculo".into(), "Física".into()],
        }
    }

    #[tokio::test]
    async fn tutor_and_student_are_both_notified() {
        let f = fixture(true).await;

        let submitted = f.service.submit(f.student, calculo_fisica()).await.unwrap();

        let to_tutor = submitted.tutor_notification.unwrap();
        assert_eq!(to_tutor.user_id, f.tutor);
        assert_eq!(to_tutor.kind, NotificationKind::AcademicReport);
        assert_eq!(to_tutor.priority, Priority::High);
        assert!(to_tutor.body.contains("Cálculo"));
        assert!(to_tutor.body.contains("Física"));

        let to_student = submitted.confirmation.unwrap();
        assert_eq!(to_student.user_id, f.student);
        assert_eq!(to_student.kind, NotificationKind::ReportConfirmation);
        assert_eq!(to_student.priority, Priority::Normal);

        assert_eq!(f.store.notification_count(), 2);
        assert_eq!(submitted.report.parcial, "2");
        assert_eq!(submitted.report.tutor_id, Some(f.tutor));
    }

    #[tokio::test]
    async fn blank_subjects_are_dropped_and_empty_reports_rejected() {
        let f = fixture(true).await;
        let result = f
            .service
            .submit(
                f.student,
                SubmitReport {
                    parcial: "1".into(),
                    subjects: vec!["  ".into(), String::new()],
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(f.store.calls(StoreOp::InsertAcademicReport), 0);

        let submitted = f
            .service
            .submit(
                f.student,
                SubmitReport {
                    parcial: " 3 ".into(),
                    subjects: vec![" Química ".into(), "".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(submitted.report.parcial, "3");
        assert_eq!(submitted.report.subjects.0, vec!["Química".to_string()]);
    }

    #[tokio::test]
    async fn without_a_tutor_only_the_confirmation_goes_out() {
        let f = fixture(false).await;
        let submitted = f.service.submit(f.student, calculo_fisica()).await.unwrap();
        assert!(submitted.tutor_notification.is_none());
        assert!(submitted.confirmation.is_some());
        assert_eq!(f.store.notification_count(), 1);
    }

    #[tokio::test]
    async fn failed_report_write_sends_nothing() {
        let f = fixture(true).await;
        f.store.fail_nth(StoreOp::InsertAcademicReport, 1);
        assert!(f.service.submit(f.student, calculo_fisica()).await.is_err());
        assert_eq!(f.store.notification_count(), 0);
    }

    #[tokio::test]
    async fn lost_tutor_notification_keeps_the_report() {
        let f = fixture(true).await;
        f.store.fail_nth(StoreOp::InsertNotification, 1);
        let submitted = f.service.submit(f.student, calculo_fisica()).await.unwrap();
        assert!(submitted.tutor_notification.is_none());
        assert!(submitted.confirmation.is_some());
    }
}
