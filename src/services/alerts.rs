use crate::{
    error::{AppError, AppResult},
    models::{
        NewNotification, NotificationModel, NotificationPayload, Priority, StudentProfileModel,
    },
    services::notification::NotificationService,
    store::SharedStore,
};
use serde::Serialize;

pub const SOCIAL_SERVICE_SEMESTER: i32 = 8;
pub const INTERNSHIP_SEMESTER: i32 = 9;
pub const ACADEMIC_RISK_FAILED_SUBJECTS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alert {
    SocialService { semester: i32 },
    Internship { semester: i32 },
    AcademicRisk { failed_subjects: i32 },
}

impl Alert {
    pub fn priority(&self) -> Priority {
        match self {
            Alert::SocialService { .. } | Alert::Internship { .. } => Priority::High,
            Alert::AcademicRisk { .. } => Priority::Critical,
        }
    }

    pub fn to_notification(self, student_id: i32) -> NewNotification {
        let (title, body, payload) = match self {
            Alert::SocialService { semester } => (
                "Servicio social pendiente",
                format!(
                    "Estás en el semestre {semester} y aún no registras tu servicio social."
                ),
                NotificationPayload::SocialServiceAlert { semester },
            ),
            Alert::Internship { semester } => (
                "Prácticas profesionales pendientes",
                format!(
                    "Estás en el semestre {semester} y aún no registras tus prácticas profesionales."
                ),
                NotificationPayload::InternshipAlert { semester },
            ),
            Alert::AcademicRisk { failed_subjects } => (
                "Riesgo académico",
                format!(
                    "Tienes {failed_subjects} materias reprobadas. Agenda una sesión con tu tutor."
                ),
                NotificationPayload::AcademicRiskAlert { failed_subjects },
            ),
        };

        NewNotification {
            user_id: student_id,
            title: title.to_string(),
            body,
            priority: self.priority(),
            payload,
        }
    }
}

/// Plain threshold gates over one profile snapshot. No memory of earlier runs.
pub fn evaluate(profile: &StudentProfileModel) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if profile.semester >= SOCIAL_SERVICE_SEMESTER && !profile.social_service_completed {
        alerts.push(Alert::SocialService {
            semester: profile.semester,
        });
    }
    if profile.semester >= INTERNSHIP_SEMESTER && !profile.internship_completed {
        alerts.push(Alert::Internship {
            semester: profile.semester,
        });
    }
    if profile.failed_subjects_count >= ACADEMIC_RISK_FAILED_SUBJECTS {
        alerts.push(Alert::AcademicRisk {
            failed_subjects: profile.failed_subjects_count,
        });
    }

    alerts
}

#[derive(Debug, Clone, Default)]
pub struct AlertRun {
    pub triggered: Vec<Alert>,
    pub emitted: Vec<NotificationModel>,
}

pub struct AlertService {
    store: SharedStore,
    notifications: NotificationService,
}

impl AlertService {
    pub fn new(store: SharedStore, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Evaluate the rules for one student and notify them of every alert that
    /// fires. Running it twice on the same snapshot notifies twice.
    pub async fn evaluate_and_notify(&self, student_id: i32) -> AppResult<AlertRun> {
        let profile = self
            .store
            .find_student_profile(student_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let triggered = evaluate(&profile);
        let mut emitted = Vec::with_capacity(triggered.len());
        for alert in &triggered {
            if let Some(saved) = self
                .notifications
                .notify_or_log(alert.to_notification(student_id))
                .await
            {
                emitted.push(saved);
            }
        }

        tracing::info!(
            student_id,
            triggered = triggered.len(),
            emitted = emitted.len(),
            "alert rules evaluated"
        );

        Ok(AlertRun { triggered, emitted })
    }
}
