use crate::{
    error::{AppError, AppResult},
    models::{Role, StudentProfileModel},
    store::SharedStore,
};

pub const MAX_SEMESTER: i32 = 15;

/// The academic snapshot tutors keep up to date. Alert rules read it as-is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub tutor_id: Option<i32>,
    pub semester: i32,
    pub social_service_completed: bool,
    pub internship_completed: bool,
    pub failed_subjects_count: i32,
}

pub struct StudentService {
    store: SharedStore,
}

impl StudentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, student_id: i32) -> AppResult<StudentProfileModel> {
        self.store
            .find_student_profile(student_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Replace a student's profile snapshot.
    pub async fn update_profile(
        &self,
        student_id: i32,
        update: ProfileUpdate,
    ) -> AppResult<StudentProfileModel> {
        if !(1..=MAX_SEMESTER).contains(&update.semester) {
            return Err(AppError::validation(format!(
                "semester must be between 1 and {MAX_SEMESTER}"
            )));
        }
        if update.failed_subjects_count < 0 {
            return Err(AppError::validation("failed subjects count cannot be negative"));
        }

        let student = self
            .store
            .find_user(student_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if student.role != Role::Alumno {
            return Err(AppError::validation("only students have an academic profile"));
        }

        if let Some(tutor_id) = update.tutor_id {
            match self.store.find_user(tutor_id).await? {
                Some(tutor) if tutor.role == Role::Profesor => {}
                _ => return Err(AppError::validation("tutor must be a professor")),
            }
        }

        let profile = self
            .store
            .save_student_profile(StudentProfileModel {
                user_id: student_id,
                tutor_id: update.tutor_id,
                semester: update.semester,
                social_service_completed: update.social_service_completed,
                internship_completed: update.internship_completed,
                failed_subjects_count: update.failed_subjects_count,
                updated_at: crate::store::now(),
            })
            .await?;

        tracing::debug!(
            student_id,
            semester = profile.semester,
            failed_subjects = profile.failed_subjects_count,
            "student profile updated"
        );
        Ok(profile)
    }
}
