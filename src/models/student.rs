use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshot of a student's academic standing. Alert rules read it as-is.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    pub tutor_id: Option<i32>,
    pub semester: i32,
    pub social_service_completed: bool,
    pub internship_completed: bool,
    pub failed_subjects_count: i32,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TutorId",
        to = "super::user::Column::Id"
    )]
    Tutor,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_failed_subjects(self.failed_subjects_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "alto")]
    High,
}

impl RiskLevel {
    pub fn from_failed_subjects(count: i32) -> Self {
        match count {
            c if c >= 3 => RiskLevel::High,
            c if c >= 1 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}
