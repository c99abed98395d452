use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
pub enum NotificationKind {
    #[sea_orm(string_value = "reporte_academico")]
    #[serde(rename = "reporte_academico")]
    AcademicReport,
    #[sea_orm(string_value = "mensaje")]
    #[serde(rename = "mensaje")]
    Message,
    #[sea_orm(string_value = "sesion_programada")]
    #[serde(rename = "sesion_programada")]
    SessionScheduled,
    #[sea_orm(string_value = "alerta_servicio_social")]
    #[serde(rename = "alerta_servicio_social")]
    SocialServiceAlert,
    #[sea_orm(string_value = "alerta_practicas")]
    #[serde(rename = "alerta_practicas")]
    InternshipAlert,
    #[sea_orm(string_value = "alerta_riesgo_academico")]
    #[serde(rename = "alerta_riesgo_academico")]
    AcademicRiskAlert,
    #[sea_orm(string_value = "confirmacion_reporte")]
    #[serde(rename = "confirmacion_reporte")]
    ReportConfirmation,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Priority {
    #[sea_orm(string_value = "baja")]
    #[serde(rename = "baja")]
    Low,
    #[sea_orm(string_value = "normal")]
    #[serde(rename = "normal")]
    Normal,
    #[sea_orm(string_value = "alta")]
    #[serde(rename = "alta")]
    High,
    #[sea_orm(string_value = "critica")]
    #[serde(rename = "critica")]
    Critical,
}

/// Kind-specific data attached to a notification.
///
/// The `kind` column is always derived from the variant, so a row can never
/// claim to be a message notification while carrying report data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    AcademicReport {
        report_id: i32,
        student_id: i32,
        parcial: String,
        subjects: Vec<String>,
    },
    Message {
        message_id: i32,
        sender_id: i32,
    },
    SessionScheduled {
        session_id: i32,
        tutor_id: i32,
        scheduled_at: DateTime,
    },
    SocialServiceAlert {
        semester: i32,
    },
    InternshipAlert {
        semester: i32,
    },
    AcademicRiskAlert {
        failed_subjects: i32,
    },
    ReportConfirmation {
        report_id: i32,
        parcial: String,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::AcademicReport { .. } => NotificationKind::AcademicReport,
            NotificationPayload::Message { .. } => NotificationKind::Message,
            NotificationPayload::SessionScheduled { .. } => NotificationKind::SessionScheduled,
            NotificationPayload::SocialServiceAlert { .. } => NotificationKind::SocialServiceAlert,
            NotificationPayload::InternshipAlert { .. } => NotificationKind::InternshipAlert,
            NotificationPayload::AcademicRiskAlert { .. } => NotificationKind::AcademicRiskAlert,
            NotificationPayload::ReportConfirmation { .. } => NotificationKind::ReportConfirmation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub kind: NotificationKind,
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime,
    pub read_at: Option<DateTime>,
    pub priority: Priority,
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: NotificationPayload,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Everything needed to create a notification; id, timestamps and read state
/// are assigned by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct NewNotification {
    pub user_id: i32,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub payload: NotificationPayload,
}

impl NewNotification {
    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_type_tag() {
        let payload = NotificationPayload::AcademicRiskAlert { failed_subjects: 3 };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "academic_risk_alert");
        assert_eq!(value["failed_subjects"], 3);
    }

    #[test]
    fn kind_follows_payload() {
        let payload = NotificationPayload::Message {
            message_id: 1,
            sender_id: 2,
        };
        assert_eq!(payload.kind(), NotificationKind::Message);
        let payload = NotificationPayload::ReportConfirmation {
            report_id: 4,
            parcial: "2".into(),
        };
        assert_eq!(payload.kind(), NotificationKind::ReportConfirmation);
    }

    #[test]
    fn priority_uses_spanish_wire_values() {
        assert_eq!(serde_json::to_value(Priority::Critical).unwrap(), "critica");
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "alta");
    }
}
