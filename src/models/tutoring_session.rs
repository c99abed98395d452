use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SessionKind {
    #[sea_orm(string_value = "individual")]
    #[serde(rename = "individual")]
    Individual,
    #[sea_orm(string_value = "grupal")]
    #[serde(rename = "grupal")]
    Group,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StudentIds(pub Vec<i32>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutoring_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tutor_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,
    pub scheduled_at: DateTime,
    pub kind: SessionKind,
    #[sea_orm(column_type = "JsonBinary")]
    pub student_ids: StudentIds,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TutorId",
        to = "super::user::Column::Id"
    )]
    Tutor,
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTutoringSession {
    pub tutor_id: i32,
    pub title: String,
    pub scheduled_at: DateTime,
    pub kind: SessionKind,
    pub student_ids: Vec<i32>,
}
