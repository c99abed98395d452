use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ConversationKind {
    #[sea_orm(string_value = "individual")]
    #[serde(rename = "individual")]
    Individual,
    #[sea_orm(string_value = "grupal")]
    #[serde(rename = "grupal")]
    Group,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sender_id: i32,
    pub recipient_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub is_read: bool,
    pub sent_at: DateTime,
    pub read_at: Option<DateTime>,
    pub conversation: ConversationKind,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id"
    )]
    Recipient,
}

// Inbox rows are joined with their sender's display name.
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sender.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMessage {
    pub sender_id: i32,
    pub recipient_id: i32,
    pub subject: String,
    pub body: String,
    pub conversation: ConversationKind,
}

/// A received message together with the sender's display name.
#[derive(Clone, Debug, PartialEq)]
pub struct InboxEntry {
    pub message: Model,
    pub sender_name: String,
}
