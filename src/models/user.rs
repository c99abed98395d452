use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "alumno")]
    #[serde(rename = "alumno")]
    Alumno,
    #[sea_orm(string_value = "profesor")]
    #[serde(rename = "profesor")]
    Profesor,
    #[sea_orm(string_value = "administrador")]
    #[serde(rename = "administrador")]
    Administrador,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Alumno => "alumno",
            Role::Profesor => "profesor",
            Role::Administrador => "administrador",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alumno" => Some(Role::Alumno),
            "profesor" => Some(Role::Profesor),
            "administrador" => Some(Role::Administrador),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in [Role::Alumno, Role::Profesor, Role::Administrador] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }
}
