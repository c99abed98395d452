use sea_orm_migration::prelude::*;

mod m20261019_000001_create_users_table;
mod m20261019_000002_create_student_profiles_table;
mod m20261019_000003_create_notifications_table;
mod m20261019_000004_create_messages_table;
mod m20261019_000005_create_academic_reports_table;
mod m20261019_000006_create_tutoring_sessions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_create_users_table::Migration),
            Box::new(m20261019_000002_create_student_profiles_table::Migration),
            Box::new(m20261019_000003_create_notifications_table::Migration),
            Box::new(m20261019_000004_create_messages_table::Migration),
            Box::new(m20261019_000005_create_academic_reports_table::Migration),
            Box::new(m20261019_000006_create_tutoring_sessions_table::Migration),
        ]
    }
}
