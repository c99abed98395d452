use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TutoringSessions {
    Table,
    Id,
    TutorId,
    Title,
    ScheduledAt,
    Kind,
    StudentIds,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TutoringSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutoringSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TutoringSessions::TutorId).integer().not_null())
                    .col(ColumnDef::new(TutoringSessions::Title).string_len(200).not_null())
                    .col(ColumnDef::new(TutoringSessions::ScheduledAt).timestamp().not_null())
                    .col(ColumnDef::new(TutoringSessions::Kind).string_len(20).not_null())
                    .col(
                        ColumnDef::new(TutoringSessions::StudentIds)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TutoringSessions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutoring_sessions_tutor_id")
                            .from(TutoringSessions::Table, TutoringSessions::TutorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutoring_sessions_tutor_scheduled")
                    .table(TutoringSessions::Table)
                    .col(TutoringSessions::TutorId)
                    .col(TutoringSessions::ScheduledAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TutoringSessions::Table).to_owned())
            .await
    }
}
