use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AcademicReports {
    Table,
    Id,
    StudentId,
    TutorId,
    Parcial,
    Subjects,
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
                    .table(AcademicReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AcademicReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AcademicReports::StudentId).integer().not_null())
                    .col(ColumnDef::new(AcademicReports::TutorId).integer().null())
                    .col(ColumnDef::new(AcademicReports::Parcial).string_len(20).not_null())
                    .col(
                        ColumnDef::new(AcademicReports::Subjects)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AcademicReports::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_academic_reports_student_id")
                            .from(AcademicReports::Table, AcademicReports::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_academic_reports_tutor_id")
                            .from(AcademicReports::Table, AcademicReports::TutorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_academic_reports_student_id")
                    .table(AcademicReports::Table)
                    .col(AcademicReports::StudentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AcademicReports::Table).to_owned())
            .await
    }
}
