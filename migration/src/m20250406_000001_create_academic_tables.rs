use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 課題テーブル。クラス削除で課題も削除される。
        manager
            .create_table(
                Table::create()
                    .table(Assignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assignment::SchoolClassId).integer().not_null())
                    .col(ColumnDef::new(Assignment::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Assignment::Description).text().not_null())
                    .col(ColumnDef::new(Assignment::DueDate).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_school_class")
                            .from(Assignment::Table, Assignment::SchoolClassId)
                            .to(Alias::new("school_class"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 成績テーブル。(student, assignment) に一意制約はなく、
        // 再採点は新しい行の追記になる。
        manager
            .create_table(
                Table::create()
                    .table(Grade::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grade::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Grade::StudentId).integer().not_null())
                    .col(ColumnDef::new(Grade::AssignmentId).integer().not_null())
                    .col(ColumnDef::new(Grade::Score).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grade_student")
                            .from(Grade::Table, Grade::StudentId)
                            .to(Alias::new("student"), Alias::new("user_id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grade_assignment")
                            .from(Grade::Table, Grade::AssignmentId)
                            .to(Assignment::Table, Assignment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Grade::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Assignment {
    Table,
    Id,
    SchoolClassId,
    Title,
    Description,
    DueDate,
}

#[derive(DeriveIden)]
enum Grade {
    Table,
    Id,
    StudentId,
    AssignmentId,
    Score,
}
