use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 教師のタスクテーブル。
        // completed_at は mark_completed 操作でのみセットされる。
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Task::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Task::TeacherId).integer().not_null())
                    .col(ColumnDef::new(Task::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Task::Description).text().not_null())
                    .col(ColumnDef::new(Task::TaskType).string_len(50).not_null())
                    .col(ColumnDef::new(Task::Priority).string_len(10).not_null().default("medium"))
                    .col(ColumnDef::new(Task::DueDate).date().not_null())
                    .col(ColumnDef::new(Task::Status).string_len(15).not_null().default("pending"))
                    .col(ColumnDef::new(Task::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Task::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Task::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_teacher")
                            .from(Task::Table, Task::TeacherId)
                            .to(Alias::new("teacher"), Alias::new("user_id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    TeacherId,
    Title,
    Description,
    TaskType,
    Priority,
    DueDate,
    Status,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
