use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 休暇申請テーブル。
        manager
            .create_table(
                Table::create()
                    .table(LeaveRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveRequest::UserId).integer().not_null())
                    .col(ColumnDef::new(LeaveRequest::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequest::EndDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequest::Reason).text().not_null())
                    .col(
                        ColumnDef::new(LeaveRequest::Status)
                            .string_len(10)
                            .not_null()
                            .default("pending"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_request_user")
                            .from(LeaveRequest::Table, LeaveRequest::UserId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 通知テーブル。fee_id は支払いリマインダーの重複抑止用。
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notification::UserId).integer().not_null())
                    .col(ColumnDef::new(Notification::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(ColumnDef::new(Notification::IsRead).boolean().not_null().default(false))
                    .col(ColumnDef::new(Notification::FeeId).integer())
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_user")
                            .from(Notification::Table, Notification::UserId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_fee")
                            .from(Notification::Table, Notification::FeeId)
                            .to(Alias::new("fee"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveRequest::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveRequest {
    Table,
    Id,
    UserId,
    StartDate,
    EndDate,
    Reason,
    Status,
}

#[derive(DeriveIden)]
enum Notification {
    Table,
    Id,
    UserId,
    Title,
    Message,
    IsRead,
    FeeId,
    CreatedAt,
}
