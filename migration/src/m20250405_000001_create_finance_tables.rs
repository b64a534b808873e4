use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 料金区分テーブル。名前で一意。
        manager
            .create_table(
                Table::create()
                    .table(FeeType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeeType::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeeType::Name).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(FeeType::Category).string_len(100).not_null())
                    .col(ColumnDef::new(FeeType::Amount).decimal_len(10, 2).not_null())
                    .to_owned(),
            )
            .await?;

        // 請求テーブル。amount は作成時点のコピーで、FeeType への
        // 外部キーは持たない (料金表の後日変更に影響されない)。
        manager
            .create_table(
                Table::create()
                    .table(Fee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fee::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fee::StudentId).integer().not_null())
                    .col(ColumnDef::new(Fee::Amount).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Fee::DueDate).date().not_null())
                    .col(ColumnDef::new(Fee::Status).string_len(10).not_null().default("unpaid"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fee_student")
                            .from(Fee::Table, Fee::StudentId)
                            .to(Alias::new("student"), Alias::new("user_id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Fee::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeeType::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FeeType {
    Table,
    Id,
    Name,
    Category,
    Amount,
}

#[derive(DeriveIden)]
enum Fee {
    Table,
    Id,
    StudentId,
    Amount,
    DueDate,
    Status,
}
