use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ユーザープロフィールテーブル。
        // ユーザー削除でプロフィールも削除される (CASCADE)。
        manager
            .create_table(
                Table::create()
                    .table(UserProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfile::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserProfile::UserId).integer().not_null().unique_key())
                    .col(ColumnDef::new(UserProfile::Phone).string_len(20))
                    .col(ColumnDef::new(UserProfile::Address).text())
                    .col(ColumnDef::new(UserProfile::ClassName).string_len(100))
                    .col(ColumnDef::new(UserProfile::Subject).string_len(100))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profile_user")
                            .from(UserProfile::Table, UserProfile::UserId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserProfile {
    Table,
    Id,
    UserId,
    Phone,
    Address,
    ClassName,
    Subject,
}
