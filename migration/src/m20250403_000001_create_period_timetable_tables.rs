use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 時限テーブル。時限番号で一意。
        manager
            .create_table(
                Table::create()
                    .table(Period::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Period::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Period::PeriodNumber).integer().not_null().unique_key())
                    .col(ColumnDef::new(Period::StartTime).time().not_null())
                    .col(ColumnDef::new(Period::EndTime).time().not_null())
                    .to_owned(),
            )
            .await?;

        // 時間割テーブル。(class, day, start, end) が自然キーだが、
        // 元実装に合わせて一意制約は宣言しない。
        manager
            .create_table(
                Table::create()
                    .table(Timetable::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timetable::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Timetable::SchoolClassId).integer().not_null())
                    .col(ColumnDef::new(Timetable::DayOfWeek).string_len(3).not_null())
                    .col(ColumnDef::new(Timetable::StartTime).time().not_null())
                    .col(ColumnDef::new(Timetable::EndTime).time().not_null())
                    .col(ColumnDef::new(Timetable::Subject).string_len(100).not_null())
                    .col(ColumnDef::new(Timetable::TeacherId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timetable_school_class")
                            .from(Timetable::Table, Timetable::SchoolClassId)
                            .to(Alias::new("school_class"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timetable_teacher")
                            .from(Timetable::Table, Timetable::TeacherId)
                            .to(Alias::new("teacher"), Alias::new("user_id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Timetable::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Period::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Period {
    Table,
    Id,
    PeriodNumber,
    StartTime,
    EndTime,
}

#[derive(DeriveIden)]
enum Timetable {
    Table,
    Id,
    SchoolClassId,
    DayOfWeek,
    StartTime,
    EndTime,
    Subject,
    TeacherId,
}
