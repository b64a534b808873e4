use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 学校テーブル。校長は unique 制約により一対一。
        manager
            .create_table(
                Table::create()
                    .table(School::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(School::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(School::Name).string_len(200).not_null().unique_key())
                    .col(ColumnDef::new(School::Address).text())
                    .col(ColumnDef::new(School::Phone).string_len(20))
                    .col(ColumnDef::new(School::Email).string_len(254))
                    .col(ColumnDef::new(School::PrincipalId).integer().unique_key())
                    .col(ColumnDef::new(School::EstablishedYear).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_school_principal")
                            .from(School::Table, School::PrincipalId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // クラステーブル。担任 (teacher_id) は role=teacher のユーザーを
        // 指す想定だが、DjangoのlimitChoicesTo同様にDB制約にはしない。
        manager
            .create_table(
                Table::create()
                    .table(SchoolClass::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolClass::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SchoolClass::Name).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(SchoolClass::TeacherId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_school_class_teacher")
                            .from(SchoolClass::Table, SchoolClass::TeacherId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 生徒テーブル。主キー = ユーザーID (OneToOne)。
        // クラス削除時は所属が外れるだけで生徒は残る (SET NULL)。
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Student::UserId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Student::SchoolClassId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_user")
                            .from(Student::Table, Student::UserId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_school_class")
                            .from(Student::Table, Student::SchoolClassId)
                            .to(SchoolClass::Table, SchoolClass::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 教師テーブル。主キー = ユーザーID (OneToOne)。
        manager
            .create_table(
                Table::create()
                    .table(Teacher::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teacher::UserId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teacher::HireDate).date())
                    .col(ColumnDef::new(Teacher::Qualification).string_len(200))
                    .col(ColumnDef::new(Teacher::ExperienceYears).integer())
                    .col(ColumnDef::new(Teacher::Specialization).string_len(200))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_user")
                            .from(Teacher::Table, Teacher::UserId)
                            .to(Alias::new("user"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Teacher::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolClass::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(School::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum School {
    Table,
    Id,
    Name,
    Address,
    Phone,
    Email,
    PrincipalId,
    EstablishedYear,
}

#[derive(DeriveIden)]
enum SchoolClass {
    Table,
    Id,
    Name,
    TeacherId,
}

#[derive(DeriveIden)]
enum Student {
    Table,
    UserId,
    SchoolClassId,
}

#[derive(DeriveIden)]
enum Teacher {
    Table,
    UserId,
    HireDate,
    Qualification,
    ExperienceYears,
    Specialization,
}
