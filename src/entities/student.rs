use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 生徒。role=student のユーザーと一対一 (主キー共有)。
/// Djangoの `Student(models.Model)` (OneToOneField, primary_key=True) に相当します。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    /// 対応するユーザーのID (主キー兼外部キー)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    /// 所属クラス。クラス削除時には NULL になる (生徒は削除されない)。
    pub school_class_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::school_class::Entity",
        from = "Column::SchoolClassId",
        to = "super::school_class::Column::Id",
        on_delete = "SetNull"
    )]
    SchoolClass,
    #[sea_orm(has_many = "super::attendance::Entity")]
    AttendanceRecords,
    #[sea_orm(has_many = "super::fee::Entity")]
    Fees,
    #[sea_orm(has_many = "super::grade::Entity")]
    Grades,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClass.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl Related<super::fee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fees.def()
    }
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
