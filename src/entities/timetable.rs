use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 曜日。Djangoの `Timetable.Day` (TextChoices) に相当します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
pub enum Day {
    #[sea_orm(string_value = "MON")]
    #[serde(rename = "MON")]
    Monday,
    #[sea_orm(string_value = "TUE")]
    #[serde(rename = "TUE")]
    Tuesday,
    #[sea_orm(string_value = "WED")]
    #[serde(rename = "WED")]
    Wednesday,
    #[sea_orm(string_value = "THU")]
    #[serde(rename = "THU")]
    Thursday,
    #[sea_orm(string_value = "FRI")]
    #[serde(rename = "FRI")]
    Friday,
}

/// 時間割のエントリ。
/// (クラス, 曜日, 開始時刻, 終了時刻) が自然キーだが、モデル上の
/// 一意制約としては宣言しない。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timetable")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub school_class_id: i32,
    pub day_of_week: Day,
    pub start_time: Time,
    pub end_time: Time,
    pub subject: String,
    /// 担当教師。教師削除時には NULL になる。
    pub teacher_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school_class::Entity",
        from = "Column::SchoolClassId",
        to = "super::school_class::Column::Id",
        on_delete = "Cascade"
    )]
    SchoolClass,
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::UserId",
        on_delete = "SetNull"
    )]
    Teacher,
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClass.def()
    }
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
