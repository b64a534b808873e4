use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// タスクのステータス。
/// pending → in_progress → completed が基本線で、cancelled へは
/// どの状態からでも遷移できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// タスクの優先度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// 教師のTODOタスク。
/// `completed_at` は mark_completed 操作でのみスタンプされる。
/// 汎用更新でstatusを直接書き換えた場合はスタンプされない。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// 所有する教師のユーザーID (外部キー)
    pub teacher_id: i32,

    /// タスクのタイトル (必須、最大200文字)
    #[sea_orm(column_type = "String(StringLen::N(200))")]
    pub title: String,

    /// 詳細な説明
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// 種別 (lesson_planning, grade_assignments, administrative など自由形式)
    pub task_type: String,

    pub priority: Priority,

    pub due_date: Date,

    pub status: Status,

    /// 完了日時。status が completed のときのみ非NULL。
    pub completed_at: Option<DateTimeWithTimeZone>,

    /// 作成日時
    pub created_at: DateTimeWithTimeZone,

    /// 更新日時
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::UserId",
        on_delete = "Cascade"
    )]
    Teacher,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
