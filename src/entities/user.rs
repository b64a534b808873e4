use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// ユーザーの役割。
/// Djangoの `User.Role` (TextChoices) に相当します。
/// 役割はアカウント作成時に確定し、以後の更新操作では変更されません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "principal")]
    Principal,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "student")]
    Student,
}

// Djangoの `models.Model` に相当する構造体。
// SeaORMではマクロを使ってDBテーブルとのマッピング、リレーション、アクティブレコードパターンを定義します。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user")] // Djangoの `class Meta: db_table = "user"` に相当
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2ハッシュ。レスポンスには決して含めない。
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

// Djangoの `RelatedName` や `ForeignKey` などのリレーションを定義する場所。
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::user_profile::Entity")]
    Profile,
    #[sea_orm(has_one = "super::student::Entity")]
    Student,
    #[sea_orm(has_one = "super::teacher::Entity")]
    Teacher,
    /// 担任として割り当てられたクラス (Djangoの `related_name='taught_classes'`)
    #[sea_orm(has_many = "super::school_class::Entity")]
    TaughtClasses,
    #[sea_orm(has_many = "super::leave_request::Entity")]
    LeaveRequests,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaughtClasses.def()
    }
}

impl Related<super::leave_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveRequests.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
