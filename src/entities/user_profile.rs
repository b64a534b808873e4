use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// ユーザープロフィール。
/// Djangoの `UserProfile(models.Model)` (OneToOneField) に相当します。
/// プロフィール行は最初の書き込み時に get-or-create で遅延作成されるため、
/// 全ユーザーに存在する保証はありません。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// 生徒用フィールド
    pub class_name: Option<String>,
    /// 教師用フィールド (担当科目)
    pub subject: Option<String>,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
