use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 学校。校長 (principal) は一校につき最大一人 (OneToOne)。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "school")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// 校長のユーザーID (unique制約により一対一)
    #[sea_orm(unique)]
    pub principal_id: Option<i32>,
    pub established_year: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::PrincipalId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Principal,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Principal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
