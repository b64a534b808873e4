use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 失効させたリフレッシュトークン。
/// simplejwt の token_blacklist アプリに相当する。ログアウト時に
/// リフレッシュトークンの jti を登録し、以後のリフレッシュを拒否する。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_blacklist")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub jti: String,
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
