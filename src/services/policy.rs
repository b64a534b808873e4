use crate::entities::user::{self, Role};
use crate::errors::AppError;

/// 集中型のオブジェクトレベル認可。
/// 個人スコープのエンティティ (生徒・教師・プロフィール・休暇申請・タスク等)
/// を変更する前に必ずここを通す。ビューごとの場当たり的なチェックは行わない。
pub struct Policy;

impl Policy {
    /// 対象レコードの所有者本人か、校長であれば変更を許可する。
    pub fn assert_can_modify(actor: &user::Model, owner_user_id: i32) -> Result<(), AppError> {
        if actor.role == Role::Principal || actor.id == owner_user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// 校長のみに許可される操作 (生徒・教師・クラスの作成/削除など)。
    pub fn assert_principal(actor: &user::Model) -> Result<(), AppError> {
        if actor.role == Role::Principal {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
