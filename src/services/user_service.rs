use sea_orm::*;
use crate::auth_utils::{hash_password, verify_password};
use crate::entities::{prelude::*, user, user_profile};
use crate::errors::AppError;
use crate::serializers::UserPatch;
use crate::validation::validate_email_field;

/// ユーザー関連のビジネスロジックを集約するサービス。
/// Djangoの Manager やカスタム QuerySet メソッドに相当します。
pub struct UserService;

impl UserService {
    /// IDでユーザーを検索 (Django: User.objects.get(pk=id))
    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<user::Model>, AppError> {
        User::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::Database)
    }

    /// ユーザー名で検索 (Django: User.objects.get(username=...))
    pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>, AppError> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await
            .map_err(AppError::Database)
    }

    /// ユーザー作成 (Django: User.objects.create_user())
    /// 役割は作成時に確定し、以後の更新では変更されない。
    pub async fn create(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: user::Role,
    ) -> Result<user::Model, AppError> {
        let password_hash = hash_password(password)?;

        let new_user = user::ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set(password_hash),
            email: Set(email.to_owned()),
            first_name: Set(first_name.to_owned()),
            last_name: Set(last_name.to_owned()),
            role: Set(role),
            is_active: Set(true),
            ..Default::default()
        };

        new_user.insert(db).await.map_err(AppError::from_db)
    }

    /// ネストされた user / user.profile の部分更新を適用する。
    /// プロフィール行が無ければ作成し (Djangoの `get_or_create` に相当)、
    /// リクエストに含まれるフィールドだけを上書きする。
    pub async fn apply_user_patch(
        db: &DatabaseConnection,
        target: user::Model,
        patch: &UserPatch,
    ) -> Result<user::Model, AppError> {
        if let Some(email) = &patch.email {
            validate_email_field(email).map_err(AppError::Validation)?;
        }

        let target_id = target.id;
        let mut updated = target.clone();
        // 変更されたフィールドがない UPDATE は発行しない
        if patch.email.is_some() || patch.first_name.is_some() || patch.last_name.is_some() {
            let mut active: user::ActiveModel = target.into();
            if let Some(email) = &patch.email {
                active.email = Set(email.clone());
            }
            if let Some(first_name) = &patch.first_name {
                active.first_name = Set(first_name.clone());
            }
            if let Some(last_name) = &patch.last_name {
                active.last_name = Set(last_name.clone());
            }
            updated = active.update(db).await?;
        }

        if let Some(profile_patch) = &patch.profile {
            let existing = UserProfile::find()
                .filter(user_profile::Column::UserId.eq(target_id))
                .one(db)
                .await?;
            let has_changes = profile_patch.phone.is_some()
                || profile_patch.address.is_some()
                || profile_patch.class_name.is_some()
                || profile_patch.subject.is_some();

            let mut active: user_profile::ActiveModel = match existing {
                Some(profile) => {
                    if !has_changes {
                        return Ok(updated);
                    }
                    profile.into()
                }
                None => user_profile::ActiveModel {
                    user_id: Set(target_id),
                    ..Default::default()
                },
            };
            if let Some(phone) = &profile_patch.phone {
                active.phone = Set(Some(phone.clone()));
            }
            if let Some(address) = &profile_patch.address {
                active.address = Set(Some(address.clone()));
            }
            if let Some(class_name) = &profile_patch.class_name {
                active.class_name = Set(Some(class_name.clone()));
            }
            if let Some(subject) = &profile_patch.subject {
                active.subject = Set(Some(subject.clone()));
            }
            // 主キーが立っていれば UPDATE、なければ INSERT
            active.save(db).await?;
        }

        Ok(updated)
    }

    /// 認証処理 (Django: authenticate())
    pub async fn authenticate(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<user::Model, AppError> {
        let user = Self::find_by_username(db, username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        Ok(user)
    }
}
