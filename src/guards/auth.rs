use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sea_orm::*;

use crate::auth_utils::{decode_token, TOKEN_TYPE_ACCESS};
use crate::entities::{prelude::*, user};

/// 認証済みユーザーを表すリクエストガード。
/// Djangoの `request.user` に相当し、ビューの引数に含めるだけで自動的に
/// `Authorization: Bearer <access>` ヘッダーの検証が行われます。
pub struct AuthenticatedUser {
    pub user: user::Model,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // DBコネクションを取得
        let db = match request.guard::<&State<DatabaseConnection>>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        // Authorizationヘッダーからアクセストークンを取り出す
        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "));

        let token = match token {
            Some(t) => t,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        // トークンを検証。リフレッシュトークンではAPIにアクセスできない。
        let claims = match decode_token(token) {
            Ok(c) if c.token_type == TOKEN_TYPE_ACCESS => c,
            _ => return Outcome::Error((Status::Unauthorized, ())),
        };

        let user_id = match claims.user_id() {
            Ok(id) => id,
            Err(_) => return Outcome::Error((Status::Unauthorized, ())),
        };

        // DBからユーザーを取得
        match User::find_by_id(user_id).one(db.inner()).await {
            Ok(Some(user)) if user.is_active => Outcome::Success(AuthenticatedUser { user }),
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// 校長 (principal) のみを許可するガード。
/// Djangoの `user.is_staff` や `PermissionRequiredMixin` に相当。
pub struct PrincipalUser(pub AuthenticatedUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PrincipalUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(request).await {
            Outcome::Success(auth) => {
                if auth.user.role == user::Role::Principal {
                    Outcome::Success(PrincipalUser(auth))
                } else {
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}
