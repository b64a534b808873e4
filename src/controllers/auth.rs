use chrono::{TimeZone, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::auth_utils::{decode_token, issue_access_token, issue_token_pair, TOKEN_TYPE_REFRESH};
use crate::entities::{prelude::*, token_blacklist};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::serializers::UserOut;
use crate::services::user_service::UserService;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserOut,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// ログイン処理を行うビュー。
/// simplejwt の `TokenObtainPairView` に相当し、トークンペアに加えて
/// ユーザー情報も返す (フロントエンドのクライアント構成に合わせる)。
#[post("/login", data = "<body>")]
pub async fn login(
    db: &State<DatabaseConnection>,
    body: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // パスワード検証 (Djangoの authenticate() に相当)
    let user = UserService::authenticate(db.inner(), &body.username, &body.password).await?;
    let pair = issue_token_pair(&user)?;
    let user = UserOut::load(db.inner(), user).await?;

    Ok(Json(LoginResponse {
        access: pair.access,
        refresh: pair.refresh,
        user,
    }))
}

/// アクセストークンの再発行。
/// ブラックリスト入りしたリフレッシュトークンと、リフレッシュ以外の
/// トークン種別は拒否する。
#[post("/token/refresh", data = "<body>")]
pub async fn refresh(
    db: &State<DatabaseConnection>,
    body: Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let claims = decode_token(&body.refresh)?;
    if claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(AppError::Unauthorized);
    }

    let blacklisted = TokenBlacklist::find()
        .filter(token_blacklist::Column::Jti.eq(claims.jti.clone()))
        .count(db.inner())
        .await?
        > 0;
    if blacklisted {
        return Err(AppError::Unauthorized);
    }

    let user = UserService::find_by_id(db.inner(), claims.user_id()?)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_active {
        return Err(AppError::Forbidden);
    }

    Ok(Json(RefreshResponse {
        access: issue_access_token(&user)?,
    }))
}

/// ログアウト処理。
/// リフレッシュトークンをブラックリストに登録して 205 を返す。
/// simplejwt の `token.blacklist()` に相当します。
#[post("/logout", data = "<body>")]
pub async fn logout(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    body: Json<RefreshRequest>,
) -> Result<Status, AppError> {
    let claims = decode_token(&body.refresh)
        .map_err(|_| AppError::BadRequest("リフレッシュトークンが不正です".to_string()))?;
    if claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(AppError::BadRequest("リフレッシュトークンが不正です".to_string()));
    }

    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .ok_or_else(|| AppError::BadRequest("リフレッシュトークンが不正です".to_string()))?
        .fixed_offset();

    let entry = token_blacklist::ActiveModel {
        jti: Set(claims.jti),
        expires_at: Set(expires_at),
        ..Default::default()
    };
    match entry.insert(db.inner()).await.map_err(AppError::from_db) {
        Ok(_) => {}
        // 既に失効済みなら何もしない (二重ログアウトは成功扱い)
        Err(AppError::Conflict(_)) => {}
        Err(e) => return Err(e),
    }

    Ok(Status::ResetContent)
}

/// 現在の認証ユーザーを返す。
/// DRFの `CurrentUserView` に相当します。
#[get("/user")]
pub async fn current_user(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
) -> Result<Json<UserOut>, AppError> {
    Ok(Json(UserOut::load(db.inner(), auth.user).await?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login, refresh, logout, current_user]
}
