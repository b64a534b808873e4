use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user;
use crate::errors::AppError;

/// パスワードをArgon2でハッシュ化します。
/// Djangoの `make_password` に相当する機能です。
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// パスワードを検証します。
/// Djangoの `check_password` に相当する機能です。
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match argon2::PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// === JWT ===
// simplejwt のアクセス/リフレッシュ構成に相当。アクセストークンは短命、
// リフレッシュトークンは jti 単位でブラックリスト化して失効できる。

/// アクセストークンの有効期間 (分)
pub const ACCESS_TOKEN_LIFETIME_MINS: i64 = 30;
/// リフレッシュトークンの有効期間 (日)
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 7;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWTのクレーム。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// ユーザーID (文字列表現)
    pub sub: String,
    pub role: user::Role,
    /// "access" または "refresh"
    pub token_type: String,
    /// トークン識別子。ブラックリストのキーになる。
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.sub.parse().map_err(|_| AppError::Unauthorized)
    }
}

/// ログインで発行するトークンのペア。
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn secret() -> String {
    // 本番では必ず JWT_SECRET を設定する
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "insecure-dev-secret".to_string())
}

fn issue(user: &user::Model, token_type: &str, lifetime: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        token_type: token_type.to_string(),
        jti: Uuid::new_v4().simple().to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to issue token: {}", e)))
}

/// アクセス/リフレッシュのトークンペアを発行します。
/// simplejwt の `RefreshToken.for_user(user)` に相当します。
pub fn issue_token_pair(user: &user::Model) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access: issue(user, TOKEN_TYPE_ACCESS, Duration::minutes(ACCESS_TOKEN_LIFETIME_MINS))?,
        refresh: issue(user, TOKEN_TYPE_REFRESH, Duration::days(REFRESH_TOKEN_LIFETIME_DAYS))?,
    })
}

/// アクセストークン単体を再発行します (リフレッシュ用)。
pub fn issue_access_token(user: &user::Model) -> Result<String, AppError> {
    issue(user, TOKEN_TYPE_ACCESS, Duration::minutes(ACCESS_TOKEN_LIFETIME_MINS))
}

/// トークンを検証してクレームを取り出します。
/// 署名不正・期限切れはいずれも認証エラー (401) として扱う。
pub fn decode_token(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}
