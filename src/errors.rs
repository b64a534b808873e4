use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::Request;
use sea_orm::DbErr;
use serde_json::json;
use std::io::Cursor;

/// アプリケーション全体で使用するエラー型。
/// Djangoの例外クラス (PermissionDenied, Http404, ValidationError 等) に相当します。
/// すべてリクエスト境界でJSONのエラーレスポンスへ変換されます。
#[derive(Debug)]
pub enum AppError {
    /// データベースエラー
    Database(DbErr),
    /// 認証エラー (401 Unauthorized)
    Unauthorized,
    /// 権限エラー (403 Forbidden)
    Forbidden,
    /// リソースが見つからない (404 Not Found)
    NotFound,
    /// バリデーションエラー (400、フィールド単位のメッセージ付き)
    Validation(Vec<String>),
    /// 不正なリクエスト (400 Bad Request)
    BadRequest(String),
    /// 一意制約などの競合 (409 Conflict)
    Conflict(String),
    /// 内部エラー (500 Internal Server Error)
    Internal(String),
}

impl AppError {
    /// 書き込み系クエリのエラーを振り分ける。
    /// 一意制約違反はConflict(409)、それ以外はDatabase(500)として扱う。
    pub fn from_db(e: DbErr) -> Self {
        let msg = e.to_string().to_lowercase();
        if msg.contains("unique") || msg.contains("duplicate") {
            AppError::Conflict("既に登録されています".to_string())
        } else {
            AppError::Database(e)
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let (status, body) = match &self {
            AppError::Unauthorized => (Status::Unauthorized, json!({ "error": "Unauthorized" })),
            AppError::Forbidden => (Status::Forbidden, json!({ "error": "Forbidden" })),
            AppError::NotFound => (Status::NotFound, json!({ "error": "Not Found" })),
            AppError::Validation(errors) => (
                Status::BadRequest,
                json!({ "error": "validation_error", "errors": errors }),
            ),
            AppError::BadRequest(msg) => (Status::BadRequest, json!({ "error": msg })),
            AppError::Conflict(msg) => (Status::Conflict, json!({ "error": msg })),
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                (Status::InternalServerError, json!({ "error": "Database Error" }))
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                (Status::InternalServerError, json!({ "error": msg }))
            }
        };

        let body = body.to_string();
        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl From<DbErr> for AppError {
    fn from(e: DbErr) -> Self {
        AppError::Database(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Validation(errors) => write!(f, "Validation error: {}", errors.join(", ")),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
