use rocket::serde::json::Json;
use serde_json::{json, Value};

/// 死活監視エンドポイント。認証不要。
#[get("/health")]
pub fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "School Management API is running",
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![health]
}
