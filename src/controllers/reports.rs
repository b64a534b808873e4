use rocket::serde::json::Json;
use rocket::State;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::path::Path;

use crate::errors::AppError;
use crate::guards::auth::{AuthenticatedUser, PrincipalUser};
use crate::services::report_service::{ReportCategory, ReportFormat, ReportService};

/// 利用可能なレポート一覧 (DRFの `ReportViewSet.list` に相当)
#[get("/")]
pub fn list(_user: AuthenticatedUser) -> Json<Value> {
    Json(json!({
        "message": "Available reports: /summary, /academic, /financial, /attendance, /performance"
    }))
}

/// 全体サマリーレポート
#[get("/summary")]
pub async fn summary(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<ReportCategory>, AppError> {
    Ok(Json(ReportService::summary(db.inner()).await?))
}

/// 学籍レポート
#[get("/academic")]
pub async fn academic(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<ReportCategory>, AppError> {
    Ok(Json(ReportService::academic(db.inner()).await?))
}

/// 財務レポート
#[get("/financial")]
pub async fn financial(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<ReportCategory>, AppError> {
    Ok(Json(ReportService::financial(db.inner()).await?))
}

/// 出欠レポート
#[get("/attendance")]
pub async fn attendance(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<ReportCategory>, AppError> {
    Ok(Json(ReportService::attendance(db.inner()).await?))
}

/// 成績レポート
#[get("/performance")]
pub async fn performance(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<ReportCategory>, AppError> {
    Ok(Json(ReportService::performance(db.inner()).await?))
}

/// レポート一式の書き出し (校長のみ)。
/// `generate_reports` 管理コマンドに相当する。タイムスタンプ付き
/// ディレクトリを REPORTS_DIR 配下に作成し、メタデータを返す。
#[post("/generate?<report_type>&<format>")]
pub async fn generate(
    db: &State<DatabaseConnection>,
    _principal: PrincipalUser,
    report_type: Option<String>,
    format: Option<String>,
) -> Result<Json<Value>, AppError> {
    let report_type = report_type.unwrap_or_else(|| "all".to_string());
    let format = format.unwrap_or_else(|| "json".to_string());
    let format = ReportFormat::from_str(&format)
        .ok_or_else(|| AppError::BadRequest(format!("不明なフォーマットです: {}", format)))?;

    let doc = ReportService::build(db.inner(), &report_type).await?;

    let base_dir = std::env::var("REPORTS_DIR").unwrap_or_else(|_| "reports".to_string());
    let dir = ReportService::write_to_dir(&doc, Path::new(&base_dir), format)?;

    Ok(Json(json!({
        "report_id": format!("report_{}", doc.generated_at.format("%Y%m%d_%H%M%S")),
        "report_type": doc.report_type,
        "generated_at": doc.generated_at.to_rfc3339(),
        "path": dir.display().to_string(),
    })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list,
        summary,
        academic,
        financial,
        attendance,
        performance,
        generate
    ]
}
