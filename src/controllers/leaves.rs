use chrono::NaiveDate;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{leave_request, prelude::*, user};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::services::policy::Policy;

/// 休暇申請の作成リクエスト。
/// 申請者はリクエストボディからではなく認証情報から取る。
#[derive(Deserialize)]
pub struct LeaveCreateRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// 休暇申請の部分更新リクエスト。
/// `{ "status": "approved" }` のように承認/却下もここで行う
/// (遷移の制限はない。却下済みの再承認も通る)。
#[derive(Deserialize)]
pub struct LeaveUpdateRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: Option<leave_request::Status>,
}

/// 休暇申請の一覧。校長は全件、それ以外は自分の申請のみ。
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<leave_request::Model>>, AppError> {
    let mut query = LeaveRequest::find().order_by_desc(leave_request::Column::StartDate);
    if auth.user.role != user::Role::Principal {
        query = query.filter(leave_request::Column::UserId.eq(auth.user.id));
    }
    Ok(Json(query.all(db.inner()).await?))
}

/// 休暇申請の詳細。本人または校長のみ。
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<leave_request::Model>, AppError> {
    let leave = LeaveRequest::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, leave.user_id)?;
    Ok(Json(leave))
}

/// 休暇申請の作成。申請者は認証済みユーザーになる。
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    body: Json<LeaveCreateRequest>,
) -> Result<status::Created<Json<leave_request::Model>>, AppError> {
    let body = body.into_inner();

    if body.end_date < body.start_date {
        return Err(AppError::Validation(vec![
            "終了日は開始日以降の日付を指定してください".to_string(),
        ]));
    }
    if body.reason.trim().is_empty() {
        return Err(AppError::Validation(vec!["理由は必須です".to_string()]));
    }

    let leave = leave_request::ActiveModel {
        user_id: Set(auth.user.id),
        start_date: Set(body.start_date),
        end_date: Set(body.end_date),
        reason: Set(body.reason),
        status: Set(leave_request::Status::Pending),
        ..Default::default()
    }
    .insert(db.inner())
    .await?;

    let location = format!("/leaves/{}", leave.id);
    Ok(status::Created::new(location).body(Json(leave)))
}

/// 休暇申請の部分更新。本人または校長のみ。
#[patch("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
    body: Json<LeaveUpdateRequest>,
) -> Result<Json<leave_request::Model>, AppError> {
    let leave = LeaveRequest::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, leave.user_id)?;

    if body.start_date.is_none()
        && body.end_date.is_none()
        && body.reason.is_none()
        && body.status.is_none()
    {
        return Ok(Json(leave));
    }

    let mut active: leave_request::ActiveModel = leave.into();
    if let Some(start_date) = body.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = body.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(reason) = &body.reason {
        active.reason = Set(reason.clone());
    }
    if let Some(status) = body.status {
        active.status = Set(status);
    }
    let leave = active.update(db.inner()).await?;
    Ok(Json(leave))
}

/// 休暇申請の削除。本人または校長のみ。
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    let leave = LeaveRequest::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, leave.user_id)?;
    LeaveRequest::delete_by_id(id).exec(db.inner()).await?;
    Ok(rocket::http::Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, retrieve, create, update, destroy]
}
