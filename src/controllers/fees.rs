use chrono::NaiveDate;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use rust_decimal::Decimal;
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::entities::{fee, prelude::*};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::services::fee_service::{FeeService, FeesSummary, ReminderOutcome};
use crate::services::policy::Policy;

/// 請求作成リクエスト
#[derive(Deserialize)]
pub struct FeeCreateRequest {
    pub student_id: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: Option<fee::Status>,
}

/// 請求の部分更新リクエスト
#[derive(Deserialize)]
pub struct FeeUpdateRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<fee::Status>,
}

/// クラス一括請求リクエスト
#[derive(Deserialize)]
pub struct ClassFeeRequest {
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// 請求一覧
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<fee::Model>>, AppError> {
    let fees = Fee::find()
        .order_by_asc(fee::Column::DueDate)
        .all(db.inner())
        .await?;
    Ok(Json(fees))
}

/// 請求詳細
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<fee::Model>, AppError> {
    let fee = Fee::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(fee))
}

/// 請求作成 (校長のみ)。ステータス省略時は unpaid。
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    body: Json<FeeCreateRequest>,
) -> Result<status::Created<Json<fee::Model>>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let body = body.into_inner();

    Student::find_by_id(body.student_id)
        .one(db.inner())
        .await?
        .ok_or_else(|| AppError::BadRequest("指定された生徒が存在しません".to_string()))?;

    let fee = fee::ActiveModel {
        student_id: Set(body.student_id),
        amount: Set(body.amount),
        due_date: Set(body.due_date),
        status: Set(body.status.unwrap_or(fee::Status::Unpaid)),
        ..Default::default()
    }
    .insert(db.inner())
    .await?;

    let location = format!("/fees/{}", fee.id);
    Ok(status::Created::new(location).body(Json(fee)))
}

/// 請求の部分更新 (校長のみ)。
/// 支払い済み (paid) の請求を unpaid/partial に戻すことはできない。
#[patch("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
    body: Json<FeeUpdateRequest>,
) -> Result<Json<fee::Model>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let existing = Fee::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(new_status) = body.status {
        if existing.status == fee::Status::Paid && new_status != fee::Status::Paid {
            return Err(AppError::BadRequest(
                "支払い済みの請求のステータスは戻せません".to_string(),
            ));
        }
    }

    if body.amount.is_none() && body.due_date.is_none() && body.status.is_none() {
        return Ok(Json(existing));
    }

    let mut active: fee::ActiveModel = existing.into();
    if let Some(amount) = body.amount {
        active.amount = Set(amount);
    }
    if let Some(due_date) = body.due_date {
        active.due_date = Set(due_date);
    }
    if let Some(new_status) = body.status {
        active.status = Set(new_status);
    }
    let fee = active.update(db.inner()).await?;
    Ok(Json(fee))
}

/// 請求削除 (校長のみ)
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    Policy::assert_principal(&auth.user)?;
    let result = Fee::delete_by_id(id).exec(db.inner()).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(rocket::http::Status::NoContent)
}

/// 支払い処理 (DRFの `@action pay` に相当)。
/// 無条件に paid へ遷移する。二重に呼んでも結果は変わらない。
/// 本来は決済ゲートウェイを挟む場所だが、ここでは paid への遷移のみ。
#[post("/<id>/pay")]
pub async fn pay(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<Value>, AppError> {
    let existing = Fee::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    // 自分の請求、または校長のみ支払い操作ができる
    Policy::assert_can_modify(&auth.user, existing.student_id)?;

    let mut active: fee::ActiveModel = existing.into();
    active.status = Set(fee::Status::Paid);
    active.update(db.inner()).await?;

    Ok(Json(json!({ "status": "Payment successful" })))
}

/// クラス一括請求 (校長のみ)。
/// クラスの現メンバー全員分の請求を単一トランザクションで作成する。
#[post("/class/<class_id>", data = "<body>", rank = 2)]
pub async fn create_class_fee(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    class_id: i32,
    body: Json<ClassFeeRequest>,
) -> Result<status::Created<Json<Vec<fee::Model>>>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let created =
        FeeService::create_class_fee(db.inner(), class_id, body.amount, body.due_date).await?;
    Ok(status::Created::new("").body(Json(created)))
}

/// 未払い請求へのリマインダー送信 (校長のみ)。
/// 同一請求への同日内の再送はスキップされる。
#[post("/send_reminders")]
pub async fn send_reminders(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
) -> Result<Json<ReminderOutcome>, AppError> {
    Policy::assert_principal(&auth.user)?;
    Ok(Json(FeeService::send_reminders(db.inner()).await?))
}

/// 徴収状況のサマリー。クラス別の未回収額は降順で返る。
#[get("/summary")]
pub async fn summary(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<FeesSummary>, AppError> {
    Ok(Json(FeeService::summary(db.inner()).await?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list,
        retrieve,
        create,
        update,
        destroy,
        pay,
        create_class_fee,
        send_reminders,
        summary
    ]
}
