use chrono::NaiveDate;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{attendance, prelude::*, student};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;

/// 出欠記録リクエスト
#[derive(Deserialize)]
pub struct AttendanceForm {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: attendance::Status,
}

/// 出欠一覧
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<attendance::Model>>, AppError> {
    let records = Attendance::find()
        .order_by_desc(attendance::Column::Date)
        .all(db.inner())
        .await?;
    Ok(Json(records))
}

/// 出欠詳細
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<attendance::Model>, AppError> {
    let record = Attendance::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(record))
}

/// 出欠記録の作成。
/// 同じ (student, date) の二重登録は一意制約違反として409になる。
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    body: Json<AttendanceForm>,
) -> Result<status::Created<Json<attendance::Model>>, AppError> {
    let body = body.into_inner();

    Student::find_by_id(body.student_id)
        .one(db.inner())
        .await?
        .ok_or_else(|| AppError::BadRequest("指定された生徒が存在しません".to_string()))?;

    let record = attendance::ActiveModel {
        student_id: Set(body.student_id),
        date: Set(body.date),
        status: Set(body.status),
        ..Default::default()
    }
    .insert(db.inner())
    .await
    .map_err(AppError::from_db)?;

    let location = format!("/attendance/{}", record.id);
    Ok(status::Created::new(location).body(Json(record)))
}

/// 出欠記録の更新 (ステータスの訂正など)
#[put("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
    body: Json<AttendanceForm>,
) -> Result<Json<attendance::Model>, AppError> {
    let existing = Attendance::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let body = body.into_inner();

    let mut active: attendance::ActiveModel = existing.into();
    active.student_id = Set(body.student_id);
    active.date = Set(body.date);
    active.status = Set(body.status);
    let record = active.update(db.inner()).await.map_err(AppError::from_db)?;
    Ok(Json(record))
}

/// 出欠記録の削除
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    let result = Attendance::delete_by_id(id).exec(db.inner()).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(rocket::http::Status::NoContent)
}

/// クラス単位の出欠一覧 (DRFの `@action by_class` に相当)。
/// `?date=YYYY-MM-DD` で日付の絞り込みができる。
#[get("/class/<class_id>?<date>")]
pub async fn by_class(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    class_id: i32,
    date: Option<String>,
) -> Result<Json<Vec<attendance::Model>>, AppError> {
    let student_ids: Vec<i32> = Student::find()
        .filter(student::Column::SchoolClassId.eq(class_id))
        .all(db.inner())
        .await?
        .into_iter()
        .map(|s| s.user_id)
        .collect();

    if student_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut query = Attendance::find().filter(attendance::Column::StudentId.is_in(student_ids));
    if let Some(date) = date {
        let date: NaiveDate = date
            .parse()
            .map_err(|_| AppError::BadRequest("日付は YYYY-MM-DD 形式で指定してください".to_string()))?;
        query = query.filter(attendance::Column::Date.eq(date));
    }

    let records = query
        .order_by_desc(attendance::Column::Date)
        .all(db.inner())
        .await?;
    Ok(Json(records))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, retrieve, create, update, destroy, by_class]
}
