use chrono::NaiveTime;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{prelude::*, timetable};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;

/// 時間割エントリのリクエスト
#[derive(Deserialize)]
pub struct TimetableForm {
    pub school_class_id: i32,
    pub day_of_week: timetable::Day,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject: String,
    #[serde(default)]
    pub teacher_id: Option<i32>,
}

async fn validate_refs(db: &DatabaseConnection, form: &TimetableForm) -> Result<(), AppError> {
    SchoolClass::find_by_id(form.school_class_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest("指定されたクラスが存在しません".to_string()))?;
    if let Some(teacher_id) = form.teacher_id {
        Teacher::find_by_id(teacher_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::BadRequest("指定された教師が存在しません".to_string()))?;
    }
    Ok(())
}

/// 時間割一覧
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<timetable::Model>>, AppError> {
    let entries = Timetable::find()
        .order_by_asc(timetable::Column::SchoolClassId)
        .order_by_asc(timetable::Column::StartTime)
        .all(db.inner())
        .await?;
    Ok(Json(entries))
}

/// 時間割詳細
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<timetable::Model>, AppError> {
    let entry = Timetable::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(entry))
}

/// 時間割エントリの作成
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    body: Json<TimetableForm>,
) -> Result<status::Created<Json<timetable::Model>>, AppError> {
    let body = body.into_inner();
    validate_refs(db.inner(), &body).await?;

    let entry = timetable::ActiveModel {
        school_class_id: Set(body.school_class_id),
        day_of_week: Set(body.day_of_week),
        start_time: Set(body.start_time),
        end_time: Set(body.end_time),
        subject: Set(body.subject),
        teacher_id: Set(body.teacher_id),
        ..Default::default()
    }
    .insert(db.inner())
    .await?;

    let location = format!("/timetable/{}", entry.id);
    Ok(status::Created::new(location).body(Json(entry)))
}

/// 時間割エントリの更新
#[put("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
    body: Json<TimetableForm>,
) -> Result<Json<timetable::Model>, AppError> {
    let existing = Timetable::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let body = body.into_inner();
    validate_refs(db.inner(), &body).await?;

    let mut active: timetable::ActiveModel = existing.into();
    active.school_class_id = Set(body.school_class_id);
    active.day_of_week = Set(body.day_of_week);
    active.start_time = Set(body.start_time);
    active.end_time = Set(body.end_time);
    active.subject = Set(body.subject);
    active.teacher_id = Set(body.teacher_id);
    let entry = active.update(db.inner()).await?;
    Ok(Json(entry))
}

/// 時間割エントリの削除
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    let result = Timetable::delete_by_id(id).exec(db.inner()).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(rocket::http::Status::NoContent)
}

/// クラス単位の時間割 (DRFの `@action by_class` に相当)
#[get("/class/<class_id>")]
pub async fn by_class(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    class_id: i32,
) -> Result<Json<Vec<timetable::Model>>, AppError> {
    let entries = Timetable::find()
        .filter(timetable::Column::SchoolClassId.eq(class_id))
        .order_by_asc(timetable::Column::StartTime)
        .all(db.inner())
        .await?;
    Ok(Json(entries))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, retrieve, create, update, destroy, by_class]
}
