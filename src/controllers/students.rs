use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{attendance, fee, prelude::*, student, user};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::serializers::{StudentOut, UserPatch};
use crate::services::policy::Policy;
use crate::services::user_service::UserService;
use crate::validation::UserFormValidation;

/// 生徒作成リクエスト。role=student のユーザーと生徒行を同時に作成する。
#[derive(Deserialize)]
pub struct StudentCreateRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub school_class_id: Option<i32>,
}

/// 生徒更新リクエスト。ネストした user / user.profile の部分更新に対応。
#[derive(Deserialize)]
pub struct StudentUpdateRequest {
    #[serde(default)]
    pub user: Option<UserPatch>,
    #[serde(default)]
    pub school_class_id: Option<i32>,
}

/// 生徒一覧 (DRFの `StudentViewSet.list` に相当)
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<StudentOut>>, AppError> {
    let students = Student::find().all(db.inner()).await?;
    let mut items = Vec::with_capacity(students.len());
    for s in students {
        items.push(StudentOut::load(db.inner(), s).await?);
    }
    Ok(Json(items))
}

/// 生徒詳細
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<StudentOut>, AppError> {
    let student = Student::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(StudentOut::load(db.inner(), student).await?))
}

/// 生徒作成 (校長のみ)
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    body: Json<StudentCreateRequest>,
) -> Result<status::Created<Json<StudentOut>>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let body = body.into_inner();

    UserFormValidation::new(&body.username, Some(&body.password), body.email.as_deref())
        .validate_form()
        .map_err(AppError::Validation)?;

    if let Some(class_id) = body.school_class_id {
        SchoolClass::find_by_id(class_id)
            .one(db.inner())
            .await?
            .ok_or_else(|| AppError::BadRequest("指定されたクラスが存在しません".to_string()))?;
    }

    let new_user = UserService::create(
        db.inner(),
        &body.username,
        &body.password,
        body.email.as_deref().unwrap_or(""),
        body.first_name.as_deref().unwrap_or(""),
        body.last_name.as_deref().unwrap_or(""),
        user::Role::Student,
    )
    .await?;

    let student_row = student::ActiveModel {
        user_id: Set(new_user.id),
        school_class_id: Set(body.school_class_id),
    }
    .insert(db.inner())
    .await?;

    let location = format!("/students/{}", student_row.user_id);
    Ok(status::Created::new(location).body(Json(StudentOut::load(db.inner(), student_row).await?)))
}

/// 生徒更新。本人または校長のみ (集中ポリシーを必ず通す)。
/// ネストした profile は get-or-create + 部分更新になる。
#[put("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
    body: Json<StudentUpdateRequest>,
) -> Result<Json<StudentOut>, AppError> {
    let student_row = Student::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, student_row.user_id)?;

    if let Some(user_patch) = &body.user {
        let target = UserService::find_by_id(db.inner(), student_row.user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        UserService::apply_user_patch(db.inner(), target, user_patch).await?;
    }

    let student_row = if let Some(class_id) = body.school_class_id {
        SchoolClass::find_by_id(class_id)
            .one(db.inner())
            .await?
            .ok_or_else(|| AppError::BadRequest("指定されたクラスが存在しません".to_string()))?;
        let mut active: student::ActiveModel = student_row.into();
        active.school_class_id = Set(Some(class_id));
        active.update(db.inner()).await?
    } else {
        student_row
    };

    Ok(Json(StudentOut::load(db.inner(), student_row).await?))
}

/// 生徒削除 (校長のみ)。
/// 対応するユーザーごと削除し、生徒行・プロフィールはCASCADEで消える。
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    Policy::assert_principal(&auth.user)?;
    let student_row = Student::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    User::delete_by_id(student_row.user_id).exec(db.inner()).await?;
    Ok(rocket::http::Status::NoContent)
}

/// 生徒の請求一覧 (DRFの `@action fees` に相当)
#[get("/<id>/fees")]
pub async fn fees(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<Vec<fee::Model>>, AppError> {
    let student_row = Student::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let fees = student_row.find_related(Fee).all(db.inner()).await?;
    Ok(Json(fees))
}

/// 生徒の出欠一覧 (DRFの `@action attendance` に相当)
#[get("/<id>/attendance")]
pub async fn attendance_records(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<Vec<attendance::Model>>, AppError> {
    let student_row = Student::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let records = student_row.find_related(Attendance).all(db.inner()).await?;
    Ok(Json(records))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, retrieve, create, update, destroy, fees, attendance_records]
}
