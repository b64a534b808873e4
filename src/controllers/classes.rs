use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{prelude::*, school_class, student, timetable, user};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::serializers::StudentOut;
use crate::services::policy::Policy;

/// クラス作成/更新リクエスト
#[derive(Deserialize)]
pub struct SchoolClassForm {
    pub name: String,
    #[serde(default)]
    pub teacher_id: Option<i32>,
}

/// 担任として指定されたユーザーが role=teacher であることを確認する。
/// DB制約ではなくバリデーション層でのチェック (Djangoの limit_choices_to 相当)。
async fn validate_teacher(db: &DatabaseConnection, teacher_id: i32) -> Result<(), AppError> {
    let teacher = User::find_by_id(teacher_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest("指定されたユーザーが存在しません".to_string()))?;
    if teacher.role != user::Role::Teacher {
        return Err(AppError::BadRequest(
            "担任には role=teacher のユーザーのみ指定できます".to_string(),
        ));
    }
    Ok(())
}

/// クラス一覧
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<school_class::Model>>, AppError> {
    let classes = SchoolClass::find()
        .order_by_asc(school_class::Column::Name)
        .all(db.inner())
        .await?;
    Ok(Json(classes))
}

/// クラス詳細
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<school_class::Model>, AppError> {
    let class = SchoolClass::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(class))
}

/// クラス作成 (校長のみ)。名前の重複は409。
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    body: Json<SchoolClassForm>,
) -> Result<status::Created<Json<school_class::Model>>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let body = body.into_inner();

    if body.name.trim().is_empty() {
        return Err(AppError::Validation(vec!["クラス名は必須です".to_string()]));
    }
    if let Some(teacher_id) = body.teacher_id {
        validate_teacher(db.inner(), teacher_id).await?;
    }

    let class = school_class::ActiveModel {
        name: Set(body.name),
        teacher_id: Set(body.teacher_id),
        ..Default::default()
    }
    .insert(db.inner())
    .await
    .map_err(AppError::from_db)?;

    let location = format!("/classes/{}", class.id);
    Ok(status::Created::new(location).body(Json(class)))
}

/// クラス更新 (校長のみ)
#[put("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
    body: Json<SchoolClassForm>,
) -> Result<Json<school_class::Model>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let class = SchoolClass::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let body = body.into_inner();

    if let Some(teacher_id) = body.teacher_id {
        validate_teacher(db.inner(), teacher_id).await?;
    }

    let mut active: school_class::ActiveModel = class.into();
    active.name = Set(body.name);
    active.teacher_id = Set(body.teacher_id);
    let class = active.update(db.inner()).await.map_err(AppError::from_db)?;
    Ok(Json(class))
}

/// クラス削除 (校長のみ)。
/// 生徒は削除されず、所属クラスが外れるだけ (SET NULL)。
/// 時間割と課題はクラスと一緒に消える (CASCADE)。
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    Policy::assert_principal(&auth.user)?;
    let result = SchoolClass::delete_by_id(id).exec(db.inner()).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(rocket::http::Status::NoContent)
}

/// クラスの生徒一覧 (DRFの `@action students` に相当)
#[get("/<id>/students")]
pub async fn students(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<Vec<StudentOut>>, AppError> {
    SchoolClass::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let students = Student::find()
        .filter(student::Column::SchoolClassId.eq(id))
        .all(db.inner())
        .await?;
    let mut items = Vec::with_capacity(students.len());
    for s in students {
        items.push(StudentOut::load(db.inner(), s).await?);
    }
    Ok(Json(items))
}

/// クラスの時間割 (DRFの `@action timetable` に相当)
#[get("/<id>/timetable")]
pub async fn class_timetable(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<Vec<timetable::Model>>, AppError> {
    SchoolClass::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let entries = Timetable::find()
        .filter(timetable::Column::SchoolClassId.eq(id))
        .all(db.inner())
        .await?;
    Ok(Json(entries))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, retrieve, create, update, destroy, students, class_timetable]
}
