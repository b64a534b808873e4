use chrono::NaiveDate;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{prelude::*, school_class, student, teacher, user};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::serializers::{StudentOut, TeacherOut, UserPatch};
use crate::services::policy::Policy;
use crate::services::user_service::UserService;
use crate::validation::UserFormValidation;

/// 教師作成リクエスト。role=teacher のユーザーと教師行を同時に作成する。
#[derive(Deserialize)]
pub struct TeacherCreateRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// 教師更新リクエスト。
#[derive(Deserialize)]
pub struct TeacherUpdateRequest {
    #[serde(default)]
    pub user: Option<UserPatch>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// 教師一覧
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<TeacherOut>>, AppError> {
    let teachers = Teacher::find().all(db.inner()).await?;
    let mut items = Vec::with_capacity(teachers.len());
    for t in teachers {
        items.push(TeacherOut::load(db.inner(), t).await?);
    }
    Ok(Json(items))
}

/// 教師詳細
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<TeacherOut>, AppError> {
    let teacher_row = Teacher::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(TeacherOut::load(db.inner(), teacher_row).await?))
}

/// 教師作成 (校長のみ)
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    body: Json<TeacherCreateRequest>,
) -> Result<status::Created<Json<TeacherOut>>, AppError> {
    Policy::assert_principal(&auth.user)?;
    let body = body.into_inner();

    UserFormValidation::new(&body.username, Some(&body.password), body.email.as_deref())
        .validate_form()
        .map_err(AppError::Validation)?;

    let new_user = UserService::create(
        db.inner(),
        &body.username,
        &body.password,
        body.email.as_deref().unwrap_or(""),
        body.first_name.as_deref().unwrap_or(""),
        body.last_name.as_deref().unwrap_or(""),
        user::Role::Teacher,
    )
    .await?;

    let teacher_row = teacher::ActiveModel {
        user_id: Set(new_user.id),
        hire_date: Set(body.hire_date),
        qualification: Set(body.qualification),
        experience_years: Set(body.experience_years),
        specialization: Set(body.specialization),
    }
    .insert(db.inner())
    .await?;

    let location = format!("/teachers/{}", teacher_row.user_id);
    Ok(status::Created::new(location).body(Json(TeacherOut::load(db.inner(), teacher_row).await?)))
}

/// 教師更新。本人または校長のみ。
#[put("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
    body: Json<TeacherUpdateRequest>,
) -> Result<Json<TeacherOut>, AppError> {
    let teacher_row = Teacher::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, teacher_row.user_id)?;

    if let Some(user_patch) = &body.user {
        let target = UserService::find_by_id(db.inner(), teacher_row.user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        UserService::apply_user_patch(db.inner(), target, user_patch).await?;
    }

    let has_changes = body.hire_date.is_some()
        || body.qualification.is_some()
        || body.experience_years.is_some()
        || body.specialization.is_some();
    let teacher_row = if has_changes {
        let mut active: teacher::ActiveModel = teacher_row.into();
        if let Some(hire_date) = body.hire_date {
            active.hire_date = Set(Some(hire_date));
        }
        if let Some(qualification) = &body.qualification {
            active.qualification = Set(Some(qualification.clone()));
        }
        if let Some(experience_years) = body.experience_years {
            active.experience_years = Set(Some(experience_years));
        }
        if let Some(specialization) = &body.specialization {
            active.specialization = Set(Some(specialization.clone()));
        }
        active.update(db.inner()).await?
    } else {
        teacher_row
    };

    Ok(Json(TeacherOut::load(db.inner(), teacher_row).await?))
}

/// 教師削除 (校長のみ)。対応するユーザーごと削除する。
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    Policy::assert_principal(&auth.user)?;
    let teacher_row = Teacher::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    User::delete_by_id(teacher_row.user_id).exec(db.inner()).await?;
    Ok(rocket::http::Status::NoContent)
}

/// 担任しているクラス一覧 (DRFの `@action classes` に相当)
#[get("/<id>/classes")]
pub async fn classes(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<Vec<school_class::Model>>, AppError> {
    Teacher::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let classes = SchoolClass::find()
        .filter(school_class::Column::TeacherId.eq(id))
        .all(db.inner())
        .await?;
    Ok(Json(classes))
}

/// 担任しているクラスの生徒一覧
#[get("/<id>/students")]
pub async fn students(
    db: &State<DatabaseConnection>,
    _user: AuthenticatedUser,
    id: i32,
) -> Result<Json<Vec<StudentOut>>, AppError> {
    Teacher::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let class_ids: Vec<i32> = SchoolClass::find()
        .filter(school_class::Column::TeacherId.eq(id))
        .all(db.inner())
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    let students = if class_ids.is_empty() {
        Vec::new()
    } else {
        Student::find()
            .filter(student::Column::SchoolClassId.is_in(class_ids))
            .all(db.inner())
            .await?
    };

    let mut items = Vec::with_capacity(students.len());
    for s in students {
        items.push(StudentOut::load(db.inner(), s).await?);
    }
    Ok(Json(items))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, retrieve, create, update, destroy, classes, students]
}
