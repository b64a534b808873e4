use chrono::{NaiveDate, Utc};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;
use serde::Deserialize;

use crate::entities::{prelude::*, task, user};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::services::policy::Policy;

/// タスク作成リクエスト。
/// 所有者の教師はリクエストからではなく認証情報から推定する。
#[derive(Deserialize)]
pub struct TaskCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub task_type: String,
    #[serde(default)]
    pub priority: Option<task::Priority>,
    pub due_date: NaiveDate,
}

/// タスクの汎用更新リクエスト。
/// status を直接書き換えても completed_at はスタンプされない
/// (スタンプは mark_completed 専用)。
#[derive(Deserialize)]
pub struct TaskUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub priority: Option<task::Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<task::Status>,
}

/// タスク一覧。校長は全件、教師は自分のタスクのみ。
/// 教師レコードを持たないユーザーには空のリストが返る。
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<task::Model>>, AppError> {
    let mut query = Task::find()
        .order_by_asc(task::Column::DueDate)
        .order_by_desc(task::Column::Priority);
    if auth.user.role != user::Role::Principal {
        query = query.filter(task::Column::TeacherId.eq(auth.user.id));
    }
    Ok(Json(query.all(db.inner()).await?))
}

/// タスク詳細。所有する教師または校長のみ。
#[get("/<id>")]
pub async fn retrieve(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<task::Model>, AppError> {
    let task_row = Task::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, task_row.teacher_id)?;
    Ok(Json(task_row))
}

/// タスク作成。
/// 呼び出し元に対応する教師レコードがなければバリデーションエラー。
#[post("/", data = "<body>")]
pub async fn create(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    body: Json<TaskCreateRequest>,
) -> Result<status::Created<Json<task::Model>>, AppError> {
    let teacher = Teacher::find_by_id(auth.user.id)
        .one(db.inner())
        .await?
        .ok_or_else(|| {
            AppError::Validation(vec![
                "教師レコードが存在しないためタスクを作成できません".to_string(),
            ])
        })?;
    let body = body.into_inner();

    if body.title.trim().is_empty() {
        return Err(AppError::Validation(vec!["タイトルは必須です".to_string()]));
    }

    let now = Utc::now().fixed_offset();
    let task_row = task::ActiveModel {
        teacher_id: Set(teacher.user_id),
        title: Set(body.title),
        description: Set(body.description.unwrap_or_default()),
        task_type: Set(body.task_type),
        priority: Set(body.priority.unwrap_or(task::Priority::Medium)),
        due_date: Set(body.due_date),
        status: Set(task::Status::Pending),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.inner())
    .await?;

    let location = format!("/tasks/{}", task_row.id);
    Ok(status::Created::new(location).body(Json(task_row)))
}

/// タスクの汎用更新。所有する教師または校長のみ。
/// cancelled への遷移もここで行う (どの状態からでも可)。
#[put("/<id>", data = "<body>")]
pub async fn update(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
    body: Json<TaskUpdateRequest>,
) -> Result<Json<task::Model>, AppError> {
    let task_row = Task::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, task_row.teacher_id)?;

    let mut active: task::ActiveModel = task_row.into();
    if let Some(title) = &body.title {
        active.title = Set(title.clone());
    }
    if let Some(description) = &body.description {
        active.description = Set(description.clone());
    }
    if let Some(task_type) = &body.task_type {
        active.task_type = Set(task_type.clone());
    }
    if let Some(priority) = body.priority {
        active.priority = Set(priority);
    }
    if let Some(due_date) = body.due_date {
        active.due_date = Set(due_date);
    }
    if let Some(status) = body.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().fixed_offset());
    let task_row = active.update(db.inner()).await?;
    Ok(Json(task_row))
}

/// タスク削除。所有する教師または校長のみ。
#[delete("/<id>")]
pub async fn destroy(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<rocket::http::Status, AppError> {
    let task_row = Task::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, task_row.teacher_id)?;
    Task::delete_by_id(id).exec(db.inner()).await?;
    Ok(rocket::http::Status::NoContent)
}

/// 着手 (pending → in_progress)。完了日時はnullのまま。
#[post("/<id>/mark_in_progress")]
pub async fn mark_in_progress(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<task::Model>, AppError> {
    let task_row = Task::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, task_row.teacher_id)?;

    let mut active: task::ActiveModel = task_row.into();
    active.status = Set(task::Status::InProgress);
    active.completed_at = Set(None);
    active.updated_at = Set(Utc::now().fixed_offset());
    let task_row = active.update(db.inner()).await?;
    Ok(Json(task_row))
}

/// 完了。status を completed にし、完了日時をスタンプする。
#[post("/<id>/mark_completed")]
pub async fn mark_completed(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<task::Model>, AppError> {
    let task_row = Task::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, task_row.teacher_id)?;

    let now = Utc::now().fixed_offset();
    let mut active: task::ActiveModel = task_row.into();
    active.status = Set(task::Status::Completed);
    active.completed_at = Set(Some(now));
    active.updated_at = Set(now);
    let task_row = active.update(db.inner()).await?;
    Ok(Json(task_row))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list,
        retrieve,
        create,
        update,
        destroy,
        mark_in_progress,
        mark_completed
    ]
}
