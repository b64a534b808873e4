use rocket::serde::json::Json;
use rocket::State;
use rust_decimal::Decimal;
use sea_orm::*;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::entities::{fee, leave_request, prelude::*, school_class, task, timetable, user};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::services::attendance_service::AttendanceService;

/// 役割に応じたダッシュボードのスナップショットを返す。
/// 生徒は出席率と未払い請求、教師は担当クラスとタスク、校長は全体の集計。
#[get("/")]
pub async fn dashboard(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let snapshot = match auth.user.role {
        user::Role::Student => student_dashboard(db.inner(), &auth.user).await?,
        user::Role::Teacher => teacher_dashboard(db.inner(), &auth.user).await?,
        user::Role::Principal => principal_dashboard(db.inner()).await?,
    };
    Ok(Json(snapshot))
}

async fn student_dashboard(db: &DatabaseConnection, user: &user::Model) -> Result<Value, AppError> {
    let student = Student::find_by_id(user.id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    // 記録ゼロのときは100になる (皆勤とみなす方針)
    let attendance_rate = AttendanceService::attendance_rate(db, student.user_id).await?;

    let pending_fees = Fee::find()
        .filter(fee::Column::StudentId.eq(student.user_id))
        .filter(fee::Column::Status.ne(fee::Status::Paid))
        .all(db)
        .await?;
    let pending_fee_total: Decimal = pending_fees.iter().map(|f| f.amount).sum();

    let subjects = match student.school_class_id {
        Some(class_id) => class_subjects(db, class_id).await?,
        None => Vec::new(),
    };

    Ok(json!({
        "role": "student",
        "attendance_rate": attendance_rate,
        "pending_fee_count": pending_fees.len(),
        "pending_fee_total": pending_fee_total,
        "subjects": subjects,
    }))
}

async fn teacher_dashboard(db: &DatabaseConnection, user: &user::Model) -> Result<Value, AppError> {
    let classes = SchoolClass::find()
        .filter(school_class::Column::TeacherId.eq(user.id))
        .all(db)
        .await?;

    let mut class_snapshots = Vec::with_capacity(classes.len());
    for c in &classes {
        class_snapshots.push(json!({
            "id": c.id,
            "name": c.name,
            "subjects": class_subjects(db, c.id).await?,
        }));
    }

    let open_tasks = Task::find()
        .filter(task::Column::TeacherId.eq(user.id))
        .filter(task::Column::Status.is_in([task::Status::Pending, task::Status::InProgress]))
        .count(db)
        .await?;
    let completed_tasks = Task::find()
        .filter(task::Column::TeacherId.eq(user.id))
        .filter(task::Column::Status.eq(task::Status::Completed))
        .count(db)
        .await?;

    Ok(json!({
        "role": "teacher",
        "classes": class_snapshots,
        "open_task_count": open_tasks,
        "completed_task_count": completed_tasks,
    }))
}

async fn principal_dashboard(db: &DatabaseConnection) -> Result<Value, AppError> {
    let school = School::find().one(db).await?;

    Ok(json!({
        "role": "principal",
        "school": school,
        "student_count": Student::find().count(db).await?,
        "teacher_count": Teacher::find().count(db).await?,
        "class_count": SchoolClass::find().count(db).await?,
        "pending_fee_count": Fee::find()
            .filter(fee::Column::Status.ne(fee::Status::Paid))
            .count(db)
            .await?,
        "pending_leave_count": LeaveRequest::find()
            .filter(leave_request::Column::Status.eq(leave_request::Status::Pending))
            .count(db)
            .await?,
    }))
}

/// クラスの時間割から重複を除いた (科目, 教師) の一覧を作る。
/// 区別は (科目, 教師) のペア単位。同じ科目でも教師が違えば別エントリになる。
async fn class_subjects(db: &DatabaseConnection, class_id: i32) -> Result<Vec<Value>, AppError> {
    let entries = Timetable::find()
        .filter(timetable::Column::SchoolClassId.eq(class_id))
        .all(db)
        .await?;

    let teacher_ids: Vec<i32> = entries
        .iter()
        .filter_map(|e| e.teacher_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let teacher_names: std::collections::HashMap<i32, String> = if teacher_ids.is_empty() {
        Default::default()
    } else {
        User::find()
            .filter(user::Column::Id.is_in(teacher_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| {
                let name = if u.first_name.is_empty() && u.last_name.is_empty() {
                    u.username.clone()
                } else {
                    format!("{} {}", u.first_name, u.last_name).trim().to_string()
                };
                (u.id, name)
            })
            .collect()
    };

    let mut seen = HashSet::new();
    let mut subjects = Vec::new();
    for e in &entries {
        if seen.insert((e.subject.clone(), e.teacher_id)) {
            subjects.push(json!({
                "subject": e.subject,
                "teacher_id": e.teacher_id,
                "teacher": e.teacher_id.and_then(|id| teacher_names.get(&id).cloned()),
            }));
        }
    }
    Ok(subjects)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![dashboard]
}
