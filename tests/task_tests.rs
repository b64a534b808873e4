use rocket::http::{ContentType, Status};
use serde_json::Value;

mod common;

fn create_task<'c>(
    client: &'c rocket::local::blocking::Client,
    token: &str,
    title: &str,
) -> rocket::local::blocking::LocalResponse<'c> {
    let body = serde_json::json!({
        "title": title,
        "description": "Review and grade student assignments for the week",
        "task_type": "grade_assignments",
        "priority": "high",
        "due_date": "2024-06-10",
    });
    client
        .post("/tasks")
        .header(common::auth_header(token))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
}

#[test]
fn test_task_create_infers_owner_from_caller() {
    let client = common::setup();
    let (teacher_user, _) = common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = create_task(&client, &token, "Grade assignment submissions");
    assert_eq!(response.status(), Status::Created);
    let value: Value = response.into_json().unwrap();

    // 所有者はリクエストではなく認証情報から決まる
    assert_eq!(value["teacher_id"], teacher_user.id);
    assert_eq!(value["status"], "pending");
    assert!(value["completed_at"].is_null());
}

#[test]
fn test_task_create_without_teacher_record_fails() {
    let client = common::setup();
    common::create_student(&client, "student1", None);
    let token = common::login(&client, "student1");

    let response = create_task(&client, &token, "Should not work");
    assert_eq!(response.status(), Status::BadRequest);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["error"], "validation_error");
}

#[test]
fn test_mark_in_progress_and_mark_completed() {
    let client = common::setup();
    common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = create_task(&client, &token, "Prepare lesson plan");
    let task: Value = response.into_json().unwrap();
    let task_id = task["id"].as_i64().unwrap();

    // 着手: ステータスは変わるが完了日時はnullのまま
    let response = client
        .post(format!("/tasks/{}/mark_in_progress", task_id))
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["status"], "in_progress");
    assert!(value["completed_at"].is_null());

    // 完了: ステータスと完了日時の両方がセットされる
    let response = client
        .post(format!("/tasks/{}/mark_completed", task_id))
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["status"], "completed");
    assert!(value["completed_at"].as_str().is_some());
}

#[test]
fn test_generic_update_does_not_stamp_completed_at() {
    let client = common::setup();
    common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = create_task(&client, &token, "Plan laboratory experiment");
    let task: Value = response.into_json().unwrap();
    let task_id = task["id"].as_i64().unwrap();

    // 汎用更新で status を直接 completed にしても completed_at は付かない
    let body = serde_json::json!({ "status": "completed" });
    let response = client
        .put(format!("/tasks/{}", task_id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["status"], "completed");
    assert!(value["completed_at"].is_null());
}

#[test]
fn test_cancelled_is_reachable_from_any_state() {
    let client = common::setup();
    common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = create_task(&client, &token, "Parent-teacher meeting preparation");
    let task: Value = response.into_json().unwrap();
    let task_id = task["id"].as_i64().unwrap();

    client
        .post(format!("/tasks/{}/mark_in_progress", task_id))
        .header(common::auth_header(&token))
        .dispatch();

    let body = serde_json::json!({ "status": "cancelled" });
    let response = client
        .put(format!("/tasks/{}", task_id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["status"], "cancelled");
}

#[test]
fn test_task_ownership_policy() {
    let client = common::setup();
    common::create_teacher(&client, "teacher1");
    common::create_teacher(&client, "teacher2");
    common::create_principal(&client, "principal");
    let owner_token = common::login(&client, "teacher1");

    let response = create_task(&client, &owner_token, "Update attendance records");
    let task: Value = response.into_json().unwrap();
    let task_id = task["id"].as_i64().unwrap();

    // 他の教師は操作できない
    let other_token = common::login(&client, "teacher2");
    let response = client
        .post(format!("/tasks/{}/mark_completed", task_id))
        .header(common::auth_header(&other_token))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);

    // 他の教師の一覧には出てこない
    let response = client
        .get("/tasks")
        .header(common::auth_header(&other_token))
        .dispatch();
    let value: Value = response.into_json().unwrap();
    assert_eq!(value.as_array().unwrap().len(), 0);

    // 校長は全件見える
    let principal_token = common::login(&client, "principal");
    let response = client
        .get("/tasks")
        .header(common::auth_header(&principal_token))
        .dispatch();
    let value: Value = response.into_json().unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
}
