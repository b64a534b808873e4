use rocket::http::{ContentType, Status};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::Value;

use school_management_api::entities::prelude::*;

mod common;

fn record_attendance<'c>(
    client: &'c rocket::local::blocking::Client,
    token: &str,
    student_id: i32,
    date: &str,
    status: &str,
) -> rocket::local::blocking::LocalResponse<'c> {
    let body = serde_json::json!({
        "student_id": student_id,
        "date": date,
        "status": status,
    });
    client
        .post("/attendance")
        .header(common::auth_header(token))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
}

#[test]
fn test_duplicate_attendance_for_same_date_conflicts() {
    let client = common::setup();
    let (_, _) = common::create_teacher(&client, "teacher1");
    let (student_user, _) = common::create_student(&client, "student1", None);
    let token = common::login(&client, "teacher1");

    let response = record_attendance(&client, &token, student_user.id, "2024-05-01", "present");
    assert_eq!(response.status(), Status::Created);

    // 同じ (student, date) の二重登録は409
    let response = record_attendance(&client, &token, student_user.id, "2024-05-01", "absent");
    assert_eq!(response.status(), Status::Conflict);

    let db = common::db(&client);
    let count = common::block_on(async { Attendance::find().count(db).await.unwrap() });
    assert_eq!(count, 1);

    // 別の日付なら登録できる
    let response = record_attendance(&client, &token, student_user.id, "2024-05-02", "absent");
    assert_eq!(response.status(), Status::Created);
}

/// エンドツーエンド: 出欠記録ゼロの生徒のダッシュボードは出席率100を返す。
#[test]
fn test_dashboard_attendance_rate_is_100_with_no_records() {
    let client = common::setup();
    common::create_student(&client, "student1", None);
    let token = common::login(&client, "student1");

    let response = client
        .get("/dashboard")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["role"], "student");
    assert_eq!(value["attendance_rate"], 100.0);
}

#[test]
fn test_dashboard_attendance_rate_counts_late_as_present() {
    let client = common::setup();
    let (_, _) = common::create_teacher(&client, "teacher1");
    let (student_user, _) = common::create_student(&client, "student1", None);
    let teacher_token = common::login(&client, "teacher1");

    // present 2, late 1, absent 1 → (2+1)/4 = 75%
    for (date, status) in [
        ("2024-05-01", "present"),
        ("2024-05-02", "present"),
        ("2024-05-03", "late"),
        ("2024-05-04", "absent"),
    ] {
        let response = record_attendance(&client, &teacher_token, student_user.id, date, status);
        assert_eq!(response.status(), Status::Created);
    }

    let token = common::login(&client, "student1");
    let response = client
        .get("/dashboard")
        .header(common::auth_header(&token))
        .dispatch();
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["attendance_rate"], 75.0);
}

#[test]
fn test_attendance_by_class_filters_by_date() {
    let client = common::setup();
    let (_, _) = common::create_teacher(&client, "teacher1");
    let class = common::create_class(&client, "Grade 3", None);
    let (s1, _) = common::create_student(&client, "student1", Some(class.id));
    let (s2, _) = common::create_student(&client, "student2", Some(class.id));
    // クラス外の生徒の記録は含まれない
    let (outsider, _) = common::create_student(&client, "outsider", None);
    let token = common::login(&client, "teacher1");

    record_attendance(&client, &token, s1.id, "2024-05-01", "present");
    record_attendance(&client, &token, s2.id, "2024-05-01", "absent");
    record_attendance(&client, &token, s1.id, "2024-05-02", "late");
    record_attendance(&client, &token, outsider.id, "2024-05-01", "present");

    // 日付指定なし → クラスの全記録
    let response = client
        .get(format!("/attendance/class/{}", class.id))
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value.as_array().unwrap().len(), 3);

    // 日付指定あり → その日の記録のみ
    let response = client
        .get(format!("/attendance/class/{}?date=2024-05-01", class.id))
        .header(common::auth_header(&token))
        .dispatch();
    let value: Value = response.into_json().unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);

    // 不正な日付は400
    let response = client
        .get(format!("/attendance/class/{}?date=not-a-date", class.id))
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
}

#[test]
fn test_student_attendance_endpoint() {
    let client = common::setup();
    let (_, _) = common::create_teacher(&client, "teacher1");
    let (student_user, _) = common::create_student(&client, "student1", None);
    let teacher_token = common::login(&client, "teacher1");

    record_attendance(&client, &teacher_token, student_user.id, "2024-05-01", "present");
    record_attendance(&client, &teacher_token, student_user.id, "2024-05-02", "late");

    let token = common::login(&client, "student1");
    let response = client
        .get(format!("/students/{}/attendance", student_user.id))
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
}

#[test]
fn test_attendance_for_unknown_student_is_rejected() {
    let client = common::setup();
    let (_, _) = common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = record_attendance(&client, &token, 9999, "2024-05-01", "present");
    assert_eq!(response.status(), Status::BadRequest);
}
