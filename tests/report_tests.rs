use rocket::http::{ContentType, Status};
use serde_json::Value;

mod common;

fn seed_small_school(client: &rocket::local::blocking::Client) {
    common::create_principal(client, "principal");
    let (teacher_user, _) = common::create_teacher(client, "teacher1");
    let class = common::create_class(client, "Grade 1", Some(teacher_user.id));
    common::create_student(client, "student1", Some(class.id));
    common::create_student(client, "student2", Some(class.id));
}

#[test]
fn test_reports_index_lists_available_reports() {
    let client = common::setup();
    seed_small_school(&client);
    let token = common::login(&client, "principal");

    let response = client
        .get("/reports")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert!(value["message"].as_str().unwrap().contains("/academic"));
}

#[test]
fn test_summary_report_counts_entities() {
    let client = common::setup();
    seed_small_school(&client);
    let token = common::login(&client, "principal");

    let response = client
        .get("/reports/summary")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["name"], "summary");

    let sections = value["sections"].as_array().unwrap();
    let overall = sections
        .iter()
        .find(|s| s["name"] == "overall_statistics")
        .expect("overall_statistics section");
    assert_eq!(overall["data"]["total_students"], 2);
    assert_eq!(overall["data"]["total_teachers"], 1);
    assert_eq!(overall["data"]["total_classes"], 1);

    let health = sections
        .iter()
        .find(|s| s["name"] == "system_health")
        .expect("system_health section");
    assert_eq!(health["data"]["database_status"], "healthy");
    // principal + teacher + 2 students
    assert_eq!(health["data"]["active_users"], 4);
}

#[test]
fn test_academic_report_class_distribution() {
    let client = common::setup();
    seed_small_school(&client);
    let token = common::login(&client, "principal");

    let response = client
        .get("/reports/academic")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();

    let sections = value["sections"].as_array().unwrap();
    let distribution = sections
        .iter()
        .find(|s| s["name"] == "class_distribution")
        .expect("class_distribution section");
    let rows = distribution["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Grade 1");
    assert_eq!(rows[0]["student_count"], 2);

    let workload = sections
        .iter()
        .find(|s| s["name"] == "teacher_workload")
        .expect("teacher_workload section");
    let rows = workload["data"].as_array().unwrap();
    assert_eq!(rows[0]["username"], "teacher1");
    assert_eq!(rows[0]["class_count"], 1);
}

#[test]
fn test_generate_reports_writes_immutable_directory_tree() {
    let client = common::setup();
    seed_small_school(&client);
    let token = common::login(&client, "principal");

    // 書き出し先をテスト用の一時ディレクトリに向ける
    let base_dir = std::env::temp_dir().join(format!("school_reports_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&base_dir);
    std::env::set_var("REPORTS_DIR", &base_dir);

    let response = client
        .post("/reports/generate?report_type=all&format=json")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    let path = std::path::PathBuf::from(value["path"].as_str().unwrap());

    // タイムスタンプ付きディレクトリと中身が揃っている
    assert!(path.file_name().unwrap().to_str().unwrap().starts_with("report_"));
    assert!(path.join("metadata.json").is_file());
    assert!(path.join("README.txt").is_file());
    for category in ["academic", "financial", "attendance", "performance", "summary"] {
        assert!(path.join(category).is_dir(), "missing {} dir", category);
    }
    assert!(path.join("academic/academic_reports.json").is_file());
    assert!(path.join("summary/summary_report.json").is_file());

    // 一時ディレクトリ (.tmp) は残らない
    let leftovers: Vec<_> = std::fs::read_dir(&base_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    // metadata.json の中身を確認する
    let metadata: Value =
        serde_json::from_str(&std::fs::read_to_string(path.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["report_type"], "all");
    assert_eq!(metadata["includes"]["summary"], true);

    let _ = std::fs::remove_dir_all(&base_dir);
}

#[test]
fn test_performance_report_ranks_students_by_average() {
    let client = common::setup();
    seed_small_school(&client);
    let token = common::login(&client, "principal");

    // 課題と成績を直接投入する
    let db = common::db(&client);
    common::block_on(async {
        use chrono::NaiveDate;
        use school_management_api::entities::{assignment, grade, prelude::*};
        use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

        let class = SchoolClass::find().one(db).await.unwrap().unwrap();
        let assignment_row = assignment::ActiveModel {
            school_class_id: Set(class.id),
            title: Set("Algebra worksheet".to_string()),
            description: Set("Chapter 3 exercises".to_string()),
            due_date: Set(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        let students = Student::find()
            .order_by_asc(school_management_api::entities::student::Column::UserId)
            .all(db)
            .await
            .unwrap();
        // student1: 90点, student2: 60点
        for (student, score) in students.iter().zip([90, 60]) {
            grade::ActiveModel {
                student_id: Set(student.user_id),
                assignment_id: Set(assignment_row.id),
                score: Set(score),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
    });

    let response = client
        .get("/reports/performance")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    let sections = value["sections"].as_array().unwrap();

    let top = sections
        .iter()
        .find(|s| s["name"] == "top_performers")
        .expect("top_performers section");
    let rows = top["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // 平均点の高い生徒が先頭に来る
    assert_eq!(rows[0]["username"], "student1");
    assert_eq!(rows[0]["avg_score"], 90.0);
    assert_eq!(rows[1]["username"], "student2");

    let per_assignment = sections
        .iter()
        .find(|s| s["name"] == "assignment_performance")
        .expect("assignment_performance section");
    let rows = per_assignment["data"].as_array().unwrap();
    assert_eq!(rows[0]["title"], "Algebra worksheet");
    assert_eq!(rows[0]["avg_score"], 75.0);
    assert_eq!(rows[0]["total_submissions"], 2);
}

#[test]
fn test_generate_reports_requires_principal() {
    let client = common::setup();
    common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = client
        .post("/reports/generate")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);
}

#[test]
fn test_generate_reports_rejects_unknown_format() {
    let client = common::setup();
    common::create_principal(&client, "principal");
    let token = common::login(&client, "principal");

    let response = client
        .post("/reports/generate?format=pdf")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
}

#[test]
fn test_financial_report_reflects_fee_status() {
    let client = common::setup();
    seed_small_school(&client);
    let token = common::login(&client, "principal");

    // unpaid 1000 と paid 2000 を登録する
    let db = common::db(&client);
    let student = common::block_on(async {
        use sea_orm::EntityTrait;
        school_management_api::entities::prelude::Student::find()
            .one(db)
            .await
            .unwrap()
    })
    .unwrap();
    for (amount, status) in [(1000, "unpaid"), (2000, "paid")] {
        let body = serde_json::json!({
            "student_id": student.user_id,
            "amount": amount,
            "due_date": "2024-06-01",
            "status": status,
        });
        let response = client
            .post("/fees")
            .header(common::auth_header(&token))
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch();
        assert_eq!(response.status(), Status::Created);
    }

    let response = client
        .get("/reports/financial")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    let sections = value["sections"].as_array().unwrap();
    let summary = sections
        .iter()
        .find(|s| s["name"] == "fee_summary")
        .expect("fee_summary section");
    assert_eq!(
        common::decimal_field(&summary["data"]["total_amount"]),
        rust_decimal::Decimal::from(3000)
    );
    assert_eq!(
        common::decimal_field(&summary["data"]["paid_amount"]),
        rust_decimal::Decimal::from(2000)
    );
    assert_eq!(
        common::decimal_field(&summary["data"]["pending_amount"]),
        rust_decimal::Decimal::from(1000)
    );
}
