use rocket::http::{ContentType, Status};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::Value;

use school_management_api::entities::{prelude::*, user_profile};

mod common;

#[test]
fn test_student_profile_update_basic_fields() {
    let client = common::setup();
    let (user, _) = common::create_student(&client, "student1", None);
    let token = common::login(&client, "student1");

    let update = serde_json::json!({
        "user": {
            "first_name": "Johnny",
            "last_name": "Updated",
            "email": "johnny.updated@school.test",
        }
    });
    let response = client
        .put(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    // DBに反映されていることを確認する
    let db = common::db(&client);
    let updated = common::block_on(async { User::find_by_id(user.id).one(db).await.unwrap() }).unwrap();
    assert_eq!(updated.first_name, "Johnny");
    assert_eq!(updated.last_name, "Updated");
    assert_eq!(updated.email, "johnny.updated@school.test");
}

#[test]
fn test_profile_creation_on_update() {
    let client = common::setup();
    let (user, _) = common::create_student(&client, "student2", None);
    let token = common::login(&client, "student2");

    // プロフィール行はまだ存在しない
    let db = common::db(&client);
    let before = common::block_on(async {
        UserProfile::find()
            .filter(user_profile::Column::UserId.eq(user.id))
            .one(db)
            .await
            .unwrap()
    });
    assert!(before.is_none());

    let update = serde_json::json!({
        "user": {
            "profile": {
                "phone": "7778889999",
                "address": "New Student Address",
            }
        }
    });
    let response = client
        .put(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    // プロフィール行が get-or-create で作成されている
    let profile = common::block_on(async {
        UserProfile::find()
            .filter(user_profile::Column::UserId.eq(user.id))
            .one(db)
            .await
            .unwrap()
    })
    .expect("profile should be created");
    assert_eq!(profile.phone.as_deref(), Some("7778889999"));
    assert_eq!(profile.address.as_deref(), Some("New Student Address"));
}

#[test]
fn test_partial_update_leaves_other_fields_untouched() {
    let client = common::setup();
    let (user, _) = common::create_student(&client, "student1", None);
    let token = common::login(&client, "student1");

    // まず phone と address を設定する
    let update = serde_json::json!({
        "user": { "profile": { "phone": "1234567890", "address": "123 Student St" } }
    });
    let response = client
        .put(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    // phone だけを更新する
    let update = serde_json::json!({
        "user": { "profile": { "phone": "1112223333" } }
    });
    let response = client
        .put(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    // address には触れていない
    let db = common::db(&client);
    let profile = common::block_on(async {
        UserProfile::find()
            .filter(user_profile::Column::UserId.eq(user.id))
            .one(db)
            .await
            .unwrap()
    })
    .unwrap();
    assert_eq!(profile.phone.as_deref(), Some("1112223333"));
    assert_eq!(profile.address.as_deref(), Some("123 Student St"));
}

#[test]
fn test_unauthorized_profile_update() {
    let client = common::setup();
    common::create_student(&client, "student1", None);
    let (other_user, _) = common::create_student(&client, "student2", None);
    let token = common::login(&client, "student1");

    // 他人のレコードは更新できない
    let update = serde_json::json!({
        "user": { "first_name": "Hacked" }
    });
    let response = client
        .put(format!("/students/{}", other_user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);

    // 変更されていないことを確認する
    let db = common::db(&client);
    let unchanged =
        common::block_on(async { User::find_by_id(other_user.id).one(db).await.unwrap() }).unwrap();
    assert_eq!(unchanged.first_name, "");
}

#[test]
fn test_principal_can_update_any_student() {
    let client = common::setup();
    common::create_principal(&client, "principal");
    let (student_user, _) = common::create_student(&client, "student1", None);
    let token = common::login(&client, "principal");

    let update = serde_json::json!({
        "user": { "first_name": "ByPrincipal" }
    });
    let response = client
        .put(format!("/students/{}", student_user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
}

#[test]
fn test_profile_update_validation() {
    let client = common::setup();
    let (user, _) = common::create_student(&client, "student1", None);
    let token = common::login(&client, "student1");

    let update = serde_json::json!({
        "user": { "email": "invalid-email" }
    });
    let response = client
        .put(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);

    let body: Value = response.into_json().unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["errors"].as_array().map(|a| !a.is_empty()).unwrap_or(false));
}

#[test]
fn test_teacher_profile_update_with_teacher_fields() {
    let client = common::setup();
    let (user, _) = common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let update = serde_json::json!({
        "user": {
            "first_name": "Dr. Jane",
            "profile": { "phone": "4445556666", "subject": "Mathematics" },
        },
        "qualification": "Ph.D. in Education",
        "experience_years": 10,
        "specialization": "Mathematics",
    });
    let response = client
        .put(format!("/teachers/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let db = common::db(&client);
    let teacher_row =
        common::block_on(async { Teacher::find_by_id(user.id).one(db).await.unwrap() }).unwrap();
    assert_eq!(teacher_row.qualification.as_deref(), Some("Ph.D. in Education"));
    assert_eq!(teacher_row.experience_years, Some(10));
    assert_eq!(teacher_row.specialization.as_deref(), Some("Mathematics"));

    let updated_user =
        common::block_on(async { User::find_by_id(user.id).one(db).await.unwrap() }).unwrap();
    assert_eq!(updated_user.first_name, "Dr. Jane");
}

#[test]
fn test_serialized_student_includes_nested_profile() {
    let client = common::setup();
    let class = common::create_class(&client, "10A", None);
    let (user, _) = common::create_student(&client, "student1", Some(class.id));
    let token = common::login(&client, "student1");

    // プロフィールを作成しておく
    let update = serde_json::json!({
        "user": { "profile": { "phone": "1234567890" } }
    });
    client
        .put(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .header(ContentType::JSON)
        .body(update.to_string())
        .dispatch();

    let response = client
        .get(format!("/students/{}", user.id))
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["user"]["username"], "student1");
    assert_eq!(value["user"]["profile"]["phone"], "1234567890");
    assert_eq!(value["school_class_id"], class.id);
}
