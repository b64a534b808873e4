use rocket::http::{ContentType, Status};
use serde_json::Value;

use school_management_api::entities::user::Role;

mod common;

#[test]
fn test_health_check() {
    let client = common::setup();

    // 認証なしでアクセスできる
    let response = client.get("/health").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["message"].as_str().is_some());
}

#[test]
fn test_login_returns_token_pair_and_user() {
    let client = common::setup();
    common::create_student(&client, "student1", None);

    let body = serde_json::json!({
        "username": "student1",
        "password": common::TEST_PASSWORD,
    });
    let response = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();

    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert!(value["access"].as_str().is_some());
    assert!(value["refresh"].as_str().is_some());
    assert_eq!(value["user"]["username"], "student1");
    assert_eq!(value["user"]["role"], "student");
    // パスワードハッシュは決して返さない
    assert!(value["user"].get("password_hash").is_none());
}

#[test]
fn test_login_with_wrong_password_is_unauthorized() {
    let client = common::setup();
    common::create_student(&client, "student1", None);

    let body = serde_json::json!({
        "username": "student1",
        "password": "wrong_password",
    });
    let response = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();

    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_requests_without_token_are_unauthorized() {
    let client = common::setup();

    let response = client.get("/students").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client.get("/dashboard").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_refresh_token_cannot_be_used_as_access_token() {
    let client = common::setup();
    common::create_student(&client, "student1", None);
    let (_access, refresh) = common::login_pair(&client, "student1");

    let response = client
        .get("/auth/user")
        .header(common::auth_header(&refresh))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_refresh_and_logout_lifecycle() {
    let client = common::setup();
    common::create_student(&client, "student1", None);
    let (access, refresh) = common::login_pair(&client, "student1");

    // リフレッシュで新しいアクセストークンが得られる
    let body = serde_json::json!({ "refresh": refresh });
    let response = client
        .post("/auth/token/refresh")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert!(value["access"].as_str().is_some());

    // アクセストークンをリフレッシュには使えない
    let bad = serde_json::json!({ "refresh": access });
    let response = client
        .post("/auth/token/refresh")
        .header(ContentType::JSON)
        .body(bad.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);

    // ログアウトでリフレッシュトークンが失効する (205)
    let body = serde_json::json!({ "refresh": refresh });
    let response = client
        .post("/auth/logout")
        .header(common::auth_header(&access))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::ResetContent);

    // 失効後のリフレッシュは拒否される
    let body = serde_json::json!({ "refresh": refresh });
    let response = client
        .post("/auth/token/refresh")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_current_user_endpoint() {
    let client = common::setup();
    let (user, _) = common::create_teacher(&client, "teacher1");
    let token = common::login(&client, "teacher1");

    let response = client
        .get("/auth/user")
        .header(common::auth_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let value: Value = response.into_json().unwrap();
    assert_eq!(value["id"], user.id);
    assert_eq!(value["username"], "teacher1");
    assert_eq!(value["role"], "teacher");
}

#[test]
fn test_inactive_user_cannot_login() {
    let client = common::setup();
    let user = common::create_user(&client, "student1", Role::Student);

    // ユーザーを無効化する
    let db = common::db(&client);
    common::block_on(async {
        use sea_orm::{ActiveModelTrait, Set};
        use school_management_api::entities::user;
        let mut active: user::ActiveModel = user.into();
        active.is_active = Set(false);
        active.update(db).await.unwrap()
    });

    let body = serde_json::json!({
        "username": "student1",
        "password": common::TEST_PASSWORD,
    });
    let response = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);
}
