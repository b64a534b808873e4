use rocket::http::{ContentType, Header};
use rocket::local::blocking::Client;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use school_management_api::auth_utils::hash_password;
use school_management_api::build_rocket;
use school_management_api::entities::{school_class, student, teacher, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

// DATABASE_URL はプロセス全体で共有されるため、セットアップは直列化する
static SETUP_LOCK: Mutex<()> = Mutex::new(());
static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// テストごとに独立したSQLiteファイルでアプリを起動する。
/// `sqlite::memory:` はプールのコネクションごとに別DBになってしまうため、
/// 一時ディレクトリ上のファイルを使う。
pub fn setup() -> Client {
    let _guard = SETUP_LOCK.lock().unwrap();

    dotenvy::dotenv().ok();
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "school_management_test_{}_{}.db",
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_file(&path);
    std::env::set_var(
        "DATABASE_URL",
        format!("sqlite://{}?mode=rwc", path.display()),
    );

    let rocket = rocket::async_test(async { build_rocket().await });
    Client::tracked(rocket).expect("valid rocket instance")
}

/// テストヘルパーから非同期のDB操作を実行するためのランタイム
pub fn block_on<F: Future>(future: F) -> F::Output {
    rocket::tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

pub fn db(client: &Client) -> &DatabaseConnection {
    client.rocket().state::<DatabaseConnection>().unwrap()
}

pub const TEST_PASSWORD: &str = "password123";

/// 指定した役割のユーザーを直接DBに作成する
pub fn create_user(client: &Client, username: &str, role: user::Role) -> user::Model {
    let db = db(client);
    block_on(async {
        user::ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set(hash_password(TEST_PASSWORD).unwrap()),
            email: Set(format!("{}@school.test", username)),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            role: Set(role),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("failed to insert test user")
    })
}

pub fn create_principal(client: &Client, username: &str) -> user::Model {
    create_user(client, username, user::Role::Principal)
}

/// 生徒ユーザーと生徒行を作成する
pub fn create_student(
    client: &Client,
    username: &str,
    class_id: Option<i32>,
) -> (user::Model, student::Model) {
    let user = create_user(client, username, user::Role::Student);
    let db = db(client);
    let student = block_on(async {
        student::ActiveModel {
            user_id: Set(user.id),
            school_class_id: Set(class_id),
        }
        .insert(db)
        .await
        .expect("failed to insert test student")
    });
    (user, student)
}

/// 教師ユーザーと教師行を作成する
pub fn create_teacher(client: &Client, username: &str) -> (user::Model, teacher::Model) {
    let user = create_user(client, username, user::Role::Teacher);
    let db = db(client);
    let teacher = block_on(async {
        teacher::ActiveModel {
            user_id: Set(user.id),
            hire_date: Set(None),
            qualification: Set(None),
            experience_years: Set(None),
            specialization: Set(None),
        }
        .insert(db)
        .await
        .expect("failed to insert test teacher")
    });
    (user, teacher)
}

pub fn create_class(client: &Client, name: &str, teacher_id: Option<i32>) -> school_class::Model {
    let db = db(client);
    block_on(async {
        school_class::ActiveModel {
            name: Set(name.to_owned()),
            teacher_id: Set(teacher_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("failed to insert test class")
    })
}

/// ログインしてアクセストークンを取り出す
pub fn login(client: &Client, username: &str) -> String {
    let body = serde_json::json!({
        "username": username,
        "password": TEST_PASSWORD,
    });
    let response = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), rocket::http::Status::Ok, "login failed");
    let value: serde_json::Value = response.into_json().expect("login response is json");
    value["access"].as_str().expect("access token").to_string()
}

/// ログインしてリフレッシュトークンも含めて取り出す
pub fn login_pair(client: &Client, username: &str) -> (String, String) {
    let body = serde_json::json!({
        "username": username,
        "password": TEST_PASSWORD,
    });
    let response = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), rocket::http::Status::Ok, "login failed");
    let value: serde_json::Value = response.into_json().expect("login response is json");
    (
        value["access"].as_str().unwrap().to_string(),
        value["refresh"].as_str().unwrap().to_string(),
    )
}

pub fn auth_header(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

/// JSONレスポンス中の金額フィールドをDecimalとして読む。
/// (文字列・数値どちらのシリアライズでも扱えるようにしておく)
pub fn decimal_field(value: &serde_json::Value) -> rust_decimal::Decimal {
    use std::str::FromStr;
    match value {
        serde_json::Value::String(s) => rust_decimal::Decimal::from_str(s).unwrap(),
        other => rust_decimal::Decimal::from_str(&other.to_string()).unwrap(),
    }
}
