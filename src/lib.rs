#[macro_use]
extern crate rocket;

use migration::{Migrator, MigratorTrait};
use rocket::Build;

pub mod auth_utils;
pub mod controllers;
pub mod db;
pub mod entities;
pub mod errors;
pub mod guards;
pub mod macros;
pub mod serializers;
pub mod services;
pub mod validation;

/// Rocketインスタンスを構築する関数。
/// テスト時にも利用できるように分離しています。
pub async fn build_rocket() -> rocket::Rocket<Build> {
    // .envファイルを読み込む (環境変数の読み込み)
    dotenvy::dotenv().ok();

    // 1. データベース接続
    let db = db::set_up_db().await.expect("Failed to connect to DB");

    // 2. マイグレーションの実行 (Djangoの `migrate` コマンドに相当)
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    // 3. Rocketインスタンスの構築
    // ルーティングの登録はDjangoの `urls.py` + DefaultRouter に相当します。
    rocket::build()
        // DB接続をRocketの管理下に置く (Djangoの `request.db` のようにどこからでも参照可能にする)
        .manage(db)
        .mount("/", controllers::health::routes())
        .mount("/auth", controllers::auth::routes())
        .mount("/students", controllers::students::routes())
        .mount("/teachers", controllers::teachers::routes())
        .mount("/classes", controllers::classes::routes())
        .mount("/fees", controllers::fees::routes())
        .mount("/attendance", controllers::attendance::routes())
        .mount("/timetable", controllers::timetable::routes())
        .mount("/periods", controllers::periods::routes())
        .mount("/fee_types", controllers::fee_types::routes())
        .mount("/leaves", controllers::leaves::routes())
        .mount("/tasks", controllers::tasks::routes())
        .mount("/notifications", controllers::notifications::routes())
        .mount("/dashboard", controllers::dashboard::routes())
        .mount("/reports", controllers::reports::routes())
}
