use school_management_api::build_rocket;

/// アプリケーションのメインエントリーポイント。
/// Djangoの `manage.py runserver` 実行時の動きに相当します。
#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    let _rocket = build_rocket().await.launch().await?;
    Ok(())
}
