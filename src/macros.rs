/// JSONのCRUDハンドラ一式を生成するマクロ。
/// DRFの `ModelViewSet` をルーターに登録するのに相当し、
/// list/retrieve/create/update/destroy と `routes()` を生成する。
/// セマンティクスが素直なリソース (Period, FeeType) で使い、
/// 固有ロジックを持つリソースは各コントローラで手書きする。
///
/// 呼び出し側のモジュールには `From<$form> for $active_model` の実装が必要。
#[macro_export]
macro_rules! impl_crud_api {
    (
        entity: $entity:ty,
        model: $model:ty,
        active_model: $active_model:ty,
        form: $form:ty,
        order_by: $order:expr
    ) => {
        use rocket::response::status;
        use rocket::serde::json::Json;
        use rocket::State;
        use sea_orm::*;

        use $crate::errors::AppError;
        use $crate::guards::auth::AuthenticatedUser;

        /// 一覧取得 (DRFの `list` アクションに相当)
        #[get("/")]
        pub async fn list(
            db: &State<DatabaseConnection>,
            _user: AuthenticatedUser,
        ) -> Result<Json<Vec<$model>>, AppError> {
            let items = <$entity>::find()
                .order_by_asc($order)
                .all(db.inner())
                .await?;
            Ok(Json(items))
        }

        /// 詳細取得 (DRFの `retrieve`)
        #[get("/<id>")]
        pub async fn retrieve(
            db: &State<DatabaseConnection>,
            _user: AuthenticatedUser,
            id: i32,
        ) -> Result<Json<$model>, AppError> {
            let item = <$entity>::find_by_id(id)
                .one(db.inner())
                .await?
                .ok_or(AppError::NotFound)?;
            Ok(Json(item))
        }

        /// 作成 (DRFの `create`)。一意制約違反は409になる。
        #[post("/", data = "<body>")]
        pub async fn create(
            db: &State<DatabaseConnection>,
            _user: AuthenticatedUser,
            body: Json<$form>,
        ) -> Result<status::Created<Json<$model>>, AppError> {
            let active: $active_model = body.into_inner().into();
            let item = active.insert(db.inner()).await.map_err(AppError::from_db)?;
            Ok(status::Created::new("").body(Json(item)))
        }

        /// 更新 (DRFの `update`)
        #[put("/<id>", data = "<body>")]
        pub async fn update(
            db: &State<DatabaseConnection>,
            _user: AuthenticatedUser,
            id: i32,
            body: Json<$form>,
        ) -> Result<Json<$model>, AppError> {
            let existing = <$entity>::find_by_id(id)
                .one(db.inner())
                .await?
                .ok_or(AppError::NotFound)?;

            let mut active: $active_model = body.into_inner().into();
            // ルートのIDを強制する
            active.id = Set(existing.id);
            let item = active.update(db.inner()).await.map_err(AppError::from_db)?;
            Ok(Json(item))
        }

        /// 削除 (DRFの `destroy`)
        #[delete("/<id>")]
        pub async fn destroy(
            db: &State<DatabaseConnection>,
            _user: AuthenticatedUser,
            id: i32,
        ) -> Result<rocket::http::Status, AppError> {
            let result = <$entity>::delete_by_id(id).exec(db.inner()).await?;
            if result.rows_affected == 0 {
                return Err(AppError::NotFound);
            }
            Ok(rocket::http::Status::NoContent)
        }

        pub fn routes() -> Vec<rocket::Route> {
            routes![list, retrieve, create, update, destroy]
        }
    };
}
