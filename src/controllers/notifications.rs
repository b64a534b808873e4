use rocket::serde::json::Json;
use rocket::State;
use sea_orm::*;

use crate::entities::{notification, prelude::*};
use crate::errors::AppError;
use crate::guards::auth::AuthenticatedUser;
use crate::services::policy::Policy;

/// 自分宛の通知一覧 (新しい順)
#[get("/")]
pub async fn list(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<notification::Model>>, AppError> {
    let notifications = Notification::find()
        .filter(notification::Column::UserId.eq(auth.user.id))
        .order_by_desc(notification::Column::CreatedAt)
        .all(db.inner())
        .await?;
    Ok(Json(notifications))
}

/// 通知を既読にする。自分宛の通知のみ。
#[post("/<id>/read")]
pub async fn mark_read(
    db: &State<DatabaseConnection>,
    auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<notification::Model>, AppError> {
    let notification = Notification::find_by_id(id)
        .one(db.inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Policy::assert_can_modify(&auth.user, notification.user_id)?;

    let mut active: notification::ActiveModel = notification.into();
    active.is_read = Set(true);
    let notification = active.update(db.inner()).await?;
    Ok(Json(notification))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, mark_read]
}
