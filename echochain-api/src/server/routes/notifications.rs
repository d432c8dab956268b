use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use echochain_common::model::{
    Id,
    notification::{NotificationMarker, NotificationView},
};
use echochain_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_notifications)
        .typed_post(mark_notification_read)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications", rejection(ServerError))]
struct NotificationsPath();

async fn get_notifications(
    NotificationsPath(): NotificationsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<NotificationView>>> {
    let notifications = db.fetch_notifications(user.user_id()).await?;

    Ok(Json(notifications))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/notifications/{id}/read", rejection(ServerError))]
struct MarkReadPath {
    id: Id<NotificationMarker>,
}

async fn mark_notification_read(
    MarkReadPath { id }: MarkReadPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<()> {
    let marked = db.mark_notification_read(user.user_id(), id).await?;

    if !marked {
        return Err(ServerError::NotificationByIdNotFound(id));
    }

    Ok(())
}
