use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use echochain_common::model::{
    Id,
    comment::{CommentDraft, CommentView},
    notification::NotificationKind,
    post::PostMarker,
};
use echochain_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_comments)
        .typed_post(add_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct CommentsPath {
    id: Id<PostMarker>,
}

async fn get_comments(
    CommentsPath { id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<CommentView>>> {
    db.post_author(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let comments = db.fetch_post_comments(id).await?;

    Ok(Json(comments))
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct AddCommentRequest {
    content: String,
}

async fn add_comment(
    CommentsPath { id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(request): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>)> {
    let draft = CommentDraft::new(&request.content)?;

    let author = db
        .post_author(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let comment = db.create_comment(id, user.user_id(), &draft).await?;

    if author != user.user_id() {
        let kind = NotificationKind::Comment {
            post: id,
            excerpt: comment.content.clone(),
        };
        if let Err(error) = db
            .create_notification(author, Some(user.user_id()), &kind)
            .await
        {
            warn!(post = %id, %error, "Failed to create comment notification");
        }
    }

    Ok((StatusCode::CREATED, Json(comment)))
}
