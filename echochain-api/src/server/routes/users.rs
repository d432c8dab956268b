use crate::server::{
    Result, ServerError, ServerRouter, auth::MaybeAuthenticatedUser, json::Json,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use echochain_common::feed::{self, FeedPost};
use echochain_common::model::{
    Id,
    profile::{Profile, UserMarker},
};
use echochain_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_user)
        .typed_get(get_user_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}", rejection(ServerError))]
struct GetUserPath {
    id: Id<UserMarker>,
}

async fn get_user(
    GetUserPath { id }: GetUserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Profile>> {
    let profile = db
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(profile))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts", rejection(ServerError))]
struct GetUserPostsPath {
    id: Id<UserMarker>,
}

async fn get_user_posts(
    GetUserPostsPath { id }: GetUserPostsPath,
    State(db): State<Arc<DbClient>>,
    viewer: MaybeAuthenticatedUser,
) -> Result<Json<Vec<FeedPost>>> {
    let rows = db
        .fetch_user_posts(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(feed::assemble(rows, viewer.user_id())))
}
