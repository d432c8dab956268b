use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, MaybeAuthenticatedUser},
    json::Json,
    publish::{PublishedPost, publish_post},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use echochain_common::feed::{self, FeedPost};
use echochain_common::model::{
    Id,
    notification::NotificationKind,
    post::{LikeToggle, PostDraft, PostKind, PostMarker},
};
use echochain_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_feed)
        .typed_get(get_post)
        .typed_post(create_post)
        .typed_post(toggle_like)
        .typed_get(search_posts)
}

const DEFAULT_FEED_LIMIT: u32 = 10;
const DEFAULT_SEARCH_LIMIT: u32 = 20;

fn default_feed_limit() -> u32 {
    DEFAULT_FEED_LIMIT
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feed", rejection(ServerError))]
struct FeedPath();

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize)]
struct FeedQuery {
    #[serde(default = "default_feed_limit")]
    limit: u32,
}

async fn get_feed(
    FeedPath(): FeedPath,
    State(db): State<Arc<DbClient>>,
    viewer: MaybeAuthenticatedUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedPost>>> {
    let rows = db.fetch_feed(query.limit).await?;

    Ok(Json(feed::assemble(rows, viewer.user_id())))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct GetPostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    GetPostPath { id }: GetPostPath,
    State(db): State<Arc<DbClient>>,
    viewer: MaybeAuthenticatedUser,
) -> Result<Json<FeedPost>> {
    let row = db
        .fetch_feed_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(feed::assemble_one(row, viewer.user_id())))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create", rejection(ServerError))]
struct CreatePostPath();

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct CreatePostRequest {
    content: String,
    #[serde(default)]
    kind: PostKind,
    #[serde(default)]
    nft_metadata: Option<serde_json::Value>,
}

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PublishedPost>)> {
    let draft = PostDraft::new(&request.content, request.kind, request.nft_metadata)?;
    let published = publish_post(&db, user.user_id(), draft).await?;

    Ok((StatusCode::CREATED, Json(published)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/like", rejection(ServerError))]
struct LikePath {
    id: Id<PostMarker>,
}

async fn toggle_like(
    LikePath { id }: LikePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<LikeToggle>> {
    let author = db
        .post_author(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let toggle = db.toggle_like(id, user.user_id()).await?;

    // Notification fan-out is secondary bookkeeping: never fail the toggle
    // over it, and skip self-likes.
    if toggle.liked && author != user.user_id() {
        let kind = NotificationKind::Like { post: id };
        if let Err(error) = db
            .create_notification(author, Some(user.user_id()), &kind)
            .await
        {
            warn!(post = %id, %error, "Failed to create like notification");
        }
    }

    Ok(Json(toggle))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/search", rejection(ServerError))]
struct SearchPath();

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct SearchQuery {
    query: String,
}

async fn search_posts(
    SearchPath(): SearchPath,
    State(db): State<Arc<DbClient>>,
    viewer: MaybeAuthenticatedUser,
    Query(search): Query<SearchQuery>,
) -> Result<Json<Vec<FeedPost>>> {
    let rows = db.search_posts(&search.query, DEFAULT_SEARCH_LIMIT).await?;

    Ok(Json(feed::assemble(rows, viewer.user_id())))
}
