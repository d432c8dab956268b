use crate::server::{
    Result, ServerError, ServerRouter, auth::MaybeAuthenticatedUser, json::Json,
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use echochain_common::feed::{self, FeedPost};
use echochain_common::model::tag::Tag;
use echochain_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_tag_posts)
        .typed_get(get_trending_tags)
}

const TAG_PAGE_LIMIT: u32 = 20;
const DEFAULT_TRENDING_LIMIT: u32 = 5;

fn default_trending_limit() -> u32 {
    DEFAULT_TRENDING_LIMIT
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/tags/{name}/posts", rejection(ServerError))]
struct TagPostsPath {
    name: String,
}

async fn get_tag_posts(
    TagPostsPath { name }: TagPostsPath,
    State(db): State<Arc<DbClient>>,
    viewer: MaybeAuthenticatedUser,
) -> Result<Json<Vec<FeedPost>>> {
    let rows = db.fetch_posts_by_tag(&name, TAG_PAGE_LIMIT).await?;

    Ok(Json(feed::assemble(rows, viewer.user_id())))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/tags/trending", rejection(ServerError))]
struct TrendingTagsPath();

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize)]
struct TrendingQuery {
    #[serde(default = "default_trending_limit")]
    limit: u32,
}

async fn get_trending_tags(
    TrendingTagsPath(): TrendingTagsPath,
    State(db): State<Arc<DbClient>>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<Vec<Tag>>> {
    let tags = db.trending_tags(query.limit).await?;

    Ok(Json(tags))
}
