use crate::server::ServerRouter;
use axum::Router;

mod comments;
mod notifications;
mod posts;
mod tags;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(tags::routes())
        .merge(users::routes())
        .merge(notifications::routes())
}
