//! The post publication workflow: persist the post, then run tag
//! bookkeeping per extracted hashtag, sequentially and best-effort.

use echochain_common::hashtag;
use echochain_common::model::{
    Id,
    post::{Post, PostDraft, PostMarker},
    profile::UserMarker,
};
use echochain_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The tag-bookkeeping seam of the workflow. `DbClient` is the production
/// implementation.
pub trait TagRegistry {
    async fn register_use(&self, post: Id<PostMarker>, name: &str) -> Result<(), DbError>;
}

impl TagRegistry for DbClient {
    async fn register_use(&self, post: Id<PostMarker>, name: &str) -> Result<(), DbError> {
        self.record_tag_usage(post, name).await.map(|_| ())
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct PublishedPost {
    pub post: Post,
    pub tags: Vec<String>,
}

/// Publishes a post for an authenticated author. The post write is the
/// primary action and aborts the workflow on failure; tag bookkeeping only
/// starts once the post exists and can never undo it.
pub async fn publish_post(
    db: &DbClient,
    author: Id<UserMarker>,
    draft: PostDraft,
) -> Result<PublishedPost, DbError> {
    let tags = hashtag::unique(hashtag::extract(draft.content()));

    let post = db.create_post(author, &draft).await?;
    index_tags(db, post.id, &tags).await;

    Ok(PublishedPost { post, tags })
}

/// Runs bookkeeping for each tag strictly one at a time. A failing tag is
/// logged and skipped; the remaining tags still run and the already-created
/// post stays published.
async fn index_tags<R: TagRegistry>(registry: &R, post: Id<PostMarker>, tags: &[String]) {
    for tag in tags {
        if let Err(error) = registry.register_use(post, tag).await {
            warn!(%post, tag, %error, "Tag bookkeeping failed, skipping tag");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::publish::{TagRegistry, index_tags};
    use echochain_common::model::{
        Id,
        post::{PostKind, PostMarker},
    };
    use echochain_db::client::DbError;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn simulated_error() -> DbError {
        DbError::Data("bogus".parse::<PostKind>().unwrap_err().into())
    }

    struct RecordingRegistry {
        fail_for: &'static str,
        recorded: Mutex<Vec<String>>,
    }

    impl RecordingRegistry {
        fn new(fail_for: &'static str) -> Self {
            Self {
                fail_for,
                recorded: Mutex::new(Vec::new()),
            }
        }
    }

    impl TagRegistry for RecordingRegistry {
        async fn register_use(&self, _post: Id<PostMarker>, name: &str) -> Result<(), DbError> {
            if name == self.fail_for {
                return Err(simulated_error());
            }

            self.recorded.lock().unwrap().push(name.to_owned());
            Ok(())
        }
    }

    #[tokio::test]
    async fn failing_tag_is_skipped_without_aborting_the_rest() {
        let registry = RecordingRegistry::new("DeFi");
        let tags = ["DeFi", "NFT", "DAOs"].map(str::to_owned);

        index_tags(&registry, Id::new(Uuid::new_v4()), &tags).await;

        assert_eq!(*registry.recorded.lock().unwrap(), vec!["NFT", "DAOs"]);
    }

    #[tokio::test]
    async fn tags_are_registered_in_order() {
        let registry = RecordingRegistry::new("");
        let tags = ["Web3", "web3"].map(str::to_owned);

        index_tags(&registry, Id::new(Uuid::new_v4()), &tags).await;

        assert_eq!(*registry.recorded.lock().unwrap(), vec!["Web3", "web3"]);
    }
}
