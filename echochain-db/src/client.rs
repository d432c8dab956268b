use crate::record::{
    CommentViewRecord, FeedPostRecord, NotificationRecord, ProfileRecord, SessionRecord,
    TagRecord, comment_author,
};
use echochain_common::feed::RawFeedPost;
use echochain_common::model::comment::{self, CommentDraft, CommentMarker, CommentView};
use echochain_common::model::notification::{NotificationKind, NotificationMarker, NotificationView};
use echochain_common::model::post::{LikeToggle, Post, PostDraft, PostMarker};
use echochain_common::model::profile::{Profile, UserMarker};
use echochain_common::model::session::{Session, SessionTokenHash};
use echochain_common::model::tag::{Tag, TagMarker};
use echochain_common::model::{Id, ModelValidationError};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The columns every feed query selects: the post row, the left-joined
/// author profile, the comment count and the like relations aggregated into
/// an array. Callers splice in a filter and an ordering tail.
const FEED_COLUMNS: &str = "
    SELECT
        p.id,
        p.user_id,
        p.content,
        p.post_type,
        p.nft_metadata,
        p.created_at,
        p.likes_count,
        pr.id AS profile_id,
        pr.username,
        pr.display_name,
        pr.avatar_url,
        pr.reputation_score,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
        COALESCE(
            ARRAY_AGG(l.user_id) FILTER (WHERE l.user_id IS NOT NULL),
            ARRAY[]::uuid[]
        ) AS liked_by
    FROM posts p
    LEFT JOIN profiles pr ON pr.id = p.user_id
    LEFT JOIN likes l ON l.post_id = p.id
";

fn feed_query(filter: &str, tail: &str) -> String {
    format!("{FEED_COLUMNS} {filter} GROUP BY p.id, pr.id {tail}")
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn fetch_profile(&self, user_id: Id<UserMarker>) -> Result<Option<Profile>> {
        let record = sqlx::query_as::<Postgres, ProfileRecord>(
            "
            SELECT id, username, display_name, avatar_url, reputation_score
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(user_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let profile = record.map(Profile::try_from).transpose()?;
        Ok(profile)
    }

    pub async fn fetch_session(&self, token_hash: &SessionTokenHash) -> Result<Option<Session>> {
        let record = sqlx::query_as::<Postgres, SessionRecord>(
            "
            SELECT user_id, token_hash, created_at, expires_at
            FROM sessions
            WHERE token_hash = $1
            ",
        )
        .bind(token_hash.0.as_slice())
        .fetch_optional(&self.pool)
        .await?;

        let session = record.map(Session::try_from).transpose()?;
        Ok(session)
    }

    /// Persists exactly one post row. The database mints the id and the
    /// creation timestamp; counters start at zero. No tag bookkeeping
    /// happens here.
    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        draft: &PostDraft,
    ) -> Result<Post> {
        let (id, created_at) = sqlx::query_as::<Postgres, (Uuid, OffsetDateTime)>(
            "
            INSERT INTO posts (user_id, content, post_type, nft_metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            ",
        )
        .bind(author.uuid())
        .bind(draft.content())
        .bind(draft.kind().as_str())
        .bind(draft.nft_metadata())
        .fetch_one(&self.pool)
        .await?;

        Ok(Post {
            id: id.into(),
            author,
            content: draft.content().to_owned(),
            kind: draft.kind(),
            nft_metadata: draft.nft_metadata().cloned(),
            created_at: created_at.to_utc(),
            likes_count: 0,
            comments_count: 0,
        })
    }

    pub async fn fetch_feed_post(&self, post_id: Id<PostMarker>) -> Result<Option<RawFeedPost>> {
        let record = sqlx::query_as::<Postgres, FeedPostRecord>(&feed_query(
            "WHERE p.id = $1",
            "",
        ))
        .bind(post_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(RawFeedPost::try_from).transpose()?;
        Ok(post)
    }

    pub async fn fetch_feed(&self, limit: u32) -> Result<Vec<RawFeedPost>> {
        let records = sqlx::query_as::<Postgres, FeedPostRecord>(&feed_query(
            "",
            "ORDER BY p.created_at DESC LIMIT $1",
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        collect_raw_posts(records)
    }

    /// `None` when the user does not exist, as opposed to a user with no
    /// posts.
    pub async fn fetch_user_posts(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Option<Vec<RawFeedPost>>> {
        if self.fetch_profile(user_id).await?.is_none() {
            return Ok(None);
        }

        let records = sqlx::query_as::<Postgres, FeedPostRecord>(&feed_query(
            "WHERE p.user_id = $1",
            "ORDER BY p.created_at DESC",
        ))
        .bind(user_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        collect_raw_posts(records).map(Some)
    }

    pub async fn search_posts(&self, query: &str, limit: u32) -> Result<Vec<RawFeedPost>> {
        let records = sqlx::query_as::<Postgres, FeedPostRecord>(&feed_query(
            "WHERE p.content ILIKE $1",
            "ORDER BY p.created_at DESC LIMIT $2",
        ))
        .bind(format!("%{}%", escape_like(query)))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        collect_raw_posts(records)
    }

    pub async fn fetch_posts_by_tag(&self, tag_name: &str, limit: u32) -> Result<Vec<RawFeedPost>> {
        let records = sqlx::query_as::<Postgres, FeedPostRecord>(&feed_query(
            "
            WHERE p.id IN (
                SELECT pt.post_id
                FROM post_tags pt
                JOIN tags t ON t.id = pt.tag_id
                WHERE t.name = $1
            )
            ",
            "ORDER BY p.created_at DESC LIMIT $2",
        ))
        .bind(tag_name)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        collect_raw_posts(records)
    }

    pub async fn trending_tags(&self, limit: u32) -> Result<Vec<Tag>> {
        let records = sqlx::query_as::<Postgres, TagRecord>(
            "
            SELECT id, name, usage_count
            FROM tags
            ORDER BY usage_count DESC, name ASC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Tag::from).collect())
    }

    /// Counts one use of a tag for a post: an atomic upsert on the unique
    /// name (so two concurrent first uses cannot create duplicate tags)
    /// followed by the post↔tag link. Linking the same pair twice is a
    /// no-op.
    pub async fn record_tag_usage(
        &self,
        post_id: Id<PostMarker>,
        name: &str,
    ) -> Result<Id<TagMarker>> {
        let tag_id = sqlx::query_scalar::<Postgres, Uuid>(
            "
            INSERT INTO tags (name, usage_count)
            VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE SET usage_count = tags.usage_count + 1
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            "
            INSERT INTO post_tags (post_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(post_id.uuid())
        .bind(tag_id)
        .execute(&self.pool)
        .await?;

        Ok(tag_id.into())
    }

    pub async fn post_author(&self, post_id: Id<PostMarker>) -> Result<Option<Id<UserMarker>>> {
        let author = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT user_id FROM posts WHERE id = $1",
        )
        .bind(post_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(author.map(Into::into))
    }

    /// Toggles the like relation for `(post, user)` and adjusts the
    /// denormalized counter. The like row and the counter commit together,
    /// so a failed toggle leaves both untouched; the preceding reads are
    /// unsynchronized and concurrent toggles can interleave. The like row is
    /// the source of truth, the counter advisory.
    pub async fn toggle_like(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<LikeToggle> {
        let existing = sqlx::query_scalar::<Postgres, i32>(
            "SELECT 1 FROM likes WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id.uuid())
        .bind(user_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let likes_count = sqlx::query_scalar::<Postgres, i32>(
            "SELECT likes_count FROM posts WHERE id = $1",
        )
        .bind(post_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        let current = LikeToggle {
            liked: existing.is_some(),
            likes_count: u32::try_from(likes_count).unwrap_or(0),
        };
        let next = current.toggled();

        let mut tx = self.pool.begin().await?;

        if next.liked {
            sqlx::query("INSERT INTO likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post_id.uuid())
                .bind(user_id.uuid())
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
                .bind(post_id.uuid())
                .bind(user_id.uuid())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE posts SET likes_count = $2 WHERE id = $1")
            .bind(post_id.uuid())
            .bind(i64::from(next.likes_count))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(next)
    }

    /// Appends one comment and bumps the denormalized counter in a single
    /// transaction, so a failed write leaves neither row behind. Returns the
    /// comment joined with the author's display projection.
    pub async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        draft: &CommentDraft,
    ) -> Result<CommentView> {
        let profile = self.fetch_profile(author).await?;

        let mut tx = self.pool.begin().await?;

        let (id, created_at) = sqlx::query_as::<Postgres, (Uuid, OffsetDateTime)>(
            "
            INSERT INTO comments (post_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            ",
        )
        .bind(post_id.uuid())
        .bind(author.uuid())
        .bind(draft.content())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(post_id.uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let author = comment_author(
            profile
                .as_ref()
                .map(|profile| profile.username.get().to_owned()),
            profile.as_ref().and_then(|profile| profile.display_name.clone()),
            profile.and_then(|profile| profile.avatar_url),
        );

        Ok(CommentView {
            id: Id::<CommentMarker>::from(id),
            content: draft.content().to_owned(),
            created_at: created_at.to_utc(),
            author,
        })
    }

    /// Comments for a post, newest first, with author projections.
    pub async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
    ) -> Result<Vec<CommentView>> {
        let records = sqlx::query_as::<Postgres, CommentViewRecord>(
            "
            SELECT
                c.id,
                c.content,
                c.created_at,
                pr.username,
                pr.display_name,
                pr.avatar_url
            FROM comments c
            LEFT JOIN profiles pr ON pr.id = c.user_id
            WHERE c.post_id = $1
            ",
        )
        .bind(post_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut comments: Vec<CommentView> =
            records.into_iter().map(CommentView::from).collect();
        comment::newest_first(&mut comments);

        Ok(comments)
    }

    pub async fn create_notification(
        &self,
        recipient: Id<UserMarker>,
        actor: Option<Id<UserMarker>>,
        kind: &NotificationKind,
    ) -> Result<()> {
        let post_id = match kind {
            NotificationKind::Like { post }
            | NotificationKind::Comment { post, .. }
            | NotificationKind::Mention { post }
            | NotificationKind::Share { post } => Some(post.uuid()),
            NotificationKind::Follow | NotificationKind::Reputation { .. } => None,
        };
        let content = match kind {
            NotificationKind::Comment { excerpt, .. } => Some(excerpt.as_str()),
            NotificationKind::Reputation { message } => Some(message.as_str()),
            _ => None,
        };

        sqlx::query(
            "
            INSERT INTO notifications (user_id, actor_id, post_id, kind, content)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(recipient.uuid())
        .bind(actor.map(Id::uuid))
        .bind(post_id)
        .bind(kind.kind_str())
        .bind(content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// A user's notifications, newest first, with the actor's profile
    /// joined in.
    pub async fn fetch_notifications(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Vec<NotificationView>> {
        let records = sqlx::query_as::<Postgres, NotificationRecord>(
            "
            SELECT
                n.id,
                n.user_id,
                n.actor_id,
                n.post_id,
                n.kind,
                n.content,
                n.read,
                n.created_at,
                pr.username,
                pr.display_name,
                pr.avatar_url
            FROM notifications n
            LEFT JOIN profiles pr ON pr.id = n.actor_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            ",
        )
        .bind(user_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| NotificationView::try_from(record).map_err(DbError::from))
            .collect()
    }

    /// `false` when the notification does not exist or belongs to someone
    /// else.
    pub async fn mark_notification_read(
        &self,
        user_id: Id<UserMarker>,
        notification_id: Id<NotificationMarker>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id.uuid())
        .bind(user_id.uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn collect_raw_posts(records: Vec<FeedPostRecord>) -> Result<Vec<RawFeedPost>> {
    records
        .into_iter()
        .map(|record| RawFeedPost::try_from(record).map_err(DbError::from))
        .collect()
}

/// Escapes `ILIKE` metacharacters so a search for `100%` matches literally.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use crate::client::{escape_like, feed_query};

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn feed_query_splices_filter_and_tail() {
        let query = feed_query("WHERE p.id = $1", "LIMIT $2");
        assert!(query.contains("WHERE p.id = $1 GROUP BY p.id, pr.id LIMIT $2"));
    }
}
