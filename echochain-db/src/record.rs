//! Raw database rows and their conversions into model types.

use echochain_common::feed::RawFeedPost;
use echochain_common::model::ModelValidationError;
use echochain_common::model::comment::{CommentAuthor, CommentView};
use echochain_common::model::notification::{
    InvalidNotificationKindError, NotificationActor, NotificationKind, NotificationView,
};
use echochain_common::model::post::PostKind;
use echochain_common::model::profile::{
    ANONYMOUS_DISPLAY_NAME, ANONYMOUS_USERNAME, Profile, Username,
};
use echochain_common::model::session::Session;
use echochain_common::model::tag::Tag;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub(crate) struct ProfileRecord {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation_score: i32,
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = ModelValidationError;

    fn try_from(value: ProfileRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            username: Username::new(value.username)?,
            display_name: value.display_name,
            avatar_url: value.avatar_url,
            reputation_score: value.reputation_score,
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub(crate) struct SessionRecord {
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = ModelValidationError;

    fn try_from(value: SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.into_boxed_slice().try_into()?,
            created_at: value.created_at.to_utc(),
            expires_at: value.expires_at.map(OffsetDateTime::to_utc),
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub(crate) struct TagRecord {
    pub id: Uuid,
    pub name: String,
    pub usage_count: i32,
}

impl From<TagRecord> for Tag {
    fn from(value: TagRecord) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
            usage_count: u32::try_from(value.usage_count).unwrap_or(0),
        }
    }
}

/// One feed row: the post columns plus the left-joined author profile, the
/// comment count and the aggregated like relations. `profile_id` is the join
/// sentinel: absent means the author has no profile row.
#[derive(Clone, PartialEq, Debug, sqlx::FromRow)]
pub(crate) struct FeedPostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub post_type: String,
    pub nft_metadata: Option<serde_json::Value>,
    pub created_at: OffsetDateTime,
    pub likes_count: i32,
    pub profile_id: Option<Uuid>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation_score: Option<i32>,
    pub comment_count: i64,
    pub liked_by: Vec<Uuid>,
}

impl TryFrom<FeedPostRecord> for RawFeedPost {
    type Error = ModelValidationError;

    fn try_from(value: FeedPostRecord) -> Result<Self, Self::Error> {
        let author = match (value.profile_id, value.username) {
            (Some(id), Some(username)) => Some(Profile {
                id: id.into(),
                username: Username::new(username)?,
                display_name: value.display_name,
                avatar_url: value.avatar_url,
                reputation_score: value.reputation_score.unwrap_or(0),
            }),
            _ => None,
        };

        Ok(Self {
            id: value.id.into(),
            author_id: value.user_id.into(),
            content: value.content,
            kind: value.post_type.parse::<PostKind>()?,
            nft_metadata: value.nft_metadata,
            created_at: value.created_at.to_utc(),
            likes_count: u32::try_from(value.likes_count).unwrap_or(0),
            author,
            comment_count: u32::try_from(value.comment_count).unwrap_or(0),
            liked_by: value.liked_by.into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub(crate) struct CommentViewRecord {
    pub id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<CommentViewRecord> for CommentView {
    fn from(value: CommentViewRecord) -> Self {
        Self {
            id: value.id.into(),
            content: value.content,
            created_at: value.created_at.to_utc(),
            author: comment_author(value.username, value.display_name, value.avatar_url),
        }
    }
}

pub(crate) fn comment_author(
    username: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
) -> CommentAuthor {
    let username = username.unwrap_or_else(|| ANONYMOUS_USERNAME.to_owned());
    let name = match display_name {
        Some(name) if !name.is_empty() => name,
        _ if username != ANONYMOUS_USERNAME => username.clone(),
        _ => ANONYMOUS_DISPLAY_NAME.to_owned(),
    };

    CommentAuthor {
        name,
        username,
        avatar_url: avatar_url.unwrap_or_default(),
    }
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub(crate) struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub kind: String,
    pub content: Option<String>,
    pub read: bool,
    pub created_at: OffsetDateTime,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl TryFrom<NotificationRecord> for NotificationView {
    type Error = ModelValidationError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        let post = value.post_id.map(Into::into);
        let require_post = |kind: &str| {
            post.ok_or_else(|| {
                InvalidNotificationKindError(format!("{kind} notification without a post id"))
            })
        };

        let kind = match value.kind.as_str() {
            "like" => NotificationKind::Like {
                post: require_post("like")?,
            },
            "comment" => NotificationKind::Comment {
                post: require_post("comment")?,
                excerpt: value.content.unwrap_or_default(),
            },
            "follow" => NotificationKind::Follow,
            "mention" => NotificationKind::Mention {
                post: require_post("mention")?,
            },
            "reputation" => NotificationKind::Reputation {
                message: value.content.unwrap_or_default(),
            },
            "share" => NotificationKind::Share {
                post: require_post("share")?,
            },
            other => return Err(InvalidNotificationKindError(other.to_owned()).into()),
        };

        let actor = value.actor_id.map(|actor_id| {
            let username = value
                .username
                .unwrap_or_else(|| ANONYMOUS_USERNAME.to_owned());
            let display_name = match value.display_name {
                Some(name) if !name.is_empty() => name,
                _ if username != ANONYMOUS_USERNAME => username.clone(),
                _ => ANONYMOUS_DISPLAY_NAME.to_owned(),
            };

            NotificationActor {
                id: actor_id.into(),
                username,
                display_name,
                avatar_url: value.avatar_url.unwrap_or_default(),
            }
        });

        Ok(Self {
            id: value.id.into(),
            recipient: value.user_id.into(),
            actor,
            kind,
            read: value.read,
            created_at: value.created_at.to_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{
        CommentViewRecord, FeedPostRecord, NotificationRecord, comment_author,
    };
    use echochain_common::feed::RawFeedPost;
    use echochain_common::model::notification::{NotificationKind, NotificationView};
    use echochain_common::model::post::PostKind;
    use time::macros::utc_datetime;
    use uuid::Uuid;

    fn feed_record() -> FeedPostRecord {
        FeedPostRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "gm #Web3".to_owned(),
            post_type: "regular".to_owned(),
            nft_metadata: None,
            created_at: utc_datetime!(2026-05-01 09:00).into(),
            likes_count: 2,
            profile_id: None,
            username: None,
            display_name: None,
            avatar_url: None,
            reputation_score: None,
            comment_count: 5,
            liked_by: vec![Uuid::new_v4()],
        }
    }

    #[test]
    fn feed_record_without_profile_has_no_author() {
        let raw = RawFeedPost::try_from(feed_record()).unwrap();
        assert_eq!(raw.author, None);
        assert_eq!(raw.kind, PostKind::Regular);
        assert_eq!(raw.likes_count, 2);
        assert_eq!(raw.comment_count, 5);
        assert_eq!(raw.liked_by.len(), 1);
    }

    #[test]
    fn feed_record_with_profile_resolves_author() {
        let mut record = feed_record();
        record.profile_id = Some(record.user_id);
        record.username = Some("chainsmith".to_owned());
        record.post_type = "nft".to_owned();

        let raw = RawFeedPost::try_from(record).unwrap();
        let author = raw.author.unwrap();
        assert_eq!(author.username.get(), "chainsmith");
        assert_eq!(author.reputation_score, 0);
        assert_eq!(raw.kind, PostKind::Nft);
    }

    #[test]
    fn feed_record_rejects_unknown_post_type() {
        let mut record = feed_record();
        record.post_type = "story".to_owned();
        assert!(RawFeedPost::try_from(record).is_err());
    }

    #[test]
    fn comment_author_fallback_chain() {
        let author = comment_author(None, None, None);
        assert_eq!(author.name, "Anonymous User");
        assert_eq!(author.username, "anonymous");
        assert_eq!(author.avatar_url, "");

        let author = comment_author(Some("chainsmith".to_owned()), None, None);
        assert_eq!(author.name, "chainsmith");

        let author =
            comment_author(Some("chainsmith".to_owned()), Some("Crypto Enthusiast".to_owned()), None);
        assert_eq!(author.name, "Crypto Enthusiast");
    }

    #[test]
    fn comment_view_carries_timestamps_and_content() {
        let record = CommentViewRecord {
            id: Uuid::new_v4(),
            content: "nice thread".to_owned(),
            created_at: utc_datetime!(2026-05-01 10:00).into(),
            username: None,
            display_name: None,
            avatar_url: None,
        };

        let view = echochain_common::model::comment::CommentView::from(record);
        assert_eq!(view.content, "nice thread");
        assert_eq!(view.created_at, utc_datetime!(2026-05-01 10:00));
    }

    fn notification_record(kind: &str, post_id: Option<Uuid>) -> NotificationRecord {
        NotificationRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            actor_id: Some(Uuid::new_v4()),
            post_id,
            kind: kind.to_owned(),
            content: Some("gm".to_owned()),
            read: false,
            created_at: utc_datetime!(2026-05-01 11:00).into(),
            username: Some("chainsmith".to_owned()),
            display_name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn notification_kinds_map_from_the_kind_column() {
        let post = Uuid::new_v4();

        let view =
            NotificationView::try_from(notification_record("like", Some(post))).unwrap();
        assert_eq!(view.kind, NotificationKind::Like { post: post.into() });

        let view =
            NotificationView::try_from(notification_record("comment", Some(post))).unwrap();
        assert_eq!(
            view.kind,
            NotificationKind::Comment {
                post: post.into(),
                excerpt: "gm".to_owned()
            }
        );

        let view = NotificationView::try_from(notification_record("follow", None)).unwrap();
        assert_eq!(view.kind, NotificationKind::Follow);
        assert_eq!(view.actor.unwrap().display_name, "chainsmith");
    }

    #[test]
    fn notification_like_without_post_is_invalid() {
        assert!(NotificationView::try_from(notification_record("like", None)).is_err());
        assert!(NotificationView::try_from(notification_record("boost", None)).is_err());
    }
}
