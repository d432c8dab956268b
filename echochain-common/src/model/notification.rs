use crate::model::{Id, post::PostMarker, profile::UserMarker};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct NotificationMarker;

/// One notification kind per variant, each carrying only the fields that
/// kind actually uses. The wire tag matches the original string column, so
/// adding a kind is a compile-time-checked change in `summary` and every
/// other match.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationKind {
    Like { post: Id<PostMarker> },
    Comment { post: Id<PostMarker>, excerpt: String },
    Follow,
    Mention { post: Id<PostMarker> },
    Reputation { message: String },
    Share { post: Id<PostMarker> },
}

impl NotificationKind {
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self {
            NotificationKind::Like { .. } => "like",
            NotificationKind::Comment { .. } => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Mention { .. } => "mention",
            NotificationKind::Reputation { .. } => "reputation",
            NotificationKind::Share { .. } => "share",
        }
    }

    /// Human-readable one-liner, with the actor's resolved display name
    /// spliced in.
    #[must_use]
    pub fn summary(&self, actor_name: &str) -> String {
        match self {
            NotificationKind::Like { .. } => format!("{actor_name} liked your post"),
            NotificationKind::Comment { excerpt, .. } => {
                format!("{actor_name} commented on your post: \"{excerpt}\"")
            }
            NotificationKind::Follow => format!("{actor_name} started following you"),
            NotificationKind::Mention { .. } => {
                format!("{actor_name} mentioned you in a post")
            }
            NotificationKind::Reputation { message } => format!("{actor_name} {message}"),
            NotificationKind::Share { .. } => format!("{actor_name} shared your post"),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown notification kind: {0:?}")]
pub struct InvalidNotificationKindError(pub String);

/// A notification joined with its actor's display projection, newest-first
/// in listings.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NotificationView {
    pub id: Id<NotificationMarker>,
    pub recipient: Id<UserMarker>,
    pub actor: Option<NotificationActor>,
    #[serde(flatten)]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NotificationActor {
    pub id: Id<UserMarker>,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}
