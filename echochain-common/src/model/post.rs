use crate::model::{Id, profile::UserMarker};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Regular,
    Nft,
}

impl PostKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Regular => "regular",
            PostKind::Nft => "nft",
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown post kind: {0:?}")]
pub struct InvalidPostKindError(String);

impl FromStr for PostKind {
    type Err = InvalidPostKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(PostKind::Regular),
            "nft" => Ok(PostKind::Nft),
            other => Err(InvalidPostKindError(other.to_owned())),
        }
    }
}

/// A persisted post. Immutable after creation; the like and comment counts
/// are denormalized display values, the authoritative state being the like
/// and comment rows themselves.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: Id<UserMarker>,
    pub content: String,
    pub kind: PostKind,
    pub nft_metadata: Option<serde_json::Value>,
    pub created_at: UtcDateTime,
    pub likes_count: u32,
    pub comments_count: u32,
}

/// Validated input for the post writer. Construction trims the content and
/// rejects text that is empty afterwards, so an attempted write always
/// carries something to show in the feed.
#[derive(Clone, PartialEq, Debug)]
pub struct PostDraft {
    content: String,
    kind: PostKind,
    nft_metadata: Option<serde_json::Value>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Content must not be empty or whitespace-only")]
pub struct EmptyContentError;

impl PostDraft {
    pub fn new(
        content: &str,
        kind: PostKind,
        nft_metadata: Option<serde_json::Value>,
    ) -> Result<Self, EmptyContentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(EmptyContentError);
        }

        // Metadata is only meaningful on NFT-flagged posts.
        let nft_metadata = match kind {
            PostKind::Nft => nft_metadata,
            PostKind::Regular => None,
        };

        Ok(Self {
            content: content.to_owned(),
            kind,
            nft_metadata,
        })
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn kind(&self) -> PostKind {
        self.kind
    }

    #[must_use]
    pub fn nft_metadata(&self) -> Option<&serde_json::Value> {
        self.nft_metadata.as_ref()
    }
}

/// Result of a like toggle: the like-existence state the toggle reached and
/// the counter after adjustment.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: u32,
}

impl LikeToggle {
    /// The state one toggle moves to: flips the liked flag and adjusts the
    /// counter, floored at zero on unlike.
    #[must_use]
    pub fn toggled(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                likes_count: self.likes_count.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                likes_count: self.likes_count + 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{EmptyContentError, LikeToggle, PostDraft, PostKind};
    use serde_json::json;

    #[test]
    fn draft_trims_content() {
        let draft = PostDraft::new("  gm frens  \n", PostKind::Regular, None).unwrap();
        assert_eq!(draft.content(), "gm frens");
    }

    #[test]
    fn draft_rejects_empty_content() {
        assert_eq!(
            PostDraft::new("", PostKind::Regular, None),
            Err(EmptyContentError)
        );
        assert_eq!(
            PostDraft::new("   \t\n", PostKind::Nft, None),
            Err(EmptyContentError)
        );
    }

    #[test]
    fn metadata_only_kept_on_nft_posts() {
        let metadata = json!({ "token_id": 7 });

        let nft = PostDraft::new("minted!", PostKind::Nft, Some(metadata.clone())).unwrap();
        assert_eq!(nft.nft_metadata(), Some(&metadata));

        let regular = PostDraft::new("minted!", PostKind::Regular, Some(metadata)).unwrap();
        assert_eq!(regular.nft_metadata(), None);
    }

    #[test]
    fn toggling_twice_is_net_zero() {
        let start = LikeToggle {
            liked: false,
            likes_count: 3,
        };

        let liked = start.toggled();
        assert_eq!(
            liked,
            LikeToggle {
                liked: true,
                likes_count: 4,
            }
        );
        assert_eq!(liked.toggled(), start);
    }

    #[test]
    fn unliking_floors_the_counter_at_zero() {
        // A drifted counter can read zero while the like row exists.
        let drifted = LikeToggle {
            liked: true,
            likes_count: 0,
        };

        assert_eq!(
            drifted.toggled(),
            LikeToggle {
                liked: false,
                likes_count: 0,
            }
        );
    }

    #[test]
    fn kind_wire_names_match_post_type_column() {
        assert_eq!(serde_json::to_string(&PostKind::Regular).unwrap(), "\"regular\"");
        assert_eq!(serde_json::to_string(&PostKind::Nft).unwrap(), "\"nft\"");
        assert_eq!("nft".parse::<PostKind>().unwrap(), PostKind::Nft);
        assert!("NFT".parse::<PostKind>().is_err());
    }
}
