//! Pure assembly of raw, pre-joined post rows into view-ready feed posts.

use crate::model::{
    Id,
    post::{PostKind, PostMarker},
    profile::{ANONYMOUS_DISPLAY_NAME, ANONYMOUS_USERNAME, Profile, UserMarker},
};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// A raw post row as the data layer hands it over: the post columns plus the
/// joined author profile (absent when the join produced nothing), the joined
/// comment count and the user ids of the post's like relations.
#[derive(Clone, PartialEq, Debug)]
pub struct RawFeedPost {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub content: String,
    pub kind: PostKind,
    pub nft_metadata: Option<serde_json::Value>,
    pub created_at: UtcDateTime,
    pub likes_count: u32,
    pub author: Option<Profile>,
    pub comment_count: u32,
    pub liked_by: Vec<Id<UserMarker>>,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct FeedPost {
    pub id: Id<PostMarker>,
    pub content: String,
    pub created_at: UtcDateTime,
    pub kind: PostKind,
    pub nft_metadata: Option<serde_json::Value>,
    pub likes_count: u32,
    pub comments_count: u32,
    pub author: FeedAuthor,
    pub viewer_has_liked: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct FeedAuthor {
    pub id: Id<UserMarker>,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub reputation_score: i32,
}

/// Maps every raw row to exactly one view-ready post, order-preserving.
/// `viewer` is the authenticated user reading the feed, if any;
/// `viewer_has_liked` is always `false` without one.
#[must_use]
pub fn assemble(rows: Vec<RawFeedPost>, viewer: Option<Id<UserMarker>>) -> Vec<FeedPost> {
    rows.into_iter().map(|row| assemble_one(row, viewer)).collect()
}

#[must_use]
pub fn assemble_one(row: RawFeedPost, viewer: Option<Id<UserMarker>>) -> FeedPost {
    let author = match &row.author {
        Some(profile) => FeedAuthor {
            id: profile.id,
            username: profile.username.get().to_owned(),
            display_name: profile.resolved_display_name().to_owned(),
            avatar_url: profile.resolved_avatar_url().to_owned(),
            reputation_score: profile.reputation_score,
        },
        None => FeedAuthor {
            id: row.author_id,
            username: ANONYMOUS_USERNAME.to_owned(),
            display_name: ANONYMOUS_DISPLAY_NAME.to_owned(),
            avatar_url: String::new(),
            reputation_score: 0,
        },
    };

    let viewer_has_liked =
        viewer.is_some_and(|viewer| row.liked_by.contains(&viewer));

    FeedPost {
        id: row.id,
        content: row.content,
        created_at: row.created_at,
        kind: row.kind,
        nft_metadata: row.nft_metadata,
        likes_count: row.likes_count,
        comments_count: row.comment_count,
        author,
        viewer_has_liked,
    }
}

#[cfg(test)]
mod tests {
    use crate::feed::{RawFeedPost, assemble, assemble_one};
    use crate::model::{
        post::PostKind,
        profile::{Profile, Username},
    };
    use time::macros::utc_datetime;
    use uuid::Uuid;

    fn raw(author: Option<Profile>) -> RawFeedPost {
        RawFeedPost {
            id: Uuid::new_v4().into(),
            author_id: Uuid::new_v4().into(),
            content: "gm #Web3".to_owned(),
            kind: PostKind::Regular,
            nft_metadata: None,
            created_at: utc_datetime!(2026-05-01 09:00),
            likes_count: 3,
            author,
            comment_count: 0,
            liked_by: Vec::new(),
        }
    }

    fn profile() -> Profile {
        Profile {
            id: Uuid::new_v4().into(),
            username: Username::new("chainsmith".to_owned()).unwrap(),
            display_name: Some("Crypto Enthusiast".to_owned()),
            avatar_url: None,
            reputation_score: 87,
        }
    }

    #[test]
    fn missing_profile_resolves_to_anonymous() {
        let post = assemble_one(raw(None), None);

        assert_eq!(post.author.username, "anonymous");
        assert_eq!(post.author.display_name, "Anonymous User");
        assert_eq!(post.author.avatar_url, "");
        assert_eq!(post.author.reputation_score, 0);
        assert_eq!(post.comments_count, 0);
        assert!(!post.viewer_has_liked);
    }

    #[test]
    fn joined_profile_is_resolved() {
        let post = assemble_one(raw(Some(profile())), None);

        assert_eq!(post.author.username, "chainsmith");
        assert_eq!(post.author.display_name, "Crypto Enthusiast");
        assert_eq!(post.author.avatar_url, "");
        assert_eq!(post.author.reputation_score, 87);
    }

    #[test]
    fn viewer_has_liked_requires_matching_like_relation() {
        let viewer = Uuid::new_v4().into();
        let other = Uuid::new_v4().into();

        let mut row = raw(None);
        row.liked_by = vec![other, viewer];
        assert!(assemble_one(row.clone(), Some(viewer)).viewer_has_liked);

        row.liked_by = vec![other];
        assert!(!assemble_one(row.clone(), Some(viewer)).viewer_has_liked);

        // Unauthenticated viewers never see a liked flag.
        row.liked_by = vec![viewer];
        assert!(!assemble_one(row, None).viewer_has_liked);
    }

    #[test]
    fn order_is_preserved() {
        let first = raw(None);
        let second = raw(None);
        let ids = [first.id, second.id];

        let posts = assemble(vec![first, second], None);
        assert_eq!(posts.len(), 2);
        assert_eq!([posts[0].id, posts[1].id], ids);
    }
}
