use crate::model::{Id, post::EmptyContentError};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

/// A comment joined with its author's display projection, the shape comment
/// listing and creation reply with. Comments are append-only; never edited
/// or deleted.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CommentView {
    pub id: Id<CommentMarker>,
    pub content: String,
    pub created_at: UtcDateTime,
    pub author: CommentAuthor,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CommentAuthor {
    pub name: String,
    pub username: String,
    pub avatar_url: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CommentDraft {
    content: String,
}

impl CommentDraft {
    pub fn new(content: &str) -> Result<Self, EmptyContentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(EmptyContentError);
        }

        Ok(Self {
            content: content.to_owned(),
        })
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Orders comments for display, newest first. The sort is stable, so equal
/// timestamps keep their relative order.
pub fn newest_first(comments: &mut [CommentView]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use crate::model::Id;
    use crate::model::comment::{CommentAuthor, CommentDraft, CommentView, newest_first};
    use crate::model::post::EmptyContentError;
    use time::{UtcDateTime, macros::utc_datetime};
    use uuid::Uuid;

    #[test]
    fn draft_trims_and_rejects_empty() {
        assert_eq!(
            CommentDraft::new(" nice thread ").unwrap().content(),
            "nice thread"
        );
        assert_eq!(CommentDraft::new("  \n"), Err(EmptyContentError));
    }

    fn comment(content: &str, created_at: UtcDateTime) -> CommentView {
        CommentView {
            id: Id::new(Uuid::new_v4()),
            content: content.to_owned(),
            created_at,
            author: CommentAuthor {
                name: "Ada".to_owned(),
                username: "ada".to_owned(),
                avatar_url: String::new(),
            },
        }
    }

    #[test]
    fn newly_added_comment_lists_first() {
        let mut comments = vec![
            comment("first!", utc_datetime!(2026-05-01 09:00)),
            comment("second", utc_datetime!(2026-05-01 10:00)),
            comment("just added", utc_datetime!(2026-05-01 11:00)),
        ];

        newest_first(&mut comments);

        let contents: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["just added", "second", "first!"]);
    }
}
