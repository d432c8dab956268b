use crate::model::Id;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct TagMarker;

/// A hashtag with its denormalized usage counter. Names are unique and
/// case-sensitive exactly as extracted; the counter only grows within the
/// publish workflow (there is no tag-removal path).
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Tag {
    pub id: Id<TagMarker>,
    pub name: String,
    pub usage_count: u32,
}
