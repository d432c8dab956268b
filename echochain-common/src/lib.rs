pub mod feed;
pub mod hashtag;
pub mod model;
