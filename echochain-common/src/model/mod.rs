pub mod comment;
pub mod notification;
pub mod post;
pub mod profile;
pub mod session;
pub mod tag;

use crate::model::{
    notification::InvalidNotificationKindError, post::InvalidPostKindError,
    profile::InvalidUsernameError, session::InvalidSessionTokenHashError,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    PostKind(#[from] InvalidPostKindError),
    #[error(transparent)]
    NotificationKind(#[from] InvalidNotificationKindError),
    #[error(transparent)]
    TokenHash(#[from] InvalidSessionTokenHashError),
}

/// Typed entity id. The marker keeps post, user, tag, comment and
/// notification ids from being mixed up while the wire and database
/// representation stays a plain UUID.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(Uuid, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    #[must_use]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<Uuid> for Id<Marker> {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for Uuid {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}
