use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use echochain_common::model::{Id, profile::UserMarker, session::SessionToken};
use echochain_db::client::DbClient;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// A validated session. Write endpoints require one; extraction fails with
/// `AuthenticationRequired` when no token is presented at all.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }
}

/// The optional variant for read endpoints: a missing Authorization header
/// means an anonymous viewer, while a present-but-invalid token is still an
/// error.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct MaybeAuthenticatedUser(Option<Id<UserMarker>>);

impl MaybeAuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Option<Id<UserMarker>> {
        self.0
    }
}

async fn validate_token(db: &DbClient, token_str: &str) -> Result<Id<UserMarker>, ServerError> {
    let request_token: SessionToken = token_str.parse()?;
    let token_hash = request_token.hash()?;

    let session = db
        .fetch_session(&token_hash)
        .await?
        .ok_or(ServerError::InvalidToken)?;

    assert_eq!(session.token_hash, token_hash);

    if session.is_expired_at(UtcDateTime::now()) {
        return Err(ServerError::InvalidToken);
    }

    Ok(session.user)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    ServerError::AuthenticationRequired
                } else {
                    ServerError::InvalidAuthorizationHeader(rejection)
                }
            })?;

        let db = Arc::<DbClient>::from_ref(state);
        let id = validate_token(&db, header.token()).await?;

        Ok(Self { id })
    }
}

impl<S> FromRequestParts<S> for MaybeAuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match AuthorizationHeader::from_request_parts(parts, state).await {
            Ok(header) => header,
            Err(rejection) if rejection.is_missing() => return Ok(Self(None)),
            Err(rejection) => return Err(ServerError::InvalidAuthorizationHeader(rejection)),
        };

        let db = Arc::<DbClient>::from_ref(state);
        let id = validate_token(&db, header.token()).await?;

        Ok(Self(Some(id)))
    }
}
