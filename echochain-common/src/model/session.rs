use crate::model::{Id, profile::UserMarker};
use argon2::{Argon2, Params};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_STANDARD};
use std::{
    fmt::{Debug, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::UtcDateTime;

pub const SESSION_TOKEN_CORE_LEN: usize = 24;
pub const SESSION_TOKEN_SALT_LEN: usize = 18;
pub const SESSION_TOKEN_HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing session token failed: {0}")]
pub struct SessionTokenHashError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionTokenDecodeError {
    #[error("Not enough parts separated by ':'")]
    NotEnoughParts,
    #[error("Invalid user id: {0}")]
    InvalidUserId(uuid::Error),
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the core part is incorrect")]
    InvalidCoreLength,
    #[error("The length of the salt part is incorrect")]
    InvalidSaltLength,
}

/// Bearer token presented by clients: `user_id:core:salt` with the binary
/// parts base64-encoded. Only its argon2 hash is ever stored.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionToken {
    pub user_id: Id<UserMarker>,
    pub core: [u8; SESSION_TOKEN_CORE_LEN],
    pub salt: [u8; SESSION_TOKEN_SALT_LEN],
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionTokenHash(pub Box<[u8; SESSION_TOKEN_HASH_LEN]>);

/// A stored session row. `expires_at` is absent for non-expiring sessions.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Session {
    pub user: Id<UserMarker>,
    pub token_hash: SessionTokenHash,
    pub created_at: UtcDateTime,
    pub expires_at: Option<UtcDateTime>,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now: UtcDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

impl SessionToken {
    #[must_use]
    pub fn generate_random(user_id: Id<UserMarker>) -> Self {
        let core = rand::random();
        let salt = rand::random();

        Self {
            user_id,
            core,
            salt,
        }
    }

    #[must_use]
    pub fn as_token_str(&self) -> String {
        let user_id = self.user_id;
        let encoded_core = Base64Display::new(&self.core, &BASE64_STANDARD);
        let encoded_salt = Base64Display::new(&self.salt, &BASE64_STANDARD);

        format!("{user_id}:{encoded_core}:{encoded_salt}")
    }

    pub fn hash(&self) -> Result<SessionTokenHash, SessionTokenHashError> {
        let argon2 = Argon2::default();

        let mut hash = Box::new([0; SESSION_TOKEN_HASH_LEN]);
        argon2
            .hash_password_into(&self.core, &self.salt, &mut *hash)
            .map_err(SessionTokenHashError)?;

        Ok(SessionTokenHash(hash))
    }
}

impl FromStr for SessionToken {
    type Err = SessionTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');

        let user_id_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let core_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let salt_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;

        let user_id = uuid::Uuid::from_str(user_id_part)
            .map_err(Self::Err::InvalidUserId)?
            .into();
        let core = BASE64_STANDARD
            .decode(core_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidCoreLength)?;
        let salt = BASE64_STANDARD
            .decode(salt_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidSaltLength)?;

        Ok(Self {
            user_id,
            core,
            salt,
        })
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("user_id", &self.user_id)
            .field("core", &"[redacted]")
            .field("salt", &"[redacted]")
            .finish()
    }
}

impl Debug for SessionTokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionTokenHash")
            .field(&"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The session token hash had an invalid length")]
pub struct InvalidSessionTokenHashError;

impl TryFrom<Box<[u8]>> for SessionTokenHash {
    type Error = InvalidSessionTokenHashError;

    fn try_from(value: Box<[u8]>) -> Result<Self, Self::Error> {
        Ok(Self(
            value.try_into().map_err(|_| InvalidSessionTokenHashError)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::session::{Session, SessionToken, SessionTokenDecodeError};
    use std::str::FromStr;
    use time::{Duration, macros::utc_datetime};
    use uuid::Uuid;

    #[test]
    fn token_round_trip() {
        let token = SessionToken::generate_random(Uuid::new_v4().into());
        let parsed = SessionToken::from_str(&token.as_token_str()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn token_rejects_malformed_input() {
        assert_eq!(
            SessionToken::from_str("no-colons-here"),
            Err(SessionTokenDecodeError::NotEnoughParts)
        );
        assert!(matches!(
            SessionToken::from_str("not-a-uuid:aaaa:bbbb"),
            Err(SessionTokenDecodeError::InvalidUserId(_))
        ));
    }

    #[test]
    fn hash_is_deterministic_per_token() {
        let token = SessionToken::generate_random(Uuid::new_v4().into());
        assert_eq!(token.hash().unwrap(), token.hash().unwrap());
    }

    #[test]
    fn expiry() {
        let now = utc_datetime!(2026-01-01 12:00);
        let token = SessionToken::generate_random(Uuid::new_v4().into());

        let mut session = Session {
            user: token.user_id,
            token_hash: token.hash().unwrap(),
            created_at: now - Duration::hours(2),
            expires_at: None,
        };
        assert!(!session.is_expired_at(now));

        session.expires_at = Some(now - Duration::hours(1));
        assert!(session.is_expired_at(now));

        session.expires_at = Some(now + Duration::hours(1));
        assert!(!session.is_expired_at(now));
    }
}
