use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 50;

/// Fallbacks used whenever a post, comment or notification has no joined
/// profile data to resolve against.
pub const ANONYMOUS_USERNAME: &str = "anonymous";
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous User";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Profile {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation_score: i32,
}

impl Profile {
    /// Display name resolution: profile display name, then username, then
    /// the anonymous literal.
    #[must_use]
    pub fn resolved_display_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.username.get(),
        }
    }

    #[must_use]
    pub fn resolved_avatar_url(&self) -> &str {
        self.avatar_url.as_deref().unwrap_or("")
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The username is invalid: {0:?}")]
pub struct InvalidUsernameError(String);

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        if !username.is_empty() && username.chars().count() <= USERNAME_MAX_LEN {
            Ok(Username(username))
        } else {
            Err(InvalidUsernameError(username))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Username"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::profile::{
        ANONYMOUS_DISPLAY_NAME, Profile, USERNAME_MAX_LEN, Username,
    };
    use uuid::Uuid;

    fn profile(display_name: Option<&str>, avatar_url: Option<&str>) -> Profile {
        Profile {
            id: Uuid::nil().into(),
            username: Username::new("chainsmith".to_owned()).unwrap(),
            display_name: display_name.map(str::to_owned),
            avatar_url: avatar_url.map(str::to_owned),
            reputation_score: 87,
        }
    }

    #[test]
    fn username_length_limits() {
        assert!(Username::new(String::new()).is_err());
        assert!(Username::new("a".repeat(USERNAME_MAX_LEN)).is_ok());
        assert!(Username::new("a".repeat(USERNAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(
            profile(Some("Crypto Enthusiast"), None).resolved_display_name(),
            "Crypto Enthusiast"
        );
        assert_eq!(profile(None, None).resolved_display_name(), "chainsmith");
        assert_eq!(profile(Some(""), None).resolved_display_name(), "chainsmith");
    }

    #[test]
    fn avatar_falls_back_to_empty() {
        assert_eq!(
            profile(None, Some("ipfs://avatar")).resolved_avatar_url(),
            "ipfs://avatar"
        );
        assert_eq!(profile(None, None).resolved_avatar_url(), "");
        assert_eq!(ANONYMOUS_DISPLAY_NAME, "Anonymous User");
    }
}
