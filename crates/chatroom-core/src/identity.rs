//! Client identity.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ConnectError;

/// The name a client claims when connecting.
///
/// Any non-empty string is accepted as-is; no trimming or case folding is
/// applied, so `"bob"` and `"bob "` are distinct identities.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate a raw identity string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ConnectError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ConnectError::MissingUsername);
        }
        Ok(Self(raw))
    }

    /// Validate an optional query value, treating absence like emptiness.
    pub fn from_query(raw: Option<String>) -> Result<Self, ConnectError> {
        raw.map_or(Err(ConnectError::MissingUsername), Self::parse)
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ConnectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}
