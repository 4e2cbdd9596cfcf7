//! RFC 4122 identifiers used as the join key across IMF documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{ImfError, ImfResult};

const URN_PREFIX: &str = "urn:uuid:";

/// A package-wide identifier, rendered as `urn:uuid:xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
///
/// Comparison is on the 128-bit value, so hex case does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Parse an identifier from document text.
    ///
    /// Accepts the `urn:uuid:` form (prefix case-insensitive) and the bare
    /// hyphenated form some CPL writers emit. Anything else, including the
    /// simple or braced UUID spellings, is rejected.
    pub fn parse(text: &str) -> ImfResult<Self> {
        let trimmed = text.trim();
        let body = match trimmed.get(..URN_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(URN_PREFIX) => &trimmed[URN_PREFIX.len()..],
            _ => trimmed,
        };

        if body.len() != 36 {
            return Err(ImfError::MalformedIdentifier(text.to_string()));
        }

        Uuid::try_parse(body)
            .map(Self)
            .map_err(|_| ImfError::MalformedIdentifier(text.to_string()))
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Render as `urn:uuid:...`.
    pub fn to_urn(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URN_PREFIX, self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = ImfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
