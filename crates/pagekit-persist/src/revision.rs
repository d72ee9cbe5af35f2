//! Content revisions
//!
//! A [`Revision`] is the Blake3 hash of a stored document body. Equal bodies
//! have equal revisions, so saving unchanged content is a no-op in effect.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Blake3 hash of a stored body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision([u8; 32]);

impl Revision {
    /// Revision of a body
    #[inline]
    #[must_use]
    pub fn of(body: &[u8]) -> Self {
        Self(*blake3::hash(body).as_bytes())
    }

    /// Raw hash bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex digits
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Revision {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| PersistenceError::InvalidRevision(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Revision {
    type Error = PersistenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Revision> for String {
    fn from(value: Revision) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn equal_bodies_equal_revisions() {
        assert_eq!(Revision::of(b"{}"), Revision::of(b"{}"));
        assert_ne!(Revision::of(b"{}"), Revision::of(b"[]"));
    }

    #[test]
    fn hex_display_parse() {
        let rev = Revision::of(b"page");
        let text = rev.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<Revision>().unwrap(), rev);
        assert_eq!(rev.short(), &text[..16]);
        assert!("zz".parse::<Revision>().is_err());
    }

    proptest! {
        #[test]
        fn prop_revision_is_deterministic(body in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(Revision::of(&body), Revision::of(&body));
        }
    }
}
