//! Page identifiers

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Longest accepted page id
pub const MAX_PAGE_ID_LEN: usize = 128;

/// Storage key of one page
///
/// Restricted to `[A-Za-z0-9_-]` so it can name a file directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(String);

impl PageId {
    /// Validate and wrap a page id
    ///
    /// # Errors
    /// Returns `PersistenceError::InvalidPageId` for empty, overlong or
    /// non-`[A-Za-z0-9_-]` ids.
    pub fn new(id: impl Into<String>) -> Result<Self, PersistenceError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_PAGE_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(id))
        } else {
            Err(PersistenceError::InvalidPageId(id))
        }
    }

    /// Id text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PageId {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PageId {
    type Error = PersistenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageId> for String {
    fn from(value: PageId) -> Self {
        value.0
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
