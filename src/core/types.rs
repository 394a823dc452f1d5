//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`QueryHash`] - Content hash identifying a persisted operation
//!
//! # Validation
//!
//! Hashes are either computed from operation text or validated at
//! construction time. A malformed hash read back from a manifest file
//! cannot be represented.
//!
//! # Examples
//!
//! ```
//! use persistgql::core::types::QueryHash;
//!
//! let hash = QueryHash::compute("query getCount {\n  count {\n    amount\n  }\n}\n");
//! assert_eq!(hash.as_str(), "f0b1fc6be73d03f4ca8b5cf34c1f7ae164b8ef57");
//!
//! assert!(QueryHash::new("not-a-hash").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid query hash: {0}")]
    InvalidQueryHash(String),
}

/// Content hash of a canonical operation string.
///
/// The hash is the SHA-1 digest of the exact UTF-8 bytes of the operation
/// text, rendered as 40 lowercase hex characters. It is computed over the
/// rendered text, never over a parsed form, so two texts that differ only in
/// whitespace hash differently.
///
/// Collisions are not detected.
///
/// # Example
///
/// ```
/// use persistgql::core::types::QueryHash;
///
/// let a = QueryHash::compute("query countUpdated {\n  amount\n}\n");
/// let b = QueryHash::compute("query countUpdated {\n  amount\n}\n");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueryHash(String);

impl QueryHash {
    /// Length of a hash in hex characters.
    pub const LEN: usize = 40;

    /// Hash the exact bytes of `text`.
    pub fn compute(text: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Create a validated hash from its hex form.
    ///
    /// The hash is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidQueryHash` if the string is not 40 hex characters.
    pub fn new(hash: impl Into<String>) -> Result<Self, TypeError> {
        let hash = hash.into().to_ascii_lowercase();
        Self::validate(&hash)?;
        Ok(Self(hash))
    }

    fn validate(hash: &str) -> Result<(), TypeError> {
        if hash.len() != Self::LEN {
            return Err(TypeError::InvalidQueryHash(format!(
                "expected {} hex characters, got {}",
                Self::LEN,
                hash.len()
            )));
        }
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidQueryHash(
                "query hash must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the hash as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QueryHash {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<QueryHash> for String {
    fn from(hash: QueryHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for QueryHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
