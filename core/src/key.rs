//! Key space: logical keys and the derived fields they address.
//!
//! A [`LogicalKey`] names one independent async slot. Every slot owns a fixed,
//! closed family of derived fields, one per [`Suffix`]. The store keeps slots in a
//! map keyed by [`LogicalKey`], so two keys can never alias each other's fields;
//! the flattened `"<key><suffix>"` names exist only for consumers that read the
//! store as a flat mapping.
//!
//! # Example
//!
//! ```
//! use keyslot_core::key::{DerivedField, LogicalKey, Suffix};
//!
//! let key = LogicalKey::new("AGENTS");
//! let field = DerivedField::new(key, Suffix::Loading);
//! assert_eq!(field.flattened(), "AGENTS.LOADING");
//! ```

use crate::transport::Verb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default key used by `GET` orchestrations when the caller supplies none.
pub const DEFAULT_GET_KEY: &str = "DEFAULT_GET";
/// Default key used by `POST` orchestrations when the caller supplies none.
pub const DEFAULT_POST_KEY: &str = "DEFAULT_POST";
/// Default key used by `PUT` orchestrations when the caller supplies none.
pub const DEFAULT_PUT_KEY: &str = "DEFAULT_PUT";
/// Default key used by `PATCH` orchestrations when the caller supplies none.
pub const DEFAULT_PATCH_KEY: &str = "DEFAULT_PATCH";
/// Default key used by `DELETE` orchestrations when the caller supplies none.
pub const DEFAULT_DELETE_KEY: &str = "DEFAULT_DELETE";
/// Default key used by manual overwrites when the caller supplies none.
pub const DEFAULT_SELECTED_KEY: &str = "DEFAULT_SELECTED";

/// Error type for `LogicalKey` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid logical key: {0}")]
pub struct ParseLogicalKeyError(String);

/// Caller-chosen name of one async slot.
///
/// Keys are opaque: no registry reserves them and nothing checks for
/// uniqueness. Two callers using the same key share one slot.
///
/// # Validation
///
/// - `FromStr::from_str()`: rejects empty strings
/// - `From::from()` and `new()`: no validation
///
/// Orchestrators never reject a key. An empty key is replaced by the verb's
/// default through [`LogicalKey::or_default_for`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    /// Create a new `LogicalKey` from a string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the key into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the key is empty (and would be replaced by a default).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The default key for a verb.
    ///
    /// ```
    /// use keyslot_core::key::LogicalKey;
    /// use keyslot_core::transport::Verb;
    ///
    /// assert_eq!(LogicalKey::default_for(Verb::Get).as_str(), "DEFAULT_GET");
    /// ```
    #[must_use]
    pub fn default_for(verb: Verb) -> Self {
        let key = match verb {
            Verb::Get => DEFAULT_GET_KEY,
            Verb::Post => DEFAULT_POST_KEY,
            Verb::Put => DEFAULT_PUT_KEY,
            Verb::Patch => DEFAULT_PATCH_KEY,
            Verb::Delete => DEFAULT_DELETE_KEY,
        };
        Self::new(key)
    }

    /// The default key for manual overwrites.
    #[must_use]
    pub fn default_selected() -> Self {
        Self::new(DEFAULT_SELECTED_KEY)
    }

    /// Resolve an optional caller key, substituting the verb default when the
    /// key is missing or empty.
    ///
    /// ```
    /// use keyslot_core::key::LogicalKey;
    /// use keyslot_core::transport::Verb;
    ///
    /// assert_eq!(LogicalKey::or_default_for(Some("AGENTS"), Verb::Get).as_str(), "AGENTS");
    /// assert_eq!(LogicalKey::or_default_for(Some(""), Verb::Post).as_str(), "DEFAULT_POST");
    /// assert_eq!(LogicalKey::or_default_for(None, Verb::Delete).as_str(), "DEFAULT_DELETE");
    /// ```
    #[must_use]
    pub fn or_default_for(key: Option<&str>, verb: Verb) -> Self {
        match key {
            Some(key) if !key.is_empty() => Self::new(key),
            _ => Self::default_for(verb),
        }
    }

    /// The derived field of this key for `suffix`.
    #[must_use]
    pub fn field(&self, suffix: Suffix) -> DerivedField {
        DerivedField::new(self.clone(), suffix)
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LogicalKey {
    type Err = ParseLogicalKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseLogicalKeyError("Logical key cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for LogicalKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LogicalKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for LogicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The closed set of fields every slot carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Suffix {
    /// `true` while a request is in flight.
    Loading,
    /// `false`, or the error payload of the last failure.
    Error,
    /// `null`, or the payload of the last success.
    Response,
    /// Parameters of the last request (informational).
    Params,
}

impl Suffix {
    /// All suffixes, in flattening order.
    pub const ALL: [Self; 4] = [Self::Loading, Self::Error, Self::Response, Self::Params];

    /// String appended to a key to build the flattened field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => ".LOADING",
            Self::Error => ".ERROR",
            Self::Response => ".RESPONSE",
            Self::Params => ".PARAMS",
        }
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(key, suffix)` address of one field in the store.
///
/// Equality is structural over the pair, so two distinct keys never share a
/// derived field even when their flattened names would collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DerivedField {
    /// The slot the field belongs to.
    pub key: LogicalKey,
    /// Which field of the slot.
    pub suffix: Suffix,
}

impl DerivedField {
    /// Create a derived field address.
    #[must_use]
    pub const fn new(key: LogicalKey, suffix: Suffix) -> Self {
        Self { key, suffix }
    }

    /// Flattened name: key and suffix concatenated, with no escaping.
    ///
    /// A key that itself ends in a suffix string (e.g. `"A.LOADING"`) can alias
    /// another key's flattened name. Avoiding that is up to the caller.
    #[must_use]
    pub fn flattened(&self) -> String {
        format!("{}{}", self.key.as_str(), self.suffix.as_str())
    }
}

impl fmt::Display for DerivedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.key, self.suffix)
    }
}
