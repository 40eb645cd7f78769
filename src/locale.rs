//! Locale identifiers used throughout the crate.
//!
//! Targets on a text unit, writer output options, and pipeline parameters are
//! all keyed by [`LocaleId`], a validated BCP-47 language tag.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// A validated BCP-47 language tag, such as `en`, `fr-CA` or `zh-Hant-TW`.
///
/// # Example
/// ```rust
/// use locflow::locale::LocaleId;
///
/// let locale = LocaleId::new("fr-CA").unwrap();
/// assert_eq!(locale.language(), "fr");
/// assert_eq!(locale.region(), Some("CA"));
/// assert_eq!(locale.to_string(), "fr-CA");
/// assert!(LocaleId::new("not a tag").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleId(LanguageIdentifier);

impl LocaleId {
    /// Parses and validates a BCP-47 tag.
    ///
    /// Returns [`Error::Locale`] when the tag is not well-formed.
    pub fn new(tag: &str) -> Result<Self, Error> {
        tag.parse::<LanguageIdentifier>()
            .map(LocaleId)
            .map_err(|_| Error::Locale(tag.to_string()))
    }

    /// The primary language subtag, lowercased (`"fr"` for `fr-CA`).
    pub fn language(&self) -> &str {
        self.0.language.as_str()
    }

    /// The region subtag, if any (`Some("CA")` for `fr-CA`).
    pub fn region(&self) -> Option<&str> {
        self.0.region.as_ref().map(|r| r.as_str())
    }

    /// True when both identifiers share the same primary language subtag,
    /// regardless of region or script.
    pub fn same_language(&self, other: &LocaleId) -> bool {
        self.0.language == other.0.language
    }
}

/// The undetermined locale, `und`.
impl Default for LocaleId {
    fn default() -> Self {
        LocaleId(LanguageIdentifier::default())
    }
}

impl Display for LocaleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocaleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocaleId::new(s)
    }
}

impl Serialize for LocaleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for LocaleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        LocaleId::new(&tag).map_err(serde::de::Error::custom)
    }
}
