//! Listing types and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dedup key for a listing.
///
/// Derived from the listing title. Titles are not guaranteed unique across
/// the board, so two distinct posts with identical titles collide and the
/// second is dropped as a duplicate. This is a known approximation carried
/// over from how the board is scraped; the feed exposes no stable post id
/// we have confirmed we can rely on instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingKey(String);

impl ListingKey {
    /// Derives a key from a listing title.
    #[must_use]
    pub fn from_title(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ListingKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A listing exactly as the feed collaborator hands it over, before any
/// admission decision has been made.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    /// Post title.
    pub title: String,
    /// Post body text.
    pub body: String,
    /// Permalink to the post.
    pub url: String,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

/// One listing admitted into the system.
///
/// Immutable once constructed. The cache owns the listing after admission;
/// the pipeline holds only the key to avoid storing the same post twice.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Dedup key, derived from the title.
    pub key: ListingKey,
    /// Post title.
    pub title: String,
    /// Post body text.
    pub body: String,
    /// Permalink to the post.
    pub url: String,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Builds a listing from a raw feed item, deriving the dedup key.
    #[must_use]
    pub fn from_raw(raw: RawListing) -> Self {
        Self {
            key: ListingKey::from_title(raw.title.clone()),
            title: raw.title,
            body: raw.body,
            url: raw.url,
            created_at: raw.created_at,
        }
    }

    /// Title and body concatenated, the text the coarse and fine matchers
    /// evaluate.
    #[must_use]
    pub fn full_text(&self) -> String {
        format!("{}{}", self.title, self.body)
    }
}

impl From<RawListing> for Listing {
    fn from(raw: RawListing) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, body: &str) -> RawListing {
        RawListing {
            title: title.to_string(),
            body: body.to_string(),
            url: "https://example.com/post/1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_key_derived_from_title() {
        let listing = Listing::from_raw(raw("[USA-WI] [H] 3080 [W] PayPal", "body"));
        assert_eq!(listing.key.as_str(), "[USA-WI] [H] 3080 [W] PayPal");
        assert_eq!(listing.key, ListingKey::from_title("[USA-WI] [H] 3080 [W] PayPal"));
    }

    #[test]
    fn test_identical_titles_collide() {
        let a = Listing::from_raw(raw("same title", "first body"));
        let b = Listing::from_raw(raw("same title", "second body"));
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn test_full_text_concatenates_title_and_body() {
        let listing = Listing::from_raw(raw("title ", "and body"));
        assert_eq!(listing.full_text(), "title and body");
    }

    #[test]
    fn test_key_display_roundtrip() {
        let key = ListingKey::from("a title");
        assert_eq!(key.to_string(), "a title");
    }
}
