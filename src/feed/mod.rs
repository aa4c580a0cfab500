//! Feed retrieval.
//!
//! The pipeline only depends on the [`FeedSource`] trait; [`RedditFeed`]
//! is the HTTP implementation against the board's JSON listing endpoints.

use crate::models::RawListing;
use crate::{Error, Result};
use chrono::DateTime;
use serde::Deserialize;

/// Capability for retrieving the current listing window.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    /// Fetches the newest listings, ordered as the feed returns them.
    ///
    /// An empty `query` retrieves all newest posts on the board; a
    /// non-empty one runs a filtered search sorted by newest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on a transport failure, a non-success
    /// status, or an undecodable response body.
    async fn fetch(&self, query: &str) -> Result<Vec<RawListing>>;
}

// JSON envelope the board wraps listings in.

#[derive(Debug, Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    url: String,
    created_utc: f64,
}

/// Decodes a feed response body into raw listings, preserving feed order.
///
/// # Errors
///
/// Returns [`Error::Fetch`] if the body is not the expected envelope.
pub fn parse_feed(body: &str) -> Result<Vec<RawListing>> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| Error::Fetch {
        cause: format!("undecodable feed response: {e}"),
    })?;

    Ok(envelope
        .data
        .children
        .into_iter()
        .map(|child| {
            let post = child.data;
            #[allow(clippy::cast_possible_truncation)]
            let created_at =
                DateTime::from_timestamp(post.created_utc as i64, 0).unwrap_or_default();
            RawListing {
                title: post.title,
                body: post.selftext,
                url: post.url,
                created_at,
            }
        })
        .collect())
}

/// HTTP feed implementation against the board's JSON endpoints.
pub struct RedditFeed {
    client: reqwest::Client,
    base_url: String,
    board: String,
    page_size: usize,
}

impl RedditFeed {
    /// Creates a feed client for the given board.
    ///
    /// `page_size` bounds the number of items requested per poll.
    #[must_use]
    pub fn new(board: impl Into<String>, user_agent: &str, page_size: usize) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: "https://reddit.com".to_string(),
            board: board.into(),
            page_size,
        }
    }

    /// Overrides the base URL. Used to point at a local stub server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_body(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                cause: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                cause: format!("HTTP {status} from feed"),
            });
        }

        response.text().await.map_err(|e| Error::Fetch {
            cause: format!("failed reading response body: {e}"),
        })
    }
}

impl FeedSource for RedditFeed {
    async fn fetch(&self, query: &str) -> Result<Vec<RawListing>> {
        let limit = self.page_size.to_string();
        let body = if query.is_empty() {
            let url = format!("{}/r/{}/new.json", self.base_url, self.board);
            self.get_body(&url, &[("limit", limit.as_str())]).await?
        } else {
            let url = format!("{}/r/{}/search.json", self.base_url, self.board);
            let params = [
                ("q", query),
                ("limit", limit.as_str()),
                ("sort", "new"),
                ("t", "week"),
                ("restrict_sr", "true"),
            ];
            self.get_body(&url, &params).await?
        };

        let listings = parse_feed(&body)?;
        tracing::debug!(count = listings.len(), board = %self.board, "fetched feed window");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "data": {
            "children": [
                {"data": {"title": "[USA-WI] [H] RTX 3080 [W] PayPal",
                          "selftext": "asking $650 shipped",
                          "url": "https://example.com/post/abc",
                          "created_utc": 1700000000.0}},
                {"data": {"title": "[USA-CA] [H] RX 480 8GB [W] PayPal",
                          "url": "https://example.com/post/def",
                          "created_utc": 1700000100.0}}
            ]
        }
    }"#;

    #[test]
    fn test_parse_feed_preserves_order() {
        let listings = parse_feed(FIXTURE).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "[USA-WI] [H] RTX 3080 [W] PayPal");
        assert_eq!(listings[0].body, "asking $650 shipped");
        assert_eq!(listings[0].url, "https://example.com/post/abc");
        assert_eq!(listings[0].created_at.timestamp(), 1_700_000_000);
        assert_eq!(listings[1].title, "[USA-CA] [H] RX 480 8GB [W] PayPal");
    }

    #[test]
    fn test_parse_feed_defaults_missing_body() {
        let listings = parse_feed(FIXTURE).unwrap();
        assert!(listings[1].body.is_empty());
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        let err = parse_feed("not json at all").unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));

        let err = parse_feed(r#"{"data": {}}"#).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_parse_feed_empty_window() {
        let listings = parse_feed(r#"{"data": {"children": []}}"#).unwrap();
        assert!(listings.is_empty());
    }
}
