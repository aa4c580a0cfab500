//! Notification delivery.
//!
//! The pipeline depends only on the [`Notifier`] trait. [`SlackNotifier`]
//! posts mrkdwn blocks to a Slack-compatible webhook; [`LogNotifier`] just
//! logs matches and exists so the watcher can run without a webhook
//! configured.

use crate::classify::PriceExtractor;
use crate::models::Listing;
use crate::{Error, Result};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

/// Capability for delivering a batch of matched listings.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Delivers one tier's matches under the given label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delivery`] on transport failure or a non-success
    /// response. Callers catch and log this per tier; it never aborts a
    /// cycle.
    async fn notify(&self, listings: &[&Listing], label: &str) -> Result<()>;
}

/// Builds the tier label, e.g. `"FINE - 3 new matches found"`.
#[must_use]
pub fn match_label(tier: &str, count: usize) -> String {
    let plural = if count == 1 { "" } else { "es" };
    format!("{tier} - {count} new match{plural} found")
}

/// Webhook notifier posting Slack-style mrkdwn blocks.
pub struct SlackNotifier {
    client: reqwest::Client,
    /// The webhook URL embeds its auth token, so it is held as a secret
    /// and never logged.
    webhook_url: SecretString,
    prices: PriceExtractor,
}

impl SlackNotifier {
    /// Creates a notifier for the given webhook URL.
    #[must_use]
    pub fn new(webhook_url: SecretString, prices: PriceExtractor) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
            prices,
        }
    }

    /// Renders the message body for one batch of listings.
    ///
    /// Each listing becomes a linked title, the notification latency
    /// relative to post creation, and any price mentions extracted from
    /// the body.
    fn render_message(&self, listings: &[&Listing], label: &str) -> String {
        let now = Utc::now();
        let mut bodies = Vec::with_capacity(listings.len());
        for listing in listings {
            let latency_secs = (now - listing.created_at).num_seconds().max(0);
            let mut body = format!(
                "*<{}|{}>*\nNotified in {latency_secs} seconds\n\n",
                listing.url, listing.title
            );
            for quote in self.prices.quotes(&listing.body) {
                body.push_str(&format!("Price: {} {}\n", quote.item, quote.price));
            }
            bodies.push(body);
        }

        format!(
            "[{}] {label}\n{}",
            now.format("%m-%d-%Y %H:%M:%S"),
            bodies.join("\n\n")
        )
    }
}

impl Notifier for SlackNotifier {
    async fn notify(&self, listings: &[&Listing], label: &str) -> Result<()> {
        let text = self.render_message(listings, label);
        let payload = serde_json::json!({
            "text": label,
            "blocks": [{
                "type": "section",
                "text": { "type": "mrkdwn", "text": text },
            }],
        });

        let response = self
            .client
            .post(self.webhook_url.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Delivery {
                cause: format!("webhook request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Delivery {
                cause: format!("HTTP {status} from webhook"),
            });
        }

        tracing::info!(count = listings.len(), label, "notification delivered");
        Ok(())
    }
}

/// Fallback notifier that logs matches instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, listings: &[&Listing], label: &str) -> Result<()> {
        for listing in listings {
            tracing::info!(label, title = %listing.title, url = %listing.url, "match found");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawListing;
    use test_case::test_case;

    #[test_case(0, "COARSE - 0 new matches found"; "zero is plural")]
    #[test_case(1, "COARSE - 1 new match found"; "one is singular")]
    #[test_case(2, "COARSE - 2 new matches found"; "two is plural")]
    fn test_match_label(count: usize, expected: &str) {
        assert_eq!(match_label("COARSE", count), expected);
    }

    fn listing(title: &str, body: &str) -> Listing {
        Listing::from_raw(RawListing {
            title: title.to_string(),
            body: body.to_string(),
            url: "https://example.com/post/1".to_string(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_render_message_links_and_prices() {
        let prices = PriceExtractor::compile(&[
            r"(?P<item>RTX\s*3080)[\s\S]*?(?P<price>\$\d+)".to_string(),
        ])
        .unwrap();
        let notifier =
            SlackNotifier::new(SecretString::from("https://hooks.invalid/x".to_string()), prices);

        let a = listing("[H] RTX 3080 [W] PayPal", "RTX 3080 for $650 obo");
        let rendered = notifier.render_message(&[&a], "FINE - 1 new match found");

        assert!(rendered.contains("FINE - 1 new match found"));
        assert!(rendered.contains("*<https://example.com/post/1|[H] RTX 3080 [W] PayPal>*"));
        assert!(rendered.contains("Notified in"));
        assert!(rendered.contains("Price: RTX 3080 $650"));
    }

    #[test]
    fn test_render_message_without_price_mentions() {
        let notifier = SlackNotifier::new(
            SecretString::from("https://hooks.invalid/x".to_string()),
            PriceExtractor::default(),
        );
        let a = listing("a title", "no prices here");
        let rendered = notifier.render_message(&[&a], "COARSE - 1 new match found");
        assert!(!rendered.contains("Price:"));
    }
}
