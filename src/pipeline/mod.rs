//! One polling cycle: fetch, admit, classify, notify.
//!
//! The pipeline owns no tasks and no timers; an external scheduler invokes
//! [`Pipeline::run_cycle`] on a cadence and must not overlap invocations,
//! since concurrent admission would break the cache's insertion-order
//! invariant. Everything that survives between cycles (the cache and the
//! compiled matchers) lives in [`PipelineContext`], constructed once and
//! mutated only by the running cycle.

use crate::Result;
use crate::cache::BoundedDedupCache;
use crate::classify::PatternClassifier;
use crate::config::WatchConfig;
use crate::feed::FeedSource;
use crate::models::{Listing, ListingKey, RawListing};
use crate::notify::{Notifier, match_label};
use std::collections::HashSet;
use std::fmt;

/// The stages a cycle moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// Retrieving the current listing window from the feed.
    Fetching,
    /// Title-filtering items and admitting them into the dedup cache.
    Admitting,
    /// Running the coarse/fine matchers over newly admitted keys.
    Classifying,
    /// Dispatching per-tier notifications.
    Notifying,
    /// Cycle finished.
    Done,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fetching => "fetching",
            Self::Admitting => "admitting",
            Self::Classifying => "classifying",
            Self::Notifying => "notifying",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Summary of one cycle, for logging and tests.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Stage the cycle reached. Anything other than [`CycleStage::Done`]
    /// means the cycle was abandoned at that stage.
    pub reached: Option<CycleStage>,
    /// Items the feed returned.
    pub fetched: usize,
    /// Items that passed the title-admission filter.
    pub admitted: usize,
    /// Keys the cache accepted as genuinely new.
    pub fresh: usize,
    /// Final coarse-tier matches (fine subtracted).
    pub coarse: usize,
    /// Fine-tier matches.
    pub fine: usize,
}

impl CycleReport {
    fn abandoned_at(stage: CycleStage) -> Self {
        Self {
            reached: Some(stage),
            ..Self::default()
        }
    }

    /// Whether the cycle ran to completion.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.reached == Some(CycleStage::Done)
    }
}

/// Process-lifetime state shared by every cycle.
pub struct PipelineContext {
    cache: BoundedDedupCache<ListingKey, Listing>,
    classifier: PatternClassifier,
}

impl PipelineContext {
    /// Builds the context from configuration: sizes the cache and compiles
    /// the pattern banks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PatternCompile`] if any configured pattern
    /// is invalid. Callers should treat this as fatal; running with a
    /// half-built classifier would silently drop matches.
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let classifier = PatternClassifier::from_patterns(
            &config.title_patterns,
            &config.coarse_patterns,
            &config.fine_patterns,
        )?;
        Ok(Self {
            cache: BoundedDedupCache::new(config.cache_capacity()),
            classifier,
        })
    }

    /// Builds a context from already-constructed parts.
    #[must_use]
    pub fn from_parts(
        cache: BoundedDedupCache<ListingKey, Listing>,
        classifier: PatternClassifier,
    ) -> Self {
        Self { cache, classifier }
    }

    /// Read access to the dedup cache.
    #[must_use]
    pub const fn cache(&self) -> &BoundedDedupCache<ListingKey, Listing> {
        &self.cache
    }
}

/// Orchestrates polling cycles against a feed and a notifier.
pub struct Pipeline<F, N> {
    ctx: PipelineContext,
    feed: F,
    notifier: N,
    query: String,
}

impl<F: FeedSource, N: Notifier> Pipeline<F, N> {
    /// Creates a pipeline.
    pub fn new(ctx: PipelineContext, feed: F, notifier: N, query: impl Into<String>) -> Self {
        Self {
            ctx,
            feed,
            notifier,
            query: query.into(),
        }
    }

    /// Read access to the shared cycle state.
    #[must_use]
    pub const fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Warm-up pass: fetch and admit without classifying or notifying.
    ///
    /// Run once at startup so that only posts appearing after the process
    /// started can trigger notifications.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Fetch`] if the feed is unreachable. Safe to
    /// treat as non-fatal; the cache just starts empty.
    pub async fn prime(&mut self) -> Result<usize> {
        let raw = self.feed.fetch(&self.query).await?;
        let (_, fresh) = self.admit(raw);
        tracing::info!(admitted = fresh.len(), "warm-up pass complete");
        Ok(fresh.len())
    }

    /// Runs one full cycle. Never returns an error: fetch failures abandon
    /// the cycle (the next tick retries naturally) and delivery failures
    /// are logged per tier.
    pub async fn run_cycle(&mut self) -> CycleReport {
        // FETCHING
        let raw = match self.feed.fetch(&self.query).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "fetch failed, abandoning cycle");
                return CycleReport::abandoned_at(CycleStage::Fetching);
            }
        };
        let fetched = raw.len();

        // ADMITTING
        let (admitted, fresh) = self.admit(raw);
        tracing::info!(
            fresh = fresh.len(),
            admitted,
            fetched,
            "admission complete"
        );

        let mut report = CycleReport {
            reached: Some(CycleStage::Done),
            fetched,
            admitted,
            fresh: fresh.len(),
            coarse: 0,
            fine: 0,
        };
        if fresh.is_empty() {
            tracing::info!("no new listings, skipping classification");
            return report;
        }

        // CLASSIFYING
        let partition = match self.ctx.classifier.classify(&fresh, &self.ctx.cache) {
            Ok(partition) => partition,
            Err(e) => {
                // Only reachable if admission bookkeeping is broken.
                tracing::error!(error = %e, "classification failed, abandoning cycle");
                return CycleReport::abandoned_at(CycleStage::Classifying);
            }
        };
        report.coarse = partition.coarse.len();
        report.fine = partition.fine.len();
        tracing::info!(
            coarse = report.coarse,
            fine = report.fine,
            fresh = report.fresh,
            "classification complete"
        );

        // NOTIFYING: tiers are independent; one failing must not block the other.
        for (tier, keys) in [("COARSE", &partition.coarse), ("FINE", &partition.fine)] {
            if keys.is_empty() {
                continue;
            }
            self.dispatch_tier(tier, keys).await;
        }

        report
    }

    /// Title-filters and admits a fetched window, in feed order.
    ///
    /// Returns how many items passed the title filter and the set of keys
    /// the cache accepted as new. Items failing the title filter are
    /// discarded before touching the cache, so they consume no capacity.
    fn admit(&mut self, raw: Vec<RawListing>) -> (usize, HashSet<ListingKey>) {
        let mut admitted = 0;
        let mut fresh = HashSet::new();
        for item in raw {
            if !self.ctx.classifier.admits_title(&item.title) {
                continue;
            }
            admitted += 1;
            let listing = Listing::from_raw(item);
            let key = listing.key.clone();
            if self.ctx.cache.put(key.clone(), listing) {
                fresh.insert(key);
            }
        }
        (admitted, fresh)
    }

    async fn dispatch_tier(&self, tier: &str, keys: &HashSet<ListingKey>) {
        let mut listings = Vec::with_capacity(keys.len());
        for key in keys {
            match self.ctx.cache.get(key) {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    tracing::error!(error = %e, tier, "matched key missing from cache");
                }
            }
        }

        let label = match_label(tier, listings.len());
        if let Err(e) = self.notifier.notify(&listings, &label).await {
            tracing::warn!(error = %e, tier, "notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_completed_only_when_done() {
        let mut report = CycleReport::default();
        assert!(!report.completed());

        report.reached = Some(CycleStage::Fetching);
        assert!(!report.completed());

        report.reached = Some(CycleStage::Done);
        assert!(report.completed());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(CycleStage::Fetching.to_string(), "fetching");
        assert_eq!(CycleStage::Done.to_string(), "done");
    }

    #[test]
    fn test_context_from_config_sizes_cache() {
        let config = WatchConfig::default()
            .with_page_size(10)
            .with_capacity_multiplier(2);
        let ctx = PipelineContext::new(&config).unwrap();
        assert_eq!(ctx.cache().capacity(), 20);
    }

    #[test]
    fn test_context_rejects_bad_patterns() {
        let config = WatchConfig::default().with_coarse_patterns(vec!["[unclosed".to_string()]);
        assert!(PipelineContext::new(&config).is_err());
    }
}
