//! Staged text-pattern classification.
//!
//! Three independent matchers, each compiled once at startup from an
//! ordered pattern list:
//!
//! - **title admission**: applied to the title alone; decides whether a
//!   listing is considered at all (an empty pattern list disables the
//!   filter and admits everything).
//! - **coarse**: applied to title+body; broad candidate detection.
//! - **fine**: applied to title+body, but only to listings the coarse
//!   matcher already accepted; strict "actionable" detection.
//!
//! The final partition subtracts fine matches out of coarse, so the two
//! tiers are disjoint by construction and stable under re-evaluation.

use crate::cache::BoundedDedupCache;
use crate::models::{Listing, ListingKey};
use crate::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Capability for deciding whether a piece of text is a match.
///
/// The classifier only depends on this trait, so the regex-backed
/// implementation can be swapped for a stub in tests or replaced outright
/// without touching the orchestration logic.
pub trait Matcher: Send + Sync {
    /// Returns true iff any configured alternative matches anywhere in `text`.
    fn is_match(&self, text: &str) -> bool;
}

/// A pattern list compiled into a single case-insensitive alternation.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: Regex,
}

impl CompiledMatcher {
    /// Compiles an ordered pattern list by joining the patterns as
    /// alternatives of one case-insensitive regex.
    ///
    /// Each pattern is wrapped in a non-capturing group so alternation
    /// inside one pattern cannot bleed into its neighbors. Compilation
    /// happens once per matcher at startup, never per item.
    ///
    /// An empty list compiles to a matcher that matches any text;
    /// [`PatternClassifier`] treats empty lists as disabled before ever
    /// calling this.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PatternCompile`] if the joined pattern is not valid
    /// regex syntax.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let joined = patterns
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&joined)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::PatternCompile {
                pattern: joined.clone(),
                cause: e.to_string(),
            })?;
        Ok(Self { regex })
    }
}

impl Matcher for CompiledMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A price mention extracted from a listing body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// The item the price refers to.
    pub item: String,
    /// The price text as written in the listing.
    pub price: String,
}

/// Extracts price mentions from listing text for notification enrichment.
///
/// Unlike the tier matchers, price patterns carry named capture groups
/// (`item` and `price`), and duplicate group names cannot share one
/// alternation, so each pattern is compiled separately.
#[derive(Debug, Clone, Default)]
pub struct PriceExtractor {
    regexes: Vec<Regex>,
}

impl PriceExtractor {
    /// Compiles the price pattern list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PatternCompile`] if any pattern is invalid or lacks
    /// the `item`/`price` capture groups.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut regexes = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::PatternCompile {
                    pattern: pattern.clone(),
                    cause: e.to_string(),
                })?;
            let names: Vec<_> = regex.capture_names().flatten().collect();
            if !names.contains(&"item") || !names.contains(&"price") {
                return Err(Error::PatternCompile {
                    pattern: pattern.clone(),
                    cause: "price pattern must define 'item' and 'price' capture groups"
                        .to_string(),
                });
            }
            regexes.push(regex);
        }
        Ok(Self { regexes })
    }

    /// Returns every price mention found in `text`, in pattern order.
    #[must_use]
    pub fn quotes(&self, text: &str) -> Vec<PriceQuote> {
        let mut quotes = Vec::new();
        for regex in &self.regexes {
            for caps in regex.captures_iter(text) {
                if let (Some(item), Some(price)) = (caps.name("item"), caps.name("price")) {
                    quotes.push(PriceQuote {
                        item: item.as_str().to_string(),
                        price: price.as_str().to_string(),
                    });
                }
            }
        }
        quotes
    }
}

/// Per-cycle classification result: two disjoint sets of keys.
#[derive(Debug, Clone, Default)]
pub struct MatchPartition {
    /// Broad candidate matches, with fine matches subtracted out.
    pub coarse: HashSet<ListingKey>,
    /// Strict, actionable matches.
    pub fine: HashSet<ListingKey>,
}

impl MatchPartition {
    /// Returns true when neither tier matched anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coarse.is_empty() && self.fine.is_empty()
    }
}

/// The three staged matchers, built once at startup.
pub struct PatternClassifier {
    /// Title-only pre-filter; `None` admits everything.
    admission: Option<Box<dyn Matcher>>,
    /// Broad candidate matcher over title+body; `None` matches nothing.
    coarse: Option<Box<dyn Matcher>>,
    /// Strict matcher over title+body; `None` matches nothing.
    fine: Option<Box<dyn Matcher>>,
}

impl PatternClassifier {
    /// Builds the classifier from the three configured pattern lists.
    ///
    /// Empty lists disable the corresponding stage: no admission filter
    /// means every title is admitted, while an empty coarse or fine list
    /// simply never matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PatternCompile`] if any non-empty list fails to
    /// compile. The caller is expected to treat this as fatal.
    pub fn from_patterns(
        title_patterns: &[String],
        coarse_patterns: &[String],
        fine_patterns: &[String],
    ) -> Result<Self> {
        Ok(Self {
            admission: compile_optional(title_patterns)?,
            coarse: compile_optional(coarse_patterns)?,
            fine: compile_optional(fine_patterns)?,
        })
    }

    /// Builds a classifier from pre-built matcher strategies. Used to swap
    /// in alternative matcher implementations.
    #[must_use]
    pub fn with_matchers(
        admission: Option<Box<dyn Matcher>>,
        coarse: Option<Box<dyn Matcher>>,
        fine: Option<Box<dyn Matcher>>,
    ) -> Self {
        Self {
            admission,
            coarse,
            fine,
        }
    }

    /// Applies the title-admission filter.
    ///
    /// Listings rejected here are discarded before they ever reach the
    /// dedup cache, so they consume no capacity and cannot evict anything.
    #[must_use]
    pub fn admits_title(&self, title: &str) -> bool {
        self.admission.as_ref().is_none_or(|m| m.is_match(title))
    }

    /// Classifies the newly admitted keys into the disjoint coarse/fine
    /// partition.
    ///
    /// The coarse matcher runs over every new key; the fine matcher runs
    /// over the coarse-matched subset only, then fine matches are
    /// subtracted out of coarse.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if a key in `new_keys` is not
    /// resident in the cache, which indicates an admission bookkeeping
    /// defect upstream.
    pub fn classify(
        &self,
        new_keys: &HashSet<ListingKey>,
        cache: &BoundedDedupCache<ListingKey, Listing>,
    ) -> Result<MatchPartition> {
        let mut coarse = HashSet::new();
        if let Some(matcher) = &self.coarse {
            for key in new_keys {
                let listing = cache.get(key)?;
                if matcher.is_match(&listing.full_text()) {
                    coarse.insert(key.clone());
                }
            }
        }

        let mut fine = HashSet::new();
        if let Some(matcher) = &self.fine {
            for key in &coarse {
                let listing = cache.get(key)?;
                if matcher.is_match(&listing.full_text()) {
                    fine.insert(key.clone());
                }
            }
        }

        // Enforce disjointness: fine wins, coarse keeps the remainder.
        for key in &fine {
            coarse.remove(key);
        }
        Ok(MatchPartition { coarse, fine })
    }
}

fn compile_optional(patterns: &[String]) -> Result<Option<Box<dyn Matcher>>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    Ok(Some(Box::new(CompiledMatcher::compile(patterns)?)))
}
