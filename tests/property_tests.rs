//! Property-based tests for the dedup cache and match partition.
//!
//! Uses proptest to verify invariants across random inputs:
//! - The cache never exceeds its capacity
//! - Residents are exactly the newest distinct keys
//! - `put` is idempotent for resident keys
//! - The coarse/fine partition is always disjoint

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::HashSet;
use swapwatch::BoundedDedupCache;
use swapwatch::classify::PatternClassifier;
use swapwatch::models::{Listing, ListingKey, RawListing};

proptest! {
    /// Property: for any put sequence, len never exceeds capacity.
    #[test]
    fn prop_capacity_never_exceeded(
        capacity in 1usize..16,
        keys in prop::collection::vec("[a-e][0-9]", 0..64),
    ) {
        let mut cache = BoundedDedupCache::new(capacity);
        for (i, key) in keys.into_iter().enumerate() {
            cache.put(key, i);
            prop_assert!(cache.len() <= capacity);
        }
    }

    /// Property: the resident set is exactly the last `capacity` distinct
    /// keys of the insertion sequence.
    #[test]
    fn prop_residents_are_newest_distinct_keys(
        capacity in 1usize..8,
        keys in prop::collection::vec("[a-d][0-9]", 0..48),
    ) {
        let mut cache = BoundedDedupCache::new(capacity);
        let mut inserted = Vec::new();
        for (i, key) in keys.into_iter().enumerate() {
            if cache.put(key.clone(), i) {
                inserted.push(key);
            }
        }

        let expected: HashSet<&String> = inserted
            .iter()
            .rev()
            .take(capacity)
            .collect();
        for key in &inserted {
            prop_assert_eq!(cache.contains(key), expected.contains(key));
        }
    }

    /// Property: re-putting a resident key returns false and changes
    /// neither the stored value nor the cache size.
    #[test]
    fn prop_put_is_idempotent_for_residents(
        capacity in 1usize..8,
        keys in prop::collection::vec("[a-c][0-9]", 1..32),
    ) {
        let mut cache = BoundedDedupCache::new(capacity);
        for (i, key) in keys.into_iter().enumerate() {
            cache.put(key.clone(), i);
            let len_before = cache.len();
            let value_before = *cache.get(&key).unwrap();

            prop_assert!(!cache.put(key.clone(), i + 1000));
            prop_assert_eq!(cache.len(), len_before);
            prop_assert_eq!(*cache.get(&key).unwrap(), value_before);
        }
    }

    /// Property: the coarse and fine tiers never share a key, and fine
    /// keys always satisfy the coarse pattern too.
    #[test]
    fn prop_partition_disjoint_and_fine_within_coarse(
        bodies in prop::collection::vec("[ a-z0-9]{0,20}", 1..12),
    ) {
        let classifier = PatternClassifier::from_patterns(
            &[],
            &["[0-9]".to_string()],
            &["[0-9]{2}".to_string()],
        ).expect("static patterns compile");

        let mut cache = BoundedDedupCache::new(bodies.len());
        let mut new_keys = HashSet::new();
        for (i, body) in bodies.into_iter().enumerate() {
            let listing = Listing::from_raw(RawListing {
                title: format!("post {i}"),
                body,
                url: String::new(),
                created_at: chrono::Utc::now(),
            });
            let key = listing.key.clone();
            cache.put(key.clone(), listing);
            new_keys.insert(key);
        }

        let partition = classifier.classify(&new_keys, &cache).unwrap();
        prop_assert!(partition.coarse.is_disjoint(&partition.fine));

        // Every fine key must itself match the coarse pattern: a two-digit
        // run implies a digit.
        let coarse_only = PatternClassifier::from_patterns(
            &[],
            &["[0-9]".to_string()],
            &[],
        ).expect("static patterns compile");
        let coarse_all: HashSet<ListingKey> = coarse_only
            .classify(&new_keys, &cache)
            .unwrap()
            .coarse;
        for key in &partition.fine {
            prop_assert!(coarse_all.contains(key));
        }
    }
}
