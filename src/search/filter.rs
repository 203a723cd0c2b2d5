//! Device name filter and its cache
//!
//! A device filter narrows results to apps supporting one device, matched as
//! an ordered phrase over the indexed device names. Filters are cached by the
//! index manager under a [`FilterCacheKey`], so repeated searches for the same
//! device (in any letter case) reuse one filter instance.

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tantivy::query::{ConstScoreQuery, EmptyQuery, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

/// Cache key for a device filter: the trimmed, lower-cased device name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCacheKey {
    device_name: String,
}

impl FilterCacheKey {
    pub fn new(device_name: &str) -> Self {
        Self {
            device_name: device_name.trim().to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.device_name
    }

    pub fn is_empty(&self) -> bool {
        self.device_name.is_empty()
    }
}

impl fmt::Display for FilterCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.device_name)
    }
}

/// A non-scoring filter matching apps that support one device
pub struct DeviceFilter {
    key: FilterCacheKey,
    query: Box<dyn Query>,
}

impl DeviceFilter {
    /// Build the filter over the device-name field.
    ///
    /// An empty name produces a filter that matches nothing; callers decide
    /// whether to apply a filter at all.
    pub fn build(key: FilterCacheKey, device_field: Field) -> Self {
        let terms: Vec<Term> = key
            .as_str()
            .split_whitespace()
            .map(|token| Term::from_field_text(device_field, token))
            .collect();

        let condition: Box<dyn Query> = match terms.len() {
            0 => Box::new(EmptyQuery),
            1 => Box::new(TermQuery::new(terms[0].clone(), IndexRecordOption::Basic)),
            _ => Box::new(PhraseQuery::new(terms)),
        };

        Self {
            key,
            query: Box::new(ConstScoreQuery::new(condition, 0.0)),
        }
    }

    pub fn key(&self) -> &FilterCacheKey {
        &self.key
    }

    /// A fresh copy of the filter condition
    pub fn query(&self) -> Box<dyn Query> {
        self.query.box_clone()
    }
}

impl fmt::Debug for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceFilter")
            .field("key", &self.key)
            .field("query", &self.query)
            .finish()
    }
}

/// Hit and miss counters for the filter cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Device filters by key, owned by the index manager
pub struct FilterCache {
    cache: Cache<FilterCacheKey, Arc<DeviceFilter>>,
    device_field: Field,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FilterCache {
    pub fn new(device_field: Field, max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(ttl)
            .build();

        Self {
            cache,
            device_field,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached filter for this device name, building it on a miss
    pub async fn get_or_build(&self, device_name: &str) -> Arc<DeviceFilter> {
        let key = FilterCacheKey::new(device_name);

        if let Some(filter) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(device = %key, "Device filter cache hit");
            return filter;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(device = %key, "Device filter cache miss");
        let filter = Arc::new(DeviceFilter::build(key.clone(), self.device_field));
        self.cache.insert(key, filter.clone()).await;
        filter
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn stats(&self) -> FilterCacheStats {
        FilterCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::document::{build_app_schema, fields, register_analyzers};
    use tantivy::collector::Count;
    use tantivy::{doc, Index};
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &FilterCacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn device_field() -> Field {
        build_app_schema().get_field(fields::DEVICE_NAMES).unwrap()
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        let a = FilterCacheKey::new("XPhone");
        let b = FilterCacheKey::new(" xphone ");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.as_str(), "xphone");
    }

    #[test]
    fn test_distinct_devices_differ() {
        assert_ne!(FilterCacheKey::new("xPhone"), FilterCacheKey::new("xTablet"));
    }

    #[test]
    fn test_filter_keeps_normalized_key() {
        let filter = DeviceFilter::build(FilterCacheKey::new(" Solar System Phone "), device_field());
        assert_eq!(filter.key().as_str(), "solar system phone");

        let empty = DeviceFilter::build(FilterCacheKey::new("   "), device_field());
        assert!(empty.key().is_empty());
    }

    /// In-memory index with one document per device list
    fn device_index(device_lists: &[&[&str]]) -> (Index, Field) {
        let index = Index::create_in_ram(build_app_schema());
        register_analyzers(&index);
        let field = device_field();

        let mut writer = index.writer_with_num_threads(1, 15_000_000).unwrap();
        for devices in device_lists {
            let mut document = doc!();
            for device in *devices {
                document.add_text(field, device);
            }
            writer.add_document(document).unwrap();
        }
        writer.commit().unwrap();
        (index, field)
    }

    fn count_matches(index: &Index, filter: &DeviceFilter) -> usize {
        let searcher = index.reader().unwrap().searcher();
        searcher.search(filter.query().as_ref(), &Count).unwrap()
    }

    #[test]
    fn test_empty_name_filter_matches_nothing() {
        let (index, field) = device_index(&[&["xPhone"], &["Personal Computer"], &[]]);

        for blank in ["", "   ", "\t"] {
            let filter = DeviceFilter::build(FilterCacheKey::new(blank), field);
            assert_eq!(count_matches(&index, &filter), 0, "blank name {blank:?}");
        }
    }

    #[test]
    fn test_filter_matches_whole_device_name_in_order() {
        let (index, field) = device_index(&[
            &["xPhone", "Solar System Phone"],
            &["Flame Book Reader"],
            &["Personal Computer"],
        ]);

        let filter = DeviceFilter::build(FilterCacheKey::new("XPHONE"), field);
        assert_eq!(count_matches(&index, &filter), 1);

        let filter = DeviceFilter::build(FilterCacheKey::new(" flame book reader "), field);
        assert_eq!(count_matches(&index, &filter), 1);

        let filter = DeviceFilter::build(FilterCacheKey::new("reader book flame"), field);
        assert_eq!(count_matches(&index, &filter), 0);
    }

    #[tokio::test]
    async fn test_cache_reuses_instance() {
        let cache = FilterCache::new(device_field(), 16, Duration::from_secs(60));

        let first = cache.get_or_build("xPhone").await;
        let second = cache.get_or_build("  XPHONE").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), FilterCacheStats { hits: 1, misses: 1 });

        let other = cache.get_or_build("xTablet").await;
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.stats().misses, 2);
    }

    proptest! {
        #[test]
        fn prop_key_equality_is_case_and_space_insensitive(
            name in "[a-zA-Z][a-zA-Z ]{0,20}",
            left in " {0,3}",
            right in " {0,3}",
        ) {
            let plain = FilterCacheKey::new(&name);
            let padded = FilterCacheKey::new(&format!("{left}{}{right}", name.to_uppercase()));
            prop_assert_eq!(&plain, &padded);
            prop_assert_eq!(hash_of(&plain), hash_of(&padded));
        }

        #[test]
        fn prop_key_equality_is_transitive(name in "[a-z]{1,12}") {
            let a = FilterCacheKey::new(&name);
            let b = FilterCacheKey::new(&name.to_uppercase());
            let c = FilterCacheKey::new(&format!(" {name} "));
            prop_assert_eq!(&a, &a);
            prop_assert_eq!(&a == &b, &b == &a);
            prop_assert!(a == b && b == c && a == c);
        }
    }
}
