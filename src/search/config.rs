//! Search configuration

use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Boost and analyzer settings for one searchable field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldProfile {
    /// Index field name
    pub field: String,

    /// Static weight applied to every match on this field
    pub index_boost: f32,

    /// Extra weight applied only in phrase mode
    pub phrase_boost: f32,
}

impl FieldProfile {
    pub fn new(field: impl Into<String>, index_boost: f32, phrase_boost: f32) -> Self {
        Self {
            field: field.into(),
            index_boost,
            phrase_boost,
        }
    }
}

/// Declarative boost layout for the app index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexProfile {
    /// Weight applied to every app match
    pub class_boost: f32,

    /// The four searchable fields, in query order
    pub fields: Vec<FieldProfile>,
}

impl IndexProfile {
    /// Static weight for a field (class boost times field boost)
    pub fn static_weight(&self, field: &FieldProfile) -> f32 {
        self.class_boost * field.index_boost
    }
}

impl Default for IndexProfile {
    fn default() -> Self {
        Self {
            class_boost: 2.0,
            fields: vec![
                FieldProfile::new("name", 1.5, 2.0),
                FieldProfile::new("description", 1.2, 2.0),
                FieldProfile::new("device_names", 1.0, 1.0),
                FieldProfile::new("review_comments", 1.0, 1.0),
            ],
        }
    }
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the search index directory; an in-memory index is used when unset
    pub index_path: Option<PathBuf>,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Number of threads for indexing
    pub indexing_threads: usize,

    /// Records returned per page
    pub page_size: usize,

    /// Wall-clock budget for query execution, in milliseconds
    pub execution_timeout_ms: u64,

    /// Minimum similarity for fuzzy keyword matches
    pub fuzzy_threshold: f32,

    /// Longest raw query accepted, in characters
    pub max_query_length: usize,

    /// Maximum number of cached device filters
    pub filter_cache_capacity: u64,

    /// Idle lifetime of a cached device filter, in seconds
    pub filter_cache_ttl_secs: u64,

    /// Maximum number of search sessions open at once
    pub max_concurrent_sessions: usize,

    /// How long a request waits for a session before failing, in milliseconds
    pub session_acquire_timeout_ms: u64,

    /// Reuse pass 1 results when no facet is selected
    pub skip_redundant_pass: bool,

    /// Field boosts
    pub profile: IndexProfile,
}

impl SearchConfig {
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    pub fn session_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.session_acquire_timeout_ms)
    }

    pub fn filter_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.filter_cache_ttl_secs)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> SearchResult<()> {
        if self.page_size == 0 {
            return Err(SearchError::InvalidConfiguration(
                "page_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(SearchError::InvalidConfiguration(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.indexing_threads == 0 {
            return Err(SearchError::InvalidConfiguration(
                "indexing_threads must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_sessions == 0 {
            return Err(SearchError::InvalidConfiguration(
                "max_concurrent_sessions must be at least 1".to_string(),
            ));
        }
        if self.profile.fields.is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "index profile declares no searchable fields".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            writer_heap_size: 50_000_000, // 50MB
            indexing_threads: 1,
            page_size: 5,
            execution_timeout_ms: 2_000,
            fuzzy_threshold: 0.7,
            max_query_length: 256,
            filter_cache_capacity: 128,
            filter_cache_ttl_secs: 600,
            max_concurrent_sessions: 64,
            session_acquire_timeout_ms: 1_000,
            skip_redundant_pass: false,
            profile: IndexProfile::default(),
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = Some(path);
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn indexing_threads(mut self, threads: usize) -> Self {
        self.config.indexing_threads = threads;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        self.config.execution_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn fuzzy_threshold(mut self, threshold: f32) -> Self {
        self.config.fuzzy_threshold = threshold;
        self
    }

    pub fn max_query_length(mut self, max: usize) -> Self {
        self.config.max_query_length = max;
        self
    }

    pub fn filter_cache_capacity(mut self, capacity: u64) -> Self {
        self.config.filter_cache_capacity = capacity;
        self
    }

    pub fn max_concurrent_sessions(mut self, sessions: usize) -> Self {
        self.config.max_concurrent_sessions = sessions;
        self
    }

    pub fn session_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_acquire_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn skip_redundant_pass(mut self, enabled: bool) -> Self {
        self.config.skip_redundant_pass = enabled;
        self
    }

    pub fn profile(mut self, profile: IndexProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
