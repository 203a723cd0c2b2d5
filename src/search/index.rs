//! Search index management

use crate::search::config::SearchConfig;
use crate::search::document::{build_app_schema, fields, register_analyzers, AppDocument, SearchDocument};
use crate::search::error::{SearchError, SearchResult};
use crate::search::filter::{FilterCache, FilterCacheStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tantivy::schema::{Field, Schema};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, Term};
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use uuid::Uuid;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes (zero for in-memory indexes)
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,

    /// Last commit timestamp
    pub last_commit: Option<DateTime<Utc>>,

    /// Device filter cache counters
    pub filter_cache: FilterCacheStats,

    /// Search sessions that can still be opened right now
    pub available_sessions: usize,
}

/// A scoped handle on the index for one request.
///
/// Holds a concurrency permit and a point-in-time searcher; both are
/// released when the session is dropped.
pub struct SearchSession {
    id: Uuid,
    searcher: Searcher,
    opened_at: Instant,
    _permit: OwnedSemaphorePermit,
}

impl SearchSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        tracing::debug!(
            session = %self.id,
            held_ms = self.opened_at.elapsed().as_millis() as u64,
            "Search session released"
        );
    }
}

/// Manages the Tantivy search index
pub struct IndexManager {
    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader, reloaded after every commit
    reader: IndexReader,

    /// Device filters shared by all requests
    filters: FilterCache,

    /// Permits for open search sessions
    sessions: Arc<Semaphore>,

    last_commit: RwLock<Option<DateTime<Utc>>>,

    /// Configuration
    config: SearchConfig,
}

impl IndexManager {
    /// Create a new IndexManager
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        config.validate()?;

        let index = match &config.index_path {
            Some(path) => Self::open_or_create(path)?,
            None => Index::create_in_ram(build_app_schema()),
        };
        register_analyzers(&index);
        let schema = index.schema();

        let writer = index
            .writer_with_num_threads(config.indexing_threads, config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        // Searches see a new snapshot only after an explicit commit
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        let device_field = schema.get_field(fields::DEVICE_NAMES).map_err(|e| {
            SearchError::IndexInitFailed(format!("Index has no device name field: {}", e))
        })?;
        let filters = FilterCache::new(
            device_field,
            config.filter_cache_capacity,
            config.filter_cache_ttl(),
        );

        tracing::info!(
            path = ?config.index_path,
            max_sessions = config.max_concurrent_sessions,
            "Search index ready"
        );

        Ok(Self {
            index,
            schema,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            filters,
            sessions: Arc::new(Semaphore::new(config.max_concurrent_sessions)),
            last_commit: RwLock::new(None),
            config,
        })
    }

    fn open_or_create(path: &Path) -> SearchResult<Index> {
        std::fs::create_dir_all(path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        if Self::index_exists(path) {
            Index::open_in_dir(path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })
        } else {
            Index::create_in_dir(path, build_app_schema()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })
        }
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn filters(&self) -> &FilterCache {
        &self.filters
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn id_field(&self) -> SearchResult<Field> {
        self.schema
            .get_field(fields::ID)
            .map_err(|e| SearchError::SchemaError(format!("Index has no id field: {}", e)))
    }

    /// Open a search session, waiting at most the configured acquire timeout
    pub async fn open_session(&self) -> SearchResult<SearchSession> {
        let acquire = self.sessions.clone().acquire_owned();
        let permit = match tokio::time::timeout(self.config.session_acquire_timeout(), acquire).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(SearchError::SessionUnavailable(
                    "index manager is shut down".to_string(),
                ))
            }
            Err(_) => {
                return Err(SearchError::SessionUnavailable(format!(
                    "no session available within {}ms",
                    self.config.session_acquire_timeout_ms
                )))
            }
        };

        let session = SearchSession {
            id: Uuid::new_v4(),
            searcher: self.reader.searcher(),
            opened_at: Instant::now(),
            _permit: permit,
        };
        tracing::debug!(session = %session.id, "Search session opened");
        Ok(session)
    }

    /// Refuse new sessions; sessions already open run to completion
    pub fn shutdown(&self) {
        self.sessions.close();
        tracing::info!("Search index closed to new sessions");
    }

    pub fn is_shut_down(&self) -> bool {
        self.sessions.is_closed()
    }

    /// Stage a document, replacing any indexed document with the same ID
    pub async fn index_document(&self, document: &AppDocument) -> SearchResult<()> {
        let id_field = self.id_field()?;
        let tantivy_doc = document.to_tantivy_doc(&self.schema);

        let writer = self.writer.write().await;
        writer.delete_term(Term::from_field_u64(id_field, document.document_id()));
        writer
            .add_document(tantivy_doc)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to add document: {}", e)))?;

        Ok(())
    }

    /// Index multiple documents and commit
    pub async fn index_documents(&self, documents: &[AppDocument]) -> SearchResult<usize> {
        let id_field = self.id_field()?;
        let mut indexed = 0;

        {
            let writer = self.writer.write().await;
            for document in documents {
                writer.delete_term(Term::from_field_u64(id_field, document.document_id()));
                writer
                    .add_document(document.to_tantivy_doc(&self.schema))
                    .map_err(|e| {
                        SearchError::IndexingFailed(format!(
                            "Failed to add document {}: {}",
                            document.document_id(),
                            e
                        ))
                    })?;
                indexed += 1;
            }
        }

        self.commit().await?;
        Ok(indexed)
    }

    /// Stage removal of a document by ID
    pub async fn delete_document(&self, document_id: u64) -> SearchResult<()> {
        let id_field = self
            .id_field()
            .map_err(|e| SearchError::DeletionFailed(e.to_string()))?;

        let writer = self.writer.write().await;
        writer.delete_term(Term::from_field_u64(id_field, document_id));
        Ok(())
    }

    /// Commit pending changes and make them visible to new sessions
    pub async fn commit(&self) -> SearchResult<()> {
        {
            let mut writer = self.writer.write().await;
            writer
                .commit()
                .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        }

        self.reader
            .reload()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to reload reader: {}", e)))?;
        *self.last_commit.write().await = Some(Utc::now());
        Ok(())
    }

    /// Clear the entire index
    pub async fn clear_index(&self) -> SearchResult<()> {
        {
            let writer = self.writer.write().await;
            writer.delete_all_documents().map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to clear index: {}", e))
            })?;
        }
        self.commit().await?;
        self.filters.invalidate_all().await;
        Ok(())
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        let index_size_bytes = self
            .config
            .index_path
            .as_ref()
            .and_then(|path| std::fs::read_dir(path).ok())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents: searcher.num_docs(),
            index_size_bytes,
            num_segments: searcher.segment_readers().len(),
            last_commit: *self.last_commit.read().await,
            filter_cache: self.filters.stats(),
            available_sessions: self.sessions.available_permits(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::App;
    use crate::search::config::SearchConfigBuilder;
    use std::time::Duration;
    use tempfile::TempDir;

    fn document(id: u64, name: &str) -> AppDocument {
        let mut app = App::new(name, "image.jpg", "A test app", "Games", 0.99);
        app.id = id;
        AppDocument::from(&app)
    }

    #[tokio::test]
    async fn test_index_creation_in_memory() {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();
        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.index_size_bytes, 0);
        assert!(stats.last_commit.is_none());
    }

    #[tokio::test]
    async fn test_index_reopens_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfigBuilder::new()
            .index_path(temp_dir.path().to_path_buf())
            .build();

        {
            let manager = IndexManager::new(config.clone()).await.unwrap();
            manager.index_documents(&[document(1, "Frustrated Flamingos")]).await.unwrap();
        }

        let manager = IndexManager::new(config).await.unwrap();
        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 1);
        assert!(stats.index_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();

        manager.index_document(&document(7, "Pachinko Fever")).await.unwrap();
        manager.index_document(&document(7, "Pachinko Fever 2")).await.unwrap();
        manager.commit().await.unwrap();
        assert_eq!(manager.get_stats().await.unwrap().total_documents, 1);

        manager.delete_document(7).await.unwrap();
        manager.commit().await.unwrap();
        assert_eq!(manager.get_stats().await.unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_uncommitted_changes_are_invisible() {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();
        manager.index_document(&document(1, "Mood Lamp")).await.unwrap();

        let session = manager.open_session().await.unwrap();
        assert_eq!(session.searcher().num_docs(), 0);
    }

    #[tokio::test]
    async fn test_session_released_on_drop() {
        let config = SearchConfigBuilder::new().max_concurrent_sessions(1).build();
        let manager = IndexManager::new(config).await.unwrap();

        let session = manager.open_session().await.unwrap();
        assert_eq!(manager.get_stats().await.unwrap().available_sessions, 0);
        drop(session);
        assert_eq!(manager.get_stats().await.unwrap().available_sessions, 1);
    }

    #[tokio::test]
    async fn test_session_acquire_timeout() {
        let config = SearchConfigBuilder::new()
            .max_concurrent_sessions(1)
            .session_acquire_timeout(Duration::from_millis(20))
            .build();
        let manager = IndexManager::new(config).await.unwrap();

        let _held = manager.open_session().await.unwrap();
        let err = manager.open_session().await.err().unwrap();
        assert!(matches!(err, SearchError::SessionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_shutdown_refuses_sessions() {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();
        manager.shutdown();
        assert!(manager.is_shut_down());
        assert!(matches!(
            manager.open_session().await,
            Err(SearchError::SessionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = SearchConfigBuilder::new().page_size(0).build();
        assert!(matches!(
            IndexManager::new(config).await,
            Err(SearchError::InvalidConfiguration(_))
        ));
    }
}
