//! Main search service implementation

use crate::models::{App, AppSummary};
use crate::search::collector::{Bounded, TimeBoundCollector};
use crate::search::config::SearchConfig;
use crate::search::document::{fields, AppDocument};
use crate::search::error::{SearchError, SearchResult};
use crate::search::facet::{FacetRequest, FacetResult, FacetSelection};
use crate::search::index::{IndexManager, IndexStats};
use crate::search::policy::{decide, IndexingDecision, LifecycleEvent};
use crate::search::query::{QueryBuilder, SearchRequest, SortMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tantivy::collector::{Count, DocSetCollector, FacetCounts, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query};
use tantivy::schema::{Schema, Value};
use tantivy::{DocAddress, DocId, Score, Searcher, SegmentReader, TantivyDocument};

/// Search response with a page of results and facet breakdowns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Lightweight projections of the requested page
    pub records: Vec<AppSummary>,

    /// Number of matches (before pagination), after device filter and facet selection
    pub total_hits: usize,

    /// Category buckets from the unnarrowed pass
    pub category_facets: FacetResult,

    /// Price-range buckets from the unnarrowed pass
    pub price_range_facets: FacetResult,

    /// The request this envelope answers
    pub request: SearchRequest,

    /// Collection stopped at the execution deadline; results are partial
    pub timed_out: bool,

    /// Search execution time in milliseconds
    pub search_time_ms: u64,
}

/// What one execution of the query produced
struct PassOutcome {
    records: Vec<AppSummary>,
    total_hits: usize,
    category_counts: FacetCounts,
    price_counts: Vec<u64>,
    timed_out: bool,
}

/// Main search service
pub struct SearchService {
    /// Index manager
    index_manager: Arc<IndexManager>,

    query_builder: QueryBuilder,

    category_facet: FacetRequest,

    price_facet: FacetRequest,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    /// Create a new search service
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        let index_manager = Arc::new(IndexManager::new(config.clone()).await?);
        Ok(Self::with_index_manager(index_manager))
    }

    /// Create a search service over an existing index
    pub fn with_index_manager(index_manager: Arc<IndexManager>) -> Self {
        let config = index_manager.config().clone();
        let query_builder = QueryBuilder::new(
            index_manager.index().clone(),
            config.profile.clone(),
            config.fuzzy_threshold,
            config.max_query_length,
        );

        Self {
            index_manager,
            query_builder,
            category_facet: FacetRequest::category(),
            price_facet: FacetRequest::price_range(),
            config,
        }
    }

    pub fn index_manager(&self) -> &Arc<IndexManager> {
        &self.index_manager
    }

    /// Search for apps.
    ///
    /// Pass 1 runs the query with both facets and nothing narrowing it; its
    /// buckets are the ones returned. Pass 2 re-runs the same query narrowed by
    /// the device filter and the selected buckets, and supplies the records and
    /// total.
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<ResultEnvelope> {
        let start_time = Instant::now();
        let deadline = start_time + self.config.execution_timeout();

        tracing::info!(
            query = %request.raw_query,
            device = ?request.selected_device(),
            category = ?request.selected_category(),
            price_range = ?request.selected_price_range(),
            sort = request.sort.as_str(),
            offset = request.page_offset,
            "Search request received"
        );

        let structured = self.query_builder.build(&request.raw_query)?;

        // Empty and "all" device names mean no filter, never an empty filter
        let device_filter = match request.selected_device() {
            Some(device) => Some(self.index_manager.filters().get_or_build(device).await),
            None => None,
        };

        // With nothing to narrow, Pass 2 would repeat Pass 1
        let reuse_pass1 = self.config.skip_redundant_pass
            && device_filter.is_none()
            && !request.has_facet_selection();

        let session = self.index_manager.open_session().await?;
        let searcher = session.searcher();

        // Pass 1 sees every match, so its buckets describe the unnarrowed distribution
        let pass1 = self.execute(searcher, structured.query(), request, deadline, reuse_pass1)?;

        let category_facets = self.category_facet.discrete_result(&pass1.category_counts);
        let price_range_facets = self.price_facet.ranged_result(&pass1.price_counts);

        let selection = FacetSelection::resolve(
            request.selected_category(),
            request.selected_price_range(),
            &category_facets,
            &price_range_facets,
            &self.price_facet,
        );

        let pass1_timed_out = pass1.timed_out;
        let outcome = if reuse_pass1 {
            tracing::debug!("Nothing to narrow, reusing first pass");
            pass1
        } else {
            let mut conditions: Vec<Box<dyn Query>> =
                device_filter.iter().map(|filter| filter.query()).collect();
            conditions.extend(selection.to_queries(self.index_manager.schema())?);
            let pass2_query = compose(structured.to_query(), conditions);
            self.execute(searcher, pass2_query.as_ref(), request, deadline, true)?
        };

        drop(session);

        let timed_out = pass1_timed_out || outcome.timed_out;
        let search_time_ms = start_time.elapsed().as_millis() as u64;

        if timed_out {
            tracing::warn!(
                query = %request.raw_query,
                budget_ms = self.config.execution_timeout_ms,
                "Search hit the execution deadline, returning partial results"
            );
        }

        tracing::info!(
            total_hits = outcome.total_hits,
            records = outcome.records.len(),
            phrase = structured.shape().is_phrase(),
            search_time_ms,
            "Search completed"
        );

        Ok(ResultEnvelope {
            records: outcome.records,
            total_hits: outcome.total_hits,
            category_facets,
            price_range_facets,
            request: request.clone(),
            timed_out,
            search_time_ms,
        })
    }

    /// Run one pass: the requested page, the match count and both facets.
    ///
    /// Page records are only loaded from the doc store when `project` is set.
    fn execute(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        request: &SearchRequest,
        deadline: Instant,
        project: bool,
    ) -> SearchResult<PassOutcome> {
        let page_size = self.config.page_size;
        let offset = request.page_offset;
        let num_docs = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);

        let (page, total_hits, category_counts, price_counts, timed_out) = match request.sort {
            // No match can sit at or past the document count
            SortMode::Relevance if offset >= num_docs => {
                let collector = TimeBoundCollector::new(
                    (
                        Count,
                        self.category_facet.facet_collector(),
                        self.price_facet.band_collector(),
                    ),
                    deadline,
                );
                let Bounded {
                    fruit: (total, categories, prices),
                    timed_out,
                } = searcher.search(query, &collector)?;

                (Vec::new(), total, categories, prices, timed_out)
            }
            SortMode::Relevance => {
                let top_docs = TopDocs::with_limit(page_size.min(num_docs - offset))
                    .and_offset(offset)
                    .tweak_score(move |segment_reader: &SegmentReader| {
                        let boosts = segment_reader.fast_fields().f64(fields::REVIEW_BOOST).ok();
                        move |doc: DocId, score: Score| {
                            let boost = boosts.as_ref().and_then(|column| column.first(doc)).unwrap_or(1.0);
                            score * boost as f32
                        }
                    });

                let collector = TimeBoundCollector::new(
                    (
                        top_docs,
                        Count,
                        self.category_facet.facet_collector(),
                        self.price_facet.band_collector(),
                    ),
                    deadline,
                );
                let Bounded {
                    fruit: (hits, total, categories, prices),
                    timed_out,
                } = searcher.search(query, &collector)?;

                let page: Vec<DocAddress> = hits.into_iter().map(|(_, address)| address).collect();
                (page, total, categories, prices, timed_out)
            }
            SortMode::NameAsc | SortMode::NameDesc => {
                let collector = TimeBoundCollector::new(
                    (
                        DocSetCollector,
                        Count,
                        self.category_facet.facet_collector(),
                        self.price_facet.band_collector(),
                    ),
                    deadline,
                );
                let Bounded {
                    fruit: (matches, total, categories, prices),
                    timed_out,
                } = searcher.search(query, &collector)?;

                if project {
                    let (sorted, sort_timed_out) =
                        self.sort_by_name(searcher, matches, request.sort, deadline)?;
                    let page: Vec<DocAddress> =
                        sorted.into_iter().skip(offset).take(page_size).collect();
                    (page, total, categories, prices, timed_out || sort_timed_out)
                } else {
                    (Vec::new(), total, categories, prices, timed_out)
                }
            }
        };

        let records = if project {
            page.into_iter()
                .map(|address| self.project(searcher, address))
                .collect::<SearchResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(PassOutcome {
            records,
            total_hits,
            category_counts,
            price_counts,
            timed_out,
        })
    }

    /// Order matches on the un-analyzed name, ties by document address.
    ///
    /// Names are loaded until the deadline passes; the matches loaded by then
    /// are sorted and the flag reports the cut.
    fn sort_by_name(
        &self,
        searcher: &Searcher,
        matches: impl IntoIterator<Item = DocAddress>,
        sort: SortMode,
        deadline: Instant,
    ) -> SearchResult<(Vec<DocAddress>, bool)> {
        let schema = self.index_manager.schema();
        let mut named = Vec::new();
        let mut timed_out = false;
        for address in matches {
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }
            let doc = load_doc(searcher, address)?;
            let name = stored_text(&doc, schema, fields::SORTING_NAME).unwrap_or_default();
            named.push((name, address));
        }

        if sort == SortMode::NameDesc {
            named.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        } else {
            named.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        }

        Ok((named.into_iter().map(|(_, address)| address).collect(), timed_out))
    }

    /// Convert a stored document to its summary projection
    fn project(&self, searcher: &Searcher, address: DocAddress) -> SearchResult<AppSummary> {
        let schema = self.index_manager.schema();
        let doc = load_doc(searcher, address)?;

        let id = schema
            .get_field(fields::ID)
            .ok()
            .and_then(|field| doc.get_first(field))
            .and_then(|value| value.as_u64())
            .ok_or_else(|| SearchError::SearchFailed("Indexed document has no id".to_string()))?;

        Ok(AppSummary {
            id,
            name: stored_text(&doc, schema, fields::NAME).unwrap_or_default(),
            description: stored_text(&doc, schema, fields::DISPLAY_DESCRIPTION).unwrap_or_default(),
            image: stored_text(&doc, schema, fields::IMAGE).unwrap_or_default(),
        })
    }

    /// Bring the index in line with a change to one app.
    ///
    /// The conditional indexing policy decides the action; the change is
    /// committed before returning, unless the decision is to skip.
    pub async fn apply_lifecycle_event(
        &self,
        event: LifecycleEvent,
        app: &App,
    ) -> SearchResult<IndexingDecision> {
        let decision = decide(event, app.active);
        tracing::info!(app_id = app.id, %event, %decision, active = app.active, "Indexing decision");

        match (event, decision) {
            (_, IndexingDecision::Skip) => return Ok(decision),
            (LifecycleEvent::Delete, _) | (_, IndexingDecision::Remove) => {
                self.index_manager.delete_document(app.id).await?
            }
            (_, IndexingDecision::Apply) | (_, IndexingDecision::Update) => {
                self.index_manager.index_document(&AppDocument::from(app)).await?
            }
        }

        self.index_manager.commit().await?;
        Ok(decision)
    }

    /// Index apps directly, without consulting the indexing policy
    pub async fn index_apps(&self, apps: &[App]) -> SearchResult<usize> {
        let documents: Vec<_> = apps.iter().map(AppDocument::from).collect();
        self.index_manager.index_documents(&documents).await
    }

    /// Rebuild the entire index from apps.
    ///
    /// Every app given is indexed, active or not.
    pub async fn rebuild_index(&self, apps: &[App]) -> SearchResult<usize> {
        let inactive = apps.iter().filter(|app| !app.active).count();
        if inactive > 0 {
            tracing::warn!(inactive, "Bulk reindex includes inactive apps");
        }

        self.clear_index().await?;
        self.index_apps(apps).await
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        self.index_manager.get_stats().await
    }

    /// Commit pending changes
    pub async fn commit(&self) -> SearchResult<()> {
        self.index_manager.commit().await
    }

    /// Clear the entire index
    pub async fn clear_index(&self) -> SearchResult<()> {
        self.index_manager.clear_index().await
    }

    /// Stop accepting searches
    pub fn shutdown(&self) {
        self.index_manager.shutdown();
    }
}

/// Require every condition alongside the base query, keeping the base score
fn compose(base: Box<dyn Query>, conditions: Vec<Box<dyn Query>>) -> Box<dyn Query> {
    if conditions.is_empty() {
        return base;
    }
    let mut clauses = vec![(Occur::Must, base)];
    clauses.extend(conditions.into_iter().map(|condition| (Occur::Must, condition)));
    Box::new(BooleanQuery::new(clauses))
}

fn load_doc(searcher: &Searcher, address: DocAddress) -> SearchResult<TantivyDocument> {
    Ok(searcher.doc(address)?)
}

/// Get text field value from document
fn stored_text(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<String> {
    schema.get_field(field_name).ok().and_then(|field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerReview, Device};
    use crate::search::config::SearchConfigBuilder;

    async fn create_test_service() -> SearchService {
        SearchService::new(SearchConfig::default()).await.unwrap()
    }

    fn create_test_app(id: u64, name: &str, category: &str, price: f32) -> App {
        let mut app = App::new(name, format!("{id}.jpg"), format!("{name} description"), category, price)
            .with_devices(vec![Device::new(Some("Orange"), "xPhone")]);
        app.id = id;
        app
    }

    #[tokio::test]
    async fn test_service_creation() {
        let service = create_test_service().await;
        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
    }

    #[tokio::test]
    async fn test_index_and_search() {
        let service = create_test_service().await;
        let app = create_test_app(1, "Frustrated Flamingos", "Games", 0.99);
        service.apply_lifecycle_event(LifecycleEvent::Add, &app).await.unwrap();

        let results = service.search(&SearchRequest::new("flamingos")).await.unwrap();

        assert_eq!(results.total_hits, 1);
        assert_eq!(results.records[0].id, 1);
        assert_eq!(results.records[0].name, "Frustrated Flamingos");
        assert_eq!(results.records[0].image, "1.jpg");
        assert!(!results.timed_out);
    }

    #[tokio::test]
    async fn test_fuzzy_search_tolerates_typo() {
        let service = create_test_service().await;
        service
            .index_apps(&[create_test_app(1, "Frustrated Flamingos", "Games", 0.99)])
            .await
            .unwrap();

        let results = service.search(&SearchRequest::new("flamingso")).await.unwrap();
        assert_eq!(results.total_hits, 1);
    }

    #[tokio::test]
    async fn test_description_projection_keeps_markup() {
        let service = create_test_service().await;
        let mut app = App::new("Mood Lamp", "lamp.jpg", "A <b>bright</b> idea", "Lifestyle", 0.0);
        app.id = 3;
        service.index_apps(&[app]).await.unwrap();

        let results = service.search(&SearchRequest::new("bright")).await.unwrap();
        assert_eq!(results.records[0].description, "A <b>bright</b> idea");
    }

    #[tokio::test]
    async fn test_inactive_app_is_skipped_then_removed() {
        let service = create_test_service().await;
        let app = create_test_app(5, "Crystal Game", "Games", 0.99);

        let decision = service
            .apply_lifecycle_event(LifecycleEvent::Add, &app.clone().with_active(false))
            .await
            .unwrap();
        assert_eq!(decision, IndexingDecision::Skip);
        assert_eq!(service.get_stats().await.unwrap().total_documents, 0);

        service.apply_lifecycle_event(LifecycleEvent::Add, &app).await.unwrap();
        assert_eq!(service.get_stats().await.unwrap().total_documents, 1);

        let decision = service
            .apply_lifecycle_event(LifecycleEvent::Update, &app.with_active(false))
            .await
            .unwrap();
        assert_eq!(decision, IndexingDecision::Remove);
        assert_eq!(service.get_stats().await.unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_five_star_reviews_raise_ranking() {
        let service = create_test_service().await;
        let plain = create_test_app(1, "Space Chess", "Games", 0.99);
        let loved = create_test_app(2, "Space Chess", "Games", 0.99)
            .with_reviews(vec![CustomerReview::new("fan", 5, "great")]);
        service.index_apps(&[plain, loved]).await.unwrap();

        let results = service.search(&SearchRequest::new("chess")).await.unwrap();
        assert_eq!(results.records[0].id, 2);
        assert_eq!(results.records[1].id, 1);
    }

    #[tokio::test]
    async fn test_rebuild_index_bypasses_policy() {
        let service = create_test_service().await;
        let inactive = create_test_app(9, "Hidden Gem", "Games", 0.99).with_active(false);

        service.rebuild_index(&[inactive]).await.unwrap();
        assert_eq!(service.get_stats().await.unwrap().total_documents, 1);
    }

    #[tokio::test]
    async fn test_name_sort_stops_at_deadline() {
        let service = create_test_service().await;
        let apps: Vec<_> = ["Gamma", "Alpha", "Beta"]
            .iter()
            .zip(1..)
            .map(|(name, id)| create_test_app(id, name, "Games", 0.99))
            .collect();
        service.index_apps(&apps).await.unwrap();

        let session = service.index_manager().open_session().await.unwrap();
        let searcher = session.searcher();
        let matches = searcher
            .search(&tantivy::query::AllQuery, &DocSetCollector)
            .unwrap();

        let later = Instant::now() + std::time::Duration::from_secs(60);
        let (sorted, timed_out) = service
            .sort_by_name(searcher, matches.clone(), SortMode::NameAsc, later)
            .unwrap();
        assert_eq!(sorted.len(), 3);
        assert!(!timed_out);
        let names: Vec<_> = sorted
            .into_iter()
            .map(|address| service.project(searcher, address).unwrap().name)
            .collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);

        let (sorted, timed_out) = service
            .sort_by_name(searcher, matches, SortMode::NameAsc, Instant::now())
            .unwrap();
        assert!(sorted.is_empty());
        assert!(timed_out);
    }

    #[tokio::test]
    async fn test_offset_past_index_size_skips_top_docs() {
        let service = create_test_service().await;
        service
            .index_apps(&[create_test_app(1, "Frustrated Flamingos", "Games", 0.99)])
            .await
            .unwrap();

        let results = service
            .search(&SearchRequest::new("flamingos").with_offset(usize::MAX))
            .await
            .unwrap();
        assert!(results.records.is_empty());
        assert_eq!(results.total_hits, 1);
        assert_eq!(results.category_facets.total(), 1);
    }

    #[tokio::test]
    async fn test_page_size_is_respected() {
        let config = SearchConfigBuilder::new().page_size(2).build();
        let service = SearchService::new(config).await.unwrap();
        let apps: Vec<_> = (1..=3)
            .map(|id| create_test_app(id, &format!("Puzzle {id}"), "Games", 0.99))
            .collect();
        service.index_apps(&apps).await.unwrap();

        let results = service.search(&SearchRequest::new("puzzle")).await.unwrap();
        assert_eq!(results.total_hits, 3);
        assert_eq!(results.records.len(), 2);
    }
}
