//! App catalog search powered by Tantivy
//!
//! This module turns free-text catalog searches into ranked, paginated,
//! facet-annotated results:
//!
//! - **Query Building**: quoted text becomes a phrase query, anything else a
//!   typo-tolerant fuzzy query over name, description, device names and reviews
//! - **Device Filtering**: cached, case-insensitive filters on supported devices
//! - **Faceting**: category and price-range breakdowns with two-pass selection
//! - **Dynamic Boosting**: five-star reviews raise an app's ranking
//! - **Conditional Indexing**: inactive apps are kept out of the index
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service                         │
//! ├─────────────────────────────────────────────────┤
//! │  - search()          - apply_lifecycle_event()  │
//! │  - rebuild_index()   - get_stats()              │
//! └─────────────────────────────────────────────────┘
//!          │                        │
//!          ▼                        ▼
//! ┌──────────────────┐   ┌──────────────────────────┐
//! │  Query Builder   │   │      Index Manager       │
//! │  Facet Requests  │   ├──────────────────────────┤
//! │  Time Bound      │   │  - Schema & Analyzers    │
//! └──────────────────┘   │  - Writer / Reader       │
//!                        │  - Search Sessions       │
//!                        │  - Device Filter Cache   │
//!                        └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use app_catalog_search::search::{SearchConfig, SearchRequest, SearchService, SortMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let search = SearchService::new(SearchConfig::default()).await?;
//!
//!     let request = SearchRequest::new("\"world tournament\"")
//!         .with_device("xPhone")
//!         .with_category("Games")
//!         .with_sort(SortMode::NameAsc);
//!
//!     let results = search.search(&request).await?;
//!     println!("Found {} apps", results.total_hits);
//!
//!     Ok(())
//! }
//! ```

mod boost;
mod collector;
mod config;
mod document;
mod error;
mod facet;
mod filter;
mod index;
mod policy;
mod query;
mod service;

pub use boost::{five_star_boost, review_boost, DEFAULT_BOOST, FIVE_STAR_BOOST};
pub use collector::{Bounded, TimeBoundCollector};
pub use config::{FieldProfile, IndexProfile, SearchConfig, SearchConfigBuilder};
pub use document::{build_app_schema, fields, register_analyzers, strip_markup, AppDocument, SearchDocument};
pub use error::{ErrorKind, SearchError, SearchResult};
pub use facet::{
    FacetBucket, FacetKind, FacetOrder, FacetRequest, FacetResult, FacetSelection, PriceBand,
    PriceBandCollector, CATEGORY_FACET, PRICE_RANGE_FACET,
};
pub use filter::{DeviceFilter, FilterCache, FilterCacheKey, FilterCacheStats};
pub use index::{IndexManager, IndexStats, SearchSession};
pub use policy::{decide, IndexingDecision, LifecycleEvent};
pub use query::{max_edits, QueryBuilder, QueryShape, SearchRequest, SortMode, StructuredQuery};
pub use service::{ResultEnvelope, SearchService};
