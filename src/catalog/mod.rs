//! Catalog write path and full-detail reads
//!
//! Every change to an app goes to the store first, then through the
//! conditional indexing policy to the search index.

mod seed;

pub use seed::{demo_catalog, demo_devices};

use crate::error::{AppError, Result};
use crate::models::{App, CustomerReview, Device};
use crate::search::{IndexingDecision, LifecycleEvent, ResultEnvelope, SearchRequest, SearchService};
use crate::state::AppStore;
use std::sync::Arc;
use validator::Validate;

/// Coordinates the app store and the search index
pub struct CatalogService {
    store: Arc<dyn AppStore>,
    search: Arc<SearchService>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn AppStore>, search: Arc<SearchService>) -> Self {
        Self { store, search }
    }

    pub fn search_service(&self) -> &Arc<SearchService> {
        &self.search
    }

    /// Save a new app and index it if active
    pub async fn add_app(&self, app: App) -> Result<App> {
        app.validate()?;
        let app = self.store.insert_app(app).await?;
        self.search
            .apply_lifecycle_event(LifecycleEvent::Add, &app)
            .await?;
        Ok(app)
    }

    pub async fn update_app(&self, app: &App) -> Result<IndexingDecision> {
        app.validate()?;
        self.store.update_app(app).await?;
        Ok(self
            .search
            .apply_lifecycle_event(LifecycleEvent::Update, app)
            .await?)
    }

    /// Activate or deactivate an app
    pub async fn set_active(&self, id: u64, active: bool) -> Result<IndexingDecision> {
        let mut app = self.app_details(id).await?;
        app.active = active;
        self.update_app(&app).await
    }

    /// Replace the devices an app supports
    pub async fn replace_devices(&self, id: u64, devices: Vec<Device>) -> Result<IndexingDecision> {
        let mut app = self.app_details(id).await?;
        app.supported_devices = devices;
        self.collection_update(&app).await
    }

    /// Replace an app's customer reviews
    pub async fn replace_reviews(
        &self,
        id: u64,
        reviews: Vec<CustomerReview>,
    ) -> Result<IndexingDecision> {
        let mut app = self.app_details(id).await?;
        app.customer_reviews = reviews;
        app.validate()?;
        self.collection_update(&app).await
    }

    async fn collection_update(&self, app: &App) -> Result<IndexingDecision> {
        self.store.update_app(app).await?;
        Ok(self
            .search
            .apply_lifecycle_event(LifecycleEvent::CollectionUpdate, app)
            .await?)
    }

    /// Delete an app from the store and the index
    pub async fn delete_app(&self, id: u64) -> Result<App> {
        let app = self.store.delete_app(id).await?;
        self.search
            .apply_lifecycle_event(LifecycleEvent::Delete, &app)
            .await?;
        Ok(app)
    }

    /// The complete app, with devices and reviews, straight from the store
    pub async fn app_details(&self, id: u64) -> Result<App> {
        self.store
            .get_app(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("App {} not found", id)))
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<ResultEnvelope> {
        Ok(self.search.search(request).await?)
    }

    /// Rebuild the index from every stored app.
    ///
    /// This bypasses the indexing policy, so inactive apps get indexed too.
    pub async fn reindex_all(&self) -> Result<usize> {
        let apps = self.store.list_apps().await?;
        Ok(self.search.rebuild_index(&apps).await?)
    }

    /// Save the demo catalog through the normal write path
    pub async fn load_demo_data(&self) -> Result<usize> {
        let mut loaded = 0;
        for app in demo_catalog() {
            let app = self.add_app(app).await?;
            tracing::info!(app_id = app.id, name = %app.name, active = app.active, "Loaded demo app");
            loaded += 1;
        }
        Ok(loaded)
    }
}
