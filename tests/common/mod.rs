//! Shared fixtures for the integration tests

#![allow(dead_code)]

use app_catalog_search::catalog::CatalogService;
use app_catalog_search::models::{App, Device};
use app_catalog_search::search::{SearchConfig, SearchService};
use app_catalog_search::state::InMemoryStore;
use std::sync::Arc;

/// Catalog service over an in-memory store, loaded with the demo apps
pub async fn demo_catalog_service() -> CatalogService {
    let search = SearchService::new(SearchConfig::default()).await.unwrap();
    let catalog = CatalogService::new(Arc::new(InMemoryStore::new()), Arc::new(search));
    catalog.load_demo_data().await.unwrap();
    catalog
}

/// Search service over the given apps, indexed directly
pub async fn service_with(config: SearchConfig, apps: &[App]) -> SearchService {
    let service = SearchService::new(config).await.unwrap();
    service.index_apps(apps).await.unwrap();
    service
}

pub fn app(id: u64, name: &str, description: &str, category: &str, price: f32, devices: &[&str]) -> App {
    let mut app = App::new(name, format!("{id}.jpg"), description, category, price)
        .with_devices(devices.iter().map(|name| Device::new(None, *name)).collect());
    app.id = id;
    app
}

/// Six puzzle apps; four of them support the xPhone
pub fn puzzle_corpus() -> Vec<App> {
    vec![
        app(1, "Block Drop", "A falling puzzle", "Games", 0.99, &["xPhone", "xTablet"]),
        app(2, "Word Grid", "A word puzzle", "Games", 1.99, &["xPhone"]),
        app(3, "Tile Slide", "A sliding puzzle", "Games", 0.99, &["Personal Computer"]),
        app(4, "Budget Maze", "A finance puzzle for accountants", "Business", 6.99, &["xPhone"]),
        app(5, "Invoice Match", "A matching puzzle with invoices", "Business", 3.99, &["Flame Book Reader"]),
        app(6, "Song Quiz", "A music puzzle", "Media", 2.49, &["xPhone", "Solar System Phone"]),
    ]
}
