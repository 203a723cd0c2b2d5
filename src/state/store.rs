use crate::error::{AppError, Result};
use crate::models::App;
use crate::state::AppStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory app store
#[derive(Clone)]
pub struct InMemoryStore {
    apps: Arc<DashMap<u64, App>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            apps: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppStore for InMemoryStore {
    async fn insert_app(&self, mut app: App) -> Result<App> {
        app.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.apps.insert(app.id, app.clone());

        tracing::debug!(app_id = app.id, name = %app.name, "App saved");
        Ok(app)
    }

    async fn get_app(&self, id: u64) -> Result<Option<App>> {
        Ok(self.apps.get(&id).map(|entry| entry.clone()))
    }

    async fn update_app(&self, app: &App) -> Result<()> {
        match self.apps.get_mut(&app.id) {
            Some(mut entry) => {
                *entry = app.clone();
                tracing::debug!(app_id = app.id, "App updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("App {} not found", app.id))),
        }
    }

    async fn delete_app(&self, id: u64) -> Result<App> {
        match self.apps.remove(&id) {
            Some((_, app)) => {
                tracing::debug!(app_id = id, "App deleted");
                Ok(app)
            }
            None => Err(AppError::NotFound(format!("App {} not found", id))),
        }
    }

    async fn list_apps(&self) -> Result<Vec<App>> {
        let mut apps: Vec<App> = self.apps.iter().map(|entry| entry.value().clone()).collect();
        apps.sort_by_key(|app| app.id);
        Ok(apps)
    }

    async fn count_apps(&self) -> Result<u64> {
        Ok(self.apps.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app(name: &str) -> App {
        App::new(name, "image.jpg", "Description", "Games", 0.99)
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = InMemoryStore::new();

        let first = store.insert_app(test_app("Pachinko Fever")).await.unwrap();
        let second = store.insert_app(test_app("Mood Lamp")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.count_apps().await.unwrap(), 2);

        let retrieved = store.get_app(first.id).await.unwrap();
        assert_eq!(retrieved.unwrap().name, "Pachinko Fever");
    }

    #[tokio::test]
    async fn test_update_app() {
        let store = InMemoryStore::new();
        let mut app = store.insert_app(test_app("Mood Lamp")).await.unwrap();

        app.price = 1.99;
        store.update_app(&app).await.unwrap();

        let retrieved = store.get_app(app.id).await.unwrap().unwrap();
        assert!((retrieved.price - 1.99).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_update_missing_app_fails() {
        let store = InMemoryStore::new();
        let mut app = test_app("Ghost");
        app.id = 42;

        assert!(matches!(
            store.update_app(&app).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_app() {
        let store = InMemoryStore::new();
        let app = store.insert_app(test_app("Mood Lamp")).await.unwrap();

        let deleted = store.delete_app(app.id).await.unwrap();
        assert_eq!(deleted.id, app.id);
        assert!(store.get_app(app.id).await.unwrap().is_none());
        assert!(store.delete_app(app.id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = InMemoryStore::new();
        for name in ["C", "A", "B"] {
            store.insert_app(test_app(name)).await.unwrap();
        }

        let ids: Vec<u64> = store.list_apps().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
