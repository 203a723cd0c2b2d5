pub mod store;

pub use store::*;

use crate::error::Result;
use crate::models::App;
use async_trait::async_trait;

/// Trait for app storage operations
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Save a new app, assigning its ID; returns the stored app
    async fn insert_app(&self, app: App) -> Result<App>;

    /// Get an app by ID
    async fn get_app(&self, id: u64) -> Result<Option<App>>;

    /// Replace an existing app
    async fn update_app(&self, app: &App) -> Result<()>;

    /// Delete an app, returning it
    async fn delete_app(&self, id: u64) -> Result<App>;

    /// All apps, ordered by ID
    async fn list_apps(&self) -> Result<Vec<App>>;

    /// Count stored apps
    async fn count_apps(&self) -> Result<u64>;
}
