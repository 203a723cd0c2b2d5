use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A software application listed in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct App {
    /// Unique identifier (assigned by the store on first save)
    pub id: u64,

    /// Human-readable name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Image filename, expected under `images/apps/`
    pub image: String,

    /// Full-length description, may contain markup
    #[validate(length(max = 1000))]
    pub description: String,

    /// Catalog category (e.g. "Business", "Games")
    #[validate(length(min = 1, max = 64))]
    pub category: String,

    /// Retail price
    #[validate(range(min = 0.0))]
    pub price: f32,

    /// Whether the app is live and searchable
    pub active: bool,

    /// Release date, indexed at day resolution
    pub release_date: DateTime<Utc>,

    /// Devices the app runs on
    pub supported_devices: Vec<Device>,

    /// Embedded customer reviews
    #[validate(nested)]
    pub customer_reviews: Vec<CustomerReview>,
}

impl App {
    /// Create a new, active app with no devices or reviews
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: f32,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            image: image.into(),
            description: description.into(),
            category: category.into(),
            price,
            active: true,
            release_date: Utc::now(),
            supported_devices: Vec::new(),
            customer_reviews: Vec::new(),
        }
    }

    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.supported_devices = devices;
        self
    }

    pub fn with_reviews(mut self, reviews: Vec<CustomerReview>) -> Self {
        self.customer_reviews = reviews;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Does this app run on a device with the given name (case-insensitive)?
    pub fn supports_device(&self, device_name: &str) -> bool {
        self.supported_devices
            .iter()
            .any(|device| device.name.eq_ignore_ascii_case(device_name.trim()))
    }

    /// Lightweight projection used in search results
    pub fn summary(&self) -> AppSummary {
        AppSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
        }
    }
}

/// A hardware device an app can run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub manufacturer: Option<String>,
    pub name: String,
}

impl Device {
    pub fn new(manufacturer: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.map(str::to_string),
            name: name.into(),
        }
    }
}

/// A review embedded in an app; its lifecycle follows the owning app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CustomerReview {
    pub username: String,

    /// Rating out of five
    #[validate(range(min = 1, max = 5))]
    pub stars: u8,

    /// Free-form comments, may contain markup
    pub comments: String,
}

impl CustomerReview {
    pub fn new(username: impl Into<String>, stars: u8, comments: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            stars,
            comments: comments.into(),
        }
    }
}

/// Projection of an app built from stored index fields, without a store hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSummary {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image: String,
}
