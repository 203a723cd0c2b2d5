//! App catalog search
//!
//! Free-text search over an app catalog with typo tolerance, quoted phrase
//! matching, device filtering, category and price-range facets, and
//! review-driven relevance boosting. Inactive apps are kept out of the index.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
