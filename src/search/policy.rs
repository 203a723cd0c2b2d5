//! Conditional indexing
//!
//! Decides what the index should do when an app goes through a lifecycle
//! event, so that inactive apps never stay searchable. The write path in
//! [`crate::catalog`] consults [`decide`] for every add, update, collection
//! update and delete, then carries out the returned decision.
//!
//! Bulk reindexing (`CatalogService::reindex_all`) does not go through this
//! policy and will index inactive apps. That is a known limitation of the
//! bulk path, not something `decide` can prevent.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A change to an app as seen by the write path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum LifecycleEvent {
    Add,
    Update,
    /// Membership change in an embedded collection (devices, reviews)
    CollectionUpdate,
    Delete,
}

/// What the index should do in response to a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum IndexingDecision {
    /// Default behavior for the event (add on Add, remove on Delete)
    Apply,
    /// Leave the index untouched
    Skip,
    /// Replace the indexed document
    Update,
    /// Remove the document if present
    Remove,
}

pub fn decide(event: LifecycleEvent, active: bool) -> IndexingDecision {
    match event {
        LifecycleEvent::Add if active => IndexingDecision::Apply,
        LifecycleEvent::Add => IndexingDecision::Skip,
        LifecycleEvent::Update if active => IndexingDecision::Update,
        LifecycleEvent::Update => IndexingDecision::Remove,
        LifecycleEvent::CollectionUpdate => decide(LifecycleEvent::Update, active),
        LifecycleEvent::Delete => IndexingDecision::Apply,
    }
}
