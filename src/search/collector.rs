//! Collector wrapper enforcing a wall-clock deadline
//!
//! Tantivy has no built-in query timeout. [`TimeBoundCollector`] wraps any
//! collector and stops feeding it documents once the deadline passes; whatever
//! the inner collector accumulated up to that point becomes the result, flagged
//! as timed out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tantivy::collector::{Collector, SegmentCollector};
use tantivy::{DocId, Score, SegmentOrdinal, SegmentReader};

/// Documents collected between two clock reads
const CHECK_INTERVAL: u64 = 64;

/// Collector output plus whether the deadline cut collection short
#[derive(Debug)]
pub struct Bounded<F> {
    pub fruit: F,
    pub timed_out: bool,
}

pub struct TimeBoundCollector<C> {
    inner: C,
    deadline: Instant,
    expired: Arc<AtomicBool>,
}

impl<C: Collector> TimeBoundCollector<C> {
    pub fn new(inner: C, deadline: Instant) -> Self {
        Self {
            inner,
            deadline,
            expired: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<C: Collector> Collector for TimeBoundCollector<C> {
    type Fruit = Bounded<C::Fruit>;
    type Child = TimeBoundSegmentCollector<C::Child>;

    fn for_segment(
        &self,
        segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<Self::Child> {
        Ok(TimeBoundSegmentCollector {
            inner: self.inner.for_segment(segment_local_id, segment)?,
            deadline: self.deadline,
            expired: self.expired.clone(),
            collected: 0,
        })
    }

    fn requires_scoring(&self) -> bool {
        self.inner.requires_scoring()
    }

    fn merge_fruits(
        &self,
        segment_fruits: Vec<<C::Child as SegmentCollector>::Fruit>,
    ) -> tantivy::Result<Self::Fruit> {
        Ok(Bounded {
            fruit: self.inner.merge_fruits(segment_fruits)?,
            timed_out: self.expired.load(Ordering::Relaxed),
        })
    }
}

pub struct TimeBoundSegmentCollector<S> {
    inner: S,
    deadline: Instant,
    expired: Arc<AtomicBool>,
    collected: u64,
}

impl<S: SegmentCollector> SegmentCollector for TimeBoundSegmentCollector<S> {
    type Fruit = S::Fruit;

    fn collect(&mut self, doc: DocId, score: Score) {
        if self.expired.load(Ordering::Relaxed) {
            return;
        }
        if self.collected % CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.expired.store(true, Ordering::Relaxed);
            return;
        }
        self.collected += 1;
        self.inner.collect(doc, score);
    }

    fn harvest(self) -> Self::Fruit {
        self.inner.harvest()
    }
}
