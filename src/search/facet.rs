//! Facet requests, results and selections
//!
//! Every search computes two facets: a discrete breakdown by category and a
//! ranged breakdown by price. Pass 1 of a search produces the buckets shown to
//! the user; a [`FacetSelection`] resolved against those buckets narrows Pass 2.

use crate::search::document::fields;
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::ops::Bound;
use tantivy::collector::{Collector, FacetCollector, FacetCounts, SegmentCollector};
use tantivy::columnar::Column;
use tantivy::query::{ConstScoreQuery, Query, RangeQuery, TermQuery};
use tantivy::schema::{Facet, IndexRecordOption, Schema};
use tantivy::{DocId, Score, SegmentOrdinal, SegmentReader, Term};

/// Result name of the category facet
pub const CATEGORY_FACET: &str = "categoryFacet";

/// Result name of the price-range facet
pub const PRICE_RANGE_FACET: &str = "priceRangeFacet";

/// One price band of the ranged facet
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBand {
    pub label: String,
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl PriceBand {
    pub fn new(label: impl Into<String>, lower: Bound<f64>, upper: Bound<f64>) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        let above_lower = match self.lower {
            Bound::Included(lower) => price >= lower,
            Bound::Excluded(lower) => price > lower,
            Bound::Unbounded => true,
        };
        let below_upper = match self.upper {
            Bound::Included(upper) => price <= upper,
            Bound::Excluded(upper) => price < upper,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }

    /// The three catalog price bands, in display order
    pub fn catalog_bands() -> Vec<PriceBand> {
        vec![
            PriceBand::new("below 1.0", Bound::Unbounded, Bound::Excluded(1.0)),
            PriceBand::new("1.0 to 5.0", Bound::Included(1.0), Bound::Included(5.0)),
            PriceBand::new("above 5.0", Bound::Excluded(5.0), Bound::Unbounded),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FacetKind {
    /// One bucket per distinct field value
    Discrete,
    /// Fixed numeric bands
    Ranged(Vec<PriceBand>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetOrder {
    /// Lexicographic by bucket label
    FieldValue,
    /// Order in which the bands were declared
    Declared,
}

/// A facet to compute for a search, shared by both passes
#[derive(Debug, Clone, PartialEq)]
pub struct FacetRequest {
    pub name: String,
    pub field: String,
    pub kind: FacetKind,
    pub order: FacetOrder,
    pub include_zero_counts: bool,
}

impl FacetRequest {
    pub fn category() -> Self {
        Self {
            name: CATEGORY_FACET.to_string(),
            field: fields::CATEGORY.to_string(),
            kind: FacetKind::Discrete,
            order: FacetOrder::FieldValue,
            include_zero_counts: false,
        }
    }

    pub fn price_range() -> Self {
        Self {
            name: PRICE_RANGE_FACET.to_string(),
            field: fields::PRICE.to_string(),
            kind: FacetKind::Ranged(PriceBand::catalog_bands()),
            order: FacetOrder::Declared,
            include_zero_counts: false,
        }
    }

    pub fn bands(&self) -> &[PriceBand] {
        match &self.kind {
            FacetKind::Ranged(bands) => bands,
            FacetKind::Discrete => &[],
        }
    }

    /// Tantivy collector for a discrete facet
    pub fn facet_collector(&self) -> FacetCollector {
        let mut collector = FacetCollector::for_field(&self.field);
        collector.add_facet(Facet::root());
        collector
    }

    /// Collector counting matches per declared band
    pub fn band_collector(&self) -> PriceBandCollector {
        PriceBandCollector::new(&self.field, self.bands().to_vec())
    }

    /// Turn discrete facet counts into ordered buckets
    pub fn discrete_result(&self, counts: &FacetCounts) -> FacetResult {
        let buckets = counts
            .get(Facet::root())
            .filter_map(|(facet, count)| {
                let label = facet.to_path().last().map(|label| label.to_string())?;
                Some(FacetBucket { label, count })
            })
            .collect();
        self.finish(buckets)
    }

    /// Turn per-band counts into ordered buckets
    pub fn ranged_result(&self, counts: &[u64]) -> FacetResult {
        let buckets = self
            .bands()
            .iter()
            .zip(counts)
            .map(|(band, &count)| FacetBucket {
                label: band.label.clone(),
                count,
            })
            .collect();
        self.finish(buckets)
    }

    fn finish(&self, mut buckets: Vec<FacetBucket>) -> FacetResult {
        if !self.include_zero_counts {
            buckets.retain(|bucket| bucket.count > 0);
        }
        if self.order == FacetOrder::FieldValue {
            buckets.sort_by(|a, b| a.label.cmp(&b.label));
        }
        FacetResult {
            name: self.name.clone(),
            buckets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub label: String,
    pub count: u64,
}

/// Ordered buckets for one facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub name: String,
    pub buckets: Vec<FacetBucket>,
}

impl FacetResult {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buckets: Vec::new(),
        }
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }

    /// Find a bucket by label, ignoring case
    pub fn find(&self, label: &str) -> Option<&FacetBucket> {
        let label = label.trim().to_lowercase();
        self.buckets
            .iter()
            .find(|bucket| bucket.label.to_lowercase() == label)
    }
}

/// Facet buckets selected for Pass 2
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSelection {
    pub category: Option<String>,
    pub price_band: Option<PriceBand>,
}

impl FacetSelection {
    /// Resolve requested labels against Pass 1 buckets.
    ///
    /// A label that matches no bucket selects nothing on its facet.
    pub fn resolve(
        category_label: Option<&str>,
        price_label: Option<&str>,
        categories: &FacetResult,
        prices: &FacetResult,
        price_request: &FacetRequest,
    ) -> Self {
        let category = category_label.and_then(|label| {
            let bucket = categories.find(label);
            if bucket.is_none() {
                tracing::debug!(label, "Category selection matches no bucket");
            }
            bucket.map(|bucket| bucket.label.clone())
        });

        let price_band = price_label.and_then(|label| {
            let band = prices.find(label).and_then(|bucket| {
                price_request
                    .bands()
                    .iter()
                    .find(|band| band.label == bucket.label)
                    .cloned()
            });
            if band.is_none() {
                tracing::debug!(label, "Price-range selection matches no bucket");
            }
            band
        });

        Self {
            category,
            price_band,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.price_band.is_none()
    }

    /// Non-scoring conditions restricting matches to the selected buckets
    pub fn to_queries(&self, schema: &Schema) -> SearchResult<Vec<Box<dyn Query>>> {
        let mut queries: Vec<Box<dyn Query>> = Vec::new();

        if let Some(category) = &self.category {
            let field = schema
                .get_field(fields::CATEGORY)
                .map_err(|e| SearchError::SchemaError(e.to_string()))?;
            let term = Term::from_facet(field, &Facet::from_path(vec![category.as_str()]));
            let query = TermQuery::new(term, IndexRecordOption::Basic);
            queries.push(Box::new(ConstScoreQuery::new(Box::new(query), 0.0)));
        }

        if let Some(band) = &self.price_band {
            let query = RangeQuery::new_f64_bounds(fields::PRICE.to_string(), band.lower, band.upper);
            queries.push(Box::new(ConstScoreQuery::new(Box::new(query), 0.0)));
        }

        Ok(queries)
    }
}

/// Counts matches per price band from the price fast field
pub struct PriceBandCollector {
    field: String,
    bands: Vec<PriceBand>,
}

impl PriceBandCollector {
    pub fn new(field: &str, bands: Vec<PriceBand>) -> Self {
        Self {
            field: field.to_string(),
            bands,
        }
    }
}

impl Collector for PriceBandCollector {
    type Fruit = Vec<u64>;
    type Child = PriceBandSegmentCollector;

    fn for_segment(
        &self,
        _segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<Self::Child> {
        let prices = segment.fast_fields().f64(&self.field)?;
        Ok(PriceBandSegmentCollector {
            prices,
            bands: self.bands.clone(),
            counts: vec![0; self.bands.len()],
        })
    }

    fn requires_scoring(&self) -> bool {
        false
    }

    fn merge_fruits(&self, segment_fruits: Vec<Vec<u64>>) -> tantivy::Result<Vec<u64>> {
        let mut totals = vec![0; self.bands.len()];
        for counts in segment_fruits {
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count;
            }
        }
        Ok(totals)
    }
}

pub struct PriceBandSegmentCollector {
    prices: Column<f64>,
    bands: Vec<PriceBand>,
    counts: Vec<u64>,
}

impl SegmentCollector for PriceBandSegmentCollector {
    type Fruit = Vec<u64>;

    fn collect(&mut self, doc: DocId, _score: Score) {
        let Some(price) = self.prices.first(doc) else {
            return;
        };
        for (band, count) in self.bands.iter().zip(self.counts.iter_mut()) {
            if band.contains(price) {
                *count += 1;
            }
        }
    }

    fn harvest(self) -> Vec<u64> {
        self.counts
    }
}
