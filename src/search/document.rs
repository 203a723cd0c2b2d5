//! Search document structures, schema and analyzers

use crate::models::App;
use crate::search::boost::review_boost;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tantivy::schema::*;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer, WhitespaceTokenizer,
};
use tantivy::{Index, TantivyDocument};

/// Index field names
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    /// Un-analyzed copy of the name, used for sorting
    pub const SORTING_NAME: &str = "sorting_name";
    pub const DESCRIPTION: &str = "description";
    /// Original description text, stored for projections
    pub const DISPLAY_DESCRIPTION: &str = "display_description";
    pub const IMAGE: &str = "image";
    pub const CATEGORY: &str = "category";
    pub const PRICE: &str = "price";
    pub const DEVICE_NAMES: &str = "device_names";
    pub const REVIEW_COMMENTS: &str = "review_comments";
    pub const REVIEW_BOOST: &str = "review_boost";
    pub const RELEASE_DATE: &str = "release_date";
}

/// Analyzer for descriptions: lower-cased, stop words removed, stemmed
pub const DESCRIPTION_ANALYZER: &str = "app_description";

/// Analyzer for review comments: lower-cased, stop words removed
pub const REVIEW_ANALYZER: &str = "review_comments";

/// Analyzer for device names: whitespace split, lower-cased
pub const DEVICE_NAME_ANALYZER: &str = "device_name";

const SECONDS_PER_DAY: i64 = 86_400;

/// English stop words dropped from descriptions and review comments
pub const ENGLISH_STOP_WORDS: [&str; 33] = [
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these", "they",
    "this", "to", "was", "will", "with",
];

fn stop_words() -> StopWordFilter {
    StopWordFilter::remove(ENGLISH_STOP_WORDS.iter().map(|word| word.to_string()))
}

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup pattern"));

/// Remove HTML tags, keeping the text between them
pub fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, " ").into_owned()
}

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument;

    /// Get document ID
    fn document_id(&self) -> u64;
}

/// App document for search indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDocument {
    pub id: u64,
    pub name: String,
    /// Description with markup removed
    pub description: String,
    /// Original description, returned in projections
    pub raw_description: String,
    pub image: String,
    pub category: String,
    pub price: f64,
    pub device_names: Vec<String>,
    /// Review comments with markup removed
    pub review_comments: Vec<String>,
    /// Product of the per-review dynamic boosts
    pub review_boost: f64,
    pub release_date: DateTime<Utc>,
}

impl From<&App> for AppDocument {
    fn from(app: &App) -> Self {
        Self {
            id: app.id,
            name: app.name.clone(),
            description: strip_markup(&app.description),
            raw_description: app.description.clone(),
            image: app.image.clone(),
            category: app.category.clone(),
            price: f64::from(app.price),
            device_names: app
                .supported_devices
                .iter()
                .map(|device| device.name.clone())
                .collect(),
            review_comments: app
                .customer_reviews
                .iter()
                .map(|review| strip_markup(&review.comments))
                .collect(),
            review_boost: f64::from(review_boost(&app.customer_reviews)),
            release_date: app.release_date,
        }
    }
}

impl From<App> for AppDocument {
    fn from(app: App) -> Self {
        Self::from(&app)
    }
}

impl SearchDocument for AppDocument {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        if let Ok(field) = schema.get_field(fields::ID) {
            doc.add_u64(field, self.id);
        }

        // Name is indexed twice: analyzed for matching, raw for sorting
        if let Ok(field) = schema.get_field(fields::NAME) {
            doc.add_text(field, &self.name);
        }
        if let Ok(field) = schema.get_field(fields::SORTING_NAME) {
            doc.add_text(field, &self.name);
        }

        if let Ok(field) = schema.get_field(fields::DESCRIPTION) {
            doc.add_text(field, &self.description);
        }
        if let Ok(field) = schema.get_field(fields::DISPLAY_DESCRIPTION) {
            doc.add_text(field, &self.raw_description);
        }

        if let Ok(field) = schema.get_field(fields::IMAGE) {
            doc.add_text(field, &self.image);
        }

        if let Ok(field) = schema.get_field(fields::CATEGORY) {
            doc.add_facet(field, Facet::from_path(vec![self.category.as_str()]));
        }

        if let Ok(field) = schema.get_field(fields::PRICE) {
            doc.add_f64(field, self.price);
        }

        // Multi-valued
        if let Ok(field) = schema.get_field(fields::DEVICE_NAMES) {
            for name in &self.device_names {
                doc.add_text(field, name);
            }
        }
        if let Ok(field) = schema.get_field(fields::REVIEW_COMMENTS) {
            for comments in &self.review_comments {
                doc.add_text(field, comments);
            }
        }

        if let Ok(field) = schema.get_field(fields::REVIEW_BOOST) {
            doc.add_f64(field, self.review_boost);
        }

        // Day resolution
        if let Ok(field) = schema.get_field(fields::RELEASE_DATE) {
            let secs = self.release_date.timestamp();
            let day = secs - secs.rem_euclid(SECONDS_PER_DAY);
            doc.add_date(field, tantivy::DateTime::from_timestamp_secs(day));
        }

        doc
    }

    fn document_id(&self) -> u64 {
        self.id
    }
}

fn text_field_options(analyzer: &str, stored: bool) -> TextOptions {
    let options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(analyzer)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );
    if stored {
        options.set_stored()
    } else {
        options
    }
}

/// Build the search schema for apps
pub fn build_app_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    schema_builder.add_u64_field(fields::ID, INDEXED | STORED | FAST);

    schema_builder.add_text_field(fields::NAME, text_field_options("default", true));
    schema_builder.add_text_field(fields::SORTING_NAME, STRING | STORED);

    // Markup-free text is indexed, the raw text is stored for projections
    schema_builder.add_text_field(fields::DESCRIPTION, text_field_options(DESCRIPTION_ANALYZER, false));
    schema_builder.add_text_field(fields::DISPLAY_DESCRIPTION, STORED);

    // Stored only, never searched
    schema_builder.add_text_field(fields::IMAGE, STORED);

    schema_builder.add_facet_field(fields::CATEGORY, INDEXED);

    schema_builder.add_f64_field(fields::PRICE, INDEXED | STORED | FAST);

    schema_builder.add_text_field(fields::DEVICE_NAMES, text_field_options(DEVICE_NAME_ANALYZER, false));
    schema_builder.add_text_field(fields::REVIEW_COMMENTS, text_field_options(REVIEW_ANALYZER, false));

    schema_builder.add_f64_field(fields::REVIEW_BOOST, FAST);

    schema_builder.add_date_field(fields::RELEASE_DATE, INDEXED | STORED | FAST);

    schema_builder.build()
}

/// Register the custom analyzers the schema refers to
pub fn register_analyzers(index: &Index) {
    let description = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(stop_words())
        .filter(Stemmer::new(Language::English))
        .build();
    index.tokenizers().register(DESCRIPTION_ANALYZER, description);

    let review = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(stop_words())
        .build();
    index.tokenizers().register(REVIEW_ANALYZER, review);

    let device_name = TextAnalyzer::builder(WhitespaceTokenizer::default())
        .filter(LowerCaser)
        .build();
    index.tokenizers().register(DEVICE_NAME_ANALYZER, device_name);
}
