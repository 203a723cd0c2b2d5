//! Search requests and query construction

use crate::search::config::IndexProfile;
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use tantivy::query::{
    BooleanQuery, BoostQuery, EmptyQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption, Schema};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

/// Largest edit distance the engine's fuzzy matcher supports
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// Value meaning "no selection" for the category and price-range filters
pub const ALL: &str = "all";

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    /// Engine ranking
    #[default]
    #[serde(rename = "relevance")]
    Relevance,
    /// Name, A to Z
    #[serde(rename = "name")]
    NameAsc,
    /// Name, Z to A
    #[serde(rename = "name-reverse")]
    NameDesc,
}

impl SortMode {
    /// Parse a sort parameter; unknown values fall back to relevance
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "name" => SortMode::NameAsc,
            "name-reverse" => SortMode::NameDesc,
            _ => SortMode::Relevance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::NameAsc => "name",
            SortMode::NameDesc => "name-reverse",
        }
    }
}

impl From<&str> for SortMode {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// One search request, immutable once built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The user's search text
    pub raw_query: String,

    /// Only return apps supporting this device
    pub device_filter: Option<String>,

    /// Category facet selection ("all" means none)
    pub category_filter: Option<String>,

    /// Price-range facet selection ("all" means none)
    pub price_range_filter: Option<String>,

    /// Result ordering
    pub sort: SortMode,

    /// Zero-based index of the first record to return
    pub page_offset: usize,
}

fn selection(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

impl SearchRequest {
    /// Create a new search request
    pub fn new(raw_query: impl Into<String>) -> Self {
        Self {
            raw_query: raw_query.into(),
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_filter = Some(device.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_filter = Some(category.into());
        self
    }

    pub fn with_price_range(mut self, price_range: impl Into<String>) -> Self {
        self.price_range_filter = Some(price_range.into());
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.page_offset = offset;
        self
    }

    /// Device to filter on, if any; empty and "all" mean no filter
    pub fn selected_device(&self) -> Option<&str> {
        selection(&self.device_filter)
    }

    pub fn selected_category(&self) -> Option<&str> {
        selection(&self.category_filter)
    }

    pub fn selected_price_range(&self) -> Option<&str> {
        selection(&self.price_range_filter)
    }

    pub fn has_facet_selection(&self) -> bool {
        self.selected_category().is_some() || self.selected_price_range().is_some()
    }
}

/// The two supported query shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryShape {
    /// Exact ordered phrase, quotes removed
    Phrase { phrase: String },
    /// Keyword match tolerating typos
    Fuzzy { text: String },
}

impl QueryShape {
    /// Decide the query shape for raw search text.
    ///
    /// Text longer than two characters wrapped in double quotes is a phrase;
    /// everything else, including `""` and a lone `"`, is a fuzzy keyword query.
    pub fn classify(raw: &str) -> Self {
        let text = raw.trim();
        if text.len() > 2 && text.starts_with('"') && text.ends_with('"') {
            QueryShape::Phrase {
                phrase: text[1..text.len() - 1].to_string(),
            }
        } else {
            QueryShape::Fuzzy {
                text: text.to_string(),
            }
        }
    }

    pub fn is_phrase(&self) -> bool {
        matches!(self, QueryShape::Phrase { .. })
    }

    pub fn pattern(&self) -> &str {
        match self {
            QueryShape::Phrase { phrase } => phrase,
            QueryShape::Fuzzy { text } => text,
        }
    }
}

/// Edits allowed for a term of `term_len` characters at the given similarity
pub fn max_edits(term_len: usize, threshold: f32) -> u8 {
    let allowed = ((1.0 - f64::from(threshold)) * term_len as f64).floor();
    allowed.clamp(0.0, f64::from(MAX_FUZZY_DISTANCE)) as u8
}

/// A compiled query, owned by one request and shared by both passes
#[derive(Debug)]
pub struct StructuredQuery {
    shape: QueryShape,
    query: Box<dyn Query>,
}

impl StructuredQuery {
    pub fn shape(&self) -> &QueryShape {
        &self.shape
    }

    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    /// A fresh copy of the compiled query, for composing with filters
    pub fn to_query(&self) -> Box<dyn Query> {
        self.query.box_clone()
    }
}

/// Builds engine queries from raw search text
pub struct QueryBuilder {
    index: Index,
    schema: Schema,
    profile: IndexProfile,
    fuzzy_threshold: f32,
    max_query_length: usize,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new(
        index: Index,
        profile: IndexProfile,
        fuzzy_threshold: f32,
        max_query_length: usize,
    ) -> Self {
        let schema = index.schema();
        Self {
            index,
            schema,
            profile,
            fuzzy_threshold,
            max_query_length,
        }
    }

    /// Build the structured query for raw search text.
    ///
    /// Empty text gives a fuzzy query with an empty pattern, which matches
    /// nothing rather than everything.
    pub fn build(&self, raw: &str) -> SearchResult<StructuredQuery> {
        let text = raw.trim();
        self.check_supported(text)?;

        let shape = QueryShape::classify(text);
        let query = match &shape {
            QueryShape::Phrase { phrase } => self.phrase_query(phrase)?,
            QueryShape::Fuzzy { text } => self.fuzzy_query(text)?,
        };

        tracing::debug!(
            phrase = shape.is_phrase(),
            pattern = %shape.pattern(),
            "Built structured query"
        );

        Ok(StructuredQuery { shape, query })
    }

    fn check_supported(&self, text: &str) -> SearchResult<()> {
        let length = text.chars().count();
        if length > self.max_query_length {
            return Err(SearchError::QueryConstructionFailed(format!(
                "query is {} characters long, the limit is {}",
                length, self.max_query_length
            )));
        }
        if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
            return Err(SearchError::QueryConstructionFailed(
                "query contains control characters".to_string(),
            ));
        }
        Ok(())
    }

    fn field(&self, name: &str) -> SearchResult<Field> {
        self.schema
            .get_field(name)
            .map_err(|e| SearchError::SchemaError(format!("Unknown field {}: {}", name, e)))
    }

    /// Run text through the field's analyzer, keeping token positions
    fn analyze(&self, field: Field, text: &str) -> SearchResult<Vec<(usize, String)>> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(field)
            .map_err(|e| SearchError::SchemaError(format!("No analyzer for field: {}", e)))?;

        let mut tokens = Vec::new();
        let mut stream = analyzer.token_stream(text);
        while stream.advance() {
            let token = stream.token();
            tokens.push((token.position, token.text.clone()));
        }
        Ok(tokens)
    }

    /// Phrase on any configured field, name and description boosted
    fn phrase_query(&self, phrase: &str) -> SearchResult<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for profile in &self.profile.fields {
            let field = self.field(&profile.field)?;
            let tokens = self.analyze(field, phrase)?;

            let matcher: Box<dyn Query> = match tokens.as_slice() {
                [] => continue,
                [(_, text)] => Box::new(TermQuery::new(
                    Term::from_field_text(field, text),
                    IndexRecordOption::WithFreqs,
                )),
                [(first, _), ..] => {
                    let first = *first;
                    let terms = tokens
                        .iter()
                        .map(|(position, text)| (position - first, Term::from_field_text(field, text)))
                        .collect();
                    Box::new(PhraseQuery::new_with_offset(terms))
                }
            };

            let weight = self.profile.static_weight(profile) * profile.phrase_boost;
            clauses.push((Occur::Should, Box::new(BoostQuery::new(matcher, weight))));
        }

        Ok(combine(clauses))
    }

    /// Every analyzed term, fuzzily, on every configured field
    fn fuzzy_query(&self, text: &str) -> SearchResult<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for profile in &self.profile.fields {
            let field = self.field(&profile.field)?;
            let weight = self.profile.static_weight(profile);

            for (_, token) in self.analyze(field, text)? {
                let distance = max_edits(token.chars().count(), self.fuzzy_threshold);
                let fuzzy = FuzzyTermQuery::new(Term::from_field_text(field, &token), distance, true);
                clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(fuzzy), weight))));
            }
        }

        Ok(combine(clauses))
    }
}

fn combine(clauses: Vec<(Occur, Box<dyn Query>)>) -> Box<dyn Query> {
    if clauses.is_empty() {
        Box::new(EmptyQuery)
    } else {
        Box::new(BooleanQuery::new(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::document::{build_app_schema, register_analyzers};
    use proptest::prelude::*;

    fn test_builder() -> QueryBuilder {
        let index = Index::create_in_ram(build_app_schema());
        register_analyzers(&index);
        QueryBuilder::new(index, IndexProfile::default(), 0.7, 256)
    }

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("cloud")
            .with_device("xPhone")
            .with_category("all")
            .with_price_range("1.0 to 5.0")
            .with_sort(SortMode::NameDesc)
            .with_offset(10);

        assert_eq!(request.raw_query, "cloud");
        assert_eq!(request.selected_device(), Some("xPhone"));
        assert_eq!(request.selected_category(), None);
        assert_eq!(request.selected_price_range(), Some("1.0 to 5.0"));
        assert_eq!(request.page_offset, 10);
        assert!(request.has_facet_selection());
    }

    #[test]
    fn test_all_and_empty_mean_unset() {
        let request = SearchRequest::new("x")
            .with_device("  ")
            .with_category("ALL")
            .with_price_range("");
        assert_eq!(request.selected_device(), None);
        assert_eq!(request.selected_category(), None);
        assert_eq!(request.selected_price_range(), None);
        assert!(!request.has_facet_selection());

        assert_eq!(SearchRequest::new("x").with_device("all").selected_device(), None);
    }

    #[test]
    fn test_sort_mode_parsing_fails_open() {
        assert_eq!(SortMode::parse("name"), SortMode::NameAsc);
        assert_eq!(SortMode::parse("name-reverse"), SortMode::NameDesc);
        assert_eq!(SortMode::parse("relevance"), SortMode::Relevance);
        assert_eq!(SortMode::parse("price"), SortMode::Relevance);
        assert_eq!(SortMode::from(""), SortMode::Relevance);
        assert_eq!(SortMode::NameDesc.as_str(), "name-reverse");
    }

    #[test]
    fn test_classify_quoted_phrase() {
        assert_eq!(
            QueryShape::classify("\"Business Games\""),
            QueryShape::Phrase {
                phrase: "Business Games".to_string()
            }
        );
        assert_eq!(
            QueryShape::classify("  \"cloud\"  "),
            QueryShape::Phrase {
                phrase: "cloud".to_string()
            }
        );
    }

    #[test]
    fn test_short_quoted_text_is_fuzzy() {
        assert_eq!(
            QueryShape::classify("\"\""),
            QueryShape::Fuzzy {
                text: "\"\"".to_string()
            }
        );
        assert_eq!(
            QueryShape::classify("\""),
            QueryShape::Fuzzy {
                text: "\"".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_quote_is_fuzzy() {
        let shape = QueryShape::classify("\"World Tournament");
        assert!(!shape.is_phrase());
        assert_eq!(shape.pattern(), "\"World Tournament");
    }

    #[test]
    fn test_max_edits() {
        assert_eq!(max_edits(0, 0.7), 0);
        assert_eq!(max_edits(3, 0.7), 0);
        assert_eq!(max_edits(4, 0.7), 1);
        assert_eq!(max_edits(5, 0.7), 1);
        assert_eq!(max_edits(7, 0.7), 2);
        assert_eq!(max_edits(40, 0.7), MAX_FUZZY_DISTANCE);
        assert_eq!(max_edits(10, 1.0), 0);
    }

    #[test]
    fn test_build_shapes() {
        let builder = test_builder();

        let phrase = builder.build("\"world tournament\"").unwrap();
        assert!(phrase.shape().is_phrase());

        let fuzzy = builder.build("wrold").unwrap();
        assert_eq!(
            fuzzy.shape(),
            &QueryShape::Fuzzy {
                text: "wrold".to_string()
            }
        );
    }

    #[test]
    fn test_empty_query_is_fuzzy_with_empty_pattern() {
        let builder = test_builder();
        let query = builder.build("   ").unwrap();
        assert_eq!(
            query.shape(),
            &QueryShape::Fuzzy {
                text: String::new()
            }
        );
    }

    #[test]
    fn test_unsupported_input_fails() {
        let builder = test_builder();

        let too_long = "a".repeat(257);
        assert!(matches!(
            builder.build(&too_long),
            Err(SearchError::QueryConstructionFailed(_))
        ));

        assert!(matches!(
            builder.build("cloud\u{0}"),
            Err(SearchError::QueryConstructionFailed(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_quoted_text_is_phrase(inner in "[a-zA-Z0-9 ]{1,30}") {
            let raw = format!("\"{inner}\"");
            prop_assert_eq!(QueryShape::classify(&raw), QueryShape::Phrase { phrase: inner });
        }

        #[test]
        fn prop_unquoted_text_is_fuzzy_verbatim(text in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,30}[a-zA-Z0-9]") {
            prop_assert_eq!(QueryShape::classify(&text), QueryShape::Fuzzy { text: text.clone() });
        }

        #[test]
        fn prop_short_text_is_always_fuzzy(text in "[\"a-z]{0,2}") {
            prop_assert!(!QueryShape::classify(&text).is_phrase());
        }
    }
}
