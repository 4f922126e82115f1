//! Query DSL parser.

use ragctx_core::{ChunkType, SearchOptions};

/// Parsed query with text and filters.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// Main query text
    pub text: String,
    /// Filters and limit for chunk search
    pub options: SearchOptions,
}

/// Query parser for the DSL.
#[derive(Debug, Clone)]
pub struct QueryParser {
    /// Default result limit
    default_limit: usize,
}

impl QueryParser {
    /// Create a new query parser.
    #[must_use]
    pub fn new(default_limit: usize) -> Self {
        Self { default_limit }
    }

    /// Parse a query string.
    ///
    /// Supports filters like:
    /// - `type:table` or `type:code`
    /// - `doc:<document id>`
    /// - `confidence:0.6` (minimum confidence)
    /// - `limit:10`
    ///
    /// Unknown keys and unparsable values stay part of the query text.
    #[must_use]
    pub fn parse(&self, query: &str) -> ParsedQuery {
        let mut text_parts = Vec::new();
        let mut options = SearchOptions {
            limit: Some(self.default_limit),
            ..Default::default()
        };

        for part in query.split_whitespace() {
            let Some((key, value)) = part.split_once(':') else {
                text_parts.push(part);
                continue;
            };
            let parsed = match key.to_lowercase().as_str() {
                "type" => value
                    .parse::<ChunkType>()
                    .map(|t| options.chunk_type = Some(t))
                    .is_ok(),
                "doc" | "document" if !value.is_empty() => {
                    options.document_id = Some(value.to_string());
                    true
                }
                "confidence" | "min" => value
                    .parse::<f64>()
                    .map(|c| options.min_confidence = c)
                    .is_ok(),
                "limit" => value.parse().map(|n| options.limit = Some(n)).is_ok(),
                _ => false,
            };
            if !parsed {
                text_parts.push(part);
            }
        }

        ParsedQuery {
            text: text_parts.join(" "),
            options,
        }
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(10)
    }
}
