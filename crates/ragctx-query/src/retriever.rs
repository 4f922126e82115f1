//! Context retrieval.
//!
//! Turns a query into a block of labelled excerpts for a downstream
//! consumer: chunk search first, one excerpt per document, each widened to
//! its neighbouring chunks; a whole-document substring search when no chunk
//! matches.

use ragctx_core::{DocumentChunk, DocumentStore, SearchHit, SearchOptions};
use ragctx_index::ChunkManager;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::parser::QueryParser;

/// Retrieval configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Neighbouring chunks included on each side of a hit
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Characters kept per document in fallback snippets
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,

    /// Text placed between excerpts
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Chunks below this confidence are not searched
    #[serde(default)]
    pub min_confidence: f64,
}

fn default_context_window() -> usize {
    1
}

fn default_snippet_length() -> usize {
    500
}

fn default_separator() -> String {
    "\n\n---\n\n".to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            snippet_length: default_snippet_length(),
            separator: default_separator(),
            min_confidence: 0.0,
        }
    }
}

/// Answers queries from a [`ChunkManager`], with document titles and the
/// fallback search coming from a [`DocumentStore`].
pub struct ContextRetriever {
    manager: Arc<ChunkManager>,
    store: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
    parser: QueryParser,
}

impl ContextRetriever {
    /// Create a new retriever.
    pub fn new(
        manager: Arc<ChunkManager>,
        store: Arc<dyn DocumentStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            manager,
            store,
            config,
            parser: QueryParser::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Relevant context for `query` from at most `limit` documents, or
    /// `None` when nothing matches.
    pub async fn get_relevant_context(&self, query: &str, limit: usize) -> Option<String> {
        if limit == 0 || query.trim().is_empty() {
            return None;
        }

        let options = SearchOptions {
            min_confidence: self.config.min_confidence,
            ..Default::default()
        };
        let hits = self.manager.search_chunks(query, &options);
        debug!("Context query {:?}: {} chunk hits", query, hits.len());

        let mut seen = HashSet::new();
        let mut excerpts = Vec::new();
        for hit in hits {
            if excerpts.len() >= limit {
                break;
            }
            let document_id = hit.chunk.metadata.document_id.clone();
            if !seen.insert(document_id.clone()) {
                continue;
            }

            let mut window = self
                .manager
                .get_chunk_context(&hit.chunk.metadata.chunk_id, self.config.context_window);
            if window.is_empty() {
                window.push(hit.chunk);
            }
            let title = self.title_for(&document_id).await;
            excerpts.push(format!("[{title}]\n{}", join_window(&window)));
        }

        if !excerpts.is_empty() {
            return Some(excerpts.join(&self.config.separator));
        }
        self.fallback_context(query, limit).await
    }

    /// Whole-document substring search over titles and content.
    async fn fallback_context(&self, query: &str, limit: usize) -> Option<String> {
        let documents = match self.store.search_documents(query.trim(), limit).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Document search failed for {:?}: {}", query, e);
                return None;
            }
        };
        if documents.is_empty() {
            return None;
        }
        debug!("Context query {:?}: {} document matches", query, documents.len());

        let snippets: Vec<String> = documents
            .iter()
            .map(|doc| {
                let title = if doc.title.trim().is_empty() {
                    doc.id.as_str()
                } else {
                    doc.title.as_str()
                };
                format!("[{title}]\n{}", truncate(&doc.content, self.config.snippet_length))
            })
            .collect();
        Some(snippets.join(&self.config.separator))
    }

    /// Chunk search with the query DSL (`type:`, `doc:`, `confidence:`,
    /// `limit:`). The configured minimum confidence applies unless the
    /// query sets a higher one.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let mut parsed = self.parser.parse(query);
        parsed.options.min_confidence = parsed.options.min_confidence.max(self.config.min_confidence);
        self.manager.search_chunks(&parsed.text, &parsed.options)
    }

    async fn title_for(&self, document_id: &str) -> String {
        match self.store.get_document(document_id).await {
            Ok(Some(doc)) if !doc.title.trim().is_empty() => doc.title,
            Ok(_) => document_id.to_string(),
            Err(e) => {
                warn!("Failed to load title for {}: {}", document_id, e);
                document_id.to_string()
            }
        }
    }
}

/// Join a context window. Only the first chunk contributes its effective
/// content (overlap + content). Later chunks contribute their content alone,
/// because their overlap repeats the tail of the chunk just before them.
/// Joining every chunk's effective content would print each overlap twice.
fn join_window(window: &[DocumentChunk]) -> String {
    let mut parts = Vec::with_capacity(window.len());
    for (i, chunk) in window.iter().enumerate() {
        if i == 0 {
            parts.push(chunk.effective_content());
        } else {
            parts.push(chunk.content.clone());
        }
    }
    parts.join("\n\n")
}

/// Truncate to `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}
