//! The chunk manager.
//!
//! [`ChunkManager`] owns the per-document chunk registry. It dispatches a
//! document to its [`ChunkStrategy`], post-processes the result (size
//! filter, confidence scoring, re-indexing and re-linking) and replaces the
//! document's registration in one step. Query-side operations (lookup,
//! context windows, lexical search, summaries, statistics and export) read
//! from the registry and never fail for unknown ids.

use chrono::Utc;
use parking_lot::RwLock;
use ragctx_chunker::text::normalize_file_type;
use ragctx_chunker::{fallback_chunk, link_sequence, ChunkStrategy};
use ragctx_core::{
    ChunkError, ChunkType, ChunkingConfig, ChunkingStatistics, ConfigError, DocumentChunk,
    DocumentIndexEntry, DocumentSummary, ExportError, FormatHints, QualityDistribution,
    SearchHit, SearchOptions, SizeStats, MAX_CONFIDENCE, MIN_CONFIDENCE,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::scoring::score_confidence;

/// File type recorded for documents registered without one.
pub const DEFAULT_FILE_TYPE: &str = "text";

/// JSON export of one document's chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkExport {
    pub document_id: String,
    pub chunk_count: usize,
    pub chunks: Vec<DocumentChunk>,
}

/// A registered document: its chunk sequence and index entry.
#[derive(Debug, Clone)]
struct Registered {
    chunks: Arc<Vec<DocumentChunk>>,
    index: DocumentIndexEntry,
    /// Registration order, for stable iteration across documents
    sequence: u64,
}

#[derive(Debug, Default)]
struct Registry {
    documents: HashMap<String, Registered>,
    next_sequence: u64,
}

/// Chunk registry and document index.
///
/// Chunking runs outside the lock; registration swaps the whole entry for a
/// document, so readers see either the old sequence or the new one.
#[derive(Debug)]
pub struct ChunkManager {
    config: ChunkingConfig,
    registry: RwLock<Registry>,
}

impl ChunkManager {
    /// Create a manager with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by
    /// [`ChunkingConfig::validate`].
    pub fn new(config: ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            "ChunkManager created (target {}, min {}, max {}, strategy {})",
            config.target_chunk_size,
            config.min_chunk_size,
            config.max_chunk_size,
            config.boundary_strategy
        );
        Ok(Self {
            config,
            registry: RwLock::new(Registry::default()),
        })
    }

    /// The configuration this manager was built with.
    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk a document and register the result, replacing any previous
    /// registration for `document_id`.
    ///
    /// Chunks shorter than `min_chunk_size` are dropped. If that leaves
    /// nothing for a non-blank document, the whole document is registered as
    /// a single fallback chunk.
    ///
    /// # Errors
    ///
    /// Returns the strategy's [`ChunkError`]; nothing is registered then.
    pub fn chunk_document(
        &self,
        content: &str,
        document_id: &str,
        file_type: Option<&str>,
        hints: &FormatHints,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        let strategy = ChunkStrategy::for_file_type(file_type, &self.config);
        let raw = strategy
            .segment(content, document_id, hints, &self.config)
            .map_err(|e| {
                error!("{} chunking failed for {}: {}", strategy, document_id, e);
                e
            })?;

        let produced = raw.len();
        let mut chunks: Vec<DocumentChunk> = raw
            .into_iter()
            .filter(|chunk| chunk.char_len() >= self.config.min_chunk_size)
            .collect();
        if chunks.len() < produced {
            debug!(
                "Dropped {} chunks below {} characters for {}",
                produced - chunks.len(),
                self.config.min_chunk_size,
                document_id
            );
        }

        if chunks.is_empty() {
            if let Some(fallback) = fallback_chunk(content, document_id, file_type, &self.config) {
                warn!("No chunks kept for {}, using a single fallback chunk", document_id);
                chunks.push(fallback);
            }
        }

        for chunk in chunks.iter_mut().filter(|c| !c.metadata.is_fallback) {
            chunk.metadata.confidence_score = score_confidence(&chunk.content, &self.config);
        }

        Ok(self.register_chunks(document_id, chunks, file_type))
    }

    /// Install an externally computed chunk list for a document, bypassing
    /// strategy dispatch. Indices, ids, overlap and links are recomputed and
    /// the document index is updated. Returns the registered sequence.
    pub fn register_chunks(
        &self,
        document_id: &str,
        mut chunks: Vec<DocumentChunk>,
        file_type: Option<&str>,
    ) -> Vec<DocumentChunk> {
        for chunk in &mut chunks {
            if chunk.metadata.document_id != document_id {
                chunk.metadata.document_id = document_id.to_string();
            }
            chunk.metadata.confidence_score = chunk
                .metadata
                .confidence_score
                .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
        }
        link_sequence(&mut chunks, &self.config);

        let file_type = file_type.map_or_else(|| DEFAULT_FILE_TYPE.to_string(), normalize_file_type);
        let index = index_entry(&chunks, file_type);
        let chunks = Arc::new(chunks);

        {
            let mut registry = self.registry.write();
            let sequence = registry.next_sequence;
            registry.next_sequence += 1;
            registry.documents.insert(
                document_id.to_string(),
                Registered {
                    chunks: Arc::clone(&chunks),
                    index,
                    sequence,
                },
            );
        }

        info!("Registered {} chunks for {}", chunks.len(), document_id);
        chunks.as_ref().clone()
    }

    /// Chunks of a document in order; empty when unknown.
    #[must_use]
    pub fn get_chunks(&self, document_id: &str) -> Vec<DocumentChunk> {
        self.registry
            .read()
            .documents
            .get(document_id)
            .map(|doc| doc.chunks.as_ref().clone())
            .unwrap_or_default()
    }

    /// Find a chunk by id across all documents.
    #[must_use]
    pub fn get_chunk(&self, chunk_id: &str) -> Option<DocumentChunk> {
        self.locate(chunk_id)
            .and_then(|(chunks, position)| chunks.get(position).cloned())
    }

    /// The chunk plus up to `window` neighbours on each side, clipped to the
    /// document bounds. Empty when the chunk is unknown.
    #[must_use]
    pub fn get_chunk_context(&self, chunk_id: &str, window: usize) -> Vec<DocumentChunk> {
        let Some((chunks, position)) = self.locate(chunk_id) else {
            return Vec::new();
        };
        let start = position.saturating_sub(window);
        let end = position.saturating_add(window).min(chunks.len() - 1);
        chunks[start..=end].to_vec()
    }

    fn locate(&self, chunk_id: &str) -> Option<(Arc<Vec<DocumentChunk>>, usize)> {
        let registry = self.registry.read();
        registry.documents.values().find_map(|doc| {
            doc.chunks
                .iter()
                .position(|c| c.metadata.chunk_id == chunk_id)
                .map(|position| (Arc::clone(&doc.chunks), position))
        })
    }

    /// Lexical search over registered chunks.
    ///
    /// A chunk containing the whole query (case-insensitive) scores 1.0.
    /// Otherwise the score is `overlap / query_words + 0.1 * overlap`,
    /// capped at 1.0. Zero scores are dropped; ties keep registration and
    /// chunk order.
    #[must_use]
    pub fn search_chunks(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        let query_words: Vec<String> = {
            let mut seen = HashSet::new();
            tokenize(&query).filter(|w| seen.insert(w.clone())).collect()
        };
        if query_words.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for chunks in self.snapshot(options.document_id.as_deref()) {
            for chunk in chunks.iter() {
                if chunk.metadata.confidence_score < options.min_confidence {
                    continue;
                }
                if options.chunk_type.is_some_and(|t| t != chunk.metadata.chunk_type) {
                    continue;
                }
                let score = relevance(&query, &query_words, &chunk.content);
                if score > 0.0 {
                    hits.push(SearchHit {
                        chunk: chunk.clone(),
                        score,
                    });
                }
            }
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(limit) = options.limit {
            hits.truncate(limit);
        }
        debug!("Search {:?} matched {} chunks", query, hits.len());
        hits
    }

    /// Chunk sequences in registration order, optionally for one document.
    fn snapshot(&self, document_id: Option<&str>) -> Vec<Arc<Vec<DocumentChunk>>> {
        let registry = self.registry.read();
        let mut docs: Vec<&Registered> = match document_id {
            Some(id) => registry.documents.get(id).into_iter().collect(),
            None => registry.documents.values().collect(),
        };
        docs.sort_by_key(|doc| doc.sequence);
        docs.into_iter().map(|doc| Arc::clone(&doc.chunks)).collect()
    }

    /// Summary of one document, or `None` when it is not registered.
    #[must_use]
    pub fn get_document_summary(&self, document_id: &str) -> Option<DocumentSummary> {
        let (chunks, index) = {
            let registry = self.registry.read();
            let doc = registry.documents.get(document_id)?;
            (Arc::clone(&doc.chunks), doc.index.clone())
        };

        let sizes: Vec<f64> = chunks.iter().map(|c| c.char_len() as f64).collect();
        let confidences: Vec<f64> = chunks.iter().map(|c| c.metadata.confidence_score).collect();
        let mut quality = QualityDistribution::default();
        for confidence in &confidences {
            quality.record(*confidence);
        }
        let mut sections: Vec<String> = Vec::new();
        for title in chunks.iter().filter_map(|c| c.metadata.section_title.as_ref()) {
            if !sections.contains(title) {
                sections.push(title.clone());
            }
        }

        Some(DocumentSummary {
            document_id: document_id.to_string(),
            index,
            size_stats: SizeStats::from_values(&sizes),
            confidence_stats: SizeStats::from_values(&confidences),
            quality,
            sections,
        })
    }

    /// Aggregate statistics across every registered document.
    #[must_use]
    pub fn get_chunking_statistics(&self) -> ChunkingStatistics {
        let (docs, file_types) = {
            let registry = self.registry.read();
            let mut file_types: BTreeMap<String, usize> = BTreeMap::new();
            for doc in registry.documents.values() {
                *file_types.entry(doc.index.file_type.clone()).or_insert(0) += 1;
            }
            let docs: Vec<Arc<Vec<DocumentChunk>>> = registry
                .documents
                .values()
                .map(|doc| Arc::clone(&doc.chunks))
                .collect();
            (docs, file_types)
        };

        let mut stats = ChunkingStatistics {
            total_documents: docs.len(),
            file_types,
            ..Default::default()
        };
        let mut sizes = Vec::new();
        let mut confidences = Vec::new();
        for chunk in docs.iter().flat_map(|chunks| chunks.iter()) {
            stats.total_chunks += 1;
            stats.total_words += chunk.metadata.word_count;
            stats.total_characters += chunk.char_len();
            *stats.chunk_types.entry(chunk.metadata.chunk_type).or_insert(0) += 1;
            stats.quality.record(chunk.metadata.confidence_score);
            sizes.push(chunk.char_len() as f64);
            confidences.push(chunk.metadata.confidence_score);
        }

        if stats.total_chunks > 0 {
            stats.average_chunk_size = stats.total_characters as f64 / stats.total_chunks as f64;
            stats.average_confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;
        }
        stats.size_stats = SizeStats::from_values(&sizes);
        stats.confidence_stats = SizeStats::from_values(&confidences);
        stats
    }

    /// Serialize a document's chunks as `json` or `text` (alias `txt`).
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnsupportedFormat`] for any other format.
    pub fn export_chunks(&self, document_id: &str, format: &str) -> Result<String, ExportError> {
        let chunks = self.get_chunks(document_id);
        match format.trim().to_lowercase().as_str() {
            "json" => {
                let export = ChunkExport {
                    document_id: document_id.to_string(),
                    chunk_count: chunks.len(),
                    chunks,
                };
                Ok(serde_json::to_string_pretty(&export)?)
            }
            "text" | "txt" => Ok(render_text(document_id, &chunks)),
            _ => Err(ExportError::UnsupportedFormat(format.to_string())),
        }
    }

    /// Remove a document's chunks and index entry. Returns whether it was
    /// registered.
    pub fn clear_document(&self, document_id: &str) -> bool {
        let removed = self.registry.write().documents.remove(document_id).is_some();
        if removed {
            debug!("Cleared chunks for {}", document_id);
        }
        removed
    }

    /// Remove every registered document.
    pub fn clear_all(&self) {
        let mut registry = self.registry.write();
        let count = registry.documents.len();
        registry.documents.clear();
        debug!("Cleared {} documents", count);
    }

    /// Registered document ids, in registration order.
    #[must_use]
    pub fn document_ids(&self) -> Vec<String> {
        let registry = self.registry.read();
        let mut docs: Vec<(&String, u64)> = registry
            .documents
            .iter()
            .map(|(id, doc)| (id, doc.sequence))
            .collect();
        docs.sort_by_key(|(_, sequence)| *sequence);
        docs.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

fn index_entry(chunks: &[DocumentChunk], file_type: String) -> DocumentIndexEntry {
    let mut chunk_types: BTreeMap<ChunkType, usize> = BTreeMap::new();
    let mut total_words = 0;
    let mut total_characters = 0;
    let mut total_confidence = 0.0;
    for chunk in chunks {
        *chunk_types.entry(chunk.metadata.chunk_type).or_insert(0) += 1;
        total_words += chunk.metadata.word_count;
        total_characters += chunk.char_len();
        total_confidence += chunk.metadata.confidence_score;
    }
    let count = chunks.len();
    let (average_chunk_size, average_confidence) = if count == 0 {
        (0.0, 0.0)
    } else {
        (
            total_characters as f64 / count as f64,
            total_confidence / count as f64,
        )
    };

    DocumentIndexEntry {
        chunk_count: count,
        total_words,
        total_characters,
        chunk_types,
        average_chunk_size,
        average_confidence,
        file_type,
        created_at: Utc::now(),
    }
}

/// Lowercase words with surrounding punctuation stripped.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| !word.is_empty())
}

/// `query` is lowercase and `query_words` distinct and non-empty.
fn relevance(query: &str, query_words: &[String], content: &str) -> f64 {
    let content = content.to_lowercase();
    if content.contains(query) {
        return 1.0;
    }
    let content_words: HashSet<String> = tokenize(&content).collect();
    let overlap = query_words.iter().filter(|w| content_words.contains(*w)).count();
    if overlap == 0 {
        return 0.0;
    }
    let score = overlap as f64 / query_words.len() as f64 + 0.1 * overlap as f64;
    score.min(1.0)
}

fn render_text(document_id: &str, chunks: &[DocumentChunk]) -> String {
    let mut out = format!("Document: {} ({} chunks)\n", document_id, chunks.len());
    for chunk in chunks {
        let meta = &chunk.metadata;
        let _ = write!(
            out,
            "\n[{}] {} | confidence {:.2} | {} words",
            meta.chunk_index, meta.chunk_type, meta.confidence_score, meta.word_count
        );
        if let Some(title) = &meta.section_title {
            let _ = write!(out, " | {title}");
        }
        if let Some(page) = meta.page_number {
            let _ = write!(out, " | page {page}");
        }
        let _ = writeln!(out, "\n{}", chunk.content);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragctx_core::SectionHint;

    fn test_config() -> ChunkingConfig {
        ChunkingConfig {
            target_chunk_size: 200,
            min_chunk_size: 40,
            max_chunk_size: 400,
            overlap_size: 40,
            ..Default::default()
        }
    }

    fn manager() -> ChunkManager {
        ChunkManager::new(test_config()).unwrap()
    }

    fn paragraph(topic: &str) -> String {
        format!(
            "The {topic} paragraph explains one idea in plain words. \
             It has two complete sentences about {topic}."
        )
    }

    fn document(topics: &[&str]) -> String {
        topics.iter().map(|t| paragraph(t)).collect::<Vec<_>>().join("\n\n")
    }

    /// Twelve paragraphs, enough for four chunks under `test_config`.
    fn long_document() -> String {
        (0..12)
            .map(|i| paragraph(&format!("topic{i}")))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ChunkingConfig {
            min_chunk_size: 500,
            target_chunk_size: 100,
            ..Default::default()
        };
        assert!(matches!(
            ChunkManager::new(config),
            Err(ConfigError::SizeOrdering { .. })
        ));
    }

    #[test]
    fn test_chunk_document_invariants() {
        let manager = manager();
        let text = document(&["alpha", "beta", "gamma", "delta", "epsilon", "zeta"]);
        let chunks = manager.chunk_document(&text, "doc", None, &FormatHints::default()).unwrap();

        assert!(chunks.len() >= 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
            let len = chunk.char_len();
            assert!((40..=400).contains(&len), "chunk {i} has {len} chars");
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&chunk.metadata.confidence_score));
        }
        assert!(chunks[0].metadata.previous_chunk_id.is_none());
        assert!(chunks.last().unwrap().metadata.next_chunk_id.is_none());
        assert_eq!(manager.get_chunks("doc"), chunks);
    }

    #[test]
    fn test_chunk_document_is_deterministic() {
        let text = document(&["alpha", "beta", "gamma", "delta"]);
        let first = manager().chunk_document(&text, "doc", None, &FormatHints::default()).unwrap();
        let second = manager().chunk_document(&text, "doc", None, &FormatHints::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_document_uses_fallback() {
        let manager = manager();
        let chunks = manager
            .chunk_document("Too short.", "tiny", Some("txt"), &FormatHints::default())
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.chunk_index, 0);
        assert!(chunks[0].metadata.is_fallback);
        assert!(chunks[0].metadata.previous_chunk_id.is_none());
        assert!(chunks[0].metadata.next_chunk_id.is_none());
        assert_eq!(chunks[0].content, "Too short.");
    }

    #[test]
    fn test_blank_document_has_no_chunks() {
        let manager = manager();
        let chunks = manager.chunk_document("  \n\n ", "blank", None, &FormatHints::default()).unwrap();
        assert!(chunks.is_empty());
        assert_eq!(manager.document_ids(), vec!["blank".to_string()]);
    }

    #[test]
    fn test_chunk_document_propagates_strategy_errors() {
        let manager = manager();
        let hints = FormatHints::with_page_breaks(vec![3, 1]);
        let result = manager.chunk_document("a\nb\nc\nd", "bad", Some("pdf"), &hints);
        assert!(matches!(result, Err(ChunkError::InvalidHints(_))));
        assert!(manager.get_chunks("bad").is_empty());
        assert!(manager.document_ids().is_empty());
    }

    #[test]
    fn test_section_hints_from_docx() {
        let manager = manager();
        let hints = FormatHints::with_sections(vec![
            SectionHint {
                title: "Intro".to_string(),
                content: paragraph("intro"),
            },
            SectionHint {
                title: "Usage".to_string(),
                content: paragraph("usage"),
            },
        ]);
        let chunks = manager.chunk_document("", "report", Some("docx"), &hints).unwrap();
        let titles: Vec<_> = chunks.iter().filter_map(|c| c.metadata.section_title.clone()).collect();
        assert_eq!(titles, vec!["Intro".to_string(), "Usage".to_string()]);
    }

    #[test]
    fn test_rechunking_replaces_registration() {
        let manager = manager();
        manager
            .chunk_document(&document(&["alpha", "beta", "gamma"]), "doc", None, &FormatHints::default())
            .unwrap();
        let replaced = manager
            .chunk_document(&paragraph("omega"), "doc", None, &FormatHints::default())
            .unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(manager.get_chunks("doc").len(), 1);
        assert_eq!(manager.document_ids().len(), 1);
    }

    #[test]
    fn test_register_chunks_relinks() {
        let manager = manager();
        let source = manager
            .chunk_document(&long_document(), "a", None, &FormatHints::default())
            .unwrap();
        assert!(source.len() >= 2);
        let mut reversed = source.clone();
        reversed.reverse();

        let registered = manager.register_chunks("b", reversed, Some("PDF"));
        assert_eq!(registered[0].metadata.document_id, "b");
        assert_eq!(registered[0].metadata.chunk_index, 0);
        assert!(registered[0].metadata.chunk_id.starts_with("b_chunk_0_"));
        assert_eq!(
            registered[0].metadata.next_chunk_id.as_deref(),
            Some(registered[1].metadata.chunk_id.as_str())
        );
        let summary = manager.get_document_summary("b").unwrap();
        assert_eq!(summary.index.file_type, "pdf");
    }

    #[test]
    fn test_get_chunk_and_context() {
        let manager = manager();
        let chunks = manager
            .chunk_document(&long_document(), "doc", None, &FormatHints::default())
            .unwrap();
        assert!(chunks.len() >= 3);

        let middle = &chunks[1];
        assert_eq!(manager.get_chunk(&middle.metadata.chunk_id).as_ref(), Some(middle));
        assert!(manager.get_chunk("missing").is_none());

        let context = manager.get_chunk_context(&middle.metadata.chunk_id, 1);
        assert_eq!(context, chunks[0..3].to_vec());

        let first = manager.get_chunk_context(&chunks[0].metadata.chunk_id, 1);
        assert_eq!(first, chunks[0..2].to_vec());

        let wide = manager.get_chunk_context(&chunks[0].metadata.chunk_id, 100);
        assert_eq!(wide.len(), chunks.len());

        assert!(manager.get_chunk_context("missing", 1).is_empty());
    }

    #[test]
    fn test_relevance() {
        let words: Vec<String> = vec!["rust".into(), "ownership".into()];
        assert!((relevance("rust ownership", &words, "All about Rust Ownership rules") - 1.0).abs() < 1e-9);
        // One of two words: 0.5 + 0.1
        assert!((relevance("rust ownership", &words, "Rust is fast.") - 0.6).abs() < 1e-9);
        assert!((relevance("rust ownership", &words, "ownership, then rust") - 1.0).abs() < 1e-9);
        assert_eq!(relevance("rust ownership", &words, "Nothing here"), 0.0);
    }

    #[test]
    fn test_search_ranking_and_filters() {
        let manager = manager();
        let long = |s: &str| format!("{s} This sentence pads the chunk to a useful size for tests.");
        let chunks = vec![
            long("Borrowing is checked at compile time."),
            long("The ownership model of Rust is unique."),
            long("Ownership appears here without the other word."),
            long("Nothing relevant in this one at all."),
            long("Rust compiles to native code."),
        ];
        for (i, content) in chunks.iter().enumerate() {
            let chunk = fallback_chunk(content, &format!("d{i}"), None, manager.config()).unwrap();
            manager.register_chunks(&format!("d{i}"), vec![chunk], None);
        }

        let hits = manager.search_chunks("ownership model of rust", &SearchOptions::default());
        assert_eq!(hits[0].chunk.metadata.document_id, "d1");
        assert!((hits[0].score - 1.0).abs() < 1e-9);
        assert!(hits[1..].iter().all(|h| h.score < 1.0));
        assert!(hits.iter().all(|h| h.chunk.metadata.document_id != "d3"));

        let only = manager.search_chunks(
            "rust",
            &SearchOptions {
                document_id: Some("d4".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(only.len(), 1);

        let limited = manager.search_chunks(
            "ownership",
            &SearchOptions {
                limit: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(limited.len(), 1);
        // Ties keep registration order
        assert_eq!(limited[0].chunk.metadata.document_id, "d1");

        let typed = manager.search_chunks(
            "rust",
            &SearchOptions {
                chunk_type: Some(ChunkType::Code),
                ..Default::default()
            },
        );
        assert!(typed.is_empty());

        let confident = manager.search_chunks(
            "rust",
            &SearchOptions {
                min_confidence: 1.1,
                ..Default::default()
            },
        );
        assert!(confident.is_empty());

        assert!(manager.search_chunks("   ", &SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_document_summary() {
        let manager = manager();
        let text = format!(
            "# First\n\n{}\n\n# Second\n\n{}",
            document(&["alpha", "beta"]),
            document(&["gamma", "delta"])
        );
        let chunks = manager.chunk_document(&text, "doc", Some("md"), &FormatHints::default()).unwrap();

        let summary = manager.get_document_summary("doc").unwrap();
        assert_eq!(summary.index.chunk_count, chunks.len());
        assert_eq!(summary.index.file_type, "md");
        assert_eq!(summary.sections, vec!["First".to_string(), "Second".to_string()]);
        assert_eq!(
            summary.quality.high + summary.quality.medium + summary.quality.low,
            chunks.len()
        );
        assert!(summary.size_stats.min <= summary.size_stats.median);
        assert!(summary.size_stats.median <= summary.size_stats.max);
        assert!(manager.get_document_summary("missing").is_none());
    }

    #[test]
    fn test_statistics_and_clear() {
        let manager = manager();
        let a = manager
            .chunk_document(&document(&["alpha", "beta", "gamma"]), "a", Some("md"), &FormatHints::default())
            .unwrap();
        let b = manager
            .chunk_document("id,name\n1,first row of data\n2,second row of data", "b", Some("csv"), &FormatHints::default())
            .unwrap();

        let stats = manager.get_chunking_statistics();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_chunks, a.len() + b.len());
        assert_eq!(stats.file_types.get("csv"), Some(&1));
        assert_eq!(stats.file_types.get("md"), Some(&1));
        assert!(stats.chunk_types.get(&ChunkType::Table).is_some());

        assert!(manager.clear_document("a"));
        assert!(!manager.clear_document("a"));
        assert!(manager.get_chunks("a").is_empty());
        let stats = manager.get_chunking_statistics();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_chunks, b.len());

        manager.clear_all();
        assert_eq!(manager.get_chunking_statistics(), ChunkingStatistics::default());
    }

    #[test]
    fn test_export_json_round_trip() {
        let manager = manager();
        let chunks = manager
            .chunk_document(&document(&["alpha", "beta", "gamma", "delta"]), "doc", None, &FormatHints::default())
            .unwrap();

        let json = manager.export_chunks("doc", "JSON").unwrap();
        let export: ChunkExport = serde_json::from_str(&json).unwrap();
        assert_eq!(export.document_id, "doc");
        assert_eq!(export.chunk_count, chunks.len());
        assert_eq!(export.chunks, chunks);
    }

    #[test]
    fn test_export_text_and_unsupported() {
        let manager = manager();
        manager
            .chunk_document(&document(&["alpha", "beta"]), "doc", None, &FormatHints::default())
            .unwrap();

        let text = manager.export_chunks("doc", "txt").unwrap();
        assert!(text.starts_with("Document: doc ("));
        assert!(text.contains("alpha paragraph"));

        let err = manager.export_chunks("doc", "xml").unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ref f) if f == "xml"));
        assert!(err.to_string().contains("xml"));
    }

    fn assert_linked(chunks: &[DocumentChunk], document_id: &str) {
        assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.document_id, document_id);
            assert_eq!(chunk.metadata.chunk_index, i);
            let previous = i.checked_sub(1).map(|p| chunks[p].metadata.chunk_id.clone());
            let next = chunks.get(i + 1).map(|n| n.metadata.chunk_id.clone());
            assert_eq!(chunk.metadata.previous_chunk_id, previous);
            assert_eq!(chunk.metadata.next_chunk_id, next);
        }
    }

    #[test]
    fn test_concurrent_registration_is_atomic() {
        let long = long_document();
        let short = document(&["north", "south", "east", "west", "up", "down"]);
        let other = document(&["red", "green", "blue", "cyan", "magenta", "yellow"]);
        let hints = FormatHints::default();

        // Both versions of "a", computed up front
        let reference = manager();
        let long_chunks = reference.chunk_document(&long, "a", None, &hints).unwrap();
        let short_chunks = reference.chunk_document(&short, "a", None, &hints).unwrap();
        assert_ne!(long_chunks.len(), short_chunks.len());

        let manager = manager();
        manager.chunk_document(&long, "a", None, &hints).unwrap();
        let b_before = manager.chunk_document(&other, "b", None, &hints).unwrap();
        let only_a = SearchOptions {
            document_id: Some("a".to_string()),
            ..Default::default()
        };

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200 {
                    let text = if i % 2 == 0 { &short } else { &long };
                    manager.chunk_document(text, "a", None, &hints).unwrap();
                }
            });

            for _ in 0..2000 {
                let chunks = manager.get_chunks("a");
                assert_linked(&chunks, "a");
                assert!(chunks == long_chunks || chunks == short_chunks);

                // Every hit of one search comes from a single registration
                let hits = manager.search_chunks("paragraph", &only_a);
                let version = if hits.len() == long_chunks.len() {
                    &long_chunks
                } else {
                    &short_chunks
                };
                assert_eq!(hits.len(), version.len());
                for (hit, expected) in hits.iter().zip(version.iter()) {
                    assert_eq!(&hit.chunk, expected);
                }

                assert_eq!(manager.get_chunks("b").len(), b_before.len());
            }
        });

        assert_eq!(manager.get_chunks("b"), b_before);
        assert_linked(&manager.get_chunks("a"), "a");
    }
}
