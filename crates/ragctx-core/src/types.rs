//! Core types for ragctx.
//!
//! ## Chunks
//! - [`DocumentChunk`]: A segment of document text with its metadata
//! - [`ChunkMetadata`]: Structural and quality attributes of a chunk
//! - [`ChunkType`]: Structural classification of chunk content
//! - [`Entity`]: A date, URL or email found in a chunk
//!
//! ## Chunking input
//! - [`FormatHints`]: Page breaks or section records supplied by text extraction
//!
//! ## Index and statistics
//! - [`DocumentIndexEntry`]: Aggregate statistics for one document
//! - [`DocumentSummary`] / [`ChunkingStatistics`]: Query-side reports
//!
//! ## Search
//! - [`SearchOptions`]: Filters for lexical chunk search
//! - [`SearchHit`]: A matching chunk with its relevance score
//!
//! ## Storage rows
//! - [`DocumentRecord`] / [`ChunkRow`]: Shapes persisted through a
//!   [`DocumentStore`](crate::DocumentStore)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Lowest confidence a chunk can carry.
pub const MIN_CONFIDENCE: f64 = 0.1;
/// Highest confidence a chunk can carry.
pub const MAX_CONFIDENCE: f64 = 1.0;

// ============================================================================
// Chunks
// ============================================================================

/// Structural classification of a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    #[default]
    Text,
    Heading,
    Paragraph,
    List,
    Table,
    Image,
    Code,
    Metadata,
    Reference,
}

impl ChunkType {
    /// String representation (matches serialization format)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::List => "list",
            Self::Table => "table",
            Self::Image => "image",
            Self::Code => "code",
            Self::Metadata => "metadata",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "heading" => Ok(Self::Heading),
            "paragraph" => Ok(Self::Paragraph),
            "list" => Ok(Self::List),
            "table" => Ok(Self::Table),
            "image" => Ok(Self::Image),
            "code" => Ok(Self::Code),
            "metadata" => Ok(Self::Metadata),
            "reference" => Ok(Self::Reference),
            other => Err(format!("unknown chunk type: {other}")),
        }
    }
}

/// Kind of extracted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Date,
    Url,
    Email,
}

/// An entity found in chunk content. `start`/`end` are byte offsets into the
/// chunk content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Metadata attached to every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Deterministic identifier: `{document_id}_chunk_{index}_{hash8}`
    pub chunk_id: String,
    /// Owning document
    pub document_id: String,
    /// Structural classification
    pub chunk_type: ChunkType,
    /// Position in the document's chunk sequence (0-indexed, contiguous)
    pub chunk_index: usize,
    /// Byte offset of the chunk start in the source text
    pub start_position: usize,
    /// Byte offset of the chunk end in the source text
    pub end_position: usize,
    /// Page number (1-indexed) for page-oriented chunks
    pub page_number: Option<u32>,
    /// Nearest heading or section title
    pub section_title: Option<String>,
    /// Heading level of `section_title`
    pub heading_level: Option<u8>,
    /// Language tag
    pub language: String,
    /// Quality estimate in `[0.1, 1.0]`
    pub confidence_score: f64,
    /// Logical link to the previous chunk
    pub previous_chunk_id: Option<String>,
    /// Logical link to the next chunk
    pub next_chunk_id: Option<String>,
    pub word_count: usize,
    pub character_count: usize,
    pub sentence_count: usize,
    /// Citation-like strings found in the content
    #[serde(default)]
    pub references: Vec<String>,
    /// Dates, URLs and emails found in the content
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Most frequent content terms
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Set on the single whole-document chunk used when chunking fails or
    /// yields nothing usable
    #[serde(default)]
    pub is_fallback: bool,
}

impl ChunkMetadata {
    /// Metadata with empty links, counts and extraction results.
    #[must_use]
    pub fn new(document_id: &str, chunk_type: ChunkType, language: &str) -> Self {
        Self {
            chunk_id: String::new(),
            document_id: document_id.to_string(),
            chunk_type,
            chunk_index: 0,
            start_position: 0,
            end_position: 0,
            page_number: None,
            section_title: None,
            heading_level: None,
            language: language.to_string(),
            confidence_score: MAX_CONFIDENCE,
            previous_chunk_id: None,
            next_chunk_id: None,
            word_count: 0,
            character_count: 0,
            sentence_count: 0,
            references: Vec::new(),
            entities: Vec::new(),
            keywords: Vec::new(),
            is_fallback: false,
        }
    }
}

/// A chunk of document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The chunk text
    pub content: String,
    /// Structural and quality attributes
    pub metadata: ChunkMetadata,
    /// Trailing text of the previous chunk, for local reading context only
    pub overlap_content: Option<String>,
}

impl DocumentChunk {
    /// Content preceded by the overlap content, when there is any.
    #[must_use]
    pub fn effective_content(&self) -> String {
        match &self.overlap_content {
            Some(overlap) if !overlap.is_empty() => format!("{overlap}\n{}", self.content),
            _ => self.content.clone(),
        }
    }

    /// Chunk length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

// ============================================================================
// Format hints
// ============================================================================

/// A section record supplied by the text extraction layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHint {
    pub title: String,
    pub content: String,
}

/// Optional structure hints accompanying decoded text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatHints {
    /// Line indices (0-based, ascending) at which a new page starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_breaks: Option<Vec<usize>>,
    /// Ordered section records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SectionHint>>,
}

impl FormatHints {
    /// Hints carrying page break positions.
    #[must_use]
    pub fn with_page_breaks(page_breaks: Vec<usize>) -> Self {
        Self {
            page_breaks: Some(page_breaks),
            sections: None,
        }
    }

    /// Hints carrying section records.
    #[must_use]
    pub fn with_sections(sections: Vec<SectionHint>) -> Self {
        Self {
            page_breaks: None,
            sections: Some(sections),
        }
    }
}

// ============================================================================
// Document index and statistics
// ============================================================================

/// Aggregate statistics kept for each registered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentIndexEntry {
    pub chunk_count: usize,
    pub total_words: usize,
    pub total_characters: usize,
    pub chunk_types: BTreeMap<ChunkType, usize>,
    pub average_chunk_size: f64,
    pub average_confidence: f64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

/// Min, max and median of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeStats {
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl SizeStats {
    /// Compute stats over a series; all zero when the series is empty.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median,
        }
    }
}

/// Chunk counts per confidence bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDistribution {
    /// Confidence >= 0.8
    pub high: usize,
    /// Confidence >= 0.6
    pub medium: usize,
    /// Everything else
    pub low: usize,
}

impl QualityDistribution {
    /// Count one confidence score into its bucket.
    pub fn record(&mut self, confidence: f64) {
        if confidence >= 0.8 {
            self.high += 1;
        } else if confidence >= 0.6 {
            self.medium += 1;
        } else {
            self.low += 1;
        }
    }
}

/// Report for a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub index: DocumentIndexEntry,
    pub size_stats: SizeStats,
    pub confidence_stats: SizeStats,
    pub quality: QualityDistribution,
    pub sections: Vec<String>,
}

/// Report across all registered documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkingStatistics {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub total_words: usize,
    pub total_characters: usize,
    pub average_chunk_size: f64,
    pub average_confidence: f64,
    pub size_stats: SizeStats,
    pub confidence_stats: SizeStats,
    pub chunk_types: BTreeMap<ChunkType, usize>,
    pub file_types: BTreeMap<String, usize>,
    pub quality: QualityDistribution,
}

// ============================================================================
// Search
// ============================================================================

/// Filters for lexical chunk search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Restrict to one document
    pub document_id: Option<String>,
    /// Restrict to one chunk type
    pub chunk_type: Option<ChunkType>,
    /// Skip chunks below this confidence
    pub min_confidence: f64,
    /// Truncate the ranked list
    pub limit: Option<usize>,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: DocumentChunk,
    /// Relevance in `(0, 1]`
    pub score: f64,
}

// ============================================================================
// Storage rows
// ============================================================================

/// A persisted document row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
    /// Declared file type (`pdf`, `csv`, ...)
    pub doc_type: String,
}

/// A persisted chunk row. `metadata` is the JSON form of [`ChunkMetadata`]
/// plus the overlap content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: String,
}

/// Storage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: u64,
    pub total_chunks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_type_string_round_trip() {
        for chunk_type in [
            ChunkType::Text,
            ChunkType::Heading,
            ChunkType::Paragraph,
            ChunkType::List,
            ChunkType::Table,
            ChunkType::Image,
            ChunkType::Code,
            ChunkType::Metadata,
            ChunkType::Reference,
        ] {
            assert_eq!(chunk_type.as_str().parse::<ChunkType>(), Ok(chunk_type));
            let json = serde_json::to_string(&chunk_type).unwrap();
            assert_eq!(json, format!("\"{}\"", chunk_type.as_str()));
        }
        assert!("video".parse::<ChunkType>().is_err());
    }

    #[test]
    fn test_effective_content_with_overlap() {
        let mut chunk = DocumentChunk {
            content: "second part".to_string(),
            metadata: ChunkMetadata::new("doc", ChunkType::Text, "en"),
            overlap_content: Some("end of first".to_string()),
        };
        assert_eq!(chunk.effective_content(), "end of first\nsecond part");

        chunk.overlap_content = None;
        assert_eq!(chunk.effective_content(), "second part");
    }

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        let chunk = DocumentChunk {
            content: "héllo".to_string(),
            metadata: ChunkMetadata::new("doc", ChunkType::Text, "en"),
            overlap_content: None,
        };
        assert_eq!(chunk.char_len(), 5);
    }

    #[test]
    fn test_size_stats() {
        let stats = SizeStats::from_values(&[3.0, 1.0, 2.0]);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.median, 2.0);

        let stats = SizeStats::from_values(&[4.0, 1.0, 2.0, 3.0]);
        assert_eq!(stats.median, 2.5);

        assert_eq!(SizeStats::from_values(&[]), SizeStats::default());
    }

    #[test]
    fn test_quality_distribution_buckets() {
        let mut quality = QualityDistribution::default();
        for score in [1.0, 0.8, 0.79, 0.6, 0.59, 0.1] {
            quality.record(score);
        }
        assert_eq!(quality.high, 2);
        assert_eq!(quality.medium, 2);
        assert_eq!(quality.low, 2);
    }

    #[test]
    fn test_format_hints_deserialize_from_map() {
        let hints: FormatHints = serde_json::from_str(
            r#"{"sections": [{"title": "Intro", "content": "Body text"}]}"#,
        )
        .unwrap();
        assert!(hints.page_breaks.is_none());
        assert_eq!(hints.sections.unwrap()[0].title, "Intro");

        let hints: FormatHints = serde_json::from_str("{}").unwrap();
        assert_eq!(hints, FormatHints::default());
    }

    #[test]
    fn test_metadata_serialization_round_trip() {
        let mut metadata = ChunkMetadata::new("doc-1", ChunkType::Reference, "en");
        metadata.chunk_id = "doc-1_chunk_0_abcdef12".to_string();
        metadata.page_number = Some(3);
        metadata.section_title = Some("Methods".to_string());
        metadata.references = vec!["[1]".to_string()];
        metadata.entities = vec![Entity {
            entity_type: EntityType::Email,
            text: "a@b.io".to_string(),
            start: 0,
            end: 6,
        }];

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"chunk_type\":\"reference\""));
        let parsed: ChunkMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }
}
