//! Turning strategy output into [`DocumentChunk`]s.

use ragctx_core::{ChunkMetadata, ChunkType, ChunkingConfig, DocumentChunk};

use crate::classify::classify;
use crate::extract::{extract_entities, extract_keywords, extract_references};
use crate::link::chunk_id;
use crate::packing::Span;
use crate::text::{char_len, normalize_file_type, sentence_ranges};

/// A chunk as produced by a strategy, before metadata is derived.
#[derive(Debug, Clone, Default)]
pub(crate) struct Draft {
    pub content: String,
    pub start: usize,
    pub end: usize,
    pub section_title: Option<String>,
    pub heading_level: Option<u8>,
    pub page_number: Option<u32>,
    /// Forced type; classified from content when absent
    pub chunk_type: Option<ChunkType>,
}

impl Draft {
    pub fn from_span(span: Span) -> Self {
        Self {
            content: span.text,
            start: span.start,
            end: span.end,
            page_number: span.page,
            ..Default::default()
        }
    }

    pub fn titled(mut self, title: Option<&str>, level: Option<u8>) -> Self {
        self.section_title = title.map(str::to_string);
        self.heading_level = level;
        self
    }
}

/// Derive counts, type and extraction results for a draft.
pub(crate) fn build_chunk(draft: Draft, document_id: &str, config: &ChunkingConfig) -> DocumentChunk {
    let chunk_type = draft
        .chunk_type
        .unwrap_or_else(|| classify(&draft.content, config));

    let mut metadata = ChunkMetadata::new(document_id, chunk_type, &config.language);
    metadata.start_position = draft.start;
    metadata.end_position = draft.end;
    metadata.page_number = draft.page_number;
    metadata.section_title = draft.section_title;
    metadata.heading_level = draft.heading_level;
    fill_content_metadata(&mut metadata, &draft.content, config);

    DocumentChunk {
        content: draft.content,
        metadata,
        overlap_content: None,
    }
}

fn fill_content_metadata(metadata: &mut ChunkMetadata, content: &str, config: &ChunkingConfig) {
    metadata.word_count = content.split_whitespace().count();
    metadata.character_count = char_len(content);
    metadata.sentence_count = sentence_ranges(content).len();
    if config.enable_entity_extraction {
        metadata.entities = extract_entities(content);
    }
    if config.enable_reference_tracking {
        metadata.references = extract_references(content);
    }
    if config.enable_semantic_analysis {
        metadata.keywords = extract_keywords(content);
    }
}

/// A single chunk spanning the whole (trimmed) document, used when chunking
/// fails or leaves nothing usable. Typed `table` for CSV input, `text`
/// otherwise. Returns `None` for blank content.
#[must_use]
pub fn fallback_chunk(
    content: &str,
    document_id: &str,
    file_type: Option<&str>,
    config: &ChunkingConfig,
) -> Option<DocumentChunk> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let chunk_type = match file_type.map(normalize_file_type).as_deref() {
        Some("csv") => ChunkType::Table,
        _ => ChunkType::Text,
    };
    let start = content.len() - content.trim_start().len();

    let mut metadata = ChunkMetadata::new(document_id, chunk_type, &config.language);
    metadata.chunk_id = chunk_id(document_id, 0, trimmed);
    metadata.start_position = start;
    metadata.end_position = start + trimmed.len();
    metadata.is_fallback = true;
    fill_content_metadata(&mut metadata, trimmed, config);

    Some(DocumentChunk {
        content: trimmed.to_string(),
        metadata,
        overlap_content: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chunk_derives_metadata() {
        let draft = Draft {
            content: "Contact ops@example.com before 2024-01-31. See section 2.".to_string(),
            start: 10,
            end: 66,
            ..Default::default()
        }
        .titled(Some("Support"), Some(2));
        let chunk = build_chunk(draft, "doc-1", &ChunkingConfig::default());

        assert_eq!(chunk.metadata.document_id, "doc-1");
        assert_eq!(chunk.metadata.chunk_type, ChunkType::Paragraph);
        assert_eq!(chunk.metadata.section_title.as_deref(), Some("Support"));
        assert_eq!(chunk.metadata.heading_level, Some(2));
        assert_eq!(chunk.metadata.start_position, 10);
        assert_eq!(chunk.metadata.word_count, 7);
        assert_eq!(chunk.metadata.sentence_count, 2);
        assert_eq!(chunk.metadata.entities.len(), 2);
        assert_eq!(chunk.metadata.references, vec!["See section 2".to_string()]);
        assert_eq!(chunk.metadata.language, "en");
        assert!(!chunk.metadata.is_fallback);
    }

    #[test]
    fn test_build_chunk_respects_feature_toggles() {
        let config = ChunkingConfig {
            enable_entity_extraction: false,
            enable_reference_tracking: false,
            enable_semantic_analysis: false,
            ..Default::default()
        };
        let draft = Draft {
            content: "Mail ops@example.com, see section 2 [1].".to_string(),
            ..Default::default()
        };
        let chunk = build_chunk(draft, "doc", &config);
        assert!(chunk.metadata.entities.is_empty());
        assert!(chunk.metadata.references.is_empty());
        assert!(chunk.metadata.keywords.is_empty());
    }

    #[test]
    fn test_build_chunk_forced_type() {
        let draft = Draft {
            content: "plain words".to_string(),
            chunk_type: Some(ChunkType::Table),
            ..Default::default()
        };
        let chunk = build_chunk(draft, "doc", &ChunkingConfig::default());
        assert_eq!(chunk.metadata.chunk_type, ChunkType::Table);
    }

    #[test]
    fn test_fallback_chunk() {
        let config = ChunkingConfig::default();
        let chunk = fallback_chunk("  short text  ", "doc", Some("txt"), &config).unwrap();
        assert_eq!(chunk.content, "short text");
        assert_eq!(chunk.metadata.chunk_type, ChunkType::Text);
        assert_eq!(chunk.metadata.chunk_index, 0);
        assert_eq!(chunk.metadata.start_position, 2);
        assert_eq!(chunk.metadata.end_position, 12);
        assert!(chunk.metadata.is_fallback);
        assert!(chunk.metadata.previous_chunk_id.is_none());
        assert!(chunk.metadata.next_chunk_id.is_none());
        assert!(chunk.metadata.chunk_id.starts_with("doc_chunk_0_"));

        let csv = fallback_chunk("a,b\n1,2", "doc", Some("data.CSV"), &config).unwrap();
        assert_eq!(csv.metadata.chunk_type, ChunkType::Table);

        assert!(fallback_chunk(" \n ", "doc", None, &config).is_none());
    }
}
