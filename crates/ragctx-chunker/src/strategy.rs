//! Strategy selection and dispatch.

use ragctx_core::{ChunkError, ChunkingConfig, DocumentChunk, FormatHints};
use std::fmt;
use tracing::debug;

use crate::builder::build_chunk;
use crate::link::link_sequence;
use crate::text::normalize_file_type;
use crate::{page, rows, section, semantic};

/// The chunking strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkStrategy {
    /// Heading sections packed by paragraph (default)
    Semantic,
    /// Lines grouped by page (PDF)
    PageOriented,
    /// Explicit section records (DOC/DOCX)
    SectionOriented,
    /// Header plus row batches (CSV)
    RowOriented,
}

impl ChunkStrategy {
    /// Strategy for a file type or file name. Total: unknown or missing
    /// types, and formats whose `*_respect_*` flag is off, map to
    /// [`ChunkStrategy::Semantic`].
    #[must_use]
    pub fn for_file_type(file_type: Option<&str>, config: &ChunkingConfig) -> Self {
        let Some(file_type) = file_type else {
            return Self::Semantic;
        };
        match normalize_file_type(file_type).as_str() {
            "pdf" if config.pdf_respect_pages => Self::PageOriented,
            "doc" | "docx" if config.docx_respect_sections => Self::SectionOriented,
            "csv" if config.csv_chunk_by_rows => Self::RowOriented,
            _ => Self::Semantic,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::PageOriented => "page",
            Self::SectionOriented => "section",
            Self::RowOriented => "row",
        }
    }

    /// Segment `text` into an ordered, linked chunk sequence.
    ///
    /// Page and section strategies delegate to semantic chunking when their
    /// hints are absent or empty. Chunks are not filtered or scored here.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidHints`] for malformed page breaks or
    /// section records.
    pub fn segment(
        &self,
        text: &str,
        document_id: &str,
        hints: &FormatHints,
        config: &ChunkingConfig,
    ) -> Result<Vec<DocumentChunk>, ChunkError> {
        let has_sections = hints.sections.as_ref().is_some_and(|s| !s.is_empty());
        if text.trim().is_empty() && !(*self == Self::SectionOriented && has_sections) {
            return Ok(vec![]);
        }

        debug!("{} chunking {} bytes for {}", self.name(), text.len(), document_id);

        let drafts = match self {
            Self::PageOriented => match hints.page_breaks.as_deref() {
                Some(breaks) if !breaks.is_empty() => page::segment(text, breaks, config)?,
                _ => semantic::segment(text, config),
            },
            Self::SectionOriented => match hints.sections.as_deref() {
                Some(sections) if has_sections => section::segment(text, sections, config)?,
                _ => semantic::segment(text, config),
            },
            Self::RowOriented => rows::segment(text, config),
            Self::Semantic => semantic::segment(text, config),
        };

        let mut chunks: Vec<DocumentChunk> = drafts
            .into_iter()
            .map(|draft| build_chunk(draft, document_id, config))
            .collect();
        link_sequence(&mut chunks, config);

        debug!("{} produced {} chunks for {}", self.name(), chunks.len(), document_id);
        Ok(chunks)
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
