//! Section-oriented strategy for documents with explicit section records,
//! such as extracted DOCX text.

use ragctx_core::{ChunkError, ChunkingConfig, SectionHint};

use crate::builder::Draft;
use crate::semantic::pack_body;

/// Pack each section body with the semantic packer and tag it with the
/// section title. Positions refer to `text` when the section body can be
/// found there; otherwise they run on from the previous section.
pub(crate) fn segment(
    text: &str,
    sections: &[SectionHint],
    config: &ChunkingConfig,
) -> Result<Vec<Draft>, ChunkError> {
    if sections.iter().all(|s| s.content.trim().is_empty()) {
        return Err(ChunkError::InvalidHints(
            "every section hint has empty content".to_string(),
        ));
    }

    let mut drafts = Vec::new();
    let mut cursor = 0;
    for section in sections {
        let body = section.content.as_str();
        let needle = body.trim();
        if needle.is_empty() {
            continue;
        }
        // Base such that `base + offset_in_body` is the document position
        let lead = body.len() - body.trim_start().len();
        let base = match text.get(cursor..).and_then(|rest| rest.find(needle)) {
            Some(found) => (cursor + found).saturating_sub(lead),
            None => cursor,
        };
        cursor = base + lead + needle.len();

        let title = Some(section.title.trim()).filter(|t| !t.is_empty());
        drafts.extend(
            pack_body(body, base, config)
                .into_iter()
                .map(|span| Draft::from_span(span).titled(title, None)),
        );
    }

    Ok(drafts)
}
