//! The overlap-and-link pass shared by every strategy.
//!
//! Given a final chunk sequence, assigns contiguous indices, derives chunk ids,
//! attaches overlap content from the previous chunk and sets the
//! previous/next links. Running it twice gives the same result.

use ragctx_core::{ChunkingConfig, DocumentChunk};

use crate::text::{char_len, tail_chars};

/// Deterministic chunk id: `{document_id}_chunk_{index}_{hash8}`.
#[must_use]
pub fn chunk_id(document_id: &str, index: usize, content: &str) -> String {
    let hash = blake3::hash(content.as_bytes());
    format!("{document_id}_chunk_{index}_{}", &hash.to_hex()[..8])
}

/// Trailing slice of `previous`, at most `min(overlap_size, len / 4)`
/// characters. `None` when that bound is zero or the slice is blank.
#[must_use]
pub fn overlap_tail(previous: &str, overlap_size: usize) -> Option<String> {
    let take = overlap_size.min(char_len(previous) / 4);
    if take == 0 {
        return None;
    }
    let tail = tail_chars(previous, take).trim_start();
    (!tail.is_empty()).then(|| tail.to_string())
}

/// Re-index and re-link a document's chunk sequence in place.
pub fn link_sequence(chunks: &mut [DocumentChunk], config: &ChunkingConfig) {
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.metadata.chunk_index = index;
        chunk.metadata.chunk_id = chunk_id(&chunk.metadata.document_id, index, &chunk.content);
    }

    for index in 0..chunks.len() {
        let previous = index
            .checked_sub(1)
            .and_then(|i| chunks.get(i))
            .map(|prev| (prev.metadata.chunk_id.clone(), overlap_tail(&prev.content, config.overlap_size)));
        let next = chunks.get(index + 1).map(|next| next.metadata.chunk_id.clone());

        let chunk = &mut chunks[index];
        match previous {
            Some((id, overlap)) => {
                chunk.metadata.previous_chunk_id = Some(id);
                chunk.overlap_content = overlap;
            }
            None => {
                chunk.metadata.previous_chunk_id = None;
                chunk.overlap_content = None;
            }
        }
        chunk.metadata.next_chunk_id = next;
    }
}
