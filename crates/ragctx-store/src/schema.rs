//! Row encoding for persisted chunks.
//!
//! The chunk row's `metadata` column holds the JSON form of the full
//! [`ChunkMetadata`] together with the overlap content, so a stored row
//! decodes back into the same [`DocumentChunk`].

use ragctx_core::{ChunkMetadata, ChunkRow, DocumentChunk, StoreError};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct StoredMetadataRef<'a> {
    metadata: &'a ChunkMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlap_content: Option<&'a str>,
}

#[derive(Deserialize)]
struct StoredMetadata {
    metadata: ChunkMetadata,
    #[serde(default)]
    overlap_content: Option<String>,
}

/// Encode a chunk as a storage row.
///
/// # Errors
///
/// Returns [`StoreError::Encoding`] if the metadata cannot be serialized.
pub fn chunk_to_row(chunk: &DocumentChunk) -> Result<ChunkRow, StoreError> {
    let stored = StoredMetadataRef {
        metadata: &chunk.metadata,
        overlap_content: chunk.overlap_content.as_deref(),
    };
    let metadata =
        serde_json::to_string(&stored).map_err(|e| StoreError::Encoding(e.to_string()))?;

    Ok(ChunkRow {
        id: chunk.metadata.chunk_id.clone(),
        document_id: chunk.metadata.document_id.clone(),
        content: chunk.content.clone(),
        chunk_index: chunk.metadata.chunk_index,
        metadata,
    })
}

/// Decode a storage row. The row's id, document id and index take
/// precedence over the values inside the metadata JSON.
///
/// # Errors
///
/// Returns [`StoreError::Encoding`] if the metadata column is not valid.
pub fn row_to_chunk(row: &ChunkRow) -> Result<DocumentChunk, StoreError> {
    let stored: StoredMetadata = serde_json::from_str(&row.metadata)
        .map_err(|e| StoreError::Encoding(format!("chunk {}: {e}", row.id)))?;

    let mut metadata = stored.metadata;
    metadata.chunk_id.clone_from(&row.id);
    metadata.document_id.clone_from(&row.document_id);
    metadata.chunk_index = row.chunk_index;

    Ok(DocumentChunk {
        content: row.content.clone(),
        metadata,
        overlap_content: stored.overlap_content,
    })
}
