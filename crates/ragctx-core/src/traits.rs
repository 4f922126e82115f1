//! Core traits for ragctx components.
//!
//! - [`DocumentStore`]: Durable storage for document and chunk rows
//!
//! Chunking itself is not a trait: strategies form a closed set, see
//! `ragctx_chunker::ChunkStrategy`.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{ChunkRow, DocumentRecord, StoreStats};

// ============================================================================
// Storage
// ============================================================================

/// Storage for documents and their chunk rows.
///
/// Chunk rows of one document are written as a batch: after
/// [`replace_chunks`](DocumentStore::replace_chunks) either every row of the
/// batch is visible or none is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Initialize the store.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert or update a document row.
    async fn upsert_document(&self, record: &DocumentRecord) -> Result<(), StoreError>;

    /// Get a document row.
    async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>, StoreError>;

    /// Get all document rows.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError>;

    /// Replace every chunk row of a document with `rows`, all or nothing.
    async fn replace_chunks(&self, document_id: &str, rows: &[ChunkRow])
        -> Result<(), StoreError>;

    /// Get the chunk rows of a document, ordered by chunk index.
    async fn get_chunks(&self, document_id: &str) -> Result<Vec<ChunkRow>, StoreError>;

    /// Delete the chunk rows of a document. Returns the number removed.
    async fn delete_chunks(&self, document_id: &str) -> Result<u64, StoreError>;

    /// Delete a document row. Returns whether a row existed.
    async fn delete_document(&self, id: &str) -> Result<bool, StoreError>;

    /// Case-insensitive substring search over document titles and content.
    async fn search_documents(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, StoreError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
