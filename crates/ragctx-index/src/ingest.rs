//! Document ingestion: the bridge between the chunk manager and storage.
//!
//! [`DocumentIngestor`] persists the document row, chunks the content,
//! absorbs chunking failures with a single fallback chunk and writes all
//! chunk rows in one batch. Progress is broadcast as [`IngestUpdate`]s.

use chrono::{DateTime, Utc};
use ragctx_chunker::fallback_chunk;
use ragctx_core::{
    DocumentChunk, DocumentRecord, DocumentStore, Error, FormatHints, Result, StoreError,
};
use ragctx_store::schema::{chunk_to_row, row_to_chunk};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::manager::{ChunkManager, DEFAULT_FILE_TYPE};

/// Characters of content hashed into a document id.
const ID_PREFIX_CHARS: usize = 1000;

/// Ingestion events.
#[derive(Debug, Clone)]
pub enum IngestUpdate {
    DocumentIngested { document_id: String, chunk_count: usize },
    FallbackUsed { document_id: String, error: String },
    DocumentRemoved { document_id: String },
    IngestError { document_id: String, error: String },
}

/// A document to ingest.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    /// File type or file name (`pdf`, `report.docx`, ...)
    pub file_type: Option<String>,
    pub hints: FormatHints,
    pub metadata: HashMap<String, String>,
}

impl NewDocument {
    /// A document with a title and content and no hints.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: FormatHints) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunk_count: usize,
    /// Chunking failed and the whole document was stored as one chunk
    pub used_fallback: bool,
}

/// Deterministic document id: the first 16 hex characters of the blake3
/// hash of the first 1000 characters of content and the RFC 3339
/// timestamp.
#[must_use]
pub fn document_id(content: &str, timestamp: &DateTime<Utc>) -> String {
    let prefix: String = content.chars().take(ID_PREFIX_CHARS).collect();
    let mut hasher = blake3::Hasher::new();
    hasher.update(prefix.as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

/// Ingests documents into a [`ChunkManager`] and a [`DocumentStore`].
pub struct DocumentIngestor {
    manager: Arc<ChunkManager>,
    store: Arc<dyn DocumentStore>,
    update_tx: broadcast::Sender<IngestUpdate>,
}

impl DocumentIngestor {
    /// Create an ingestor over a shared manager and store.
    pub fn new(manager: Arc<ChunkManager>, store: Arc<dyn DocumentStore>) -> Self {
        let (update_tx, _) = broadcast::channel(256);
        Self {
            manager,
            store,
            update_tx,
        }
    }

    /// Subscribe to ingestion updates.
    pub fn subscribe(&self) -> broadcast::Receiver<IngestUpdate> {
        self.update_tx.subscribe()
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<ChunkManager> {
        &self.manager
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Ingest a document stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns a store error if the document or chunk rows cannot be written.
    /// Chunking failures never fail ingestion.
    pub async fn ingest(&self, document: NewDocument) -> Result<IngestReport> {
        self.ingest_at(document, Utc::now()).await
    }

    /// Ingest a document with an explicit ingestion timestamp.
    ///
    /// # Errors
    ///
    /// Returns a store error if the document or chunk rows cannot be written.
    /// If the chunk batch fails, the document row and registry entry are
    /// removed again.
    pub async fn ingest_at(
        &self,
        document: NewDocument,
        timestamp: DateTime<Utc>,
    ) -> Result<IngestReport> {
        let id = document_id(&document.content, &timestamp);
        let file_type = document.file_type.as_deref();
        debug!("Ingesting {:?} as {}", document.title, id);

        let record = DocumentRecord {
            id: id.clone(),
            title: document.title.clone(),
            content: document.content.clone(),
            metadata: document.metadata.clone(),
            timestamp,
            doc_type: file_type.map_or_else(
                || DEFAULT_FILE_TYPE.to_string(),
                ragctx_chunker::text::normalize_file_type,
            ),
        };
        self.store.upsert_document(&record).await.map_err(Error::Store)?;

        let (chunks, used_fallback) =
            match self
                .manager
                .chunk_document(&document.content, &id, file_type, &document.hints)
            {
                Ok(chunks) => (chunks, false),
                Err(e) => {
                    warn!("Chunking failed for {}, storing a single fallback chunk: {}", id, e);
                    let _ = self.update_tx.send(IngestUpdate::FallbackUsed {
                        document_id: id.clone(),
                        error: e.to_string(),
                    });
                    let fallback: Vec<_> =
                        fallback_chunk(&document.content, &id, file_type, self.manager.config())
                            .into_iter()
                            .collect();
                    (self.manager.register_chunks(&id, fallback, file_type), true)
                }
            };

        if let Err(e) = self.write_chunks(&id, &chunks).await {
            error!("Failed to store chunks for {}: {}", id, e);
            self.manager.clear_document(&id);
            if let Err(rollback) = self.store.delete_document(&id).await {
                warn!("Failed to roll back document row {}: {}", id, rollback);
            }
            let _ = self.update_tx.send(IngestUpdate::IngestError {
                document_id: id.clone(),
                error: e.to_string(),
            });
            return Err(Error::Store(e));
        }

        info!("Ingested {} ({} chunks)", id, chunks.len());
        let _ = self.update_tx.send(IngestUpdate::DocumentIngested {
            document_id: id.clone(),
            chunk_count: chunks.len(),
        });

        Ok(IngestReport {
            document_id: id,
            chunk_count: chunks.len(),
            used_fallback,
        })
    }

    async fn write_chunks(
        &self,
        document_id: &str,
        chunks: &[DocumentChunk],
    ) -> std::result::Result<(), StoreError> {
        let rows = chunks
            .iter()
            .map(chunk_to_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store.replace_chunks(document_id, &rows).await
    }

    /// Delete a document's chunk rows, its document row and its
    /// registration. Returns whether any row was removed.
    ///
    /// # Errors
    ///
    /// Returns a store error if a delete fails.
    pub async fn delete_document(&self, document_id: &str) -> Result<bool> {
        let chunks = self.store.delete_chunks(document_id).await?;
        let existed = self.store.delete_document(document_id).await?;
        self.manager.clear_document(document_id);

        let removed = chunks > 0 || existed;
        if removed {
            info!("Deleted {} ({} chunk rows)", document_id, chunks);
            let _ = self.update_tx.send(IngestUpdate::DocumentRemoved {
                document_id: document_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Load every stored document's chunks back into the manager. Returns
    /// the number of documents restored.
    ///
    /// # Errors
    ///
    /// Returns a store error if rows cannot be read or decoded.
    pub async fn restore(&self) -> Result<usize> {
        let documents = self.store.list_documents().await?;
        for document in &documents {
            let rows = self.store.get_chunks(&document.id).await?;
            let chunks = rows
                .iter()
                .map(row_to_chunk)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            self.manager
                .register_chunks(&document.id, chunks, Some(&document.doc_type));
        }
        info!("Restored {} documents", documents.len());
        Ok(documents.len())
    }
}
