//! In-memory document store.
//!
//! [`MemoryStore`] keeps document rows and chunk rows in memory behind a
//! single lock, so a document's chunk batch is replaced in one step and
//! readers never see half of it. It backs the CLI and the tests; a
//! persistent engine implements the same [`DocumentStore`] trait.

use async_trait::async_trait;
use ragctx_core::{ChunkRow, DocumentRecord, DocumentStore, StoreError, StoreStats};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    documents: HashMap<String, DocumentRecord>,
    /// Chunk rows per document, ordered by chunk index
    chunks: HashMap<String, Vec<ChunkRow>>,
}

/// In-memory store.
///
/// # Example
///
/// ```rust
/// use ragctx_store::MemoryStore;
/// use ragctx_core::DocumentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.init().await?;
///
/// let stats = store.stats().await?;
/// assert_eq!(stats.total_chunks, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn validate_batch(document_id: &str, rows: &[ChunkRow]) -> Result<(), StoreError> {
    let mut ids = HashSet::with_capacity(rows.len());
    for row in rows {
        if row.document_id != document_id {
            return Err(StoreError::Insert(format!(
                "chunk {} belongs to {}, not {document_id}",
                row.id, row.document_id
            )));
        }
        if !ids.insert(row.id.as_str()) {
            return Err(StoreError::Insert(format!("duplicate chunk id {}", row.id)));
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        debug!("MemoryStore initialized");
        Ok(())
    }

    async fn upsert_document(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.documents.insert(record.id.clone(), record.clone());
        debug!("Upserted document {}", record.id);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.documents.get(id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut documents: Vec<DocumentRecord> = tables.documents.values().cloned().collect();
        documents.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(documents)
    }

    async fn replace_chunks(&self, document_id: &str, rows: &[ChunkRow]) -> Result<(), StoreError> {
        validate_batch(document_id, rows)?;

        let mut tables = self.tables.write().await;
        if !tables.documents.contains_key(document_id) {
            return Err(StoreError::Insert(format!(
                "document {document_id} does not exist"
            )));
        }

        let mut batch = rows.to_vec();
        batch.sort_by_key(|row| row.chunk_index);
        tables.chunks.insert(document_id.to_string(), batch);

        debug!("Stored {} chunk rows for {}", rows.len(), document_id);
        Ok(())
    }

    async fn get_chunks(&self, document_id: &str) -> Result<Vec<ChunkRow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.chunks.get(document_id).cloned().unwrap_or_default())
    }

    async fn delete_chunks(&self, document_id: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let deleted = tables
            .chunks
            .remove(document_id)
            .map_or(0, |rows| rows.len() as u64);
        debug!("Deleted {} chunk rows for {}", deleted, document_id);
        Ok(deleted)
    }

    async fn delete_document(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let existed = tables.documents.remove(id).is_some();
        debug!("Deleted document {} (existed: {})", id, existed);
        Ok(existed)
    }

    async fn search_documents(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let tables = self.tables.read().await;
        let mut matches: Vec<&DocumentRecord> = tables
            .documents
            .values()
            .filter(|doc| {
                doc.title.to_lowercase().contains(&needle)
                    || doc.content.to_lowercase().contains(&needle)
            })
            .collect();

        // Newest first
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(matches.into_iter().take(limit).cloned().collect())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let tables = self.tables.read().await;

        Ok(StoreStats {
            total_documents: tables.documents.len() as u64,
            total_chunks: tables.chunks.values().map(|rows| rows.len() as u64).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn create_test_document(id: &str, title: &str, content: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            metadata: HashMap::new(),
            timestamp: Utc::now(),
            doc_type: "txt".to_string(),
        }
    }

    fn create_test_row(document_id: &str, index: usize) -> ChunkRow {
        ChunkRow {
            id: format!("{document_id}_chunk_{index}"),
            document_id: document_id.to_string(),
            content: format!("chunk {index}"),
            chunk_index: index,
            metadata: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_init() {
        let store = MemoryStore::new();
        store.init().await.unwrap();
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn test_upsert_and_get_document() {
        let store = MemoryStore::new();
        let doc = create_test_document("d1", "Guide", "Body");
        store.upsert_document(&doc).await.unwrap();

        assert_eq!(store.get_document("d1").await.unwrap(), Some(doc));
        assert_eq!(store.get_document("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_chunks_orders_and_replaces() {
        let store = MemoryStore::new();
        store
            .upsert_document(&create_test_document("d1", "Guide", "Body"))
            .await
            .unwrap();

        let rows = vec![create_test_row("d1", 1), create_test_row("d1", 0)];
        store.replace_chunks("d1", &rows).await.unwrap();
        let stored = store.get_chunks("d1").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].chunk_index, 0);

        store
            .replace_chunks("d1", &[create_test_row("d1", 0)])
            .await
            .unwrap();
        assert_eq!(store.get_chunks("d1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_chunks_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .upsert_document(&create_test_document("d1", "Guide", "Body"))
            .await
            .unwrap();
        store
            .replace_chunks("d1", &[create_test_row("d1", 0)])
            .await
            .unwrap();

        // One foreign row fails the whole batch and leaves prior rows intact
        let rows = vec![create_test_row("d1", 0), create_test_row("d2", 1)];
        let result = store.replace_chunks("d1", &rows).await;
        assert!(matches!(result, Err(StoreError::Insert(_))));
        assert_eq!(store.get_chunks("d1").await.unwrap().len(), 1);

        let duplicate = vec![create_test_row("d1", 0), create_test_row("d1", 0)];
        assert!(store.replace_chunks("d1", &duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_replace_chunks_requires_document() {
        let store = MemoryStore::new();
        let result = store.replace_chunks("ghost", &[create_test_row("ghost", 0)]).await;
        assert!(matches!(result, Err(StoreError::Insert(_))));
        assert!(store.get_chunks("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .upsert_document(&create_test_document("d1", "Guide", "Body"))
            .await
            .unwrap();
        store
            .replace_chunks("d1", &[create_test_row("d1", 0), create_test_row("d1", 1)])
            .await
            .unwrap();

        assert_eq!(store.delete_chunks("d1").await.unwrap(), 2);
        assert!(store.delete_document("d1").await.unwrap());
        assert_eq!(store.delete_chunks("d1").await.unwrap(), 0);
        assert!(!store.delete_document("d1").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_documents() {
        let store = MemoryStore::new();
        let mut older = create_test_document("d1", "Rust Guide", "Ownership and borrowing.");
        older.timestamp = Utc::now() - Duration::hours(1);
        let newer = create_test_document("d2", "Notes", "Borrowing rules in practice.");
        let other = create_test_document("d3", "Recipes", "Bread and butter.");
        for doc in [&older, &newer, &other] {
            store.upsert_document(doc).await.unwrap();
        }

        let hits = store.search_documents("BORROWING", 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d1"]);

        let hits = store.search_documents("rust guide", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        assert_eq!(store.search_documents("borrowing", 1).await.unwrap().len(), 1);
        assert!(store.search_documents("  ", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = MemoryStore::new();
        store
            .upsert_document(&create_test_document("d1", "A", "a"))
            .await
            .unwrap();
        store
            .upsert_document(&create_test_document("d2", "B", "b"))
            .await
            .unwrap();
        store
            .replace_chunks("d1", &[create_test_row("d1", 0), create_test_row("d1", 1)])
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_chunks, 2);
    }
}
