//! Chunk registry and ingestion pipeline for ragctx.
//!
//! # Components
//!
//! - [`ChunkManager`]: chunks documents, scores and links the result, and
//!   answers lookups, context windows, lexical search, summaries,
//!   statistics and exports from its registry
//! - [`DocumentIngestor`]: persists documents and chunk rows through a
//!   [`DocumentStore`](ragctx_core::DocumentStore), falling back to a single
//!   chunk when chunking fails
//! - [`score_confidence`]: the chunk quality heuristic
//!
//! # Example
//!
//! ```rust,ignore
//! use ragctx_index::{ChunkManager, DocumentIngestor, NewDocument};
//! use ragctx_store::MemoryStore;
//!
//! let manager = Arc::new(ChunkManager::new(ChunkingConfig::default())?);
//! let ingestor = DocumentIngestor::new(manager.clone(), Arc::new(MemoryStore::new()));
//!
//! let report = ingestor
//!     .ingest(NewDocument::new("Guide", text).with_file_type("md"))
//!     .await?;
//! let hits = manager.search_chunks("ownership", &SearchOptions::default());
//! ```

pub mod ingest;
pub mod manager;
pub mod scoring;

pub use ingest::{document_id, DocumentIngestor, IngestReport, IngestUpdate, NewDocument};
pub use manager::{ChunkExport, ChunkManager, DEFAULT_FILE_TYPE};
pub use scoring::score_confidence;
