//! Storage layer for ragctx.
//!
//! Documents and their chunks are persisted through the
//! [`DocumentStore`](ragctx_core::DocumentStore) trait. This crate provides
//! [`MemoryStore`], an in-memory implementation, and the row encoding in
//! [`schema`] that turns a [`DocumentChunk`](ragctx_core::DocumentChunk)
//! into a storage row and back.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragctx_store::{schema, MemoryStore};
//! use ragctx_core::DocumentStore;
//!
//! let store = MemoryStore::new();
//! store.init().await?;
//!
//! store.upsert_document(&record).await?;
//! let rows = chunks.iter().map(schema::chunk_to_row).collect::<Result<Vec<_>, _>>()?;
//! store.replace_chunks(&record.id, &rows).await?;
//! ```

pub mod memory;
pub mod schema;

pub use memory::MemoryStore;
pub use schema::{chunk_to_row, row_to_chunk};
