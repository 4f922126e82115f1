//! # ragctx-core
//!
//! Core types, configuration and traits for ragctx, a document chunking and
//! context-retrieval engine for retrieval-augmented generation.
//!
//! - **Configuration**: [`ChunkingConfig`], validated once before use
//! - **Chunk model**: [`DocumentChunk`], [`ChunkMetadata`], [`ChunkType`]
//! - **Storage boundary**: [`DocumentStore`] with [`DocumentRecord`] and
//!   [`ChunkRow`] row shapes
//! - **Errors**: [`ConfigError`], [`ChunkError`], [`ExportError`],
//!   [`StoreError`] and the umbrella [`Error`]
//!
//! ## Pipeline
//!
//! ```text
//! text + hints → ChunkStrategy → ChunkManager (filter, score, link, register)
//!                                      ↓                    ↓
//!                               DocumentStore        ContextRetriever
//! ```
//!
//! ## Related Crates
//!
//! - `ragctx-chunker`: Chunking strategies
//! - `ragctx-store`: In-memory document store and row encoding
//! - `ragctx-index`: Chunk manager and ingestion
//! - `ragctx-query`: Context retrieval

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{BoundaryStrategy, ChunkingConfig, ScoringConfig};
pub use error::{ChunkError, ConfigError, Error, ExportError, Result, StoreError};
pub use traits::*;
pub use types::*;
