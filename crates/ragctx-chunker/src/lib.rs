//! Document chunking strategies for ragctx.
//!
//! [`ChunkStrategy`] selects one of four strategies from a file type and
//! turns text into an ordered, linked sequence of [`DocumentChunk`]s:
//!
//! - semantic: markdown heading sections packed by paragraph, sentence or
//!   sliding window
//! - page-oriented: lines grouped by page using `page_breaks` hints
//! - section-oriented: explicit section records
//! - row-oriented: CSV header plus row batches
//!
//! Every strategy ends with [`link_sequence`], the shared overlap-and-link
//! pass. Scoring and filtering happen in the index crate.
//!
//! [`DocumentChunk`]: ragctx_core::DocumentChunk

mod builder;
pub mod classify;
pub mod extract;
pub mod link;
mod packing;
mod page;
mod rows;
mod section;
mod semantic;
pub mod strategy;
pub mod text;
mod window;

pub use builder::fallback_chunk;
pub use classify::classify;
pub use link::{chunk_id, link_sequence};
pub use strategy::ChunkStrategy;
