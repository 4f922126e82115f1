//! Query parsing and context retrieval for ragctx.
//!
//! [`ContextRetriever::get_relevant_context`] answers a query with labelled
//! excerpts taken from the chunk registry, widened to neighbouring chunks.
//! [`QueryParser`] handles the small filter DSL used by
//! [`ContextRetriever::search`].

pub mod parser;
pub mod retriever;

pub use parser::{ParsedQuery, QueryParser};
pub use retriever::{ContextRetriever, RetrievalConfig};
