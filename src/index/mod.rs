// Semantic recipe index: embedding, corpus loading, vector storage

pub mod builder;
pub mod corpus;
pub mod embedding;
pub mod store;

// Re-exports
pub use builder::IndexBuilder;
pub use embedding::{embedder_for, Embedder, HashedEmbedder};
pub use store::VectorIndex;

use crate::error::{Error, Result};
use crate::recipe::IndexedDocument;

/// A retrieved document with its similarity to the query, when the backend
/// reports one. Scores are only comparable within a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub document: IndexedDocument,
    pub score: Option<f32>,
}

/// Nearest-neighbour search over embedded recipe documents.
pub trait Retriever: Send + Sync {
    /// Top `k` documents with similarity scores, best first.
    fn search_with_scores(&self, _query: &str, _k: usize) -> Result<Vec<Candidate>> {
        Err(Error::Search("Scored search is not supported".to_string()))
    }

    /// Top `k` documents, best first, without scores.
    fn search(&self, query: &str, k: usize) -> Result<Vec<IndexedDocument>> {
        Ok(self
            .search_with_scores(query, k)?
            .into_iter()
            .map(|candidate| candidate.document)
            .collect())
    }
}
