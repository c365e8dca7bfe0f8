use crate::config::Settings;
use crate::error::{Error, Result};
use crate::index::corpus::load_records;
use crate::index::embedding::{embedder_for, Embedder};
use crate::index::store::VectorIndex;
use crate::recipe::IndexedDocument;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Builds a [`VectorIndex`] from a CSV corpus, one document per row.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
}

impl IndexBuilder {
    /// Large enough that ordinary recipe rows are never cut.
    pub const DEFAULT_CHUNK_SIZE: usize = 1200;

    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = embedder_for(&settings.index.embedding_model)?;
        Ok(Self::new(embedder).with_chunk_size(settings.index.chunk_size))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Load the corpus and embed every row. Fails with `NotFound` before any
    /// embedding work if the corpus is missing.
    pub fn build(&self, corpus_path: impl AsRef<Path>) -> Result<VectorIndex> {
        let corpus_path = corpus_path.as_ref();
        if !corpus_path.exists() {
            return Err(Error::NotFound(format!(
                "Recipes file not found: {}",
                corpus_path.display()
            )));
        }

        let started = Instant::now();
        let records = load_records(corpus_path)?;
        info!(
            "Loaded {} recipes from {:?}, embedding with {}",
            records.len(),
            corpus_path,
            self.embedder.model_id()
        );

        let documents: Vec<IndexedDocument> = records
            .iter()
            .map(|record| {
                let mut document = IndexedDocument::from_record(record);
                if document.truncate(self.chunk_size) {
                    warn!(
                        "Recipe row {} exceeds {} characters and was truncated",
                        record.row, self.chunk_size
                    );
                }
                document
            })
            .collect();

        let index = VectorIndex::from_documents(documents, self.embedder.clone())?;
        info!(
            "Built index with {} documents in {:?}",
            index.len(),
            started.elapsed()
        );

        Ok(index)
    }

    /// Build from `corpus_path` and persist into `index_dir`.
    pub fn build_and_persist(
        &self,
        corpus_path: impl AsRef<Path>,
        index_dir: impl AsRef<Path>,
    ) -> Result<VectorIndex> {
        let index = self.build(corpus_path)?;
        index.persist(index_dir)?;
        Ok(index)
    }

    /// Load the persisted index from `index_dir` if there is one, otherwise build
    /// it from `corpus_path` and persist it.
    pub fn load_or_build(
        &self,
        corpus_path: impl AsRef<Path>,
        index_dir: impl AsRef<Path>,
    ) -> Result<VectorIndex> {
        let index_dir = index_dir.as_ref();
        if VectorIndex::exists_in(index_dir) {
            return VectorIndex::load(index_dir, self.embedder.clone());
        }

        info!("No persisted index in {:?}, building one", index_dir);
        self.build_and_persist(corpus_path, index_dir)
    }
}
