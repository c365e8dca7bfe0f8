use crate::error::{Error, Result};
use crate::index::embedding::{normalize, Embedder};
use crate::index::{Candidate, Retriever};
use crate::recipe::IndexedDocument;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// File inside the index directory that holds the whole bundle
pub const INDEX_FILE: &str = "index.json";

#[derive(Serialize, Deserialize)]
struct IndexBundle {
    model_id: String,
    dimension: usize,
    documents: Vec<IndexedDocument>,
    vectors: Vec<Vec<f32>>,
}

/// Exact cosine nearest-neighbour index over unit-length document embeddings.
/// Immutable once constructed.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    documents: Vec<IndexedDocument>,
    vectors: Vec<Vec<f32>>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("model_id", &self.embedder.model_id())
            .field("documents", &self.documents.len())
            .finish()
    }
}

impl VectorIndex {
    /// Embed every document and build the index
    pub fn from_documents(
        documents: Vec<IndexedDocument>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;

        if vectors.len() != documents.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                vectors.len()
            )));
        }

        let vectors = vectors.into_iter().map(normalize).collect();
        let index = Self {
            embedder,
            documents,
            vectors,
        };
        index.check_dimensions()?;

        Ok(index)
    }

    fn check_dimensions(&self) -> Result<()> {
        let dimension = self.embedder.dimension();
        if let Some(bad) = self.vectors.iter().position(|v| v.len() != dimension) {
            return Err(Error::Embedding(format!(
                "Document {bad} has dimension {}, expected {dimension}",
                self.vectors[bad].len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Top `k` documents by cosine similarity to `query`, best first. Equal
    /// scores keep corpus order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let query = normalize(query.to_vec());

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vector)| {
                let similarity: f32 = vector.iter().zip(&query).map(|(a, b)| a * b).sum();
                (idx, similarity)
            })
            .collect();

        // stable sort: ties stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Write the index into `dir`. The bundle is written to a temporary file and
    /// renamed into place, so a concurrent `load` sees the old or the new index.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let bundle = IndexBundle {
            model_id: self.embedder.model_id().to_string(),
            dimension: self.embedder.dimension(),
            documents: self.documents.clone(),
            vectors: self.vectors.clone(),
        };

        let tmp_path = dir.join(format!("{INDEX_FILE}.tmp"));
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, &bundle)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, dir.join(INDEX_FILE))?;

        info!("Persisted {} documents to {:?}", self.len(), dir);
        Ok(())
    }

    /// Read an index written by [`VectorIndex::persist`]. The bundle must have been
    /// built with the same model as `embedder`.
    pub fn load(dir: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let path = dir.as_ref().join(INDEX_FILE);
        if !path.exists() {
            return Err(Error::NotFound(format!("No index at {}", path.display())));
        }

        let bundle: IndexBundle = serde_json::from_reader(BufReader::new(File::open(&path)?))?;

        if bundle.model_id != embedder.model_id() || bundle.dimension != embedder.dimension() {
            return Err(Error::Config(format!(
                "Index at {} was built with {} ({} dims) but {} ({} dims) is configured; rebuild it",
                path.display(),
                bundle.model_id,
                bundle.dimension,
                embedder.model_id(),
                embedder.dimension()
            )));
        }

        if bundle.documents.len() != bundle.vectors.len() {
            return Err(Error::Search(format!(
                "Corrupt index at {}: {} documents but {} vectors",
                path.display(),
                bundle.documents.len(),
                bundle.vectors.len()
            )));
        }

        let index = Self {
            embedder,
            documents: bundle.documents,
            vectors: bundle.vectors,
        };
        index.check_dimensions()?;

        info!("Loaded index with {} documents from {:?}", index.len(), path);
        Ok(index)
    }

    /// Whether `dir` holds a persisted index
    pub fn exists_in(dir: impl AsRef<Path>) -> bool {
        dir.as_ref().join(INDEX_FILE).exists()
    }
}

impl Retriever for VectorIndex {
    fn search_with_scores(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        let embedding = self.embedder.embed(query)?;
        let hits = self.nearest(&embedding, k);
        debug!("Query matched {} documents", hits.len());

        Ok(hits
            .into_iter()
            .map(|(idx, score)| Candidate {
                document: self.documents[idx].clone(),
                score: Some(score),
            })
            .collect())
    }
}
