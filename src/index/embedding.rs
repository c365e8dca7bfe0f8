use crate::error::{Error, Result};
use crate::recipe::tokens::words;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Model used when nothing else is configured: the sentence model when it is
/// compiled in, the hashed model otherwise.
#[cfg(feature = "fastembed")]
pub const DEFAULT_MODEL_ID: &str = FastEmbedder::MODEL_ID;
#[cfg(not(feature = "fastembed"))]
pub const DEFAULT_MODEL_ID: &str = HashedEmbedder::MODEL_ID;

/// A pinned text embedding model. The same model id must always produce the
/// same vector for the same text.
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Resolve a configured model id to an embedder.
pub fn embedder_for(model_id: &str) -> Result<Arc<dyn Embedder>> {
    match model_id {
        HashedEmbedder::MODEL_ID => Ok(Arc::new(HashedEmbedder::new())),
        #[cfg(feature = "fastembed")]
        FastEmbedder::MODEL_ID => Ok(Arc::new(FastEmbedder::new()?)),
        other => Err(Error::Config(format!(
            "Unknown embedding model '{other}' (built-in: {})",
            available_models().join(", ")
        ))),
    }
}

pub fn available_models() -> Vec<&'static str> {
    let mut models = vec![HashedEmbedder::MODEL_ID];
    #[cfg(feature = "fastembed")]
    models.push(FastEmbedder::MODEL_ID);
    models
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
    vector
}

/// Feature-hashed bag of words. Each lowercased word is hashed with SHA-256
/// into a bucket and a sign, weighted by `1 + ln(tf)`, and the result is
/// normalised. No model download, and bit-for-bit stable across platforms.
#[derive(Debug, Clone, Default)]
pub struct HashedEmbedder;

impl HashedEmbedder {
    pub const MODEL_ID: &'static str = "hashed-bow-384-v1";
    pub const DIMENSION: usize = 384;

    pub fn new() -> Self {
        Self
    }

    fn bucket(word: &str) -> (usize, f32) {
        let digest = Sha256::digest(word.as_bytes());
        let mut index = [0u8; 8];
        index.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(index) % Self::DIMENSION as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl Embedder for HashedEmbedder {
    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for word in words(text) {
            *counts.entry(word).or_default() += 1;
        }

        let mut vector = vec![0.0f32; Self::DIMENSION];
        for (word, count) in &counts {
            let (bucket, sign) = Self::bucket(word);
            vector[bucket] += sign * (1.0 + (*count as f32).ln());
        }

        Ok(normalize(vector))
    }
}

/// all-MiniLM-L6-v2 sentence embeddings through fastembed's ONNX runtime.
#[cfg(feature = "fastembed")]
pub struct FastEmbedder {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "fastembed")]
impl FastEmbedder {
    pub const MODEL_ID: &'static str = "all-MiniLM-L6-v2";
    pub const DIMENSION: usize = 384;

    pub fn new() -> Result<Self> {
        tracing::info!("Loading embedding model {}", Self::MODEL_ID);
        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| Error::Embedding(format!("Failed to load {}: {e}", Self::MODEL_ID)))?;

        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "fastembed")]
impl Embedder for FastEmbedder {
    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("Model returned no embedding".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("Embedding model lock poisoned".to_string()))?;
        let vectors = model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(format!("Embedding failed: {e}")))?;

        Ok(vectors.into_iter().map(normalize).collect())
    }
}
