use crate::config::Settings;
use crate::error::{Error, Result};
use crate::index::{IndexBuilder, VectorIndex};
use crate::selector::{select, Answer, DEFAULT_TOP_K, EMPTY_QUERY_MESSAGE};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

type IndexLoader = dyn Fn() -> Result<VectorIndex> + Send + Sync;

/// Entry point for recipe questions. Owns the recipe index, which is loaded
/// (or built) on the first query and shared read-only by every query after it.
pub struct KitchenAssistant {
    loader: Arc<IndexLoader>,
    index: OnceCell<Arc<VectorIndex>>,
    top_k: usize,
    timeout: Duration,
}

impl KitchenAssistant {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// `loader` runs at most once, on a blocking thread, when the first query arrives.
    pub fn new(loader: impl Fn() -> Result<VectorIndex> + Send + Sync + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            index: OnceCell::new(),
            top_k: DEFAULT_TOP_K,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Serve an index that is already built.
    pub fn with_index(index: VectorIndex) -> Self {
        Self {
            loader: Arc::new(|| -> Result<VectorIndex> {
                Err(Error::Internal(
                    "index was provided up front and cannot be reloaded".to_string(),
                ))
            }),
            index: OnceCell::new_with(Some(Arc::new(index))),
            top_k: DEFAULT_TOP_K,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Load the persisted index from `INDEX_DIR`, building it from the corpus if absent.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let builder = IndexBuilder::from_settings(settings)?;
        let corpus_path = settings.corpus.path.clone();
        let index_dir = settings.index.dir.clone();

        Ok(
            Self::new(move || builder.load_or_build(&corpus_path, &index_dir))
                .with_top_k(settings.search.top_k)
                .with_timeout(Duration::from_millis(settings.search.timeout_ms)),
        )
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the index has been loaded
    pub fn is_ready(&self) -> bool {
        self.index.initialized()
    }

    /// The shared index, loading it if this is the first call. Concurrent first
    /// callers wait for a single load.
    pub async fn index(&self) -> Result<Arc<VectorIndex>> {
        self.index
            .get_or_try_init(|| async {
                info!("Initializing recipe index");
                let loader = self.loader.clone();
                let index = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| Error::Internal(format!("Index load task failed: {e}")))??;
                info!("Recipe index ready ({} recipes)", index.len());
                Ok::<_, Error>(Arc::new(index))
            })
            .await
            .cloned()
    }

    /// Answer a free-text question with the best matching recipe or a message
    /// for the user. Never fails.
    pub async fn answer(&self, input: &str) -> Answer {
        let query = input.trim();
        if query.is_empty() {
            debug!("Rejected blank query");
            return Answer::InvalidQuery(EMPTY_QUERY_MESSAGE.to_string());
        }

        let index = match self.index().await {
            Ok(index) => index,
            Err(e) => {
                error!("Recipe index unavailable: {}", e.log_safe());
                return Answer::RetrievalFailed(format!("Search failed: {e}"));
            }
        };

        let owned_query = query.to_string();
        let top_k = self.top_k;
        let search = tokio::task::spawn_blocking(move || select(&*index, &owned_query, top_k));

        match tokio::time::timeout(self.timeout, search).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                error!("Search task failed: {}", e);
                Answer::RetrievalFailed(format!("Search failed: {e}"))
            }
            Err(_) => {
                warn!("Search timed out after {:?}", self.timeout);
                Answer::RetrievalFailed(format!(
                    "Search failed: no answer within {} ms",
                    self.timeout.as_millis()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::embedding::{Embedder, HashedEmbedder};
    use crate::recipe::{IndexedDocument, RecipeRecord};

    fn index() -> VectorIndex {
        let documents = vec![
            RecipeRecord::new(
                0,
                "Chicken Curry",
                "chicken, onion, tomato, curry powder",
                "1. Fry onion. 2. Add chicken.",
            ),
            RecipeRecord::new(1, "Tomato Soup", "tomato, basil, cream", "Simmer.\nBlend."),
        ]
        .iter()
        .map(IndexedDocument::from_record)
        .collect();

        VectorIndex::from_documents(documents, Arc::new(HashedEmbedder::new())).unwrap()
    }

    #[tokio::test]
    async fn test_answer_selects_recipe() {
        let assistant = KitchenAssistant::with_index(index());
        assert!(assistant.is_ready());

        let answer = assistant.answer("  chicken tomato ").await;
        let recipe = answer.recipe().unwrap();
        assert_eq!(recipe.title, "Chicken Curry");
        assert_eq!(recipe.steps, vec!["Fry onion.", "Add chicken."]);
    }

    #[tokio::test]
    async fn test_blank_input_does_not_load_index() {
        let assistant = KitchenAssistant::new(|| panic!("index must not load for blank input"));

        let answer = assistant.answer("   ").await;
        assert_eq!(answer, Answer::InvalidQuery(EMPTY_QUERY_MESSAGE.to_string()));
        assert!(!assistant.is_ready());
    }

    #[tokio::test]
    async fn test_load_failure_becomes_message() {
        let assistant = KitchenAssistant::new(|| {
            Err(Error::NotFound("Recipes file not found: recipes.csv".to_string()))
        });

        let answer = assistant.answer("chicken").await;
        assert!(matches!(answer, Answer::RetrievalFailed(ref msg) if msg.contains("recipes.csv")));
        assert!(!assistant.is_ready());
    }

    #[tokio::test]
    async fn test_slow_search_times_out() {
        struct SlowEmbedder;
        impl Embedder for SlowEmbedder {
            fn model_id(&self) -> &str {
                HashedEmbedder::MODEL_ID
            }
            fn dimension(&self) -> usize {
                HashedEmbedder::DIMENSION
            }
            fn embed(&self, text: &str) -> Result<Vec<f32>> {
                if text.starts_with("slow") {
                    std::thread::sleep(Duration::from_millis(500));
                }
                HashedEmbedder::new().embed(text)
            }
        }

        let documents = vec![IndexedDocument::from_record(&RecipeRecord::new(
            0, "Toast", "bread", "Toast it.",
        ))];
        let index = VectorIndex::from_documents(documents, Arc::new(SlowEmbedder)).unwrap();
        let assistant =
            KitchenAssistant::with_index(index).with_timeout(Duration::from_millis(20));

        let answer = assistant.answer("slow toast").await;
        assert!(matches!(answer, Answer::RetrievalFailed(_)));

        let answer = assistant.answer("toast").await;
        assert_eq!(answer.recipe().unwrap().title, "Toast");
    }
}
