use futures::future::join_all;
use kitchen::index::{HashedEmbedder, IndexBuilder, VectorIndex};
use kitchen::{Answer, Error, KitchenAssistant};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

const CORPUS: &str = "\
name,ingredients,instructions
Chicken Curry,\"chicken, onion, tomato, curry powder\",1. Brown the chicken. 2. Add onion and tomato. 3. Simmer with curry powder.
Tomato Soup,\"tomato, basil, cream\",\"Roast the tomatoes.
Blend with basil.
Stir in cream.\"
Pancakes,\"flour, egg, milk\",Whisk everything. Fry in a hot pan.
Omelette,\"egg, butter\",\"Whisk the eggs
Melt butter
Cook gently\"
";

fn write_corpus() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create corpus file");
    file.write_all(CORPUS.as_bytes())
        .expect("Failed to write corpus");
    file
}

fn builder() -> IndexBuilder {
    IndexBuilder::new(Arc::new(HashedEmbedder::new()))
}

fn recipe(answer: Answer) -> kitchen::SelectionResult {
    match answer {
        Answer::Recipe(recipe) => recipe,
        other => panic!("expected a recipe, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ingredient_query_picks_best_overlap() {
    let corpus = write_corpus();
    let index = builder().build(corpus.path()).expect("Failed to build index");
    assert_eq!(index.len(), 4);

    let assistant = KitchenAssistant::with_index(index);
    let result = recipe(assistant.answer("chicken tomato").await);

    assert_eq!(result.title, "Chicken Curry");
    assert_eq!(result.ingredients, "chicken, onion, tomato, curry powder");
    assert_eq!(
        result.steps,
        vec![
            "Brown the chicken.",
            "Add onion and tomato.",
            "Simmer with curry powder."
        ]
    );
}

#[tokio::test]
async fn test_title_query_and_line_steps() {
    let corpus = write_corpus();
    let index = builder().build(corpus.path()).expect("Failed to build index");

    let assistant = KitchenAssistant::with_index(index);
    let result = recipe(assistant.answer("  Tomato Soup  ").await);

    assert_eq!(result.title, "Tomato Soup");
    assert_eq!(
        result.steps,
        vec!["Roast the tomatoes.", "Blend with basil.", "Stir in cream."]
    );
}

#[tokio::test]
async fn test_sentence_steps() {
    let corpus = write_corpus();
    let index = builder().build(corpus.path()).expect("Failed to build index");

    let assistant = KitchenAssistant::with_index(index);
    let result = recipe(assistant.answer("flour egg milk").await);

    assert_eq!(result.title, "Pancakes");
    assert_eq!(result.steps, vec!["Whisk everything.", "Fry in a hot pan."]);
}

#[tokio::test]
async fn test_line_broken_steps_without_periods() {
    let corpus = write_corpus();
    let index = builder().build(corpus.path()).expect("Failed to build index");

    let assistant = KitchenAssistant::with_index(index);
    let result = recipe(assistant.answer("omelette with butter").await);

    assert_eq!(result.title, "Omelette");
    assert_eq!(result.ingredients, "egg, butter");
    assert_eq!(
        result.steps,
        vec!["Whisk the eggs", "Melt butter", "Cook gently"]
    );
}

#[tokio::test]
async fn test_blank_query_is_rejected_without_loading() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let assistant = KitchenAssistant::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(Error::Internal("should not load".to_string()))
    });

    let answer = assistant.answer("   ").await;
    assert!(matches!(answer, Answer::InvalidQuery(_)));
    assert_eq!(loads.load(Ordering::SeqCst), 0);
    assert!(!assistant.is_ready());
}

#[tokio::test]
async fn test_persisted_index_answers_the_same() {
    let corpus = write_corpus();
    let index_dir = TempDir::new().expect("Failed to create index dir");

    let built = builder()
        .build_and_persist(corpus.path(), index_dir.path())
        .expect("Failed to build index");
    assert!(VectorIndex::exists_in(index_dir.path()));

    let loaded = VectorIndex::load(index_dir.path(), Arc::new(HashedEmbedder::new()))
        .expect("Failed to load index");
    assert_eq!(loaded.documents(), built.documents());

    let fresh = KitchenAssistant::with_index(built);
    let reloaded = KitchenAssistant::with_index(loaded);
    for query in ["chicken tomato", "Tomato Soup", "what can I make with eggs?"] {
        assert_eq!(fresh.answer(query).await, reloaded.answer(query).await);
    }
}

#[tokio::test]
async fn test_load_or_build_reuses_persisted_index() {
    let corpus = write_corpus();
    let index_dir = TempDir::new().expect("Failed to create index dir");

    builder()
        .build_and_persist(corpus.path(), index_dir.path())
        .expect("Failed to build index");

    // The corpus is gone but the persisted index is still served
    let missing = index_dir.path().join("missing.csv");
    let index = builder()
        .load_or_build(&missing, index_dir.path())
        .expect("Failed to load index");
    assert_eq!(index.len(), 4);
}

#[tokio::test]
async fn test_missing_corpus_reports_failure() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let corpus = dir.path().join("recipes.csv");
    let index_dir = dir.path().join("index");

    let assistant = KitchenAssistant::new(move || builder().load_or_build(&corpus, &index_dir));

    match assistant.answer("chicken").await {
        Answer::RetrievalFailed(message) => {
            assert!(message.starts_with("Search failed:"));
            assert!(message.contains("recipes.csv"));
        }
        other => panic!("expected a retrieval failure, got {other:?}"),
    }
    assert!(!assistant.is_ready());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_queries_build_once() {
    let corpus = write_corpus();
    let corpus_path = corpus.path().to_path_buf();
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let assistant = Arc::new(KitchenAssistant::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(50));
        builder().build(&corpus_path)
    }));

    let tasks = (0..8).map(|i| {
        let assistant = assistant.clone();
        tokio::spawn(async move {
            let query = if i % 2 == 0 { "chicken tomato" } else { "Tomato Soup" };
            assistant.answer(query).await
        })
    });

    let answers = join_all(tasks).await;
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(assistant.is_ready());

    for (i, answer) in answers.into_iter().enumerate() {
        let result = recipe(answer.expect("query task panicked"));
        let expected = if i % 2 == 0 { "Chicken Curry" } else { "Tomato Soup" };
        assert_eq!(result.title, expected);
    }
}
