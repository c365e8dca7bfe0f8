//! Hybrid re-ranking of semantically retrieved recipes.
//!
//! The index returns the `k` nearest documents to the query embedding. Each is
//! parsed into title/ingredients/instructions and scored by literal word overlap
//! with the query, so a recipe that contains the user's actual ingredients beats
//! one that is merely about the same topic.

use crate::index::{Candidate, Retriever};
use crate::recipe::{parse_document, split_steps, token_set, ParsedCandidate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Weight of each query word found in a candidate's ingredients.
pub const INGREDIENT_WEIGHT: usize = 1;

/// Weight of each query word found in a candidate's title. Favors queries that
/// name the dish directly.
pub const TITLE_WEIGHT: usize = 2;

pub const DEFAULT_TOP_K: usize = 5;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter ingredients or a recipe question.";

/// The recipe handed back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub title: String,
    pub ingredients: String,
    pub steps: Vec<String>,
}

impl From<ParsedCandidate> for SelectionResult {
    fn from(parsed: ParsedCandidate) -> Self {
        Self {
            steps: split_steps(&parsed.instructions),
            title: parsed.title,
            ingredients: parsed.ingredients,
        }
    }
}

/// Outcome of a query. Only `Recipe` carries data; the other variants carry a
/// message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Best match. All fields are empty when the index returned nothing.
    Recipe(SelectionResult),
    /// The query was blank.
    InvalidQuery(String),
    /// The index could not be searched.
    RetrievalFailed(String),
}

impl Answer {
    pub fn recipe(&self) -> Option<&SelectionResult> {
        match self {
            Answer::Recipe(result) => Some(result),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Answer::Recipe(_) => None,
            Answer::InvalidQuery(msg) | Answer::RetrievalFailed(msg) => Some(msg.as_str()),
        }
    }
}

/// `INGREDIENT_WEIGHT * |query ∩ ingredients| + TITLE_WEIGHT * |query ∩ title|`
pub fn overlap_score(query_tokens: &HashSet<String>, candidate: &ParsedCandidate) -> usize {
    let ingredient_hits = token_set(&candidate.ingredients)
        .intersection(query_tokens)
        .count();
    let title_hits = token_set(&candidate.title)
        .intersection(query_tokens)
        .count();

    INGREDIENT_WEIGHT * ingredient_hits + TITLE_WEIGHT * title_hits
}

/// Index and overlap of the winning candidate: the first one to reach the
/// highest overlap. With no overlap anywhere this is the first candidate.
pub fn pick_best(
    query_tokens: &HashSet<String>,
    candidates: &[ParsedCandidate],
) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;

    for (idx, candidate) in candidates.iter().enumerate() {
        let overlap = overlap_score(query_tokens, candidate);
        match best {
            Some((_, best_overlap)) if overlap <= best_overlap => {}
            _ => best = Some((idx, overlap)),
        }
    }

    best
}

fn retrieve(retriever: &dyn Retriever, query: &str, k: usize) -> Result<Vec<Candidate>, String> {
    match retriever.search_with_scores(query, k) {
        Ok(candidates) => Ok(candidates),
        Err(scored_err) => {
            debug!("Scored search unavailable ({}), retrying unscored", scored_err);
            retriever
                .search(query, k)
                .map(|documents| {
                    documents
                        .into_iter()
                        .map(|document| Candidate {
                            document,
                            score: None,
                        })
                        .collect()
                })
                .map_err(|e| format!("Search failed: {e}"))
        }
    }
}

/// Pick the best recipe among the `k` nearest documents to `query`.
pub fn select(retriever: &dyn Retriever, query: &str, k: usize) -> Answer {
    let query = query.trim();
    if query.is_empty() {
        return Answer::InvalidQuery(EMPTY_QUERY_MESSAGE.to_string());
    }

    let candidates = match retrieve(retriever, query, k) {
        Ok(candidates) => candidates,
        Err(message) => {
            warn!("{}", message);
            return Answer::RetrievalFailed(message);
        }
    };

    let mut parsed: Vec<ParsedCandidate> = candidates
        .iter()
        .map(|c| parse_document(&c.document.content, &c.document.metadata))
        .collect();

    let query_tokens = token_set(query);
    let Some((winner, overlap)) = pick_best(&query_tokens, &parsed) else {
        debug!("No candidates for query");
        return Answer::Recipe(SelectionResult::default());
    };

    debug!(
        "Selected {:?} (rank {}, overlap {}, similarity {:?})",
        parsed[winner].title, winner, overlap, candidates[winner].score
    );

    Answer::Recipe(SelectionResult::from(parsed.swap_remove(winner)))
}
