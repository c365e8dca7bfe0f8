use crate::api::models::{ErrorResponse, RecipeResponse};
use crate::assistant::KitchenAssistant;
use crate::config::Settings;
use crate::index::IndexBuilder;
use crate::selector::Answer;
use crate::{db, Result};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Instant;

/// Build the index from `corpus` and persist it into `index_dir`
pub async fn build(settings: &Settings, corpus: &Path, index_dir: &Path) -> Result<()> {
    let builder = IndexBuilder::from_settings(settings)?;
    let started = Instant::now();

    println!("Loading recipes from {} and building index...", corpus.display());

    let corpus = corpus.to_path_buf();
    let index_dir_owned = index_dir.to_path_buf();
    let index = tokio::task::spawn_blocking(move || {
        builder.build_and_persist(&corpus, &index_dir_owned)
    })
    .await
    .map_err(|e| crate::Error::Internal(format!("Index build task failed: {e}")))??;

    println!(
        "\u{2713} Indexed {} recipes with {} in {:.1}s",
        index.len(),
        index.model_id(),
        started.elapsed().as_secs_f64()
    );
    println!("  Saved to: {}", index_dir.display());

    Ok(())
}

/// Answer a query with a locally loaded index
pub async fn ask(settings: &Settings, query: &str) -> Result<()> {
    let assistant = KitchenAssistant::from_settings(settings)?;
    let answer = assistant.answer(query).await;
    println!("{}", format_answer(&answer));
    Ok(())
}

/// Answer a query through a running server
pub async fn ask_remote(server_url: &str, query: &str) -> Result<()> {
    let client = Client::new();
    let url = format!(
        "{}/api/recipe?q={}",
        server_url.trim_end_matches('/'),
        urlencoding::encode(query)
    );

    let response = client.get(&url).send().await?;
    let answer = match response.status() {
        StatusCode::OK => Answer::Recipe(response.json::<RecipeResponse>().await?),
        StatusCode::BAD_REQUEST => {
            Answer::InvalidQuery(response.json::<ErrorResponse>().await?.error)
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            Answer::RetrievalFailed(response.json::<ErrorResponse>().await?.error)
        }
        status => {
            return Err(crate::Error::Internal(format!(
                "Unexpected response from {server_url}: {status}"
            )))
        }
    };

    println!("{}", format_answer(&answer));
    Ok(())
}

/// Export all accounts to CSV
pub async fn export_users(settings: &Settings, output: &Path) -> Result<()> {
    let pool = db::init_pool_with_config(&settings.database).await?;
    let count = db::users::export_users_csv(&pool, output).await?;

    println!("\u{2713} Exported {} users to {}", count, output.display());
    Ok(())
}

/// Render an answer for the terminal, numbering the steps
pub fn format_answer(answer: &Answer) -> String {
    let Some(recipe) = answer.recipe() else {
        return format!("! {}", answer.message().unwrap_or_default());
    };

    if recipe.title.is_empty() && recipe.ingredients.is_empty() && recipe.steps.is_empty() {
        return "No matching recipe found.".to_string();
    }

    let mut out = String::new();
    out.push_str("Suggested Dish\n");
    out.push_str(&format!("  {}\n\n", recipe.title));

    out.push_str("Ingredients:\n");
    if recipe.ingredients.is_empty() {
        out.push_str("  Not available\n\n");
    } else {
        out.push_str(&format!("  {}\n\n", recipe.ingredients));
    }

    out.push_str("Instructions:\n");
    if recipe.steps.is_empty() {
        out.push_str("  Step-by-step instructions not available.");
    } else {
        let steps: Vec<String> = recipe
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("  {}. {}", i + 1, step))
            .collect();
        out.push_str(&steps.join("\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectionResult;

    #[test]
    fn test_format_answer_numbers_steps() {
        let answer = Answer::Recipe(SelectionResult {
            title: "Tomato Soup".to_string(),
            ingredients: "tomato, basil, cream".to_string(),
            steps: vec!["Simmer.".to_string(), "Blend.".to_string()],
        });

        let out = format_answer(&answer);
        assert!(out.contains("  Tomato Soup\n"));
        assert!(out.contains("  tomato, basil, cream\n"));
        assert!(out.ends_with("  1. Simmer.\n  2. Blend."));
    }

    #[test]
    fn test_format_answer_without_steps() {
        let answer = Answer::Recipe(SelectionResult {
            title: "Toast".to_string(),
            ingredients: String::new(),
            steps: vec![],
        });

        let out = format_answer(&answer);
        assert!(out.contains("Not available"));
        assert!(out.ends_with("Step-by-step instructions not available."));
    }

    #[test]
    fn test_format_answer_messages() {
        assert_eq!(
            format_answer(&Answer::RetrievalFailed("Search failed: boom".to_string())),
            "! Search failed: boom"
        );
        assert_eq!(
            format_answer(&Answer::Recipe(SelectionResult::default())),
            "No matching recipe found."
        );
    }
}
