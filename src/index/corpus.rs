use crate::error::{Error, Result};
use crate::recipe::RecipeRecord;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Title,
    Ingredients,
    Instructions,
}

fn column_role(header: &str) -> Option<Column> {
    let header = header.trim_start_matches('\u{feff}').trim().to_lowercase();
    match header.as_str() {
        "name" | "title" => Some(Column::Title),
        h if h.starts_with("ingredient") => Some(Column::Ingredients),
        h if h.starts_with("instruction") || h.starts_with("step") => Some(Column::Instructions),
        _ => None,
    }
}

/// Load every row of a CSV corpus as one record. The file must have a header row
/// naming at least one of the title, ingredients or instructions columns.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<RecipeRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Recipes file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let roles: Vec<Option<Column>> = headers.iter().map(|h| column_role(h)).collect();

    if roles.iter().all(Option::is_none) {
        return Err(Error::Validation(format!(
            "{} has no name/title, ingredients or instructions column",
            path.display()
        )));
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let fields = result?;
        let mut record = RecipeRecord::new(row, "", "", "");

        for (idx, value) in fields.iter().enumerate() {
            let header = headers.get(idx).cloned().unwrap_or_default();
            match roles.get(idx).copied().flatten() {
                Some(Column::Title) => record.title = value.trim().to_string(),
                Some(Column::Ingredients) => record.ingredients = value.trim().to_string(),
                Some(Column::Instructions) => record.instructions = value.trim().to_string(),
                None => {}
            }
            record.columns.push((header, value.to_string()));
        }

        if record.is_empty() {
            warn!("Skipping empty corpus row {}", row);
            continue;
        }

        records.push(record);
    }

    debug!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}
