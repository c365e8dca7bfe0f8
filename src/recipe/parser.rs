use crate::recipe::DocumentMetadata;
use serde::{Deserialize, Serialize};

/// Fields pulled out of a retrieved document. Every field is always present,
/// possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCandidate {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
}

/// Extract title, ingredients and instructions from a document's `key: value` lines.
///
/// Keys are matched case-insensitively: `name`/`title` set the title, keys starting
/// with `ingredient` set the ingredients, keys starting with `instruction` or `step`
/// set the instructions. A later line for the same field replaces an earlier one.
/// Fields still empty after the scan are taken from `fallback`.
pub fn parse_document(text: &str, fallback: &DocumentMetadata) -> ParsedCandidate {
    let mut parsed = ParsedCandidate::default();

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "name" | "title" => parsed.title = value.to_string(),
            k if k.starts_with("ingredient") => parsed.ingredients = value.to_string(),
            k if is_instructions_key(k) => parsed.instructions = value.to_string(),
            _ => {}
        }
    }

    fill_from(&mut parsed.title, &fallback.title);
    fill_from(&mut parsed.ingredients, &fallback.ingredients);
    fill_from(&mut parsed.instructions, &fallback.instructions);

    parsed
}

/// Whether a lowercased, trimmed key names the instructions field.
pub(crate) fn is_instructions_key(key: &str) -> bool {
    key.starts_with("instruction") || key.starts_with("step")
}

fn fill_from(field: &mut String, fallback: &Option<String>) {
    if field.is_empty() {
        if let Some(value) = fallback {
            field.clone_from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let text = "name: Chicken Curry\ningredients: chicken, onion, tomato\ninstructions: 1. Fry. 2. Simmer.";
        let parsed = parse_document(text, &DocumentMetadata::default());

        assert_eq!(parsed.title, "Chicken Curry");
        assert_eq!(parsed.ingredients, "chicken, onion, tomato");
        assert_eq!(parsed.instructions, "1. Fry. 2. Simmer.");
    }

    #[test]
    fn test_keys_are_case_and_whitespace_insensitive() {
        let text = "  TITLE  :  Tomato Soup \n Ingredients List: tomato, basil\nSTEPS: Blend it";
        let parsed = parse_document(text, &DocumentMetadata::default());

        assert_eq!(parsed.title, "Tomato Soup");
        assert_eq!(parsed.ingredients, "tomato, basil");
        assert_eq!(parsed.instructions, "Blend it");
    }

    #[test]
    fn test_last_line_wins_per_field() {
        let text = "name: First\ntitle: Second\ningredient: a\ningredients: b";
        let parsed = parse_document(text, &DocumentMetadata::default());

        assert_eq!(parsed.title, "Second");
        assert_eq!(parsed.ingredients, "b");
    }

    #[test]
    fn test_value_keeps_everything_after_first_colon() {
        let parsed = parse_document(
            "instructions: Bake: 20 minutes at 180C",
            &DocumentMetadata::default(),
        );
        assert_eq!(parsed.instructions, "Bake: 20 minutes at 180C");
    }

    #[test]
    fn test_lines_without_separator_are_ignored() {
        let text = "Chicken Curry\nname: Curry\nsome stray line";
        let parsed = parse_document(text, &DocumentMetadata::default());

        assert_eq!(parsed.title, "Curry");
        assert_eq!(parsed.ingredients, "");
        assert_eq!(parsed.instructions, "");
    }

    #[test]
    fn test_missing_fields_come_from_metadata() {
        let metadata = DocumentMetadata {
            row: 0,
            title: Some("From Metadata".to_string()),
            ingredients: Some("rice".to_string()),
            instructions: None,
        };
        let parsed = parse_document("name: From Text", &metadata);

        assert_eq!(parsed.title, "From Text");
        assert_eq!(parsed.ingredients, "rice");
        assert_eq!(parsed.instructions, "");
    }

    #[test]
    fn test_empty_input_yields_empty_strings() {
        let parsed = parse_document("", &DocumentMetadata::default());
        assert_eq!(parsed, ParsedCandidate::default());
    }
}
