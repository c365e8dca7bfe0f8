// Recipe records and the text handling applied to retrieved candidates

pub mod parser;
pub mod steps;
pub mod tokens;

pub use parser::{parse_document, ParsedCandidate};
pub use steps::split_steps;
pub use tokens::token_set;

use serde::{Deserialize, Serialize};

/// One corpus row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// Zero-based data row in the corpus file
    pub row: usize,
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    /// Every `(header, value)` pair of the row in header order, when loaded from a file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<(String, String)>,
}

impl RecipeRecord {
    pub fn new(
        row: usize,
        title: impl Into<String>,
        ingredients: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            row,
            title: title.into(),
            ingredients: ingredients.into(),
            instructions: instructions.into(),
            columns: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.ingredients.trim().is_empty()
            && self.instructions.trim().is_empty()
    }
}

/// Side-channel copy of a record's fields, stored next to the rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A record rendered into the text blob that gets embedded and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl IndexedDocument {
    /// Render a record as `key: value` lines, one line per field.
    ///
    /// Instructions that span several lines are left out of the text and read
    /// back from the metadata, which keeps the line breaks between steps.
    pub fn from_record(record: &RecipeRecord) -> Self {
        let content = if record.columns.is_empty() {
            [
                ("name", record.title.as_str()),
                ("ingredients", record.ingredients.as_str()),
                ("instructions", record.instructions.as_str()),
            ]
            .iter()
            .filter_map(|(key, value)| render_line(key, value))
            .collect::<Vec<_>>()
            .join("\n")
        } else {
            record
                .columns
                .iter()
                .filter_map(|(key, value)| render_line(key.trim(), value))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Self {
            content,
            metadata: DocumentMetadata {
                row: record.row,
                title: non_empty(&record.title),
                ingredients: non_empty(&record.ingredients),
                instructions: non_empty(&record.instructions),
            },
        }
    }

    /// Cap the rendered text at `max_chars` characters. Returns true if anything was cut.
    pub fn truncate(&mut self, max_chars: usize) -> bool {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => {
                self.content.truncate(byte_idx);
                true
            }
            None => false,
        }
    }
}

fn render_line(key: &str, value: &str) -> Option<String> {
    if parser::is_instructions_key(&key.to_lowercase()) && value.trim().contains('\n') {
        return None;
    }
    Some(format!("{key}: {}", single_line(value)))
}

// Values with embedded newlines would otherwise spill onto lines the parser can't attribute
fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
