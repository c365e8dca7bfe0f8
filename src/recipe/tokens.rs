use std::collections::HashSet;

/// Lowercased alphanumeric words of `text`, in order, duplicates included.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Distinct lowercased alphanumeric words of `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    words(text).collect()
}
