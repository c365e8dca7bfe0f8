use regex::Regex;
use std::sync::OnceLock;

fn step_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\d+\.\s*").expect("step marker pattern is valid"))
}

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\s+").expect("sentence pattern is valid"))
}

/// Split an instructions blob into ordered steps.
///
/// Text containing list markers (`1. Chop. 2. Stir.`, or a preamble followed by
/// numbered lines) is split on the markers, which are dropped. Otherwise
/// newline-separated text is split per line, and a single paragraph is split after
/// each sentence-ending period.
pub fn split_steps(instructions: &str) -> Vec<String> {
    if instructions.trim().is_empty() {
        return Vec::new();
    }

    if let Some(parts) = split_on_markers(instructions) {
        let steps = clean(parts.into_iter());
        if !steps.is_empty() {
            return steps;
        }
    }

    if instructions.contains('\n') {
        return clean(instructions.lines());
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_end().find_iter(instructions) {
        // keep the period with its sentence
        sentences.push(&instructions[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&instructions[start..]);

    clean(sentences.into_iter())
}

// None when the text has no list marker. A digit right after the period is a
// decimal (`1.5 cups`), not a marker.
fn split_on_markers(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;

    for m in step_marker().find_iter(text) {
        if text[m.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        parts.push(&text[start..m.start()]);
        start = m.end();
    }

    if parts.is_empty() {
        return None;
    }
    parts.push(&text[start..]);
    Some(parts)
}

fn clean<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
