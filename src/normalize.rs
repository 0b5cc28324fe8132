//! Text normalization shared by keyword phrases, utterances and scan queries.

/// U+2011 NON-BREAKING HYPHEN, common in caption exports
const NON_BREAKING_HYPHEN: char = '\u{2011}';

/// Lowercase `text` and fold non-breaking hyphens into `-`.
///
/// Does not touch whitespace, so character offsets of the result line up with
/// the input whenever lowercasing is one-to-one.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c == NON_BREAKING_HYPHEN { '-' } else { c })
        .collect()
}

/// Normalize a keyword phrase or an utterance for matching: trim, collapse
/// internal whitespace runs to a single space, then `normalize_text`.
pub fn normalize_phrase(phrase: &str) -> String {
    let collapsed = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    normalize_text(&collapsed)
}
