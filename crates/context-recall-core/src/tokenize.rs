//! Text normalization and tokenization.
//!
//! Normalization lower-cases, replaces punctuation with spaces, and
//! collapses whitespace. Tokens are the whitespace-separated words of the
//! normalized text; "significant" tokens are those longer than a minimum
//! char length.

/// Lower-case `text`, turn every non-alphanumeric char into a space, and
/// collapse whitespace runs to a single space.
///
/// ```rust
/// use context_recall_core::tokenize::normalize;
///
/// assert_eq!(normalize("Hello,   World!\nBye."), "hello world bye");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Split normalized text into tokens.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokens whose char length is strictly greater than `min_len`.
pub fn significant_tokens(text: &str, min_len: usize) -> Vec<String> {
    tokens(text)
        .into_iter()
        .filter(|t| t.chars().count() > min_len)
        .collect()
}
