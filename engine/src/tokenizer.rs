use lazy_static::lazy_static;
use regex::Regex;

/// Words shorter than this are never indexed.
pub const MIN_INDEXED_LEN: usize = 3;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[0-9A-Za-z]+").expect("valid regex");
}

/// Splits text into candidate words: maximal runs of ASCII alphanumerics.
/// No filtering happens here; that is `normalize`'s job.
pub fn tokenize(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Lowercases a candidate word. Rejects it when shorter than `min_len` or
/// when any character is non-alphabetic.
pub fn normalize(token: &str, min_len: usize) -> Option<String> {
    if token.is_empty() || token.len() < min_len {
        return None;
    }
    if !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(token.to_ascii_lowercase())
}
