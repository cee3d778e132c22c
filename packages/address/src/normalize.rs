//! Text canonicalization for street names.
//!
//! Applied symmetrically to catalog names and to incoming addresses so that
//! "Côte-Sainte-Catherine" and "cote-sainte-catherine" compare equal.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalizes street text for comparison.
///
/// The pipeline:
/// 1. Lowercase
/// 2. Canonical decomposition (NFD), so `é` becomes `e` + combining acute
/// 3. Drop combining marks
/// 4. Trim
///
/// Lowercasing runs first because some uppercase letters lowercase into a
/// base letter plus a combining mark (`İ` → `i̇`), which must be stripped in
/// the same pass for the function to be idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped.trim().to_string()
}

/// Normalizes text and splits it into whitespace-separated tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
