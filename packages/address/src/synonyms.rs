//! Street type synonym tables.
//!
//! Montreal street names are published in French, but addresses coming
//! from phones and car head units mix French, English and abbreviations
//! ("av", "blvd", "st"). These tables map every accepted spelling back to
//! one canonical French street type.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::normalize::normalize;

/// Canonical street types and their accepted synonyms, in display order.
pub const STREET_TYPES: &[(&str, &[&str])] = &[
    ("avenue", &["ave", "av"]),
    ("boulevard", &["boul", "blvd", "bd"]),
    ("rue", &["street", "st", "r"]),
    ("chemin", &["ch"]),
    ("place", &["pl"]),
    ("cercle", &["circle"]),
    ("croissant", &["crescent", "cres"]),
    ("terrasse", &["terrace", "terr"]),
    ("allee", &["allée"]),
    ("montee", &["montée"]),
    ("cote", &["côte"]),
];

/// Normalized spelling → canonical street type.
static SYNONYM_TO_TYPE: LazyLock<BTreeMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    for (canonical, synonyms) in STREET_TYPES {
        map.insert(normalize(canonical), *canonical);
        for synonym in *synonyms {
            map.entry(normalize(synonym)).or_insert(*canonical);
        }
    }
    map
});

/// Looks up the canonical street type for a normalized token.
#[must_use]
pub fn canonical_type(token: &str) -> Option<&'static str> {
    SYNONYM_TO_TYPE.get(token).copied()
}

/// Returns every accepted spelling of a street type, canonical form first.
///
/// Any spelling may be passed in (`"blvd"` expands the same way as
/// `"boulevard"`). An unknown type expands to its own normalized form, and
/// an absent or blank type expands to nothing.
#[must_use]
pub fn expand_street_types(street_type: Option<&str>) -> Vec<String> {
    let Some(street_type) = street_type else {
        return Vec::new();
    };
    let normalized = normalize(street_type);
    if normalized.is_empty() {
        return Vec::new();
    }

    let Some(canonical) = canonical_type(&normalized) else {
        return vec![normalized];
    };

    let synonyms = STREET_TYPES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map_or(&[][..], |(_, synonyms)| *synonyms);

    std::iter::once(canonical)
        .chain(synonyms.iter().copied())
        .map(str::to_string)
        .collect()
}
