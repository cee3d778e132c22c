//! Fuzzy street name search over the catalog.
//!
//! Matching is substring containment on normalized names. Results are
//! ranked so that a street whose address range contains the queried civic
//! number always comes first, then by how closely the name matched, then
//! by id so that equal candidates come back in a stable order.

use std::cmp::Reverse;

use snow_removal_address::normalize;
use snow_removal_street_models::SearchMatch;

use crate::StreetCatalog;

/// Maximum number of matches returned by a single search.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// How a catalog name matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Normalized names are identical.
    Exact,
    /// The catalog name starts with the query.
    Prefix,
    /// The query appears elsewhere inside the catalog name.
    Substring,
}

impl MatchKind {
    /// Classifies a catalog name against a query. Both must already be
    /// normalized.
    #[must_use]
    pub fn classify(normalized_name: &str, normalized_query: &str) -> Option<Self> {
        if !normalized_name.contains(normalized_query) {
            return None;
        }
        Some(if normalized_name == normalized_query {
            Self::Exact
        } else if normalized_name.starts_with(normalized_query) {
            Self::Prefix
        } else {
            Self::Substring
        })
    }

    /// Score on the 0–100 scale.
    #[must_use]
    pub const fn score(self) -> u8 {
        match self {
            Self::Exact => 100,
            Self::Prefix => 60,
            Self::Substring => 40,
        }
    }
}

impl StreetCatalog {
    /// Searches the catalog by street name, optionally ranking streets
    /// whose address range contains `number` first.
    ///
    /// Returns at most [`MAX_SEARCH_RESULTS`] matches. An unloaded catalog,
    /// a blank query, or no match at all yields an empty list.
    #[must_use]
    pub fn search(&self, number: Option<u32>, name: &str) -> Vec<SearchMatch<'_>> {
        let query = normalize(name);
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<SearchMatch<'_>> = self
            .entries()
            .filter(|entry| !entry.normalized_name.is_empty())
            .filter_map(|entry| {
                let kind = MatchKind::classify(&entry.normalized_name, &query)?;
                let in_range = number.is_some_and(|n| entry.street.contains_number(n));
                Some(SearchMatch {
                    id: entry.street.id,
                    score: kind.score(),
                    in_range,
                    street: &entry.street,
                })
            })
            .collect();

        matches.sort_by_key(|m| (!m.in_range, Reverse(m.score), m.id));
        matches.truncate(MAX_SEARCH_RESULTS);

        log::debug!(
            "Catalog search for {query:?} (number {number:?}) returned {} matches",
            matches.len()
        );

        matches
    }
}
