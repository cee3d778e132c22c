//! Free-text address parsing.
//!
//! Vehicle integrations report addresses in many shapes:
//! - With a civic number: `"1234 avenue du Parc"`
//! - Type after the name: `"5000 Saint-Denis St"`
//! - No number at all: `"Boulevard Saint-Laurent"`
//!
//! This module splits them into number, name and canonical street type.

use regex::Regex;
use std::sync::LazyLock;

use snow_removal_street_models::ParsedAddress;

use crate::normalize::tokenize;
use crate::synonyms::canonical_type;

/// Leading civic number followed by whitespace and the rest of the address.
static CIVIC_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([0-9]+)\s+(.+)$").expect("valid regex"));

/// Parses a full address into number, street name and street type.
///
/// The first token that is a known street type spelling becomes the
/// canonical type; every other token, in order, forms the name. A type word
/// that is genuinely part of a name ("Rue de la Côte") is still taken as
/// the type.
///
/// Returns `None` for blank input or when no name tokens remain.
#[must_use]
pub fn parse(full_address: &str) -> Option<ParsedAddress> {
    let original = full_address.trim();
    if original.is_empty() {
        return None;
    }

    let (number, tail) = split_civic_number(original);

    let tokens = tokenize(tail);
    if tokens.is_empty() {
        log::warn!("No street parts found in: {original}");
        return None;
    }

    let type_position = tokens
        .iter()
        .position(|token| canonical_type(token).is_some());

    let (street_type, name) = match type_position {
        Some(idx) => {
            let name_tokens: Vec<&str> = tokens
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, t)| t.as_str())
                .collect();
            (canonical_type(&tokens[idx]), name_tokens.join(" "))
        }
        None => {
            log::debug!("No street type identified in: {tail}");
            (None, tokens.join(" "))
        }
    };

    if name.is_empty() {
        log::warn!("No street name found in: {original}");
        return None;
    }

    Some(ParsedAddress {
        number,
        name,
        street_type: street_type.map(str::to_string),
        original: original.to_string(),
    })
}

/// Splits a leading civic number from the rest of the address.
///
/// A zero or out-of-range number is consumed but reported as absent, so
/// the search simply runs without range filtering.
fn split_civic_number(address: &str) -> (Option<u32>, &str) {
    let Some(caps) = CIVIC_NUMBER_RE.captures(address) else {
        log::debug!("No street number found in: {address}");
        return (None, address);
    };

    let (Some(digits), Some(tail)) = (caps.get(1), caps.get(2)) else {
        return (None, address);
    };

    let number = digits.as_str().parse::<u32>().ok().filter(|n| *n > 0);
    (number, tail.as_str())
}
