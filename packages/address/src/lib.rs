#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address handling for Montreal street resolution.
//!
//! - [`normalize`] canonicalizes street text (accents, case, whitespace).
//! - [`synonyms`] maps French/English street type spellings to one
//!   canonical type.
//! - [`parser`] splits a free-text address into civic number, street name
//!   and street type.

pub mod normalize;
pub mod parser;
pub mod synonyms;

pub use normalize::normalize;
pub use parser::parse;
pub use synonyms::expand_street_types;
