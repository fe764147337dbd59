//! Place-search enrichment and ranking.
//!
//! [`pipeline::run`] pages through a text search, normalizes every result
//! into a [`record::PlaceRecord`], enriches the records with AI review
//! summaries and image captions under a shared concurrency bound, and marks
//! the ones most relevant to a free-text prompt.

pub mod ai;
pub mod config;
pub mod enrich;
pub mod estimate;
pub mod normalize;
pub mod pipeline;
pub mod places;
pub mod rank;
pub mod record;
pub mod translate;

#[cfg(test)]
mod testing;

pub const USER_AGENT: &str = concat!("placewise/", env!("CARGO_PKG_VERSION"));
