//! Parsers for the stringified list fields and the overview.
//!
//! TMDB ships genres, keywords, cast and crew as JSON arrays embedded in a
//! CSV cell:
//!
//! ```text
//! [{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}]
//! [{"credit_id": "52fe48009251416c750aca23", "job": "Director", "name": "James Cameron"}]
//! ```
//!
//! Only `name` (always) and `job` (crew only) are read; every other key is
//! ignored.

use crate::error::{FeatureError, Result};
use crate::types::{ListField, MovieId};
use serde::Deserialize;

/// How many billed cast members make it into a movie's tags
pub const TOP_CAST: usize = 3;

/// Crew job that identifies the director
pub const DIRECTOR_JOB: &str = "Director";

/// One entry of a stringified list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListEntry {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

/// Parse a stringified list field into its entries.
///
/// A blank cell, invalid JSON, a non-array value or an entry without a
/// `name` all fail with [`FeatureError::MalformedList`].
pub fn parse_list(movie_id: MovieId, field: ListField, raw: &str) -> Result<Vec<ListEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FeatureError::MalformedList {
            movie_id,
            field,
            reason: "empty field".to_string(),
        });
    }

    serde_json::from_str::<Vec<ListEntry>>(trimmed).map_err(|e| FeatureError::MalformedList {
        movie_id,
        field,
        reason: e.to_string(),
    })
}

/// Remove every whitespace character so a multi-word name becomes one token.
///
/// Example: "Sam Worthington" -> "SamWorthington"
pub fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect()
}

/// All entry names in source order, collapsed
pub fn extract_names(entries: &[ListEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| collapse_whitespace(&entry.name))
        .collect()
}

/// The first `limit` entry names in source order, collapsed
pub fn extract_top_names(entries: &[ListEntry], limit: usize) -> Vec<String> {
    entries
        .iter()
        .take(limit)
        .map(|entry| collapse_whitespace(&entry.name))
        .collect()
}

/// Name of the first crew entry whose job is exactly "Director".
///
/// Returns an empty string when the crew has no director.
pub fn extract_director(crew: &[ListEntry]) -> String {
    crew.iter()
        .find(|entry| entry.job.as_deref() == Some(DIRECTOR_JOB))
        .map(|entry| collapse_whitespace(&entry.name))
        .unwrap_or_default()
}

/// Split the overview into whitespace-separated words.
///
/// A missing or blank overview is an empty sequence, not an error.
pub fn split_overview(overview: Option<&str>) -> Vec<String> {
    overview
        .map(|text| text.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
