//! Core domain types for the feature builder.
//!
//! Three stages of a movie live here:
//! - [`RawMovie`]: metadata exactly as it comes out of the TMDB exports,
//!   list fields still stringified
//! - [`MovieRecord`]: parsed and normalized fields
//! - [`TaggedMovie`]: id + title + the [`TagString`] the similarity engine consumes

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a movie (the TMDB id)
pub type MovieId = u32;

// =============================================================================
// Raw input
// =============================================================================

/// One movie's metadata before any parsing.
///
/// The list fields hold stringified lists such as
/// `[{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMovie {
    pub id: MovieId,
    pub title: String,
    /// Free-text plot summary; absent for a handful of TMDB entries
    pub overview: Option<String>,
    pub genres: String,
    pub keywords: String,
    pub cast: String,
    pub crew: String,
}

/// Which stringified list field a parse error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListField {
    Genres,
    Keywords,
    Cast,
    Crew,
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListField::Genres => "genres",
            ListField::Keywords => "keywords",
            ListField::Cast => "cast",
            ListField::Crew => "crew",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Normalized record
// =============================================================================

/// A movie after its list fields have been parsed and its names collapsed.
///
/// Every name in `genres`, `keywords`, `cast` and `director` has had its
/// whitespace removed, so "Science Fiction" is stored as "ScienceFiction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    /// Overview split on whitespace; empty when the overview is missing
    pub overview: Vec<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    /// At most the first three billed cast members
    pub cast: Vec<String>,
    /// Empty when the crew list has no director
    pub director: String,
}

// =============================================================================
// Tag strings
// =============================================================================

/// Lower-cased, single-space-joined content signature of one movie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagString(String);

impl TagString {
    /// Joins the tokens with single spaces and lower-cases the result
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = tokens
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        TagString(joined.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TagString {
    fn from(s: &str) -> Self {
        TagString::from_tokens(s.split_whitespace())
    }
}

/// What the similarity engine needs per movie: identity plus tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedMovie {
    pub id: MovieId,
    pub title: String,
    pub tags: TagString,
}

impl TaggedMovie {
    pub fn new(id: MovieId, title: impl Into<String>, tags: impl Into<TagString>) -> Self {
        Self {
            id,
            title: title.into(),
            tags: tags.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_string_lowercases_and_joins() {
        let tags = TagString::from_tokens(["In", "the", "22nd", "ScienceFiction"]);
        assert_eq!(tags.as_str(), "in the 22nd sciencefiction");
    }

    #[test]
    fn test_tag_string_skips_empty_tokens() {
        let tags = TagString::from_tokens(["Action", "", "JamesCameron"]);
        assert_eq!(tags.as_str(), "action jamescameron");
    }

    #[test]
    fn test_list_field_display() {
        assert_eq!(ListField::Crew.to_string(), "crew");
        assert_eq!(ListField::Keywords.to_string(), "keywords");
    }
}
