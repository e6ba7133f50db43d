//! Error types for the feature-builder crate.
//!
//! Every variant here is a build-time data defect. The offline build never
//! skips a bad record: dropping one would shift every later movie out of
//! alignment with the vector table and the similarity matrix.

use crate::types::{ListField, MovieId};
use thiserror::Error;

/// Errors that can occur while loading raw metadata and building tag strings
#[derive(Error, Debug)]
pub enum FeatureError {
    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader itself failed (bad quoting, unreadable file, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV row couldn't be mapped onto the expected columns
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A required column is absent from the header row
    #[error("Missing column {column} in {file}")]
    MissingColumn { file: String, column: String },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// A stringified list field (genres, keywords, cast, crew) is not a
    /// well-formed list of named entries
    #[error("Malformed {field} list for movie {movie_id}: {reason}")]
    MalformedList {
        movie_id: MovieId,
        field: ListField,
        reason: String,
    },

    /// The same movie id appears twice in one batch
    #[error("Duplicate movie id {0}")]
    DuplicateMovie(MovieId),

    /// The credits file has more than one row for the same movie
    #[error("Duplicate credits for movie {0}")]
    DuplicateCredits(MovieId),

    /// A movie row has no matching row in the credits file
    #[error("No credits found for movie {movie_id} ({title})")]
    MissingCredits { movie_id: MovieId, title: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, FeatureError>;
