//! Error types for the similarity crate.

use feature_builder::MovieId;
use thiserror::Error;

/// Errors raised while building, loading or querying the similarity engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// No movie carries exactly this title
    #[error("Movie not found: {title}")]
    NotFound { title: String },

    /// More than one movie carries exactly this title
    #[error("Title {title} matches {count} movies")]
    AmbiguousTitle { title: String, count: usize },

    /// The same movie id appears twice in the corpus
    #[error("Duplicate movie id {0}")]
    DuplicateMovie(MovieId),

    /// The loaded tables don't line up with each other
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// I/O error while reading or writing artifacts
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Artifact (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
