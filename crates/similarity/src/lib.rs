//! # Similarity Crate
//!
//! Second stage of the CineBlend pipeline: turns tag strings into count
//! vectors over a frozen vocabulary, builds the all-pairs cosine similarity
//! matrix and answers single-title and blended two-title queries.
//!
//! ## Main Components
//!
//! - **stop_words**: English stop-word list used by the vectorizer
//! - **vocabulary**: tokenization and the frequency-capped vocabulary
//! - **vector**: sparse count vectors and cosine similarity
//! - **matrix**: the symmetric similarity matrix, keyed by movie id
//! - **engine**: the frozen engine and its query operations
//! - **artifacts**: the on-disk form of everything the engine needs
//! - **error**: Error types for build, load and query
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{EngineConfig, SimilarityEngine};
//!
//! let engine = SimilarityEngine::build(&tagged, &EngineConfig::default())?;
//! for rec in engine.recommend("Avatar")? {
//!     println!("{} ({:.0}%)", rec.title, rec.score * 100.0);
//! }
//! ```

pub mod error;
pub mod stop_words;
pub mod vocabulary;
pub mod vector;
pub mod matrix;
pub mod engine;
pub mod artifacts;

pub use error::{EngineError, Result};
pub use vocabulary::Vocabulary;
pub use vector::{cosine_similarity, CountVector, WeightedVector};
pub use matrix::SimilarityMatrix;
pub use engine::{EngineConfig, Recommendation, SimilarityEngine, RESULT_LIMIT};
pub use artifacts::{Artifacts, StoredVector};
