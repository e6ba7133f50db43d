//! # Feature Builder Crate
//!
//! First stage of the CineBlend pipeline: turns raw TMDB movie metadata into
//! one normalized [`TagString`] per movie.
//!
//! ## Main Components
//!
//! - **types**: RawMovie, MovieRecord, TagString, TaggedMovie
//! - **parser**: stringified-list parsing and name collapsing
//! - **builder**: record normalization and tag string assembly
//! - **loader**: TMDB CSV loading and the movies/credits join
//! - **error**: Error types for the build
//!
//! ## Example Usage
//!
//! ```ignore
//! use feature_builder::{build_tagged_movies, loader};
//! use std::path::Path;
//!
//! let raws = loader::load_tmdb(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//! )?;
//! let tagged = build_tagged_movies(&raws)?;
//!
//! println!("{}: {}", tagged[0].title, tagged[0].tags);
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod builder;
pub mod loader;

pub use error::{FeatureError, Result};
pub use types::{ListField, MovieId, MovieRecord, RawMovie, TagString, TaggedMovie};
pub use builder::{build_records, build_tagged_movies};
