//! Service crate for CineBlend.
//!
//! Loads the similarity engine once per process and exposes the query
//! interface the front-end calls into.

pub mod cache;
pub mod service;

pub use cache::{shared_engine, EngineCache};
pub use service::RecommendationService;
pub use similarity::Recommendation;
