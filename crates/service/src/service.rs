//! # Recommendation Service
//!
//! Thin facade over a shared [`SimilarityEngine`]: times each query, logs
//! it and attaches context to errors. Clones share the same engine.

use anyhow::{Context, Result};
use similarity::{Recommendation, SimilarityEngine};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::cache::shared_engine;

#[derive(Debug, Clone)]
pub struct RecommendationService {
    engine: Arc<SimilarityEngine>,
}

impl RecommendationService {
    pub fn new(engine: Arc<SimilarityEngine>) -> Self {
        Self { engine }
    }

    /// Service over the process-wide engine loaded from `artifacts`
    pub fn shared(artifacts: &Path) -> Result<Self> {
        Ok(Self::new(shared_engine(artifacts)?))
    }

    /// Up to five movies similar to `title`
    #[instrument(skip(self))]
    pub fn recommend(&self, title: &str) -> Result<Vec<Recommendation>> {
        let start = Instant::now();
        let recs = self
            .engine
            .recommend(title)
            .with_context(|| format!("Failed to recommend for '{title}'"))?;
        info!("recommend '{}' -> {} results in {:?}", title, recs.len(), start.elapsed());
        Ok(recs)
    }

    /// Up to five movies similar to the blend of two titles
    #[instrument(skip(self))]
    pub fn blend(&self, first: &str, second: &str) -> Result<Vec<Recommendation>> {
        let start = Instant::now();
        let recs = self
            .engine
            .blend(first, second)
            .with_context(|| format!("Failed to blend '{first}' and '{second}'"))?;
        info!(
            "blend '{}' + '{}' -> {} results in {:?}",
            first,
            second,
            recs.len(),
            start.elapsed()
        );
        Ok(recs)
    }

    pub fn engine(&self) -> &Arc<SimilarityEngine> {
        &self.engine
    }
}
