//! # Engine Cache
//!
//! The artifacts are loaded at most once per cache. Concurrent first
//! callers block on the same initialization instead of loading twice; every
//! later caller gets a clone of the same `Arc`. A failed load leaves the
//! cache empty, so a later caller can try again.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use similarity::SimilarityEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Lazily loaded engine bound to one artifacts path
#[derive(Debug)]
pub struct EngineCache {
    path: PathBuf,
    cell: OnceCell<Arc<SimilarityEngine>>,
}

impl EngineCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// The engine, loading it on first access
    pub fn get(&self) -> Result<Arc<SimilarityEngine>> {
        load_once(&self.cell, &self.path)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

static SHARED: OnceCell<Arc<SimilarityEngine>> = OnceCell::new();

/// Process-wide engine.
///
/// The first successful call wins; `path` is ignored once an engine is loaded.
pub fn shared_engine(path: &Path) -> Result<Arc<SimilarityEngine>> {
    load_once(&SHARED, path)
}

fn load_once(cell: &OnceCell<Arc<SimilarityEngine>>, path: &Path) -> Result<Arc<SimilarityEngine>> {
    cell.get_or_try_init(|| {
        let start = Instant::now();
        let engine = SimilarityEngine::load(path)
            .with_context(|| format!("Failed to load artifacts from {}", path.display()))?;
        info!("Engine ready in {:?}", start.elapsed());
        Ok::<_, anyhow::Error>(Arc::new(engine))
    })
    .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_builder::TaggedMovie;
    use similarity::EngineConfig;

    fn write_artifacts(path: &Path) {
        let movies = vec![
            TaggedMovie::new(1, "Avatar", "alien marine"),
            TaggedMovie::new(2, "Aliens", "alien marine creature"),
        ];
        SimilarityEngine::build(&movies, &EngineConfig::default())
            .unwrap()
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_loads_once_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.json");
        write_artifacts(&path);

        let cache = Arc::new(EngineCache::new(&path));
        assert!(!cache.is_loaded());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get().unwrap())
            })
            .collect();
        let engines: Vec<Arc<SimilarityEngine>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(cache.is_loaded());
        assert!(engines.iter().all(|e| Arc::ptr_eq(e, &engines[0])));
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.json");
        let cache = EngineCache::new(&path);

        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());

        write_artifacts(&path);
        assert_eq!(cache.get().unwrap().movie_count(), 2);
    }
}
