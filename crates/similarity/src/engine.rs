//! # Similarity Engine
//!
//! Holds the frozen vocabulary, every movie's count vector and the
//! precomputed similarity matrix, and answers the two query kinds:
//!
//! 1. `recommend(title)`: read the movie's matrix row, rank the other movies
//! 2. `blend(a, b)`: average both count vectors, score every movie against
//!    the blend on the fly, rank, drop both inputs
//!
//! Everything is keyed by movie id. Row positions stay inside the engine.
//! Once built the engine is never mutated, so it can be shared across
//! threads behind an `Arc` without locking.

use crate::error::{EngineError, Result};
use crate::matrix::SimilarityMatrix;
use crate::vector::{cosine_similarity, CountVector, WeightedVector};
use crate::vocabulary::Vocabulary;
use feature_builder::{MovieId, TaggedMovie};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// How many movies a query returns at most
pub const RESULT_LIMIT: usize = 5;

/// Build-time settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Vocabulary cap: keep only this many of the most frequent tokens
    pub max_features: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_features: 5000 }
    }
}

impl EngineConfig {
    /// Configure the vocabulary cap (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    /// Cosine similarity in [0, 1]
    pub score: f32,
}

/// Frozen, read-only similarity engine
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    config: EngineConfig,
    movies: Vec<TaggedMovie>,
    vocabulary: Vocabulary,
    vectors: Vec<CountVector>,
    weighted: Vec<WeightedVector>,
    matrix: SimilarityMatrix,
    by_title: HashMap<String, Vec<usize>>,
    by_id: HashMap<MovieId, usize>,
}

impl SimilarityEngine {
    /// Build vocabulary, vectors and matrix from the tagged corpus.
    ///
    /// Corpus order is kept everywhere and is the tie-breaker when ranking.
    #[instrument(skip(movies), fields(movies = movies.len()))]
    pub fn build(movies: &[TaggedMovie], config: &EngineConfig) -> Result<Self> {
        let start = Instant::now();

        let vocabulary =
            Vocabulary::build(movies.iter().map(|m| m.tags.as_str()), config.max_features);
        let vectors: Vec<CountVector> = movies
            .par_iter()
            .map(|m| vocabulary.vectorize(m.tags.as_str()))
            .collect();

        let degenerate = vectors.iter().filter(|v| v.is_zero()).count();
        if degenerate > 0 {
            debug!("{} movies have an all-zero vector", degenerate);
        }

        let weighted: Vec<WeightedVector> = vectors.iter().map(WeightedVector::from).collect();
        let ids = movies.iter().map(|m| m.id).collect();
        let matrix = SimilarityMatrix::compute(ids, &weighted);

        let engine =
            Self::assemble(*config, movies.to_vec(), vocabulary, vectors, weighted, matrix)?;
        info!(
            "Built engine: {} movies, {} terms in {:?}",
            engine.movie_count(),
            engine.vocabulary_size(),
            start.elapsed()
        );
        Ok(engine)
    }

    /// Put already-built tables together and index them.
    ///
    /// `weighted[i]` must be the weighted view of `vectors[i]`.
    /// Fails on duplicate movie ids; shape checks are the caller's concern.
    pub(crate) fn assemble(
        config: EngineConfig,
        movies: Vec<TaggedMovie>,
        vocabulary: Vocabulary,
        vectors: Vec<CountVector>,
        weighted: Vec<WeightedVector>,
        matrix: SimilarityMatrix,
    ) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(movies.len());
        let mut by_title: HashMap<String, Vec<usize>> = HashMap::with_capacity(movies.len());
        for (i, movie) in movies.iter().enumerate() {
            if by_id.insert(movie.id, i).is_some() {
                return Err(EngineError::DuplicateMovie(movie.id));
            }
            by_title.entry(movie.title.clone()).or_default().push(i);
        }

        Ok(Self {
            config,
            movies,
            vocabulary,
            vectors,
            weighted,
            matrix,
            by_title,
            by_id,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Top movies most similar to `title`, never including `title` itself
    #[instrument(skip(self))]
    pub fn recommend(&self, title: &str) -> Result<Vec<Recommendation>> {
        let query = self.position_of(title)?;
        let row = self.matrix.row(query);

        let scored = row.iter().copied().enumerate().filter(|&(i, _)| i != query);
        let results = self.top_excluding(scored, &[title]);

        debug!("{} recommendations for {}", results.len(), title);
        Ok(results)
    }

    /// Top movies most similar to the average of two movies' vectors.
    ///
    /// Neither input title appears in the output, even if it ranks first.
    #[instrument(skip(self))]
    pub fn blend(&self, first: &str, second: &str) -> Result<Vec<Recommendation>> {
        let a = self.position_of(first)?;
        let b = self.position_of(second)?;
        let blended = WeightedVector::average(&self.weighted[a], &self.weighted[b]);

        let scores: Vec<f32> = self
            .weighted
            .par_iter()
            .map(|v| cosine_similarity(&blended, v) as f32)
            .collect();
        let results = self.top_excluding(scores.into_iter().enumerate(), &[first, second]);

        debug!("{} blended recommendations for {} + {}", results.len(), first, second);
        Ok(results)
    }

    /// Stable descending sort, then the first [`RESULT_LIMIT`] whose title
    /// isn't excluded
    fn top_excluding(
        &self,
        scored: impl Iterator<Item = (usize, f32)>,
        excluded: &[&str],
    ) -> Vec<Recommendation> {
        let mut ranked: Vec<(usize, f32)> = scored.collect();
        ranked.sort_by(|x, y| y.1.total_cmp(&x.1));

        ranked
            .into_iter()
            .filter(|&(i, _)| !excluded.contains(&self.movies[i].title.as_str()))
            .take(RESULT_LIMIT)
            .map(|(i, score)| Recommendation {
                movie_id: self.movies[i].id,
                title: self.movies[i].title.clone(),
                score,
            })
            .collect()
    }

    fn position_of(&self, title: &str) -> Result<usize> {
        match self.by_title.get(title).map(Vec::as_slice) {
            None | Some([]) => Err(EngineError::NotFound {
                title: title.to_string(),
            }),
            Some([only]) => Ok(*only),
            Some(many) => Err(EngineError::AmbiguousTitle {
                title: title.to_string(),
                count: many.len(),
            }),
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Case-insensitive substring search over titles.
    ///
    /// Exact matches come first, then corpus order.
    pub fn search(&self, fragment: &str, limit: usize) -> Vec<&TaggedMovie> {
        let needle = fragment.to_lowercase();
        let mut matches: Vec<(bool, &TaggedMovie)> = self
            .movies
            .iter()
            .filter_map(|m| {
                let title = m.title.to_lowercase();
                title.contains(&needle).then_some((title != needle, m))
            })
            .collect();
        matches.sort_by_key(|&(inexact, _)| inexact);
        matches.into_iter().take(limit).map(|(_, m)| m).collect()
    }

    /// All titles in corpus order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }

    pub fn get_movie(&self, id: MovieId) -> Option<&TaggedMovie> {
        self.by_id.get(&id).map(|&i| &self.movies[i])
    }

    /// Precomputed similarity between two movies
    pub fn similarity(&self, a: MovieId, b: MovieId) -> Option<f32> {
        let i = *self.by_id.get(&a)?;
        let j = *self.by_id.get(&b)?;
        Some(self.matrix.get(i, j))
    }

    /// Raw count vector of one movie
    pub fn vector(&self, id: MovieId) -> Option<&CountVector> {
        self.by_id.get(&id).map(|&i| &self.vectors[i])
    }

    pub fn movie_count(&self) -> usize {
        self.movies.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn movies(&self) -> &[TaggedMovie] {
        &self.movies
    }

    pub(crate) fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub(crate) fn vectors(&self) -> &[CountVector] {
        &self.vectors
    }

    pub(crate) fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<TaggedMovie> {
        vec![
            TaggedMovie::new(1, "Avatar", "marine alien planet action sciencefiction jamescameron"),
            TaggedMovie::new(2, "Aliens", "marine alien action sciencefiction jamescameron"),
            TaggedMovie::new(3, "Titanic", "ship romance drama jamescameron"),
            TaggedMovie::new(4, "Notebook", "romance drama letters"),
            TaggedMovie::new(5, "Zzz-Filler", "quiet nothingness"),
            TaggedMovie::new(6, "Empty", "the a of"),
            TaggedMovie::new(7, "Predator", "alien jungle action"),
        ]
    }

    fn engine() -> SimilarityEngine {
        SimilarityEngine::build(&corpus(), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_recommend_ranks_closest_first() {
        let recs = engine().recommend("Avatar").unwrap();
        assert_eq!(recs.len(), RESULT_LIMIT);
        assert_eq!(recs[0].title, "Aliens");
        assert!(recs.iter().all(|r| r.title != "Avatar"));
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_recommend_ties_keep_corpus_order() {
        let recs = engine().recommend("Zzz-Filler").unwrap();
        let ids: Vec<MovieId> = recs.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 6]);
        assert!(recs.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_recommend_unknown_title() {
        let err = engine().recommend("Nope").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { ref title } if title == "Nope"));
    }

    #[test]
    fn test_duplicate_titles_are_ambiguous() {
        let mut movies = corpus();
        movies.push(TaggedMovie::new(8, "Avatar", "blue people"));
        let engine = SimilarityEngine::build(&movies, &EngineConfig::default()).unwrap();
        assert!(matches!(
            engine.recommend("Avatar"),
            Err(EngineError::AmbiguousTitle { count: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut movies = corpus();
        movies.push(TaggedMovie::new(1, "Again", "alien"));
        let err = SimilarityEngine::build(&movies, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateMovie(1)));
    }

    #[test]
    fn test_blend_excludes_both_inputs() {
        let recs = engine().blend("Avatar", "Titanic").unwrap();
        assert!(recs.iter().all(|r| r.title != "Avatar" && r.title != "Titanic"));
        assert_eq!(recs[0].title, "Aliens");
        assert_eq!(recs.len(), RESULT_LIMIT);
    }

    #[test]
    fn test_blend_stops_when_corpus_runs_out() {
        let movies = vec![
            TaggedMovie::new(1, "A", "alpha"),
            TaggedMovie::new(2, "B", "beta"),
            TaggedMovie::new(3, "C", "alpha beta"),
        ];
        let engine = SimilarityEngine::build(&movies, &EngineConfig::default()).unwrap();
        let recs = engine.blend("A", "B").unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "C");
        assert!((recs[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_blend_missing_second_title() {
        let err = engine().blend("Avatar", "Nope").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { ref title } if title == "Nope"));
    }

    #[test]
    fn test_degenerate_vector() {
        let engine = engine();
        assert!(engine.vector(6).unwrap().is_zero());
        assert_eq!(engine.similarity(6, 6), Some(0.0));
        assert_eq!(engine.similarity(6, 1), Some(0.0));
        assert_eq!(engine.similarity(1, 1), Some(1.0));
    }

    #[test]
    fn test_search() {
        let engine = engine();
        let hits: Vec<&str> = engine.search("alien", 10).iter().map(|m| m.title.as_str()).collect();
        assert_eq!(hits, vec!["Aliens"]);

        let movies = vec![
            TaggedMovie::new(1, "Alien Nation", "x"),
            TaggedMovie::new(2, "Alien", "y"),
        ];
        let engine = SimilarityEngine::build(&movies, &EngineConfig::default()).unwrap();
        let hits: Vec<MovieId> = engine.search("ALIEN", 10).iter().map(|m| m.id).collect();
        assert_eq!(hits, vec![2, 1]);
        assert_eq!(engine.search("alien", 1).len(), 1);
    }

    #[test]
    fn test_weighted_vectors_line_up_with_counts() {
        let built = engine();
        let loaded = crate::Artifacts::from_engine(&built).into_engine().unwrap();
        for engine in [&built, &loaded] {
            assert_eq!(engine.weighted.len(), engine.movie_count());
            for (counts, weighted) in engine.vectors.iter().zip(&engine.weighted) {
                assert_eq!(&WeightedVector::from(counts), weighted);
            }
        }
        assert_eq!(loaded.blend("Avatar", "Titanic").unwrap(), built.blend("Avatar", "Titanic").unwrap());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::default().with_max_features(3);
        assert_eq!(EngineConfig::default().max_features, 5000);
        let engine = SimilarityEngine::build(&corpus(), &config).unwrap();
        assert_eq!(engine.vocabulary_size(), 3);
    }
}
