//! On-disk form of a built engine.
//!
//! The offline build writes one JSON file holding the movie table, the
//! vocabulary, the count-vector table and the similarity matrix. Every
//! table carries movie ids; loading checks that they all line up before
//! the engine is reassembled.

use crate::engine::{EngineConfig, SimilarityEngine};
use crate::error::{EngineError, Result};
use crate::matrix::SimilarityMatrix;
use crate::vector::{CountVector, WeightedVector};
use crate::vocabulary::Vocabulary;
use feature_builder::{MovieId, TaggedMovie};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{info, instrument};

/// One row of the vector table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVector {
    pub movie_id: MovieId,
    pub vector: CountVector,
}

/// Everything the serving side needs, keyed by movie id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub config: EngineConfig,
    pub movies: Vec<TaggedMovie>,
    pub vocabulary: Vec<String>,
    pub vectors: Vec<StoredVector>,
    pub matrix: SimilarityMatrix,
}

impl Artifacts {
    /// Snapshot a built engine
    pub fn from_engine(engine: &SimilarityEngine) -> Self {
        Self {
            config: *engine.config(),
            movies: engine.movies().to_vec(),
            vocabulary: engine.vocabulary().terms().to_vec(),
            vectors: engine
                .movies()
                .iter()
                .zip(engine.vectors())
                .map(|(movie, vector)| StoredVector {
                    movie_id: movie.id,
                    vector: vector.clone(),
                })
                .collect(),
            matrix: engine.matrix().clone(),
        }
    }

    /// Check that every table lists the same movies in the same order and
    /// that the shapes agree with the vocabulary
    pub fn validate(&self) -> Result<()> {
        let ids: Vec<MovieId> = self.movies.iter().map(|m| m.id).collect();

        let vector_ids = self.vectors.iter().map(|v| v.movie_id);
        if !vector_ids.eq(ids.iter().copied()) {
            return Err(mismatch("vector table ids differ from movie table"));
        }
        if self.matrix.ids() != ids.as_slice() {
            return Err(mismatch("similarity matrix ids differ from movie table"));
        }
        if !self.matrix.has_valid_shape() {
            return Err(mismatch("similarity matrix is not square"));
        }

        let dimension = self.vocabulary.len();
        for stored in &self.vectors {
            if stored.vector.dimension() != dimension {
                return Err(mismatch(&format!(
                    "vector of movie {} doesn't match vocabulary size {}",
                    stored.movie_id, dimension
                )));
            }
            if !stored.vector.is_well_formed() {
                return Err(mismatch(&format!(
                    "vector of movie {} has unsorted, repeated, zero or out-of-range counts",
                    stored.movie_id
                )));
            }
        }
        Ok(())
    }

    /// Validate and reassemble the engine
    pub fn into_engine(self) -> Result<SimilarityEngine> {
        self.validate()?;
        let vectors: Vec<CountVector> = self.vectors.into_iter().map(|s| s.vector).collect();
        let weighted = vectors.iter().map(WeightedVector::from).collect();
        SimilarityEngine::assemble(
            self.config,
            self.movies,
            Vocabulary::from_terms(self.vocabulary),
            vectors,
            weighted,
            self.matrix,
        )
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

fn mismatch(reason: &str) -> EngineError {
    EngineError::ArtifactMismatch(reason.to_string())
}

impl SimilarityEngine {
    /// Write this engine's artifacts to `path`
    #[instrument(skip(self))]
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        Artifacts::from_engine(self).write_to(&mut writer)?;
        writer.flush()?;
        info!("Saved artifacts for {} movies", self.movie_count());
        Ok(())
    }

    /// Load and validate artifacts from `path`
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let engine = Artifacts::read_from(reader)?.into_engine()?;
        info!(
            "Loaded artifacts: {} movies, {} terms",
            engine.movie_count(),
            engine.vocabulary_size()
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifacts() -> Artifacts {
        let movies = vec![
            TaggedMovie::new(1, "Avatar", "alien marine planet"),
            TaggedMovie::new(2, "Aliens", "alien marine"),
            TaggedMovie::new(3, "Titanic", "ship romance"),
        ];
        let engine = SimilarityEngine::build(&movies, &EngineConfig::default()).unwrap();
        Artifacts::from_engine(&engine)
    }

    #[test]
    fn test_snapshot_is_valid() {
        artifacts().validate().unwrap();
    }

    #[test]
    fn test_reordered_vectors_rejected() {
        let mut a = artifacts();
        a.vectors.swap(0, 1);
        assert!(matches!(a.validate(), Err(EngineError::ArtifactMismatch(_))));
    }

    #[test]
    fn test_missing_movie_rejected() {
        let mut a = artifacts();
        a.movies.pop();
        assert!(matches!(a.into_engine(), Err(EngineError::ArtifactMismatch(_))));
    }

    #[test]
    fn test_vocabulary_size_mismatch_rejected() {
        let mut a = artifacts();
        a.vocabulary.pop();
        assert!(matches!(a.validate(), Err(EngineError::ArtifactMismatch(_))));
    }

    #[test]
    fn test_corrupted_counts_rejected() {
        let mut buffer = Vec::new();
        artifacts().write_to(&mut buffer).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        let counts = json["vectors"][0]["vector"]["counts"].as_array_mut().unwrap();
        assert!(counts.len() > 1);
        counts.reverse();

        let corrupted = Artifacts::read_from(json.to_string().as_bytes()).unwrap();
        assert!(matches!(corrupted.validate(), Err(EngineError::ArtifactMismatch(_))));
        assert!(matches!(corrupted.into_engine(), Err(EngineError::ArtifactMismatch(_))));
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut buffer = Vec::new();
        artifacts().write_to(&mut buffer).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        json["vectors"][2]["vector"]["counts"][0][1] = serde_json::json!(0);

        let corrupted = Artifacts::read_from(json.to_string().as_bytes()).unwrap();
        assert!(matches!(corrupted.validate(), Err(EngineError::ArtifactMismatch(_))));
    }

    #[test]
    fn test_in_memory_round_trip() {
        let a = artifacts();
        let mut buffer = Vec::new();
        a.write_to(&mut buffer).unwrap();
        let back = Artifacts::read_from(buffer.as_slice()).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        let err = Artifacts::read_from("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
