//! All-pairs cosine similarity matrix.

use crate::error::{EngineError, Result};
use crate::vector::{cosine_similarity, WeightedVector};
use feature_builder::MovieId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Square similarity matrix with one row and one column per movie.
///
/// `ids[i]` names row and column `i`; values are stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    ids: Vec<MovieId>,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute every pairwise cosine similarity.
    ///
    /// Only the upper triangle is computed (rows in parallel) and then
    /// mirrored, so the result is exactly symmetric. The diagonal is 1.0,
    /// or 0.0 for a movie whose vector is all-zero.
    #[instrument(skip_all, fields(movies = ids.len()))]
    pub fn compute(ids: Vec<MovieId>, vectors: &[WeightedVector]) -> Self {
        let n = vectors.len();
        let upper: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i..n)
                    .map(|j| {
                        if i == j {
                            if vectors[i].norm() > 0.0 { 1.0 } else { 0.0 }
                        } else {
                            cosine_similarity(&vectors[i], &vectors[j]) as f32
                        }
                    })
                    .collect()
            })
            .collect();

        let mut values = vec![0.0f32; n * n];
        for (i, row) in upper.iter().enumerate() {
            for (offset, &score) in row.iter().enumerate() {
                let j = i + offset;
                values[i * n + j] = score;
                values[j * n + i] = score;
            }
        }

        info!("Computed {}x{} similarity matrix", n, n);
        Self { ids, values }
    }

    /// Rebuild from raw parts, checking the shape
    pub fn from_parts(ids: Vec<MovieId>, values: Vec<f32>) -> Result<Self> {
        if values.len() != ids.len() * ids.len() {
            return Err(EngineError::ArtifactMismatch(format!(
                "matrix has {} values for {} movies",
                values.len(),
                ids.len()
            )));
        }
        Ok(Self { ids, values })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[MovieId] {
        &self.ids
    }

    /// Row `i` of the matrix
    pub(crate) fn row(&self, i: usize) -> &[f32] {
        let n = self.len();
        &self.values[i * n..(i + 1) * n]
    }

    pub(crate) fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.len() + j]
    }

    pub(crate) fn has_valid_shape(&self) -> bool {
        self.values.len() == self.ids.len() * self.ids.len()
    }
}
