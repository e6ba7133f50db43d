//! Sparse count vectors and cosine similarity.
//!
//! Movies carry a few dozen tokens against a vocabulary of thousands, so
//! vectors are kept as sorted `(dimension, value)` pairs.

use serde::{Deserialize, Serialize};

/// Raw token counts of one movie against the shared vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountVector {
    dimension: usize,
    /// Sorted by dimension index, zero counts omitted
    counts: Vec<(u32, u32)>,
}

impl CountVector {
    /// Build from `(index, count)` pairs; zero counts are dropped and pairs sorted
    pub fn new(dimension: usize, mut counts: Vec<(u32, u32)>) -> Self {
        counts.retain(|&(_, c)| c > 0);
        counts.sort_by_key(|&(i, _)| i);
        Self { dimension, counts }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn counts(&self) -> &[(u32, u32)] {
        &self.counts
    }

    /// All-zero vectors are similar to nothing
    pub fn is_zero(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn to_dense(&self) -> Vec<u32> {
        let mut dense = vec![0; self.dimension];
        for &(i, c) in &self.counts {
            dense[i as usize] = c;
        }
        dense
    }

    /// Indices strictly increase, every count is positive and the largest
    /// index is inside the dimension.
    ///
    /// Always true for vectors made by [`CountVector::new`]; deserialized
    /// vectors are checked with this before use.
    pub(crate) fn is_well_formed(&self) -> bool {
        let sorted = self.counts.windows(2).all(|w| w[0].0 < w[1].0);
        let positive = self.counts.iter().all(|&(_, c)| c > 0);
        let in_range = self
            .counts
            .last()
            .is_none_or(|&(i, _)| (i as usize) < self.dimension);
        sorted && positive && in_range
    }
}

/// Floating point view of a vector with its norm precomputed
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedVector {
    entries: Vec<(u32, f64)>,
    norm: f64,
}

impl WeightedVector {
    fn from_entries(entries: Vec<(u32, f64)>) -> Self {
        let norm = entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
        Self { entries, norm }
    }

    /// Elementwise average of two vectors
    pub fn average(a: &WeightedVector, b: &WeightedVector) -> Self {
        let mut entries = Vec::with_capacity(a.entries.len() + b.entries.len());
        let (mut i, mut j) = (0, 0);
        while i < a.entries.len() || j < b.entries.len() {
            let left = a.entries.get(i);
            let right = b.entries.get(j);
            match (left, right) {
                (Some(&(ia, wa)), Some(&(ib, wb))) if ia == ib => {
                    entries.push((ia, (wa + wb) / 2.0));
                    i += 1;
                    j += 1;
                }
                (Some(&(ia, wa)), Some(&(ib, _))) if ia < ib => {
                    entries.push((ia, wa / 2.0));
                    i += 1;
                }
                (Some(&(ia, wa)), None) => {
                    entries.push((ia, wa / 2.0));
                    i += 1;
                }
                (_, Some(&(ib, wb))) => {
                    entries.push((ib, wb / 2.0));
                    j += 1;
                }
                (None, None) => break,
            }
        }
        Self::from_entries(entries)
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    pub fn dot(&self, other: &WeightedVector) -> f64 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

impl From<&CountVector> for WeightedVector {
    fn from(v: &CountVector) -> Self {
        Self::from_entries(v.counts.iter().map(|&(i, c)| (i, f64::from(c))).collect())
    }
}

/// dot(a, b) / (|a| * |b|), or 0 when either vector is all-zero.
///
/// Inputs are non-negative, so the result is clamped into [0, 1].
pub fn cosine_similarity(a: &WeightedVector, b: &WeightedVector) -> f64 {
    let denominator = a.norm() * b.norm();
    if denominator == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denominator).clamp(0.0, 1.0)
}
