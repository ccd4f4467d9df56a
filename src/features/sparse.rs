//! Sparse feature vector
use super::FeatureVector;
use std::fmt;

/// Position marker for indices without a stored entry.
const ABSENT: usize = usize::MAX;

/// A sparse real vector with constant-time indexed access.
///
/// Active entries are stored densely in insertion order alongside a table mapping each
/// feature index to its storage position. All arithmetic iterates over the stored entries
/// only so its cost is proportional to the number of active features, not the dimension.
#[derive(Clone)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
    positions: Vec<usize>,
}

impl SparseVector {
    /// Create an all-zero vector.
    pub fn new(dimension: usize) -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
            positions: vec![ABSENT; dimension],
        }
    }

    /// Create a vector from `(index, value)` pairs; repeated indices accumulate.
    pub fn from_entries<I>(dimension: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut v = Self::new(dimension);
        for (index, value) in entries {
            v.add_to_entry(index, value);
        }
        v
    }

    /// Number of features; fixed at construction.
    pub fn dimension(&self) -> usize {
        self.positions.len()
    }

    /// The value of a feature. Unset features are 0.
    pub fn get(&self, index: usize) -> f64 {
        match self.positions[index] {
            ABSENT => 0.0,
            pos => self.values[pos],
        }
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Whether no feature is active. Marks a terminal state.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn l1_norm(&self) -> f64 {
        self.values.iter().map(|v| v.abs()).sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Stored feature indices, in storage order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Iterate over the stored `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Set the value of a feature. Setting 0 removes the entry.
    pub fn set_entry(&mut self, index: usize, value: f64) {
        if value == 0.0 {
            self.remove_entry(index);
            return;
        }
        match self.positions[index] {
            ABSENT => self.push(index, value),
            pos => self.values[pos] = value,
        }
    }

    /// Add to the value of a feature.
    pub fn add_to_entry(&mut self, index: usize, value: f64) {
        match self.positions[index] {
            ABSENT => {
                if value != 0.0 {
                    self.push(index, value)
                }
            }
            pos => self.values[pos] += value,
        }
    }

    /// Remove the entry for a feature, setting it to 0.
    pub fn remove_entry(&mut self, index: usize) {
        let pos = self.positions[index];
        if pos == ABSENT {
            return;
        }
        self.positions[index] = ABSENT;
        self.indices.swap_remove(pos);
        self.values.swap_remove(pos);
        if let Some(&moved) = self.indices.get(pos) {
            self.positions[moved] = pos;
        }
    }

    /// Set every feature to 0.
    pub fn clear(&mut self) {
        for &index in &self.indices {
            self.positions[index] = ABSENT;
        }
        self.indices.clear();
        self.values.clear();
    }

    /// Copy the values of another vector of the same dimension.
    pub fn set(&mut self, other: &Self) {
        assert_eq!(self.dimension(), other.dimension(), "dimension mismatch");
        self.clear();
        for (index, value) in other.iter() {
            self.push(index, value);
        }
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: f64) {
        if factor == 0.0 {
            self.clear();
        } else {
            self.values.iter_mut().for_each(|v| *v *= factor);
        }
    }

    /// In-place `self += factor * other`.
    pub fn add_scaled(&mut self, factor: f64, other: &Self) {
        assert_eq!(self.dimension(), other.dimension(), "dimension mismatch");
        for (index, value) in other.iter() {
            self.add_to_entry(index, factor * value);
        }
    }

    /// Remove every entry with absolute value below `threshold`.
    pub fn remove_below(&mut self, threshold: f64) {
        let mut pos = 0;
        while pos < self.indices.len() {
            if self.values[pos].abs() < threshold {
                self.remove_entry(self.indices[pos]);
            } else {
                pos += 1;
            }
        }
    }

    /// Inner product with another sparse vector.
    pub fn dot(&self, other: &Self) -> f64 {
        assert_eq!(self.dimension(), other.dimension(), "dimension mismatch");
        let (small, large) = if self.nnz() <= other.nnz() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .iter()
            .map(|(index, value)| value * large.get(index))
            .sum()
    }

    /// Move every stored entry up by `offset` indices, leaving a copy behind if `keep_original`.
    ///
    /// Every stored index must be below `offset`.
    pub fn shift_entries(&mut self, offset: usize, keep_original: bool) {
        debug_assert!(self.indices.iter().all(|&index| index < offset));
        let n = self.nnz();
        if keep_original {
            for pos in 0..n {
                let (index, value) = (self.indices[pos], self.values[pos]);
                self.push(index + offset, value);
            }
        } else {
            for &index in &self.indices {
                self.positions[index] = ABSENT;
            }
            for (pos, index) in self.indices.iter_mut().enumerate() {
                *index += offset;
                self.positions[*index] = pos;
            }
        }
    }

    /// Whether every stored value is finite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    fn push(&mut self, index: usize, value: f64) {
        self.positions[index] = self.indices.len();
        self.indices.push(index);
        self.values.push(value);
    }
}

impl FeatureVector for SparseVector {
    fn dimension(&self) -> usize {
        Self::dimension(self)
    }

    fn get(&self, index: usize) -> f64 {
        Self::get(self, index)
    }

    fn nnz(&self) -> usize {
        Self::nnz(self)
    }

    fn l1_norm(&self) -> f64 {
        Self::l1_norm(self)
    }

    fn l2_norm(&self) -> f64 {
        Self::l2_norm(self)
    }
}

/// Equal if they have the same dimension and the same value for every feature.
impl PartialEq for SparseVector {
    fn eq(&self, other: &Self) -> bool {
        self.dimension() == other.dimension()
            && self.iter().all(|(i, v)| other.get(i) == v)
            && other.iter().all(|(i, v)| self.get(i) == v)
    }
}

// The position table is as long as the dimension; only show the entries.
impl fmt::Debug for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseVector")
            .field("dimension", &self.dimension())
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
