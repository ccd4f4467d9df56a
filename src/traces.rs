//! Eligibility traces
use crate::features::SparseVector;
use std::ops::{Index, IndexMut};

/// Trace entries below this magnitude are dropped after each decay to keep traces sparse.
pub const DEFAULT_THRESHOLD: f64 = 1e-8;

/// A decaying memory of recently active features.
pub trait Trace {
    /// Decay the trace by `decay` (typically `γλ`) and then mark `features` as active.
    ///
    /// An empty `features` vector makes this a pure decay.
    fn update(&mut self, decay: f64, features: &SparseVector);

    /// Multiply the whole trace by `factor`.
    fn decay(&mut self, factor: f64);

    /// The current trace vector.
    fn vect(&self) -> &SparseVector;

    /// Reset every entry to 0.
    fn clear(&mut self);

    fn dimension(&self) -> usize {
        self.vect().dimension()
    }
}

impl<T: Trace + ?Sized> Trace for Box<T> {
    fn update(&mut self, decay: f64, features: &SparseVector) {
        T::update(self, decay, features)
    }
    fn decay(&mut self, factor: f64) {
        T::decay(self, factor)
    }
    fn vect(&self) -> &SparseVector {
        T::vect(self)
    }
    fn clear(&mut self) {
        T::clear(self)
    }
}

/// Accumulating trace: active features are added to the decayed trace.
///
/// Repeated activations compound. Suited to continuous tile-coded features.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatingTrace {
    vector: SparseVector,
    threshold: f64,
}

impl AccumulatingTrace {
    pub fn new(dimension: usize) -> Self {
        Self::with_threshold(dimension, DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(dimension: usize, threshold: f64) -> Self {
        Self {
            vector: SparseVector::new(dimension),
            threshold,
        }
    }
}

impl Trace for AccumulatingTrace {
    fn update(&mut self, decay: f64, features: &SparseVector) {
        self.decay(decay);
        self.vector.add_scaled(1.0, features);
    }

    fn decay(&mut self, factor: f64) {
        self.vector.scale(factor);
        self.vector.remove_below(self.threshold);
    }

    fn vect(&self) -> &SparseVector {
        &self.vector
    }

    fn clear(&mut self) {
        self.vector.clear();
    }
}

/// Replacing trace: active features are reset to their feature value, others decay.
///
/// For binary features this clamps active entries to 1, bounding the trace magnitude.
/// Suited to tabular / indicator features.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacingTrace {
    vector: SparseVector,
    threshold: f64,
}

impl ReplacingTrace {
    pub fn new(dimension: usize) -> Self {
        Self::with_threshold(dimension, DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(dimension: usize, threshold: f64) -> Self {
        Self {
            vector: SparseVector::new(dimension),
            threshold,
        }
    }
}

impl Trace for ReplacingTrace {
    fn update(&mut self, decay: f64, features: &SparseVector) {
        self.decay(decay);
        for (index, value) in features.iter() {
            self.vector.set_entry(index, value);
        }
    }

    fn decay(&mut self, factor: f64) {
        self.vector.scale(factor);
        self.vector.remove_below(self.threshold);
    }

    fn vect(&self) -> &SparseVector {
        &self.vector
    }

    fn clear(&mut self) {
        self.vector.clear();
    }
}

/// A set of independent traces updated together.
///
/// An actor keeps one trace per policy parameter group.
#[derive(Debug, Clone, PartialEq)]
pub struct Traces<T> {
    traces: Vec<T>,
}

impl<T: Trace> Traces<T> {
    pub fn new(traces: Vec<T>) -> Self {
        Self { traces }
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Update trace `i` with `features[i]`, for every trace.
    pub fn update(&mut self, decay: f64, features: &[SparseVector]) {
        assert_eq!(self.traces.len(), features.len());
        for (trace, phi) in self.traces.iter_mut().zip(features) {
            trace.update(decay, phi);
        }
    }

    /// Decay every trace by `factor`.
    pub fn decay(&mut self, factor: f64) {
        self.traces.iter_mut().for_each(|t| t.decay(factor));
    }

    pub fn clear(&mut self) {
        self.traces.iter_mut().for_each(Trace::clear);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.traces.iter()
    }
}

impl<T> Index<usize> for Traces<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.traces[index]
    }
}

impl<T> IndexMut<usize> for Traces<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.traces[index]
    }
}

impl<T: Trace> FromIterator<T> for Traces<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
