//! Learner checkpoints
use crate::features::DenseVector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::vec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("file error {0}")]
    Io(#[from] std::io::Error),
    #[error("(de)serialization error {0}")]
    Serialize(#[from] serde_cbor::Error),
    #[error("checkpoint vector has dimension {found}, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("checkpoint has {found} vectors, expected {expected}")]
    VectorCount { expected: usize, found: usize },
}

/// The numeric state of a learner: a flat sequence of vectors.
///
/// Scalars are stored as vectors of length one.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    vectors: Vec<Vec<f64>>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_vector(&mut self, vector: &DenseVector) {
        self.vectors.push(vector.to_vec());
    }

    pub fn push_scalar(&mut self, value: f64) {
        self.vectors.push(vec![value]);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Check that `other` holds as many vectors as `self`, each of the same dimension.
    pub fn check_layout(&self, other: &Self) -> Result<(), CheckpointError> {
        if self.len() != other.len() {
            return Err(CheckpointError::VectorCount {
                expected: self.len(),
                found: other.len(),
            });
        }
        for (expected, found) in self.vectors.iter().zip(&other.vectors) {
            if expected.len() != found.len() {
                return Err(CheckpointError::DimensionMismatch {
                    expected: expected.len(),
                    found: found.len(),
                });
            }
        }
        Ok(())
    }

    pub fn into_reader(self) -> CheckpointReader {
        CheckpointReader {
            total: self.vectors.len(),
            loaded: 0,
            vectors: self.vectors.into_iter(),
        }
    }
}

/// Reads back the vectors of a [`Checkpoint`] in the order they were pushed.
#[derive(Debug)]
pub struct CheckpointReader {
    vectors: vec::IntoIter<Vec<f64>>,
    total: usize,
    loaded: usize,
}

impl CheckpointReader {
    fn next(&mut self) -> Result<Vec<f64>, CheckpointError> {
        let vector = self.vectors.next().ok_or(CheckpointError::VectorCount {
            expected: self.loaded + 1,
            found: self.total,
        })?;
        self.loaded += 1;
        Ok(vector)
    }

    /// The next vector, which must have `dimension` entries.
    pub fn read_vector(&mut self, dimension: usize) -> Result<Vec<f64>, CheckpointError> {
        let vector = self.next()?;
        if vector.len() != dimension {
            return Err(CheckpointError::DimensionMismatch {
                expected: dimension,
                found: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Overwrite `target` with the next vector; it must have the same dimension.
    pub fn load_vector(&mut self, target: &mut DenseVector) -> Result<(), CheckpointError> {
        let vector = self.read_vector(target.dimension())?;
        target.assign(&vector);
        Ok(())
    }

    pub fn load_scalar(&mut self) -> Result<f64, CheckpointError> {
        match self.next()?.as_slice() {
            &[value] => Ok(value),
            other => Err(CheckpointError::DimensionMismatch {
                expected: 1,
                found: other.len(),
            }),
        }
    }

    /// Check that every vector was consumed.
    pub fn finish(self) -> Result<(), CheckpointError> {
        if self.loaded == self.total {
            Ok(())
        } else {
            Err(CheckpointError::VectorCount {
                expected: self.loaded,
                found: self.total,
            })
        }
    }
}

/// Save and restore the numeric state of a learner.
///
/// Only weights (and scalar estimates such as an average reward) are stored.
/// Loading clears eligibility traces; the learner resumes as at the start of an episode.
pub trait Persist {
    /// Append the learner state to a checkpoint.
    fn save_into(&self, checkpoint: &mut Checkpoint);

    /// Load state written by [`Persist::save_into`] on a learner of the same configuration.
    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError>;

    fn checkpoint(&self) -> Checkpoint {
        let mut checkpoint = Checkpoint::new();
        self.save_into(&mut checkpoint);
        checkpoint
    }

    /// Restore from a checkpoint. Fails without coercion on any mismatch.
    ///
    /// The layout is checked against the current state first, so a rejected checkpoint
    /// leaves the learner unchanged.
    fn restore(&mut self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        self.checkpoint().check_layout(&checkpoint)?;
        let mut reader = checkpoint.into_reader();
        self.load_from(&mut reader)?;
        reader.finish()
    }

    /// Serialize the learner state to a file.
    fn persist(&self, path: &Path) -> Result<(), CheckpointError> {
        let mut file = BufWriter::new(File::create(path)?);
        serde_cbor::to_writer(&mut file, &self.checkpoint())?;
        file.flush()?;
        Ok(())
    }

    /// Load learner state from a file written by [`Persist::persist`].
    fn resurrect(&mut self, path: &Path) -> Result<(), CheckpointError> {
        let file = BufReader::new(File::open(path)?);
        let checkpoint: Checkpoint = serde_cbor::from_reader(file)?;
        self.restore(checkpoint)
    }
}

impl<T: Persist + ?Sized> Persist for Box<T> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        T::save_into(self, checkpoint)
    }
    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        T::load_from(self, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Weights {
        w: DenseVector,
        average: f64,
    }

    impl Persist for Weights {
        fn save_into(&self, checkpoint: &mut Checkpoint) {
            checkpoint.push_vector(&self.w);
            checkpoint.push_scalar(self.average);
        }

        fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
            reader.load_vector(&mut self.w)?;
            self.average = reader.load_scalar()?;
            Ok(())
        }
    }

    fn weights(dimension: usize) -> Weights {
        Weights {
            w: DenseVector::from_vec((0..dimension).map(|i| i as f64 * 0.5).collect()),
            average: -1.25,
        }
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join(format!("linear_rl_save_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("weights.cbor");
        let original = weights(4);
        original.persist(&path).unwrap();

        let mut restored = Weights {
            w: DenseVector::zeros(4),
            average: 0.0,
        };
        restored.resurrect(&path).unwrap();
        assert_eq!(restored, original);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let mut target = weights(5);
        let result = target.restore(weights(4).checkpoint());
        assert!(matches!(
            result,
            Err(CheckpointError::DimensionMismatch {
                expected: 5,
                found: 4
            })
        ));
    }

    #[test]
    fn missing_vectors_are_an_error() {
        let mut checkpoint = Checkpoint::new();
        checkpoint.push_vector(&DenseVector::zeros(4));
        let result = weights(4).restore(checkpoint);
        assert!(matches!(result, Err(CheckpointError::VectorCount { .. })));
    }

    #[test]
    fn trailing_vectors_are_an_error() {
        let mut checkpoint = weights(4).checkpoint();
        checkpoint.push_scalar(1.0);
        assert!(matches!(
            weights(4).restore(checkpoint),
            Err(CheckpointError::VectorCount {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn rejected_checkpoint_leaves_state_unchanged() {
        let mut checkpoint = Checkpoint::new();
        checkpoint.push_vector(&DenseVector::from_vec(vec![9.0; 4]));
        checkpoint.push_vector(&DenseVector::zeros(2));
        let mut target = weights(4);
        assert!(matches!(
            target.restore(checkpoint),
            Err(CheckpointError::DimensionMismatch {
                expected: 1,
                found: 2
            })
        ));
        assert_eq!(target, weights(4));
    }

    #[test]
    fn missing_file() {
        let mut target = weights(2);
        let result = target.resurrect(Path::new("/nonexistent/linear_rl/checkpoint"));
        assert!(matches!(result, Err(CheckpointError::Io(_))));
    }
}
