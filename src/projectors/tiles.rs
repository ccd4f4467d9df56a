//! Tile coding
use super::Projector;
use crate::error::BuildError;
use crate::features::SparseVector;
use serde::{Deserialize, Serialize};

/// Configuration of a [`TileCoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCoderConfig {
    /// Number of offset tilings. Each contributes one active feature per observation.
    pub num_tilings: usize,
    /// Number of tiles spanning each observation range, per tiling.
    pub resolution: usize,
    /// Hashed memory size. `None` lays the tiles out on an exact, collision-free grid.
    pub memory_size: Option<usize>,
    /// Add a feature that is active for every non-terminal observation.
    pub include_bias: bool,
    /// Number of tags (e.g. discrete actions) tiled jointly with the observation.
    ///
    /// Multiplies the grid size; ignored when hashing, which accepts any tag.
    pub num_tags: usize,
}

impl Default for TileCoderConfig {
    fn default() -> Self {
        Self {
            num_tilings: 10,
            resolution: 10,
            memory_size: Some(10_000),
            include_bias: true,
            num_tags: 1,
        }
    }
}

impl TileCoderConfig {
    /// Build a tile coder over observations with the given per-variable ranges.
    pub fn build(&self, ranges: Vec<(f64, f64)>) -> Result<TileCoder, BuildError> {
        if self.num_tilings == 0 {
            return Err(BuildError::InvalidTiling("no tilings".into()));
        }
        if self.resolution == 0 {
            return Err(BuildError::InvalidTiling("zero resolution".into()));
        }
        if self.num_tags == 0 {
            return Err(BuildError::InvalidTiling("zero tags".into()));
        }
        if ranges.is_empty() {
            return Err(BuildError::InvalidTiling("no observation variables".into()));
        }
        if let Some((i, _)) = ranges
            .iter()
            .enumerate()
            .find(|(_, (low, high))| !(low.is_finite() && high.is_finite() && low < high))
        {
            return Err(BuildError::InvalidTiling(format!(
                "observation variable {} has an empty or unbounded range",
                i
            )));
        }

        let layout = match self.memory_size {
            Some(0) => return Err(BuildError::ZeroDimension),
            Some(memory_size) => Layout::Hashed { memory_size },
            None => {
                let overflow = || BuildError::InvalidTiling("grid too large".into());
                let tiles_per_tiling = u32::try_from(ranges.len())
                    .ok()
                    .and_then(|d| (self.resolution + 1).checked_pow(d))
                    .ok_or_else(overflow)?;
                let grid_size = tiles_per_tiling
                    .checked_mul(self.num_tilings)
                    .and_then(|n| n.checked_mul(self.num_tags))
                    .ok_or_else(overflow)?;
                Layout::Grid {
                    tiles_per_tiling,
                    grid_size,
                }
            }
        };
        let memory = match layout {
            Layout::Hashed { memory_size } => memory_size,
            Layout::Grid { grid_size, .. } => grid_size,
        };

        Ok(TileCoder {
            config: *self,
            ranges,
            layout,
            dimension: memory + usize::from(self.include_bias),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Grid {
        tiles_per_tiling: usize,
        grid_size: usize,
    },
    Hashed {
        memory_size: usize,
    },
}

/// Tile coder with grid or hashed tile storage.
///
/// Observation variables are normalized by their ranges (values outside are clamped) and
/// covered by `num_tilings` grids of `resolution` tiles per variable, each displaced by a
/// different fraction of a tile. Each tiling contributes a unit feature for the tile
/// containing the observation, so a non-terminal observation has exactly `num_tilings`
/// active units (plus the bias unit if enabled).
///
/// With hashing, tile coordinates are mapped into a fixed memory by [`hash_coordinates`].
/// Distinct tiles may share a memory cell; larger memories make this rarer.
/// Tiles colliding within one observation accumulate so the L1 norm stays exact.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCoder {
    config: TileCoderConfig,
    ranges: Vec<(f64, f64)>,
    layout: Layout,
    dimension: usize,
}

impl TileCoder {
    pub const fn config(&self) -> &TileCoderConfig {
        &self.config
    }

    /// Observation ranges used for normalization.
    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    /// Whether tiles are hashed into a fixed memory.
    pub const fn is_hashed(&self) -> bool {
        matches!(self.layout, Layout::Hashed { .. })
    }

    /// Tile coordinates of `observation` in tiling `tiling`, written into `coordinates`.
    fn tile_coordinates(&self, observation: &[f64], tiling: usize, coordinates: &mut Vec<i64>) {
        let num_tilings = self.config.num_tilings;
        let resolution = self.config.resolution as f64;
        coordinates.clear();
        for (i, (&x, &(low, high))) in observation.iter().zip(&self.ranges).enumerate() {
            let scaled = ((x - low) / (high - low)).clamp(0.0, 1.0) * resolution;
            // Displace each variable by a different odd multiple of 1/num_tilings
            // so that tilings are not aligned along the diagonal.
            let offset = ((tiling * (2 * i + 1)) % num_tilings) as f64 / num_tilings as f64;
            coordinates.push((scaled + offset).floor() as i64);
        }
    }
}

impl Projector for TileCoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_norm(&self) -> f64 {
        (self.config.num_tilings + usize::from(self.config.include_bias)) as f64
    }

    fn tag_capacity(&self) -> usize {
        match self.layout {
            Layout::Grid { .. } => self.config.num_tags,
            Layout::Hashed { .. } => usize::MAX,
        }
    }

    fn project_tagged(&self, observation: Option<&[f64]>, tag: usize, features: &mut SparseVector) {
        features.clear();
        let observation = match observation {
            Some(observation) => observation,
            None => return,
        };
        assert_eq!(
            observation.len(),
            self.ranges.len(),
            "observation has {} variables, tile coder expects {}",
            observation.len(),
            self.ranges.len()
        );
        assert!(tag < self.tag_capacity(), "tag {} out of range", tag);

        let mut coordinates = Vec::with_capacity(observation.len() + 2);
        for tiling in 0..self.config.num_tilings {
            self.tile_coordinates(observation, tiling, &mut coordinates);
            let index = match self.layout {
                Layout::Grid {
                    tiles_per_tiling, ..
                } => {
                    let stride = self.config.resolution as i64 + 1;
                    let within = coordinates
                        .iter()
                        .rev()
                        .fold(0, |acc, &c| acc * stride + c) as usize;
                    (tag * self.config.num_tilings + tiling) * tiles_per_tiling + within
                }
                Layout::Hashed { memory_size } => {
                    coordinates.push(tiling as i64);
                    coordinates.push(tag as i64);
                    hash_coordinates(&coordinates, memory_size)
                }
            };
            features.add_to_entry(index, 1.0);
        }
        if self.config.include_bias {
            features.set_entry(self.dimension - 1, 1.0);
        }
    }
}

/// Map a tuple of integer grid coordinates to a cell of a memory of size `memory_size`.
///
/// A pure function of its inputs: equal coordinates always map to the same cell.
pub fn hash_coordinates(coordinates: &[i64], memory_size: usize) -> usize {
    let mut h: u64 = 0x9e37_79b9_7f4a_7c15;
    for &c in coordinates {
        h = mix64(h ^ mix64(c as u64));
    }
    (h % memory_size as u64) as usize
}

/// SplitMix64 finalizer.
const fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
