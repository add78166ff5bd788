use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use ts_core::{ChunkCoord, WorldPos};

use crate::error::VoronoiError;
use crate::params::{validate_inputs, VoronoiParams};
use crate::seed::chunk_seed;

/// A randomly placed point carrying a category label.
#[derive(Debug, Clone, PartialEq)]
pub struct Site<L> {
    pub position: WorldPos,
    pub label: L,
}

impl<L> Site<L> {
    pub const fn new(position: WorldPos, label: L) -> Self {
        Self { position, label }
    }
}

/// The sites of one chunk, in generation order. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSiteSet<L> {
    pub coord: ChunkCoord,
    pub sites: Vec<Site<L>>,
}

impl<L: Clone> ChunkSiteSet<L> {
    /// Deterministically generate the sites for `coord`.
    ///
    /// Each site draws its x offset, y offset and label index, in that
    /// order, from one `ChaCha8Rng` seeded by [`chunk_seed`]. Offsets are
    /// uniform in `[0, scale)` so sites stay inside the chunk's half-open
    /// bounds.
    ///
    /// Fails with `InvalidConfiguration` for an empty label set or a scale
    /// that is not a positive finite number.
    pub fn generate(
        coord: ChunkCoord,
        world_seed: u64,
        params: &VoronoiParams,
        labels: &[L],
    ) -> Result<Self, VoronoiError> {
        validate_inputs(params, labels)?;

        let scale = params.scale;
        let mut rng = ChaCha8Rng::seed_from_u64(chunk_seed(world_seed, coord));

        let origin = coord.origin(scale);
        let max_x = (coord.x as f64 + 1.0) * scale;
        let max_y = (coord.y as f64 + 1.0) * scale;

        let mut sites = Vec::with_capacity(params.sites_per_chunk);
        for _ in 0..params.sites_per_chunk {
            let x = below(origin.x + rng.gen_range(0.0..scale), max_x);
            let y = below(origin.y + rng.gen_range(0.0..scale), max_y);
            let label = labels[rng.gen_range(0..labels.len())].clone();
            sites.push(Site::new(WorldPos::new(x, y), label));
        }

        Ok(Self { coord, sites })
    }
}

impl<L> ChunkSiteSet<L> {
    pub fn new(coord: ChunkCoord, sites: Vec<Site<L>>) -> Self {
        Self { coord, sites }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Site<L>> {
        self.sites.iter()
    }
}

/// Keeps `value` strictly under `upper`; float addition near the far edge
/// can otherwise round onto the next chunk's boundary.
fn below(value: f64, upper: f64) -> f64 {
    if value < upper {
        value
    } else {
        previous_float(upper)
    }
}

fn previous_float(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x < 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}
