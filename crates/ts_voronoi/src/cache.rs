use bevy::log::{debug, info, trace, warn};
use bevy::prelude::*;
use smallvec::SmallVec;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use ts_core::{ChunkCoord, WorldPos};

use crate::error::{ConfigIssue, VoronoiError};
use crate::params::{validate_inputs, VoronoiParams};
use crate::site::{ChunkSiteSet, Site};

/// World seed used when a chunk is generated before [`VoronoiCache::initialize`].
pub const DEFAULT_SEED: u64 = 0;

/// Lazily populated, chunked Voronoi site index.
///
/// Sites are generated per chunk on first use and never evicted. Any number
/// of threads may query concurrently: generation runs outside the lock and
/// the result is committed insert-if-absent, so each chunk keeps exactly one
/// site set and every caller sees that same set.
///
/// Like the seed, the [`VoronoiParams`] are fixed by the first call that
/// supplies them; stored chunks are only valid for that scale and density,
/// so later calls with other params fail with
/// [`ConfigIssue::ParamsMismatch`].
#[derive(Resource)]
pub struct VoronoiCache<L: Send + Sync + 'static> {
    seed: OnceLock<u64>,
    params: OnceLock<VoronoiParams>,
    chunks: RwLock<HashMap<ChunkCoord, Arc<ChunkSiteSet<L>>>>,
}

/// Result of a nearest-site query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestSite<L> {
    pub site: Site<L>,
    pub distance_squared: f64,
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub chunks: usize,
    pub sites: usize,
}

impl<L> Default for VoronoiCache<L>
where
    L: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L> VoronoiCache<L>
where
    L: Clone + Send + Sync + 'static,
{
    /// Create an empty, uninitialized cache.
    pub fn new() -> Self {
        Self {
            seed: OnceLock::new(),
            params: OnceLock::new(),
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty cache already initialized with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let cache = Self::new();
        cache.initialize(seed);
        cache
    }

    /// Create an empty cache with both the seed and the params fixed.
    pub fn with_settings(seed: u64, params: VoronoiParams) -> Result<Self, VoronoiError> {
        params.validate()?;
        let cache = Self::with_seed(seed);
        cache.bind_params(&params)?;
        Ok(cache)
    }

    /// Set the world seed. Only the first call has any effect.
    ///
    /// Returns `true` if this call performed the initialization.
    pub fn initialize(&self, seed: u64) -> bool {
        let mut initialized_here = false;
        let active = *self.seed.get_or_init(|| {
            initialized_here = true;
            seed
        });

        if initialized_here {
            info!("Voronoi cache initialized with seed {}", seed);
        } else if active != seed {
            warn!(
                "Ignoring Voronoi seed {}: cache already initialized with seed {}",
                seed, active
            );
        }
        initialized_here
    }

    pub fn is_initialized(&self) -> bool {
        self.seed.get().is_some()
    }

    /// The active world seed, if initialized.
    pub fn seed(&self) -> Option<u64> {
        self.seed.get().copied()
    }

    /// The params this cache generates chunks with, once fixed.
    pub fn params(&self) -> Option<VoronoiParams> {
        self.params.get().copied()
    }

    fn bind_params(&self, params: &VoronoiParams) -> Result<(), VoronoiError> {
        let bound = *self.params.get_or_init(|| *params);
        if bound != *params {
            return Err(ConfigIssue::ParamsMismatch {
                bound,
                requested: *params,
            }
            .into());
        }
        Ok(())
    }

    /// Validate query inputs and check them against the bound params.
    pub(crate) fn check_inputs(&self, params: &VoronoiParams, labels: &[L]) -> Result<(), VoronoiError> {
        validate_inputs(params, labels)?;
        self.bind_params(params)
    }

    fn world_seed(&self) -> u64 {
        if let Some(&seed) = self.seed.get() {
            return seed;
        }
        *self.seed.get_or_init(|| {
            debug!("Voronoi cache used before initialization, using seed {}", DEFAULT_SEED);
            DEFAULT_SEED
        })
    }

    // The map only ever gains complete entries, so a panic elsewhere while a
    // guard was held cannot leave it half-written.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ChunkCoord, Arc<ChunkSiteSet<L>>>> {
        self.chunks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ChunkCoord, Arc<ChunkSiteSet<L>>>> {
        self.chunks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The stored site set for `coord`, if it has been populated.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<Arc<ChunkSiteSet<L>>> {
        self.read().get(&coord).cloned()
    }

    /// Store a prebuilt site set unless its chunk is already populated.
    ///
    /// Returns the set that ends up stored for the chunk, which is the
    /// existing one if another writer got there first.
    pub fn insert_chunk(&self, set: ChunkSiteSet<L>) -> Arc<ChunkSiteSet<L>> {
        self.commit(set).0
    }

    fn commit(&self, set: ChunkSiteSet<L>) -> (Arc<ChunkSiteSet<L>>, bool) {
        let mut chunks = self.write();
        match chunks.entry(set.coord) {
            Entry::Occupied(entry) => {
                trace!("Chunk ({}, {}) already populated, discarding new sites", set.coord.x, set.coord.y);
                (Arc::clone(entry.get()), false)
            }
            Entry::Vacant(entry) => (Arc::clone(entry.insert(Arc::new(set))), true),
        }
    }

    /// Generate the sites for `coord` unless they already exist.
    ///
    /// Returns the stored set. When several threads race on the same chunk
    /// they all get back the one set that was committed first.
    pub fn ensure_chunk_populated(
        &self,
        coord: ChunkCoord,
        params: &VoronoiParams,
        labels: &[L],
    ) -> Result<Arc<ChunkSiteSet<L>>, VoronoiError> {
        self.check_inputs(params, labels)?;
        self.populate(coord, params, labels)
    }

    fn populate(
        &self,
        coord: ChunkCoord,
        params: &VoronoiParams,
        labels: &[L],
    ) -> Result<Arc<ChunkSiteSet<L>>, VoronoiError> {
        if let Some(set) = self.chunk(coord) {
            return Ok(set);
        }

        let set = ChunkSiteSet::generate(coord, self.world_seed(), params, labels)?;
        let site_count = set.len();
        let (stored, inserted) = self.commit(set);
        if inserted {
            debug!("Generated {} Voronoi sites for chunk ({}, {})", site_count, coord.x, coord.y);
        }
        Ok(stored)
    }

    /// Nearest site to `pos` among the 3×3 chunk neighbourhood of its chunk.
    ///
    /// Chunks are scanned in [`ChunkCoord::neighborhood`] order and sites in
    /// generation order; on equal distance the first site scanned wins.
    /// Returns `Ok(None)` when the neighbourhood holds no sites.
    pub fn nearest_site(
        &self,
        pos: WorldPos,
        params: &VoronoiParams,
        labels: &[L],
    ) -> Result<Option<NearestSite<L>>, VoronoiError> {
        self.check_inputs(params, labels)?;
        let center = ChunkCoord::from_world(pos, params.scale)
            .ok_or(ConfigIssue::PositionOutOfRange { x: pos.x, y: pos.y })?;

        let sets = center
            .neighborhood()
            .iter()
            .map(|&coord| self.populate(coord, params, labels))
            .collect::<Result<SmallVec<[Arc<ChunkSiteSet<L>>; 9]>, _>>()?;

        let mut best: Option<(&Site<L>, f64)> = None;
        for site in sets.iter().flat_map(|set| set.iter()) {
            let distance = pos.distance_squared(site.position);
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((site, distance));
            }
        }

        Ok(best.map(|(site, distance_squared)| NearestSite {
            site: site.clone(),
            distance_squared,
        }))
    }

    /// Label of the nearest site to `pos`, or `None` if no sites are in range.
    pub fn nearest_label(
        &self,
        pos: WorldPos,
        params: &VoronoiParams,
        labels: &[L],
    ) -> Result<Option<L>, VoronoiError> {
        Ok(self
            .nearest_site(pos, params, labels)?
            .map(|nearest| nearest.site.label))
    }

    /// Initialize with `seed` (ignored if already initialized), then query.
    pub fn sample_biome(
        &self,
        pos: WorldPos,
        params: &VoronoiParams,
        labels: &[L],
        seed: u64,
    ) -> Result<Option<L>, VoronoiError> {
        self.initialize(seed);
        self.nearest_label(pos, params, labels)
    }

    /// Get cache statistics for debugging.
    pub fn stats(&self) -> CacheStats {
        let chunks = self.read();
        CacheStats {
            chunks: chunks.len(),
            sites: chunks.values().map(|set| set.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use ts_core::BiomeType;

    const LABELS: [BiomeType; 2] = [BiomeType::Forest, BiomeType::Desert];

    fn params() -> VoronoiParams {
        VoronoiParams::new(10.0, 3)
    }

    #[test]
    fn first_seed_wins() {
        let cache = VoronoiCache::<BiomeType>::new();
        assert!(!cache.is_initialized());
        assert!(cache.initialize(42));
        assert!(!cache.initialize(7));
        assert_eq!(cache.seed(), Some(42));
    }

    #[test]
    fn concurrent_initialize_has_one_winner() {
        let cache = VoronoiCache::<BiomeType>::new();
        let barrier = Barrier::new(8);
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u64)
                .map(|i| {
                    let cache = &cache;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        cache.initialize(i) as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
        assert!(cache.is_initialized());
    }

    #[test]
    fn uninitialized_cache_uses_default_seed() {
        let cache = VoronoiCache::new();
        let set = cache
            .ensure_chunk_populated(ChunkCoord::new(1, 1), &params(), &LABELS)
            .unwrap();
        assert_eq!(cache.seed(), Some(DEFAULT_SEED));
        assert_eq!(
            *set,
            ChunkSiteSet::generate(ChunkCoord::new(1, 1), DEFAULT_SEED, &params(), &LABELS).unwrap()
        );
    }

    #[test]
    fn populate_is_idempotent() {
        let cache = VoronoiCache::with_seed(42);
        let coord = ChunkCoord::new(2, -5);
        let first = cache.ensure_chunk_populated(coord, &params(), &LABELS).unwrap();
        let stats = cache.stats();
        let second = cache.ensure_chunk_populated(coord, &params(), &LABELS).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), stats);
        assert_eq!(stats, CacheStats { chunks: 1, sites: 3 });
    }

    #[test]
    fn separate_caches_generate_identical_sites() {
        let a = VoronoiCache::with_seed(42);
        let b = VoronoiCache::with_seed(42);
        let coord = ChunkCoord::new(-1, 3);
        let sa = a.ensure_chunk_populated(coord, &params(), &LABELS).unwrap();
        let sb = b.ensure_chunk_populated(coord, &params(), &LABELS).unwrap();
        assert_eq!(*sa, *sb);
    }

    #[test]
    fn racing_population_keeps_one_set() {
        let cache = VoronoiCache::with_seed(9);
        let coord = ChunkCoord::new(0, 0);
        let barrier = Barrier::new(16);

        let results: Vec<Arc<ChunkSiteSet<BiomeType>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let cache = &cache;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        cache.ensure_chunk_populated(coord, &params(), &LABELS).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let stored = cache.chunk(coord).unwrap();
        assert!(results.iter().all(|set| Arc::ptr_eq(set, &stored)));
        assert_eq!(cache.stats().chunks, 1);
    }

    #[test]
    fn insert_chunk_keeps_first_committer() {
        let cache = VoronoiCache::with_seed(1);
        let coord = ChunkCoord::new(0, 0);
        let first = ChunkSiteSet::new(coord, vec![Site::new(WorldPos::new(1.0, 1.0), BiomeType::Forest)]);
        let second = ChunkSiteSet::new(coord, vec![Site::new(WorldPos::new(2.0, 2.0), BiomeType::Desert)]);

        cache.insert_chunk(first.clone());
        let stored = cache.insert_chunk(second);
        assert_eq!(*stored, first);
        assert_eq!(*cache.ensure_chunk_populated(coord, &params(), &LABELS).unwrap(), first);
    }

    #[test]
    fn params_are_fixed_by_first_use() {
        let cache = VoronoiCache::with_seed(42);
        let coarse = VoronoiParams::new(1000.0, 3);
        let fine = VoronoiParams::new(10.0, 3);
        let coord = ChunkCoord::new(0, 0);

        cache.ensure_chunk_populated(coord, &coarse, &LABELS).unwrap();
        assert_eq!(cache.params(), Some(coarse));

        let err = cache.ensure_chunk_populated(coord, &fine, &LABELS).unwrap_err();
        assert_eq!(
            err,
            VoronoiError::InvalidConfiguration(ConfigIssue::ParamsMismatch {
                bound: coarse,
                requested: fine,
            })
        );
        assert!(cache
            .nearest_label(WorldPos::new(5.0, 5.0), &VoronoiParams::new(1000.0, 4), &LABELS)
            .is_err());

        let stored = cache.chunk(coord).unwrap();
        assert!(stored.iter().all(|site| coord.contains(site.position, coarse.scale)));
    }

    #[test]
    fn with_settings_binds_params_up_front() {
        let params = VoronoiParams::new(10.0, 2);
        let cache = VoronoiCache::<BiomeType>::with_settings(5, params).unwrap();
        assert_eq!(cache.seed(), Some(5));
        assert_eq!(cache.params(), Some(params));
        assert_eq!(cache.stats(), CacheStats::default());

        let err = cache
            .nearest_label(WorldPos::new(1.0, 1.0), &VoronoiParams::new(20.0, 2), &LABELS)
            .unwrap_err();
        assert!(matches!(
            err,
            VoronoiError::InvalidConfiguration(ConfigIssue::ParamsMismatch { .. })
        ));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn with_settings_rejects_bad_scale() {
        assert!(VoronoiCache::<BiomeType>::with_settings(5, VoronoiParams::new(-1.0, 2)).is_err());
    }

    #[test]
    fn neighbouring_chunk_site_can_be_nearest() {
        let scale = 10.0;
        let params = VoronoiParams::new(scale, 0);
        let cache = VoronoiCache::with_seed(42);
        cache.insert_chunk(ChunkSiteSet::new(
            ChunkCoord::new(0, 0),
            vec![Site::new(WorldPos::new(0.01, 0.01), "A")],
        ));
        cache.insert_chunk(ChunkSiteSet::new(
            ChunkCoord::new(1, 0),
            vec![Site::new(WorldPos::new(scale - 0.01, 0.01), "B")],
        ));

        let label = cache
            .nearest_label(WorldPos::new(scale - 0.001, 0.005), &params, &["A", "B"])
            .unwrap();
        assert_eq!(label, Some("B"));
    }

    #[test]
    fn site_across_the_border_beats_own_chunk() {
        let params = VoronoiParams::new(10.0, 0);
        let cache = VoronoiCache::with_seed(42);
        cache.insert_chunk(ChunkSiteSet::new(
            ChunkCoord::new(0, 0),
            vec![Site::new(WorldPos::new(0.5, 0.5), "own")],
        ));
        cache.insert_chunk(ChunkSiteSet::new(
            ChunkCoord::new(1, 1),
            vec![Site::new(WorldPos::new(10.2, 10.2), "diagonal")],
        ));

        let nearest = cache
            .nearest_site(WorldPos::new(9.9, 9.9), &params, &["own", "diagonal"])
            .unwrap()
            .unwrap();
        assert_eq!(nearest.site.label, "diagonal");
        assert!((nearest.distance_squared - 0.18).abs() < 1e-9);
    }

    #[test]
    fn equidistant_sites_prefer_own_chunk_then_generation_order() {
        let params = VoronoiParams::new(10.0, 0);
        let cache = VoronoiCache::with_seed(42);
        cache.insert_chunk(ChunkSiteSet::new(
            ChunkCoord::new(1, 0),
            vec![Site::new(WorldPos::new(11.0, 5.0), "neighbour")],
        ));
        cache.insert_chunk(ChunkSiteSet::new(
            ChunkCoord::new(0, 0),
            vec![
                Site::new(WorldPos::new(8.0, 5.0), "first"),
                Site::new(WorldPos::new(8.0, 5.0), "second"),
            ],
        ));

        let labels = ["first", "second", "neighbour"];
        let nearest = cache
            .nearest_site(WorldPos::new(9.5, 5.0), &params, &labels)
            .unwrap()
            .unwrap();
        assert_eq!(nearest.site.label, "first");
        assert_eq!(nearest.distance_squared, 2.25);
    }

    #[test]
    fn empty_label_set_is_rejected() {
        let cache = VoronoiCache::<BiomeType>::with_seed(42);
        let err = cache
            .nearest_label(WorldPos::new(5.0, 5.0), &params(), &[])
            .unwrap_err();
        assert_eq!(err, VoronoiError::InvalidConfiguration(ConfigIssue::EmptyLabelSet));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let cache = VoronoiCache::with_seed(42);
        let err = cache
            .ensure_chunk_populated(ChunkCoord::new(0, 0), &VoronoiParams::new(0.0, 3), &LABELS)
            .unwrap_err();
        assert!(matches!(
            err,
            VoronoiError::InvalidConfiguration(ConfigIssue::NonPositiveScale(_))
        ));
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let cache = VoronoiCache::with_seed(42);
        let err = cache
            .nearest_label(WorldPos::new(f64::NAN, 0.0), &params(), &LABELS)
            .unwrap_err();
        assert!(matches!(
            err,
            VoronoiError::InvalidConfiguration(ConfigIssue::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_sites_yields_no_label() {
        let cache = VoronoiCache::with_seed(42);
        let label = cache
            .nearest_label(WorldPos::new(5.0, 5.0), &VoronoiParams::new(10.0, 0), &LABELS)
            .unwrap();
        assert_eq!(label, None);
        assert_eq!(cache.stats(), CacheStats { chunks: 9, sites: 0 });
    }

    #[test]
    fn repeated_query_returns_same_label() {
        let cache = VoronoiCache::new();
        let pos = WorldPos::new(5.0, 5.0);
        let first = cache.sample_biome(pos, &params(), &LABELS, 42).unwrap();
        let second = cache.sample_biome(pos, &params(), &LABELS, 42).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { chunks: 9, sites: 27 });
    }

    #[test]
    fn nearest_site_matches_brute_force() {
        let cache = VoronoiCache::with_seed(1234);
        let params = VoronoiParams::new(16.0, 4);
        for &(x, y) in &[(0.0, 0.0), (15.9, 0.1), (-3.5, 40.2), (100.0, -7.25)] {
            let pos = WorldPos::new(x, y);
            let nearest = cache.nearest_site(pos, &params, &LABELS).unwrap().unwrap();

            let center = ChunkCoord::from_world(pos, params.scale).unwrap();
            let brute = center
                .neighborhood()
                .iter()
                .flat_map(|&c| cache.chunk(c).unwrap().sites.clone())
                .map(|s| pos.distance_squared(s.position))
                .fold(f64::INFINITY, f64::min);
            assert_eq!(nearest.distance_squared, brute);
        }
    }
}
