use bevy::prelude::*;
use ts_core::{BiomeType, WorldPos};

pub mod cache;
pub mod error;
pub mod params;
pub mod region;
pub mod seed;
pub mod site;

pub use cache::{CacheStats, NearestSite, VoronoiCache, DEFAULT_SEED};
pub use error::{ConfigIssue, VoronoiError};
pub use params::{VoronoiParams, VoronoiSettings};
pub use seed::chunk_seed;
pub use site::{ChunkSiteSet, Site};

/// Voronoi cache labelled with the built-in biome set.
pub type BiomeCache = VoronoiCache<BiomeType>;

impl BiomeCache {
    /// Biome at `pos` using the seed, chunking and labels in `settings`.
    pub fn biome_at(
        &self,
        pos: WorldPos,
        settings: &VoronoiSettings,
    ) -> Result<Option<BiomeType>, VoronoiError> {
        self.sample_biome(pos, &settings.params, &settings.labels, settings.seed)
    }
}

/// Voronoi biome plugin for Tessera.
/// Inserts the settings and a [`BiomeCache`] bound to their seed and params.
#[derive(Default)]
pub struct VoronoiPlugin {
    pub settings: VoronoiSettings,
}

impl VoronoiPlugin {
    pub fn new(settings: VoronoiSettings) -> Self {
        Self { settings }
    }
}

impl Plugin for VoronoiPlugin {
    fn build(&self, app: &mut App) {
        let settings = &self.settings;
        if let Err(err) = settings.validate() {
            error!("Voronoi settings rejected, biome queries will fail: {}", err);
        }
        let cache = BiomeCache::with_settings(settings.seed, settings.params)
            .unwrap_or_else(|_| BiomeCache::with_seed(settings.seed));
        app.insert_resource(settings.clone()).insert_resource(cache);
    }
}
