use bevy::app::PluginGroupBuilder;
use bevy::prelude::*;
use std::path::Path;

pub use ts_core::{BiomeType, ChunkCoord, TsCorePlugin, WorldPos};
pub use ts_persistence::{PresetStore, SettingsIoError};
pub use ts_voronoi::{BiomeCache, VoronoiError, VoronoiParams, VoronoiPlugin, VoronoiSettings};

/// All Tessera plugins, configured with one set of Voronoi settings.
#[derive(Default)]
pub struct TesseraPlugins {
    pub settings: VoronoiSettings,
}

impl TesseraPlugins {
    pub fn new(settings: VoronoiSettings) -> Self {
        Self { settings }
    }

    /// Read the settings from a RON file, using defaults if it is missing.
    pub fn from_settings_file(path: &Path) -> Result<Self, SettingsIoError> {
        let settings = ts_persistence::load_settings_or_default(path)?;
        info!("Using Voronoi settings (seed {}) from {}", settings.seed, path.display());
        Ok(Self::new(settings))
    }

    /// Read the preset called `name` from `store`, using defaults if there
    /// is no such preset.
    pub fn from_preset(store: &PresetStore, name: &str) -> Result<Self, SettingsIoError> {
        Self::from_settings_file(&store.path_for(name))
    }
}

impl PluginGroup for TesseraPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(TsCorePlugin)
            .add(VoronoiPlugin::new(self.settings))
    }
}
