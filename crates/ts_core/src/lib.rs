use bevy::prelude::*;

pub mod biome;
pub mod coords;

pub use biome::BiomeType;
pub use coords::{ChunkCoord, WorldPos};

/// Core plugin providing foundational types for Tessera.
pub struct TsCorePlugin;

impl Plugin for TsCorePlugin {
    fn build(&self, _app: &mut App) {
        // Shared value types only; other crates register the systems.
    }
}
