use serde::{Deserialize, Serialize};

/// Biome categories a terrain generator can assign to Voronoi sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BiomeType {
    #[default]
    Plains,
    Forest,
    Desert,
    Tundra,
    Swamp,
    Savanna,
    Jungle,
    Mountain,
}
