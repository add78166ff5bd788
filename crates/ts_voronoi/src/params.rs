use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use ts_core::BiomeType;

use crate::error::{ConfigIssue, VoronoiError};

/// Chunking parameters shared by every query against one cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoronoiParams {
    /// Chunk side length in world units.
    pub scale: f64,
    /// Number of sites generated in each chunk.
    pub sites_per_chunk: usize,
}

impl Default for VoronoiParams {
    fn default() -> Self {
        Self {
            scale: 64.0,
            sites_per_chunk: 3,
        }
    }
}

impl VoronoiParams {
    pub const fn new(scale: f64, sites_per_chunk: usize) -> Self {
        Self {
            scale,
            sites_per_chunk,
        }
    }

    pub fn validate(&self) -> Result<(), VoronoiError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigIssue::NonPositiveScale(self.scale).into());
        }
        Ok(())
    }
}

/// Checks the parameters together with the label set they will be used with.
pub(crate) fn validate_inputs<L>(params: &VoronoiParams, labels: &[L]) -> Result<(), VoronoiError> {
    if labels.is_empty() {
        return Err(ConfigIssue::EmptyLabelSet.into());
    }
    params.validate()
}

/// World-level Voronoi configuration: seed, chunking and biome labels.
///
/// This is the serializable unit stored in settings files and inserted as a
/// resource by [`crate::VoronoiPlugin`].
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiSettings {
    /// World seed for site generation.
    pub seed: u64,
    /// Chunk scale and site density.
    pub params: VoronoiParams,
    /// Biomes that sites may be labelled with.
    pub labels: Vec<BiomeType>,
}

impl Default for VoronoiSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            params: VoronoiParams::default(),
            labels: vec![
                BiomeType::Plains,
                BiomeType::Forest,
                BiomeType::Desert,
                BiomeType::Tundra,
            ],
        }
    }
}

impl VoronoiSettings {
    pub fn validate(&self) -> Result<(), VoronoiError> {
        validate_inputs(&self.params, &self.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(VoronoiParams::default().validate().is_ok());
        assert!(VoronoiSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_scales() {
        for scale in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let err = VoronoiParams::new(scale, 3).validate().unwrap_err();
            assert!(matches!(
                err,
                VoronoiError::InvalidConfiguration(ConfigIssue::NonPositiveScale(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_labels() {
        let settings = VoronoiSettings {
            labels: Vec::new(),
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(VoronoiError::InvalidConfiguration(ConfigIssue::EmptyLabelSet))
        );
    }
}
