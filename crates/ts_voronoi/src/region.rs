use rayon::prelude::*;
use ts_core::WorldPos;

use crate::cache::VoronoiCache;
use crate::error::{ConfigIssue, VoronoiError};
use crate::params::VoronoiParams;

impl<L> VoronoiCache<L>
where
    L: Clone + Send + Sync + 'static,
{
    /// Sample a `width × height` grid of labels in parallel.
    ///
    /// Point `(i, j)` sits at `origin + (i * step, j * step)`; the result is
    /// row-major with `width * height` entries, each equal to
    /// [`VoronoiCache::nearest_label`] at that point. Rows are spread over
    /// the rayon pool and populate chunks concurrently.
    pub fn sample_region(
        &self,
        origin: WorldPos,
        width: usize,
        height: usize,
        step: f64,
        params: &VoronoiParams,
        labels: &[L],
    ) -> Result<Vec<Option<L>>, VoronoiError> {
        self.check_inputs(params, labels)?;
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigIssue::NonPositiveStep(step).into());
        }

        let rows: Vec<Vec<Option<L>>> = (0..height)
            .into_par_iter()
            .map(|j| {
                let y = origin.y + j as f64 * step;
                (0..width)
                    .map(|i| self.nearest_label(WorldPos::new(origin.x + i as f64 * step, y), params, labels))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().flatten().collect())
    }
}
