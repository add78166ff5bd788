use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Grid position of a chunk in chunk-space coordinates.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Component, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk offset by `(dx, dy)`.
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The 3×3 block of chunks centred on this one.
    ///
    /// Order is fixed: self, left, right, up, down, up-left, up-right,
    /// down-left, down-right (up is +y). Nearest-site scans walk chunks in
    /// this order, so it decides which of two equidistant sites wins.
    ///
    /// Callers must keep `x` and `y` at least one step away from the `i32`
    /// limits.
    pub const fn neighborhood(&self) -> [ChunkCoord; 9] {
        [
            *self,
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(-1, 1),
            self.offset(1, 1),
            self.offset(-1, -1),
            self.offset(1, -1),
        ]
    }

    /// Chunk containing `pos` for chunks of side `scale`, using floor
    /// division per axis.
    ///
    /// Returns `None` when the position is not finite or when the chunk or
    /// any of its neighbours would fall outside the `i32` range.
    ///
    /// This is the lookup used for queries. It divides where [`contains`]
    /// multiplies, so for a point within rounding error of an edge the two
    /// can name adjacent chunks; a query's 3×3 neighbourhood covers both.
    ///
    /// [`contains`]: ChunkCoord::contains
    pub fn from_world(pos: WorldPos, scale: f64) -> Option<Self> {
        let cx = chunk_axis(pos.x, scale)?;
        let cy = chunk_axis(pos.y, scale)?;
        Some(Self::new(cx, cy))
    }

    /// World-space corner with the smallest coordinates.
    pub fn origin(&self, scale: f64) -> WorldPos {
        WorldPos::new(self.x as f64 * scale, self.y as f64 * scale)
    }

    /// Whether `pos` lies in this chunk's half-open bounds
    /// `[x * scale, (x + 1) * scale) × [y * scale, (y + 1) * scale)`.
    ///
    /// These bounds are authoritative for where a chunk's sites may be
    /// generated.
    pub fn contains(&self, pos: WorldPos, scale: f64) -> bool {
        let origin = self.origin(scale);
        let (max_x, max_y) = ((self.x as f64 + 1.0) * scale, (self.y as f64 + 1.0) * scale);
        pos.x >= origin.x && pos.x < max_x && pos.y >= origin.y && pos.y < max_y
    }
}

fn chunk_axis(value: f64, scale: f64) -> Option<i32> {
    let chunk = (value / scale).floor();
    // One chunk of headroom on each side for the neighbourhood.
    let limit = (i32::MAX - 1) as f64;
    if chunk.is_finite() && chunk.abs() <= limit {
        Some(chunk as i32)
    } else {
        None
    }
}

/// Continuous world-space position using f64 for precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: WorldPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
