use ts_core::ChunkCoord;

const CHUNK_X_PRIME: u64 = 73_856_093;
const CHUNK_Y_PRIME: u64 = 19_349_663;

/// Seed for one chunk's site stream.
///
/// A pure function of the world seed and chunk coordinates. Each axis is
/// spread with its own odd multiplier and folded in separately, with a
/// 64-bit finalizer after each step, so point-mirrored chunks such as
/// (1, 1) and (-1, -1) get different seeds.
pub fn chunk_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let hx = (coord.x as i64 as u64).wrapping_mul(CHUNK_X_PRIME);
    let hy = (coord.y as i64 as u64).wrapping_mul(CHUNK_Y_PRIME);
    mix64(mix64(world_seed ^ hx) ^ hy)
}

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
