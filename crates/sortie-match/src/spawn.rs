//! Random spawn point selection.

use rand::Rng;
use sortie_protocol::BlockPos;

use crate::WorldHost;

/// Picks a spawn point for one player.
///
/// X and Z are uniform in `[-radius, radius)`. Y is one block above the
/// surface at that column. Columns with no terrain (surface at or below
/// the world floor) fall back to one block above sea level, so the
/// result is `sea_level + 2`.
pub fn pick_spawn<H, R>(host: &H, world: &H::World, radius: i32, rng: &mut R) -> BlockPos
where
    H: WorldHost,
    R: Rng + ?Sized,
{
    let radius = radius.max(1);
    let x = rng.random_range(-radius..radius);
    let z = rng.random_range(-radius..radius);

    let mut y = host.surface_height(world, x, z);
    if y <= host.min_build_height(world) {
        y = host.sea_level(world) + 1;
    }

    BlockPos::new(x, y + 1, z)
}
