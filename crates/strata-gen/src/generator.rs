//! The generation pipeline: bias curves, mountain carving, per-level fill
//! and smoothing, then the decoration layer.
//!
//! Generation is single-threaded and strictly level-by-level: each level's
//! fill reads the completed, already-smoothed state of the level below for
//! parent lookups and the in-progress state of its own level for lateral
//! neighbor counts. One seeded RNG stream drives the whole run, consumed in
//! a fixed order, so the same `(palette, dims, seed)` triple always produces
//! the same world.

use glam::UVec3;
use hashbrown::HashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_world::{EntityId, Layer, Palette, PaletteError, Tile, World};

use crate::eigenstate::EigenState;
use crate::mountain::{HeightMap, carve_mountains};
use crate::selection::{Candidate, weighted_pick};
use crate::smoothing::smooth_top_layer;

/// Errors reported before any generation work begins.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The palette failed its structural preconditions.
    #[error("invalid palette: {0}")]
    Palette(#[from] PaletteError),
    /// A grid dimension is zero.
    #[error("invalid grid dimensions {0}x{1}x{2}: every axis must be at least 1")]
    InvalidDimensions(u32, u32, u32),
}

/// Neighbor offsets, the four laterals first, then the diagonals.
pub(crate) const NEIGHBOUR_DIRS: [(i64, i64); 8] = [
    (0, 1),
    (0, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (1, 1),
    (-1, -1),
    (1, -1),
];

/// Generates a world from the palette.
///
/// The result holds `dims.z` terrain layers bottom-up followed by one
/// decoration layer. Tiles at level `z > 0` only exist above an occupied
/// tile at `z - 1`, and every placed entity respects its vertical parent's
/// adjacency rules at placement time.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidDimensions`] when any axis of `dims` is
/// zero and [`GenerateError::Palette`] when the palette has no terrains or
/// carries duplicate entity names.
pub fn generate(palette: &Palette, dims: UVec3, seed: u64) -> Result<World, GenerateError> {
    if dims.x == 0 || dims.y == 0 || dims.z == 0 {
        return Err(GenerateError::InvalidDimensions(dims.x, dims.y, dims.z));
    }
    palette.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let terrain_states: Vec<EigenState> = palette
        .terrains
        .iter()
        .map(|t| EigenState::new(&t.entity, &mut rng))
        .collect();
    let decoration_states: Vec<EigenState> = palette
        .decorations
        .iter()
        .map(|e| EigenState::new(e, &mut rng))
        .collect();

    let height_map = carve_mountains(
        dims,
        palette.mountain_factor,
        palette.mountain_probability,
        &mut rng,
    );

    let mut world = World::new(dims.x, dims.y);
    for _ in 0..dims.z {
        world.push_layer(Layer::empty(dims.x, dims.y));
        fill_terrain_layer(palette, &terrain_states, &height_map, &mut world, &mut rng);
        smooth_top_layer(palette, &mut world, palette.terrain_noise_factor);
    }

    place_decorations(palette, &decoration_states, &mut world, &mut rng);

    Ok(world)
}

/// Fills the newest terrain layer column by column, row-major.
fn fill_terrain_layer(
    palette: &Palette,
    states: &[EigenState],
    height_map: &HeightMap,
    world: &mut World,
    rng: &mut impl Rng,
) {
    let z = world.depth() - 1;

    for y in 0..world.height() {
        for x in 0..world.width() {
            // Terrain stops where the column below is empty or the mountain
            // height is exceeded.
            if z > 0 && world.layer(z - 1).get(x, y).is_none() {
                continue;
            }
            if z as u32 >= height_map.get(x, y) + 1 {
                continue;
            }

            let parent = if z > 0 {
                world.layer(z - 1).get(x, y).map(Tile::entity)
            } else {
                None
            };
            let counts = count_neighbours(world, x, y);
            let picked = pick_entity(palette, states, palette.terrain_ids(), &counts, parent, rng);

            if let Some(entity) = picked {
                world.layer_mut(z).place(x, y, Tile::new(x, y, entity));
            }
        }
    }
}

/// Places the decoration layer: one pass over all columns, each decorated
/// tile sitting on the highest occupied terrain tile, which also acts as the
/// adjacency parent. The finished layer is appended to the world.
fn place_decorations(
    palette: &Palette,
    states: &[EigenState],
    world: &mut World,
    rng: &mut impl Rng,
) {
    let top = world.depth() - 1;
    let mut layer = Layer::empty(world.width(), world.height());

    for y in 0..world.height() {
        for x in 0..world.width() {
            let Some((_, parent)) = world.highest_tile(x, y, top) else {
                continue;
            };
            let parent_id = parent.entity();
            let counts = count_neighbours(world, x, y);
            let picked = pick_entity(
                palette,
                states,
                palette.decoration_ids(),
                &counts,
                Some(parent_id),
                rng,
            );

            if let Some(entity) = picked {
                layer.place(x, y, Tile::new(x, y, entity));
            }
        }
    }

    world.push_layer(layer);
}

/// Tallies the entities of the up-to-8 neighbor columns, taking the top-most
/// occupied tile per direction, searched from the newest layer downward.
fn count_neighbours(world: &World, x: u32, y: u32) -> HashMap<EntityId, usize> {
    let mut counts = HashMap::new();
    let top = world.depth() - 1;

    for (dx, dy) in NEIGHBOUR_DIRS {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || nx >= world.width() as i64 || ny < 0 || ny >= world.height() as i64 {
            continue;
        }
        if let Some((_, tile)) = world.highest_tile(nx as u32, ny as u32, top) {
            *counts.entry(tile.entity()).or_insert(0) += 1;
        }
    }

    counts
}

/// Scores the given candidates against their bias curves and neighbor counts
/// and draws one. `states` runs parallel to `candidate_ids`. Candidates the
/// parent's rule table forbids are excluded before the draw.
fn pick_entity(
    palette: &Palette,
    states: &[EigenState],
    candidate_ids: impl Iterator<Item = EntityId>,
    neighbour_counts: &HashMap<EntityId, usize>,
    parent: Option<EntityId>,
    rng: &mut impl Rng,
) -> Option<EntityId> {
    let parent_terrain = parent.and_then(|id| palette.terrain(id));
    let mut candidates = Vec::new();

    for (i, id) in candidate_ids.enumerate() {
        if let Some(parent) = parent_terrain {
            if !parent.is_entity_allowed(&palette.entity(id).name) {
                continue;
            }
        }
        let count = neighbour_counts.get(&id).copied().unwrap_or(0);
        candidates.push(Candidate {
            entity: id,
            score: states[i].weight(count),
        });
    }

    weighted_pick(candidates, rng)
}
