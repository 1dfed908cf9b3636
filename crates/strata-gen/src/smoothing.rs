//! Connected-region noise smoothing: small same-entity surface regions are
//! reclassified to the dominant entity among the region and its boundary.
//!
//! Runs once per terrain layer, immediately after that layer's fill and
//! before the next layer's fill, because later layers read the corrected
//! layer beneath them for parent and height lookups. The decoration layer is
//! never smoothed.

use hashbrown::{HashMap, HashSet};
use strata_world::{EntityId, Palette, World};

use crate::generator::NEIGHBOUR_DIRS;

/// A maximal same-entity region on the current surface.
///
/// Membership spreads through the four lateral directions only, always to
/// the top-most occupied tile of the neighboring column. Differing-entity
/// column tops in any of the eight directions form the deduplicated
/// boundary; same-entity diagonal tops belong to neither set.
struct Region {
    /// Region tiles as `(x, y, z)` column tops.
    tiles: Vec<(u32, u32, usize)>,
    /// Boundary tiles as `(x, y, z)` column tops.
    boundary: Vec<(u32, u32, usize)>,
    /// Whether the seed tile was terrain. Fixed at discovery time.
    is_terrain: bool,
    /// Entity of the tile directly below the top layer at the seed column.
    parent: Option<EntityId>,
}

impl Region {
    /// Floods the region seeded at `(seed_x, seed_y)` on the top layer,
    /// marking every member column in `visited`.
    fn discover(
        world: &World,
        palette: &Palette,
        seed_x: u32,
        seed_y: u32,
        visited: &mut [bool],
    ) -> Self {
        let top = world.depth() - 1;
        let width = world.width();
        let seed_tile = world.layer(top).get(seed_x, seed_y).expect("seed cell is occupied");
        let entity = seed_tile.entity();

        let parent = if top > 0 {
            world.layer(top - 1).get(seed_x, seed_y).map(|t| t.entity())
        } else {
            None
        };

        let mut tiles = Vec::new();
        let mut boundary = Vec::new();
        let mut member: HashSet<(u32, u32)> = HashSet::new();
        let mut seen_boundary: HashSet<(u32, u32)> = HashSet::new();
        let mut stack = vec![(seed_x, seed_y, top)];
        member.insert((seed_x, seed_y));

        while let Some((x, y, z)) = stack.pop() {
            visited[(y * width + x) as usize] = true;
            tiles.push((x, y, z));

            for (i, (dx, dy)) in NEIGHBOUR_DIRS.iter().enumerate() {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || nx >= width as i64 || ny < 0 || ny >= world.height() as i64 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                let Some((nz, neighbour)) = world.highest_tile(nx, ny, top) else {
                    continue;
                };

                if neighbour.entity() == entity {
                    let lateral = i < 4;
                    if lateral && !member.contains(&(nx, ny)) {
                        member.insert((nx, ny));
                        stack.push((nx, ny, nz));
                    }
                } else if seen_boundary.insert((nx, ny)) {
                    boundary.push((nx, ny, nz));
                }
            }
        }

        Self {
            tiles,
            boundary,
            is_terrain: palette.is_terrain(entity),
            parent,
        }
    }

    /// A region is noise when its share of the combined region-plus-boundary
    /// set falls below `noise_factor`. An isolated region with no boundary
    /// has a share of 1 and is never noise.
    fn is_noise(&self, noise_factor: f32) -> bool {
        let same = self.tiles.len();
        let total = same + self.boundary.len();
        if total == 0 {
            return false;
        }
        (same as f32 / total as f32) < noise_factor
    }

    /// Reclassifies every region tile to the dominant entity of the combined
    /// region-plus-boundary tally.
    ///
    /// A non-terrain region never counts terrain entities, so it cannot turn
    /// into terrain. When the seed column's parent is terrain, the tally is
    /// walked from the highest count down to the first entity the parent
    /// allows, falling back to the plain highest count if it allows none.
    fn convert(&self, world: &mut World, palette: &Palette) {
        let mut order: Vec<EntityId> = Vec::new();
        let mut counts: HashMap<EntityId, usize> = HashMap::new();

        for &(x, y, z) in self.tiles.iter().chain(&self.boundary) {
            let Some(tile) = world.layer(z).get(x, y) else {
                continue;
            };
            let entity = tile.entity();
            if !self.is_terrain && palette.is_terrain(entity) {
                continue;
            }
            if !counts.contains_key(&entity) {
                order.push(entity);
            }
            *counts.entry(entity).or_insert(0) += 1;
        }

        let mut ranked: Vec<(EntityId, usize)> =
            order.into_iter().map(|e| (e, counts[&e])).collect();
        ranked.sort_by_key(|&(_, count)| count);

        let Some(&(mut choice, _)) = ranked.last() else {
            return;
        };

        if let Some(parent) = self.parent.and_then(|id| palette.terrain(id)) {
            for &(entity, _) in ranked.iter().rev() {
                if parent.is_entity_allowed(&palette.entity(entity).name) {
                    choice = entity;
                    break;
                }
            }
        }

        for &(x, y, z) in &self.tiles {
            if let Some(tile) = world.layer_mut(z).get_mut(x, y) {
                tile.set_entity(choice);
            }
        }
    }
}

/// Smooths the newest layer of the world: every surface region whose density
/// falls below `noise_factor` is reclassified in place. Regions are
/// discovered and converted one at a time, so later regions see the already
/// corrected entities of earlier ones.
pub(crate) fn smooth_top_layer(palette: &Palette, world: &mut World, noise_factor: f32) {
    let top = world.depth() - 1;
    let width = world.width();
    let height = world.height();
    let mut visited = vec![false; (width * height) as usize];
    let mut reclassified = 0usize;

    for y in 0..height {
        for x in 0..width {
            if world.layer(top).get(x, y).is_none() || visited[(y * width + x) as usize] {
                continue;
            }
            let region = Region::discover(world, palette, x, y, &mut visited);
            if region.is_noise(noise_factor) {
                region.convert(world, palette);
                reclassified += 1;
            }
        }
    }

    if reclassified > 0 {
        tracing::debug!("smoothing reclassified {reclassified} regions on layer {top}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_world::{AdjacencyRule, EntityDef, Layer, SpriteId, TerrainDef, Tile};

    const GRASS: EntityId = EntityId(0);
    const ROCK: EntityId = EntityId(1);
    const FLOWER: EntityId = EntityId(2);

    fn entity(name: &str) -> EntityDef {
        EntityDef {
            name: name.to_string(),
            sprite: SpriteId(0),
            probability: 50,
            positive_bias: 10,
            negative_bias: 10,
        }
    }

    fn terrain(name: &str, terrain_rules: Vec<AdjacencyRule>) -> TerrainDef {
        TerrainDef {
            entity: entity(name),
            rise: 0.5,
            terrain_rules,
            decoration_rules: vec![AdjacencyRule::allowed("flower")],
        }
    }

    /// grass accepts anything above it; rock only accepts rock.
    fn palette() -> Palette {
        Palette {
            terrains: vec![
                terrain(
                    "grass",
                    vec![AdjacencyRule::allowed("grass"), AdjacencyRule::allowed("rock")],
                ),
                terrain(
                    "rock",
                    vec![AdjacencyRule::disallowed("grass"), AdjacencyRule::allowed("rock")],
                ),
            ],
            decorations: vec![entity("flower")],
            terrain_noise_factor: 0.5,
            decoration_noise_factor: 0.0,
            mountain_factor: 0,
            mountain_probability: 0,
        }
    }

    fn single_layer_world(width: u32, height: u32, tiles: &[(u32, u32, EntityId)]) -> World {
        let mut world = World::new(width, height);
        world.push_layer(Layer::empty(width, height));
        for &(x, y, entity) in tiles {
            world.layer_mut(0).place(x, y, Tile::new(x, y, entity));
        }
        world
    }

    #[test]
    fn test_region_ratio_counts_region_and_boundary() {
        // Four grass tiles in a block with one rock neighbor: ratio 4/5.
        let world = single_layer_world(
            3,
            3,
            &[
                (0, 0, GRASS),
                (1, 0, GRASS),
                (0, 1, GRASS),
                (1, 1, GRASS),
                (2, 0, ROCK),
            ],
        );
        let palette = palette();
        let mut visited = vec![false; 9];
        let region = Region::discover(&world, &palette, 0, 0, &mut visited);

        assert_eq!(region.tiles.len(), 4);
        assert_eq!(region.boundary.len(), 1, "the rock column must be deduplicated");
        assert!(region.is_noise(0.9), "4/5 = 0.8 sits below a 0.9 threshold");
        assert!(!region.is_noise(0.5), "4/5 = 0.8 clears a 0.5 threshold");
    }

    #[test]
    fn test_diagonal_same_entity_tiles_stay_separate() {
        let world = single_layer_world(
            2,
            2,
            &[(0, 0, GRASS), (1, 1, GRASS), (1, 0, ROCK), (0, 1, ROCK)],
        );
        let palette = palette();
        let mut visited = vec![false; 4];
        let region = Region::discover(&world, &palette, 0, 0, &mut visited);

        assert_eq!(
            region.tiles.len(),
            1,
            "membership must not spread diagonally"
        );
        assert_eq!(
            region.boundary.len(),
            2,
            "only the differing-entity columns count as boundary"
        );
    }

    #[test]
    fn test_lone_tile_converts_to_boundary_majority() {
        let mut world = single_layer_world(
            3,
            3,
            &[(1, 1, ROCK), (0, 1, GRASS), (1, 0, GRASS), (2, 1, GRASS), (1, 2, GRASS)],
        );
        let palette = palette();
        smooth_top_layer(&palette, &mut world, 0.5);

        assert_eq!(
            world.layer(0).get(1, 1).map(Tile::entity),
            Some(GRASS),
            "an outnumbered rock tile becomes grass"
        );
    }

    #[test]
    fn test_smoothing_swaps_entities_without_moving_tiles() {
        let mut world = single_layer_world(
            3,
            3,
            &[(1, 1, ROCK), (0, 1, GRASS), (1, 0, GRASS), (2, 1, GRASS), (1, 2, GRASS)],
        );
        let palette = palette();
        smooth_top_layer(&palette, &mut world, 0.9);

        assert_eq!(world.layer(0).occupied(), 5, "smoothing never adds or removes tiles");
        assert_eq!(world.layer(0).get(1, 1).map(Tile::name), Some("tile[1,1]"));
    }

    #[test]
    fn test_parent_rules_steer_the_conversion() {
        // Top-layer rock at (1, 1) is outvoted four-to-one by grass column
        // tops, but its parent is rock, which refuses grass; the walk falls
        // through to rock.
        let mut world = World::new(3, 3);
        world.push_layer(Layer::empty(3, 3));
        world.layer_mut(0).place(1, 1, Tile::new(1, 1, ROCK));
        for (x, y) in [(0, 1), (1, 0), (2, 1), (1, 2)] {
            world.layer_mut(0).place(x, y, Tile::new(x, y, GRASS));
        }
        world.push_layer(Layer::empty(3, 3));
        world.layer_mut(1).place(1, 1, Tile::new(1, 1, ROCK));

        let palette = palette();
        smooth_top_layer(&palette, &mut world, 0.9);

        assert_eq!(
            world.layer(1).get(1, 1).map(Tile::entity),
            Some(ROCK),
            "a rock parent must veto the grass majority"
        );
    }

    #[test]
    fn test_parent_allows_the_majority_conversion() {
        // Same shape, but the parent is grass, which accepts grass above it.
        let mut world = World::new(3, 3);
        world.push_layer(Layer::empty(3, 3));
        for (x, y) in [(1, 1), (0, 1), (1, 0), (2, 1), (1, 2)] {
            world.layer_mut(0).place(x, y, Tile::new(x, y, GRASS));
        }
        world.push_layer(Layer::empty(3, 3));
        world.layer_mut(1).place(1, 1, Tile::new(1, 1, ROCK));

        let palette = palette();
        smooth_top_layer(&palette, &mut world, 0.9);

        assert_eq!(
            world.layer(1).get(1, 1).map(Tile::entity),
            Some(GRASS),
            "a grass parent lets the grass majority through"
        );
    }

    #[test]
    fn test_non_terrain_region_never_becomes_terrain() {
        // A lone flower surrounded by rock keeps its category: the terrain
        // votes are dropped from the tally.
        let mut world = single_layer_world(
            3,
            3,
            &[(1, 1, FLOWER), (0, 1, ROCK), (1, 0, ROCK), (2, 1, ROCK), (1, 2, ROCK)],
        );
        let palette = palette();
        smooth_top_layer(&palette, &mut world, 0.5);

        assert_eq!(
            world.layer(0).get(1, 1).map(Tile::entity),
            Some(FLOWER),
            "terrain boundary votes must not convert a decoration region"
        );
    }

    #[test]
    fn test_smoothing_follows_column_tops() {
        // The rock tile sits one level above its grass surroundings; the
        // flood still connects across the height step.
        let mut world = World::new(3, 1);
        world.push_layer(Layer::empty(3, 1));
        for x in 0..3 {
            world.layer_mut(0).place(x, 0, Tile::new(x, 0, GRASS));
        }
        world.push_layer(Layer::empty(3, 1));
        world.layer_mut(1).place(1, 0, Tile::new(1, 0, ROCK));

        let palette = palette();
        smooth_top_layer(&palette, &mut world, 0.9);

        assert_eq!(
            world.layer(1).get(1, 0).map(Tile::entity),
            Some(GRASS),
            "the raised rock is outvoted by the grass column tops beside it"
        );
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        // First pass absorbs the lone rock into grass; the stabilized layer
        // must survive a second pass untouched.
        let mut tiles = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                let entity = if (x, y) == (1, 1) { ROCK } else { GRASS };
                tiles.push((x, y, entity));
            }
        }
        let mut world = single_layer_world(3, 3, &tiles);
        let palette = palette();

        smooth_top_layer(&palette, &mut world, 0.9);
        assert_eq!(world.layer(0).get(1, 1).map(Tile::entity), Some(GRASS));

        let stabilized = world.clone();
        smooth_top_layer(&palette, &mut world, 0.9);
        assert_eq!(world, stabilized, "a stabilized layer must be a fixed point");
    }

    #[test]
    fn test_dense_regions_are_left_alone() {
        // Two solid blocks, each dense enough to clear a 0.3 threshold.
        let mut tiles = Vec::new();
        for y in 0..3 {
            for x in 0..2 {
                tiles.push((x, y, GRASS));
            }
            tiles.push((2, y, ROCK));
        }
        let mut world = single_layer_world(3, 3, &tiles);
        let palette = palette();

        let before = world.clone();
        smooth_top_layer(&palette, &mut world, 0.3);
        assert_eq!(world, before, "6/9 and 3/6 both clear a 0.3 threshold");
    }
}
