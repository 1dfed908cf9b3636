//! Layered tile grids: the generated world handed to the rendering layer.
//!
//! A world is an ordered stack of dense 2-D layers. Terrain layers come
//! first, bottom-up, followed by a single decoration layer. An empty cell is
//! simply never populated; tiles are never removed, only re-pointed at a
//! different entity during smoothing.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A single placed tile: a stable name plus its current entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    name: String,
    entity: EntityId,
}

impl Tile {
    /// Creates a tile named after its column coordinates.
    pub fn new(x: u32, y: u32, entity: EntityId) -> Self {
        Self {
            name: format!("tile[{x},{y}]"),
            entity,
        }
    }

    /// Stable identifying name, derived from the column coordinates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity currently occupying this tile.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Re-points the tile at a different entity. The name never changes.
    pub fn set_entity(&mut self, entity: EntityId) {
        self.entity = entity;
    }
}

/// One z-level of the world: a dense row-major grid of optional tiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    width: u32,
    height: u32,
    tiles: Vec<Option<Tile>>,
}

impl Layer {
    /// Creates a layer with every cell unoccupied.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![None; (width * height) as usize],
        }
    }

    /// Grid width (columns).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height (rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the tile at `(x, y)`, or `None` for an unoccupied cell.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<&Tile> {
        self.tiles[self.index(x, y)].as_ref()
    }

    /// Mutable access to the tile at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        let index = self.index(x, y);
        self.tiles[index].as_mut()
    }

    /// Places a tile at `(x, y)`, replacing any previous occupant.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn place(&mut self, x: u32, y: u32, tile: Tile) {
        let index = self.index(x, y);
        self.tiles[index] = Some(tile);
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "tile coordinate ({x}, {y}) outside {}x{} layer",
            self.width,
            self.height
        );
        (y * self.width + x) as usize
    }
}

/// The generated world: terrain layers bottom-up, then one decoration layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl World {
    /// Creates a world with no layers yet.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Grid width (columns).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height (rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of layers currently in the stack.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Appends a layer on top of the stack.
    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// The layer at z-level `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z` is out of range.
    pub fn layer(&self, z: usize) -> &Layer {
        &self.layers[z]
    }

    /// Mutable access to the layer at z-level `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z` is out of range.
    pub fn layer_mut(&mut self, z: usize) -> &mut Layer {
        &mut self.layers[z]
    }

    /// All layers, bottom-up.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The top-most occupied tile in the column at `(x, y)`, searching from
    /// `from_z` downward. Returns the tile's z-level alongside the tile.
    ///
    /// # Panics
    ///
    /// Panics if `from_z` is not a valid layer index or `(x, y)` is outside
    /// the grid.
    pub fn highest_tile(&self, x: u32, y: u32, from_z: usize) -> Option<(usize, &Tile)> {
        (0..=from_z)
            .rev()
            .find_map(|z| self.layers[z].get(x, y).map(|tile| (z, tile)))
    }
}
