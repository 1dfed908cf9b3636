//! Tile-world data model: entity descriptors, per-terrain adjacency rules,
//! palettes, and layered tile grids.

pub mod entity;
pub mod palette;
pub mod world;

pub use entity::{AdjacencyRule, EntityDef, EntityId, SpriteId, TerrainDef};
pub use palette::{Palette, PaletteError};
pub use world::{Layer, Tile, World};
