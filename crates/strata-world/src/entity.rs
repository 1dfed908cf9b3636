//! Entity descriptors and per-terrain adjacency rule tables.
//!
//! Entities are referenced throughout generation by [`EntityId`], an index
//! into the palette's flattened entity table (terrains first, then
//! decorations). The visual reference is an opaque [`SpriteId`] that only the
//! rendering layer knows how to resolve.

use serde::{Deserialize, Serialize};

/// Compact identifier for an entity within one palette (2 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u16);

/// Opaque handle to a sprite owned by the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteId(pub u16);

/// Descriptor shared by terrain and decoration entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Human-readable name, unique within a palette.
    pub name: String,
    /// Sprite handle, resolved by the renderer.
    pub sprite: SpriteId,
    /// Base spawn weight; entry 0 of the entity's bias curve. Range: `[1, 100]`.
    pub probability: i32,
    /// Largest upward step between consecutive bias curve entries. Range: `[1, 100]`.
    pub positive_bias: i32,
    /// Largest downward step between consecutive bias curve entries. Range: `[1, 100]`.
    pub negative_bias: i32,
}

/// One allow/deny entry in a terrain's adjacency rule lists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyRule {
    /// Name of the candidate entity this entry governs.
    pub name: String,
    /// Whether the candidate may sit directly above the owning terrain.
    pub allowed: bool,
}

impl AdjacencyRule {
    /// Creates a disallowed entry for the given entity name.
    pub fn disallowed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: false,
        }
    }

    /// Creates an allowed entry for the given entity name.
    pub fn allowed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: true,
        }
    }
}

/// A terrain entity: stackable, and the bearer of adjacency rules for
/// whatever gets placed directly above it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainDef {
    /// Shared entity descriptor.
    pub entity: EntityDef,
    /// Vertical rise per z-level, consumed by the renderer when projecting.
    pub rise: f32,
    /// Allow/deny entries for terrain successors, one per palette terrain.
    pub terrain_rules: Vec<AdjacencyRule>,
    /// Allow/deny entries for decoration successors, one per palette decoration.
    pub decoration_rules: Vec<AdjacencyRule>,
}

impl TerrainDef {
    /// Returns whether the named entity may be placed directly above this
    /// terrain.
    ///
    /// Scans the terrain rules first, then the decoration rules; the first
    /// name match wins. A name with no entry in either list is disallowed.
    pub fn is_entity_allowed(&self, name: &str) -> bool {
        for rule in self.terrain_rules.iter().chain(&self.decoration_rules) {
            if rule.name == name {
                return rule.allowed;
            }
        }
        tracing::warn!(
            "no adjacency rule for entity '{name}' on terrain '{}'",
            self.entity.name
        );
        false
    }

    /// Re-derives both rule lists against the palette's current entity names.
    ///
    /// Entry `i` survives only while its name still matches `names[i]`; a
    /// mismatch or a newly appended entity gets a fresh disallowed entry.
    pub fn sync_rules(&mut self, terrain_names: &[String], decoration_names: &[String]) {
        self.terrain_rules = resync(&self.terrain_rules, terrain_names);
        self.decoration_rules = resync(&self.decoration_rules, decoration_names);
    }
}

fn resync(rules: &[AdjacencyRule], names: &[String]) -> Vec<AdjacencyRule> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| match rules.get(i) {
            Some(rule) if rule.name == *name => rule.clone(),
            _ => AdjacencyRule::disallowed(name.clone()),
        })
        .collect()
}
