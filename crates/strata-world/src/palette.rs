//! The palette: the declarative entity set and tunables driving one
//! generation run.
//!
//! Terrains and decorations form one flattened id space: terrains occupy
//! `EntityId(0..T)`, decorations `EntityId(T..T+D)`, in palette order. The
//! palette is loaded and validated by an external configuration layer;
//! generation only reads it.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityDef, EntityId, TerrainDef};

/// Errors reported by [`Palette::validate`].
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    /// The palette defines no terrain entities.
    #[error("palette has no terrain entities")]
    NoTerrains,
    /// Two entities share a name.
    #[error("duplicate entity name: {0}")]
    DuplicateName(String),
}

/// The declarative entity set and tunables for one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Stackable terrain entities, in declaration order.
    pub terrains: Vec<TerrainDef>,
    /// Decoration entities placed atop the terrain stack, in declaration order.
    pub decorations: Vec<EntityDef>,
    /// Region-density threshold for terrain smoothing. Range: `[0, 1]`.
    pub terrain_noise_factor: f32,
    /// Counterpart threshold for the decoration layer. Accepted for
    /// completeness; smoothing currently runs on terrain layers only.
    pub decoration_noise_factor: f32,
    /// Number of mountain growth attempts per run.
    pub mountain_factor: u32,
    /// Percent chance, per attempt, that growth actually occurs. Range: `[0, 100]`.
    pub mountain_probability: u32,
}

impl Palette {
    /// Number of terrain entities.
    pub fn terrain_count(&self) -> usize {
        self.terrains.len()
    }

    /// Number of decoration entities.
    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    /// Total number of entities across both categories.
    pub fn entity_count(&self) -> usize {
        self.terrains.len() + self.decorations.len()
    }

    /// Returns the descriptor for the given entity.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range for this palette.
    pub fn entity(&self, id: EntityId) -> &EntityDef {
        let index = id.0 as usize;
        if index < self.terrains.len() {
            &self.terrains[index].entity
        } else {
            &self.decorations[index - self.terrains.len()]
        }
    }

    /// Returns the terrain definition for `id`, or `None` if `id` names a
    /// decoration.
    pub fn terrain(&self, id: EntityId) -> Option<&TerrainDef> {
        self.terrains.get(id.0 as usize)
    }

    /// Returns `true` if `id` falls in the terrain range of the id space.
    pub fn is_terrain(&self, id: EntityId) -> bool {
        (id.0 as usize) < self.terrains.len()
    }

    /// Ids of all terrain entities, in palette order.
    pub fn terrain_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.terrains.len()).map(|i| EntityId(i as u16))
    }

    /// Ids of all decoration entities, in palette order.
    pub fn decoration_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        let offset = self.terrains.len();
        (0..self.decorations.len()).map(move |i| EntityId((offset + i) as u16))
    }

    /// Looks up an entity id by name, terrains first.
    pub fn lookup_by_name(&self, name: &str) -> Option<EntityId> {
        self.terrains
            .iter()
            .map(|t| &t.entity)
            .chain(&self.decorations)
            .position(|e| e.name == name)
            .map(|i| EntityId(i as u16))
    }

    /// Checks the structural preconditions generation relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::NoTerrains`] when the terrain list is empty and
    /// [`PaletteError::DuplicateName`] when two entities share a name.
    pub fn validate(&self) -> Result<(), PaletteError> {
        if self.terrains.is_empty() {
            return Err(PaletteError::NoTerrains);
        }
        let mut seen: Vec<&str> = Vec::with_capacity(self.entity_count());
        for def in self.terrains.iter().map(|t| &t.entity).chain(&self.decorations) {
            if seen.contains(&def.name.as_str()) {
                return Err(PaletteError::DuplicateName(def.name.clone()));
            }
            seen.push(&def.name);
        }
        Ok(())
    }

    /// Re-derives every terrain's rule lists against the current entity names.
    ///
    /// An editing layer calls this after inserting, removing, renaming, or
    /// reordering entities so each terrain always carries exactly one entry
    /// per palette entity, with prior flags preserved where names still match
    /// by position.
    pub fn sync_rules(&mut self) {
        let terrain_names: Vec<String> =
            self.terrains.iter().map(|t| t.entity.name.clone()).collect();
        let decoration_names: Vec<String> =
            self.decorations.iter().map(|e| e.name.clone()).collect();
        for terrain in &mut self.terrains {
            terrain.sync_rules(&terrain_names, &decoration_names);
        }
    }
}
