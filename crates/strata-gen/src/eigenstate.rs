//! Per-entity bias curves: selection weight as a function of how many
//! like neighbors a tile already has.

use rand::Rng;
use strata_world::EntityDef;

/// Number of entries in a bias curve: neighbor counts 0 through 8.
pub const CURVE_LEN: usize = 9;

/// Lookup table mapping a neighbor count to a selection weight.
///
/// Entry 0 is the entity's base probability. Each later entry is the
/// previous one plus a random step in `[-negative_bias, positive_bias)`, so
/// the curve drifts upward for entities that cluster and downward for ones
/// that repel their own kind. Entries may go negative; the selection routine
/// shifts all candidate scores to positive before drawing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EigenState {
    weights: [i32; CURVE_LEN],
}

impl EigenState {
    /// Builds the curve for one entity, consuming `CURVE_LEN - 1` draws from
    /// `rng`. The curve is immutable afterwards.
    pub fn new(entity: &EntityDef, rng: &mut impl Rng) -> Self {
        let mut weights = [0i32; CURVE_LEN];
        weights[0] = entity.probability;
        let low = -entity.negative_bias;
        let high = entity.positive_bias;
        for i in 1..CURVE_LEN {
            weights[i] = weights[i - 1] + rng.random_range(low..high);
        }
        Self { weights }
    }

    /// Selection weight for a tile with `neighbours` same-entity neighbors.
    /// Counts past 8 saturate at the last entry.
    pub fn weight(&self, neighbours: usize) -> i32 {
        self.weights[neighbours.min(CURVE_LEN - 1)]
    }
}
