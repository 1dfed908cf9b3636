//! Weighted entity selection shared by the layer filler and the decoration
//! builder.

use rand::Rng;
use strata_world::EntityId;

/// One eligible entity with its bias-curve score.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    /// The entity under consideration.
    pub entity: EntityId,
    /// Bias-curve weight at the tile's neighbor count. May be negative.
    pub score: i32,
}

/// Draws one entity from the candidate set, or `None` when the set is empty.
///
/// Scores may be negative, so every candidate's width is its score shifted by
/// `|min score| + 1`, guaranteeing strictly positive widths and strictly
/// increasing cumulative thresholds. Candidates are stable-sorted ascending
/// by score (ties keep palette order), a uniform draw is taken over
/// `[0, last threshold]`, and the first candidate whose threshold reaches the
/// draw wins.
pub fn weighted_pick(candidates: Vec<Candidate>, rng: &mut impl Rng) -> Option<EntityId> {
    let (candidates, thresholds) = build_thresholds(candidates)?;
    let last = *thresholds.last().expect("thresholds match candidates");
    let draw = rng.random_range(0..=last);
    Some(pick_at(&candidates, &thresholds, draw))
}

/// Sorts the candidates ascending by score and builds their cumulative
/// thresholds. Returns `None` for an empty set.
fn build_thresholds(mut candidates: Vec<Candidate>) -> Option<(Vec<Candidate>, Vec<i64>)> {
    if candidates.is_empty() {
        return None;
    }

    let min_score = candidates.iter().map(|c| c.score).min()?;
    candidates.sort_by_key(|c| c.score);

    let shift = i64::from(min_score).abs() + 1;
    let mut cumulative = 0i64;
    let thresholds = candidates
        .iter()
        .map(|c| {
            cumulative += i64::from(c.score) + shift;
            cumulative
        })
        .collect();

    Some((candidates, thresholds))
}

/// Resolves a draw against the cumulative thresholds: the first candidate
/// whose threshold is at least `draw`.
fn pick_at(candidates: &[Candidate], thresholds: &[i64], draw: i64) -> EntityId {
    for (candidate, &threshold) in candidates.iter().zip(thresholds) {
        if threshold >= draw {
            return candidate.entity;
        }
    }
    candidates[candidates.len() - 1].entity
}
