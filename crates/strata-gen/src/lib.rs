//! Layered biome world generation: bias curves, mountain carving,
//! neighbor-weighted entity selection, and connected-region noise smoothing.

mod eigenstate;
mod generator;
mod mountain;
mod selection;
mod smoothing;

pub use eigenstate::{CURVE_LEN, EigenState};
pub use generator::{GenerateError, generate};
pub use mountain::{HeightMap, carve_mountains};
pub use selection::{Candidate, weighted_pick};
