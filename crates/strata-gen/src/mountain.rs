//! Mountain carving: randomized flood growth producing a per-column height map.

use glam::UVec3;
use rand::Rng;

/// Per-column maximum mountain heights, merged pointwise across growth passes.
///
/// Built once per generation run and read-only afterwards. A value of `h`
/// means terrain may stack up to and including z-level `h` in that column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMap {
    width: u32,
    height: u32,
    values: Vec<u32>,
}

impl HeightMap {
    /// Creates an all-zero map (flat ground everywhere).
    pub fn zeroed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0; (width * height) as usize],
        }
    }

    /// Mountain height of the column at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.values[self.index(x, y)]
    }

    fn raise(&mut self, x: u32, y: u32, z: u32) {
        let index = self.index(x, y);
        self.values[index] = self.values[index].max(z);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "column ({x}, {y}) outside {}x{} height map",
            self.width,
            self.height
        );
        (y * self.width + x) as usize
    }
}

/// Runs exactly `mountain_factor` growth attempts over a `dims.x` × `dims.y`
/// grid with z-levels `0..dims.z`.
///
/// Each attempt first rolls a percent gate in `[0, 100]`; a roll above
/// `mountain_probability` consumes the attempt without growing anything, so
/// the expected number of actual mountains is
/// `mountain_factor * mountain_probability / 100`.
pub fn carve_mountains(
    dims: UVec3,
    mountain_factor: u32,
    mountain_probability: u32,
    rng: &mut impl Rng,
) -> HeightMap {
    let mut map = HeightMap::zeroed(dims.x, dims.y);
    let mut grown = 0u32;

    for _ in 0..mountain_factor {
        if rng.random_range(0..=100) > mountain_probability {
            continue;
        }
        let z = if dims.z > 1 { rng.random_range(1..dims.z) } else { 1 };
        let x = rng.random_range(0..dims.x);
        let y = rng.random_range(0..dims.y);
        grow_pass(x, y, z, &mut map, rng);
        grown += 1;
    }

    tracing::debug!("mountain carving: {grown}/{mountain_factor} attempts grew");
    map
}

/// One growth pass: work-list flood from the seed column. Every visited
/// column is raised to at least the carried height, then the height either
/// drops by one or is re-rolled lower before spreading to the four lateral
/// neighbors. Each pass uses its own visited set.
fn grow_pass(x: u32, y: u32, z: u32, map: &mut HeightMap, rng: &mut impl Rng) {
    let mut visited = vec![false; (map.width * map.height) as usize];
    let mut stack = vec![(x, y, z)];

    while let Some((x, y, mut z)) = stack.pop() {
        if z == 0 {
            continue;
        }
        let index = (y * map.width + x) as usize;
        if visited[index] {
            continue;
        }
        visited[index] = true;
        map.raise(x, y, z);

        if rng.random_range(1..100) > 50 {
            z -= 1;
        } else if rng.random_range(1..100) > 50 {
            z = if z > 1 { rng.random_range(1..z) } else { 1 };
        }

        for (dx, dy) in [(0i64, 1i64), (0, -1), (-1, 0), (1, 0)] {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || nx >= map.width as i64 || ny < 0 || ny >= map.height as i64 {
                continue;
            }
            if visited[(ny as u32 * map.width + nx as u32) as usize] {
                continue;
            }
            stack.push((nx as u32, ny as u32, z));
        }
    }
}
