/* ************************************************************************ **
** This file is part of rald, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of rald is provided under this permissive license, **
** and that the project as a whole is licensed under the GPL 3.0.           **
** ************************************************************************ */

//! Same-z-plane nearest-neighbor index.
//!
//! In-plane steric effects act between sites that share a z plane but are
//! not necessarily connected in the lattice adjacency, so they get their own
//! geometric table: for each site, the closest few sites (by horizontal
//! distance) whose z coordinate matches within a small tolerance.

use ordered_float::NotNaN;

/// Vertical tolerance for two sites to count as coplanar.
pub const Z_TOL: f64 = 1e-6;

/// Each site keeps at most this many same-plane neighbors.
pub const MAX_SAME_Z: usize = 6;

/// Read-only per-site table of same-plane neighbors, sorted by increasing
/// horizontal distance (ties broken by site index).
#[derive(Debug, Clone, Default)]
pub struct SameZTable {
    neighbors: Vec<Vec<usize>>,
}

impl SameZTable {
    /// Scan all site pairs and keep, per site, the `MAX_SAME_Z` nearest
    /// coplanar sites.
    ///
    /// The scan is quadratic in the site count.  It runs once per setup, on
    /// lattices whose cost is dominated by the KMC loop, so nothing smarter
    /// has been needed.
    pub fn build(xyz: &[[f64; 3]]) -> SameZTable {
        let mut neighbors = Vec::with_capacity(xyz.len());
        for (i, pi) in xyz.iter().enumerate() {
            let mut near: Vec<usize> = (0..xyz.len())
                .filter(|&j| j != i && (xyz[j][2] - pi[2]).abs() <= Z_TOL)
                .collect();
            // stable sort; equal distances keep index order
            near.sort_by_key(|&j| NotNaN::new(horizontal_distance(pi, &xyz[j])).unwrap());
            near.truncate(MAX_SAME_Z);
            neighbors.push(near);
        }
        SameZTable { neighbors }
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    pub fn num_sites(&self) -> usize {
        self.neighbors.len()
    }
}

fn horizontal_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    f64::sqrt(dx * dx + dy * dy)
}
