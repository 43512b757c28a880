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

//! The engine's read-only view of the host-supplied lattice.
//!
//! The host framework loads site coordinates and the first-shell adjacency,
//! and (under domain decomposition) decides which sites this process owns.
//! Ghost sites appear in the adjacency so that shell walks can pass through
//! them, but they have no solver slot and the engine never writes their
//! propensity.

use crate::FailResult;

/// Site coordinates, adjacency, and the solver-slot map.
#[derive(Debug, Clone)]
pub struct Lattice {
    xyz: Vec<[f64; 3]>,
    neighbor: Vec<Vec<usize>>,
    /// Solver slot per site; negative marks a ghost.
    i2site: Vec<i32>,
    maxneigh: usize,
    nowned: usize,
}

impl Lattice {
    /// A lattice in which every site is owned, with solver slots in site
    /// order.  This is the single-process case.
    pub fn new(xyz: Vec<[f64; 3]>, neighbor: Vec<Vec<usize>>) -> FailResult<Lattice> {
        let i2site = (0..xyz.len() as i32).collect();
        Lattice::with_site_map(xyz, neighbor, i2site)
    }

    /// A lattice with an explicit owned-site map, as handed over by a
    /// domain-decomposed host.  Owned slots must cover `[0, nowned)` exactly
    /// once; any negative value marks a ghost.
    pub fn with_site_map(
        xyz: Vec<[f64; 3]>,
        neighbor: Vec<Vec<usize>>,
        i2site: Vec<i32>,
    ) -> FailResult<Lattice> {
        ensure!(
            xyz.len() == neighbor.len() && xyz.len() == i2site.len(),
            "lattice arrays disagree on the site count ({}, {}, {})",
            xyz.len(),
            neighbor.len(),
            i2site.len()
        );
        for (i, shell) in neighbor.iter().enumerate() {
            for &j in shell {
                ensure!(j < xyz.len(), "site {} lists out-of-range neighbor {}", i, j);
                ensure!(j != i, "site {} lists itself as a neighbor", i);
            }
        }

        let nowned = i2site.iter().filter(|&&s| s >= 0).count();
        let mut seen = vec![false; nowned];
        for &s in &i2site {
            if s >= 0 {
                ensure!(
                    (s as usize) < nowned && !seen[s as usize],
                    "solver slots must cover 0..{} exactly once",
                    nowned
                );
                seen[s as usize] = true;
            }
        }

        let maxneigh = neighbor.iter().map(|shell| shell.len()).max().unwrap_or(0);
        Ok(Lattice { xyz, neighbor, i2site, maxneigh, nowned })
    }

    /// Total sites visible to this process, ghosts included.
    pub fn num_sites(&self) -> usize {
        self.xyz.len()
    }

    /// Sites owned by this process (the solver's site count).
    pub fn num_owned(&self) -> usize {
        self.nowned
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbor[i]
    }

    pub fn num_neighbors(&self, i: usize) -> usize {
        self.neighbor[i].len()
    }

    /// Largest first-shell size over all sites.
    pub fn max_neighbors(&self) -> usize {
        self.maxneigh
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.xyz
    }

    /// The solver slot of an owned site, or `None` for a ghost.
    pub fn site_index(&self, i: usize) -> Option<usize> {
        let s = self.i2site[i];
        if s >= 0 {
            Some(s as usize)
        } else {
            None
        }
    }
}
