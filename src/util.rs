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

/// A reusable visited-set over a fixed index range.
///
/// Entries are stamped with a generation counter, so starting a new pass is
/// O(1) instead of requiring the previous pass to unwind its marks.
#[derive(Debug, Clone)]
pub(crate) struct VisitSet {
    stamp: Vec<u64>,
    generation: u64,
}

impl VisitSet {
    pub fn new(len: usize) -> VisitSet {
        VisitSet {
            stamp: vec![0; len],
            generation: 0,
        }
    }

    /// Begin a new pass, forgetting all marks.
    pub fn begin(&mut self) {
        self.generation += 1;
    }

    /// Mark `i`; returns `true` the first time `i` is seen in this pass.
    pub fn insert(&mut self, i: usize) -> bool {
        if self.stamp[i] == self.generation {
            false
        } else {
            self.stamp[i] = self.generation;
            true
        }
    }
}
