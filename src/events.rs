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

//! Per-site candidate-event lists, backed by one growable arena.
//!
//! Events churn constantly (every propensity refresh frees and rebuilds a
//! site's list), so the storage is a single slot arena with an intrusive
//! free chain.  Each site heads a singly linked list of its live events; the
//! arena is always partitioned between those lists and the free chain.

/// Arena growth quantum, in slots.
pub const DELTAEVENT: usize = 100_000;

/// Propensity of the null event present in every site's list.  Keeps the
/// per-site total strictly positive so the solver never sees a stalled site.
pub const NULL_PROPENSITY: f64 = 0.1;

const NIL: i32 = -1;

/// What a candidate event would do, and to whom.
///
/// `which` indexes the declared reactions of the matching class.  Partners
/// are site indices held by value; the arena owns nothing about them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Single-site reaction at the owning site.
    Single { which: usize },
    /// Pair reaction with a second-shell partner (`k`).
    SecondShell { which: usize, partner: usize },
    /// Pair reaction with a first-shell partner (`j`).
    FirstShell { which: usize, partner: usize },
    /// Pair reaction with a same-z-plane partner (`g`).
    SamePlane { which: usize, partner: usize },
    /// The do-nothing event.
    Null,
}

/// One live event, as seen by the executor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub propensity: f64,
}

#[derive(Debug, Copy, Clone)]
struct Slot {
    kind: EventKind,
    propensity: f64,
    next: i32,
}

#[derive(Debug, Clone)]
pub struct EventList {
    slots: Vec<Slot>,
    first: Vec<i32>,
    free: i32,
    live: usize,
}

impl EventList {
    pub fn new(num_sites: usize) -> EventList {
        EventList {
            slots: vec![],
            first: vec![NIL; num_sites],
            free: NIL,
            live: 0,
        }
    }

    /// Drop every live event and return the whole arena to the free chain.
    pub fn reset(&mut self) {
        for head in &mut self.first {
            *head = NIL;
        }
        let len = self.slots.len();
        for (m, slot) in self.slots.iter_mut().enumerate() {
            slot.next = if m + 1 == len { NIL } else { (m + 1) as i32 };
        }
        self.free = if len == 0 { NIL } else { 0 };
        self.live = 0;
    }

    /// Link a new event onto `site`'s list.
    ///
    /// # Panics
    ///
    /// Panics if `propensity` is not strictly positive; zero-rate reactions
    /// must be filtered before they reach the arena.
    pub fn add(&mut self, site: usize, kind: EventKind, propensity: f64) {
        assert!(propensity > 0.0, "event propensity must be positive");
        if self.free == NIL {
            self.grow();
        }
        let slot = self.free as usize;
        self.free = self.slots[slot].next;
        self.slots[slot] = Slot {
            kind,
            propensity,
            next: self.first[site],
        };
        self.first[site] = slot as i32;
        self.live += 1;
    }

    fn grow(&mut self) {
        let old = self.slots.len();
        let new = old + DELTAEVENT;
        self.slots.reserve(DELTAEVENT);
        for m in old..new {
            self.slots.push(Slot {
                kind: EventKind::Null,
                propensity: 0.0,
                next: if m + 1 == new { NIL } else { (m + 1) as i32 },
            });
        }
        self.free = old as i32;
    }

    /// Unlink all of `site`'s events, prepending them to the free chain.
    pub fn clear(&mut self, site: usize) {
        let mut index = self.first[site];
        while index != NIL {
            let next = self.slots[index as usize].next;
            self.slots[index as usize].next = self.free;
            self.free = index;
            self.live -= 1;
            index = next;
        }
        self.first[site] = NIL;
    }

    /// The site's events, most recently added first.
    pub fn iter(&self, site: usize) -> EventIter<'_> {
        EventIter {
            list: self,
            index: self.first[site],
        }
    }

    /// Number of live events across all sites.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total slots allocated (live + free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

pub struct EventIter<'a> {
    list: &'a EventList,
    index: i32,
}

impl<'a> Iterator for EventIter<'a> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.index == NIL {
            return None;
        }
        let slot = &self.list.slots[self.index as usize];
        self.index = slot.next;
        Some(Event {
            kind: slot.kind,
            propensity: slot.propensity,
        })
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    // Counts the free chain and checks that, together with the per-site
    // lists, it partitions the arena.
    fn check_partition(list: &EventList) {
        let mut seen = vec![false; list.capacity()];
        let mut mark = |index: i32| {
            assert!(!seen[index as usize], "slot {} linked twice", index);
            seen[index as usize] = true;
        };

        let mut live = 0;
        for site in 0..list.first.len() {
            let mut index = list.first[site];
            while index != NIL {
                mark(index);
                live += 1;
                index = list.slots[index as usize].next;
            }
        }
        assert_eq!(live, list.len());

        let mut index = list.free;
        while index != NIL {
            mark(index);
            index = list.slots[index as usize].next;
        }
        assert!(seen.iter().all(|&s| s), "arena slot neither live nor free");
    }

    #[test]
    fn add_clear_recycle() {
        let mut list = EventList::new(2);
        list.add(0, EventKind::Single { which: 3 }, 1.5);
        list.add(0, EventKind::Null, NULL_PROPENSITY);
        list.add(1, EventKind::FirstShell { which: 0, partner: 0 }, 2.0);
        assert_eq!(list.len(), 3);
        assert_eq!(list.capacity(), DELTAEVENT);
        check_partition(&list);

        // most recently added first
        let kinds: Vec<_> = list.iter(0).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Null, EventKind::Single { which: 3 }]
        );

        list.clear(0);
        assert_eq!(list.len(), 1);
        assert_eq!(list.iter(0).count(), 0);
        check_partition(&list);

        // freed slots are reused before the arena grows
        list.add(0, EventKind::SamePlane { which: 1, partner: 9 }, 0.25);
        assert_eq!(list.capacity(), DELTAEVENT);
        check_partition(&list);
    }

    #[test]
    fn reset_frees_everything() {
        let mut list = EventList::new(3);
        for site in 0..3 {
            list.add(site, EventKind::Null, NULL_PROPENSITY);
        }
        list.reset();
        assert_eq!(list.len(), 0);
        for site in 0..3 {
            assert_eq!(list.iter(site).count(), 0);
        }
        check_partition(&list);
    }

    #[test]
    #[should_panic(expected = "propensity must be positive")]
    fn zero_propensity_is_a_bug() {
        let mut list = EventList::new(1);
        list.add(0, EventKind::Null, 0.0);
    }
}
