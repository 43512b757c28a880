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

//! The KMC site-event engine.
//!
//! The host's solver picks an owned site with probability proportional to
//! its propensity and calls [`Model::site_event`]; the engine chooses one of
//! the site's candidate events by a weighted draw, applies the transition
//! and its steric-mask side effects, re-evaluates the pulse phase, and
//! refreshes every propensity within four hops before handing the touched
//! slots back to the solver.

use enum_map::EnumMap;
use itertools::Itertools;

use crate::coordination::Coord;
use crate::events::{EventKind, EventIter, EventList, NULL_PROPENSITY};
use crate::geometry::SameZTable;
use crate::host::{Solver, Uniform};
use crate::lattice::Lattice;
use crate::pulse::{Phase, PulseSchedule};
use crate::reaction::{self, EventDecl, RateTable, ReactionSet};
use crate::species::Species;
use crate::util::VisitSet;
use crate::FailResult;

/// Refresh radius after a fired event, in hops of the lattice adjacency.
/// Covers everything whose admissibility can change: pair reactions reach
/// two hops, and a mask walk shifts coordinations two hops further out.
const REFRESH_HOPS: usize = 4;

/// Fire counts per declared reaction, per class.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub single: Vec<u64>,
    pub second_shell: Vec<u64>,
    pub first_shell: Vec<u64>,
    pub same_plane: Vec<u64>,
}

impl Counters {
    fn zeroed(reactions: &ReactionSet) -> Counters {
        Counters {
            single: vec![0; reactions.single.len()],
            second_shell: vec![0; reactions.second_shell.len()],
            first_shell: vec![0; reactions.first_shell.len()],
            same_plane: vec![0; reactions.same_plane.len()],
        }
    }

    /// Total non-null events fired.
    pub fn all_events(&self) -> u64 {
        self.single.iter().sum::<u64>()
            + self.second_shell.iter().sum::<u64>()
            + self.first_shell.iter().sum::<u64>()
            + self.same_plane.iter().sum::<u64>()
    }
}

/// The ALD lattice model: per-site chemical state, the reaction catalog,
/// candidate-event lists, and the pulse clock.
#[derive(Debug)]
pub struct Model {
    lattice: Lattice,
    element: Vec<Species>,
    coord: Vec<Coord>,
    same_z: SameZTable,
    reactions: ReactionSet,
    rates: RateTable,
    counts: Counters,
    events: EventList,
    pulse: PulseSchedule,
    /// Per-solver-slot total propensity of the owning site.
    propensity: Vec<f64>,
    temperature: f64,
    // per-call scratch
    visited: VisitSet,
    touched: Vec<usize>,
    seen_pairs: Vec<(usize, usize)>,
}

impl Model {
    /// Take over a loaded lattice with its initial per-site state.
    ///
    /// Initial packed coordination values must lie in `[-1, 8]`; anything
    /// else indicates a corrupt sites file.
    pub fn new(
        lattice: Lattice,
        element: Vec<Species>,
        coord: Vec<i32>,
    ) -> FailResult<Model> {
        ensure!(
            element.len() == lattice.num_sites() && coord.len() == lattice.num_sites(),
            "site state arrays disagree with the lattice on the site count"
        );
        for (i, &c) in coord.iter().enumerate() {
            ensure!(
                -1 <= c && c <= 8,
                "site {} has invalid coordination value {}",
                i,
                c
            );
        }

        let num_sites = lattice.num_sites();
        let num_owned = lattice.num_owned();
        let same_z = SameZTable::build(lattice.positions());
        Ok(Model {
            element,
            coord: coord.into_iter().map(Coord::from_packed).collect(),
            same_z,
            reactions: Default::default(),
            rates: Default::default(),
            counts: Default::default(),
            events: EventList::new(num_sites),
            pulse: PulseSchedule::new(),
            propensity: vec![0.0; num_owned],
            temperature: 0.0,
            visited: VisitSet::new(num_sites),
            touched: vec![],
            seen_pairs: vec![],
            lattice,
        })
    }

    /// Handle one declarative command from the host's input parser.
    ///
    /// Recognized commands: `event`, `pulse_time`, `purge_time`.
    pub fn input_app(&mut self, command: &str, args: &[&str]) -> FailResult<()> {
        match command {
            "event" => {
                match reaction::parse_event(args)? {
                    EventDecl::Single(r) => self.reactions.single.push(r),
                    EventDecl::SecondShell(r) => self.reactions.second_shell.push(r),
                    EventDecl::FirstShell(r) => self.reactions.first_shell.push(r),
                    EventDecl::SamePlane(r) => self.reactions.same_plane.push(r),
                }
                Ok(())
            }
            "pulse_time" => {
                ensure!(args.len() == 2, "illegal pulse_time command");
                let t1 = parse_duration(args[0])?;
                let t3 = parse_duration(args[1])?;
                self.pulse.set_pulse_times(t1, t3);
                Ok(())
            }
            "purge_time" => {
                ensure!(args.len() == 2, "illegal purge_time command");
                let t2 = parse_duration(args[0])?;
                let t4 = parse_duration(args[1])?;
                self.pulse.set_purge_times(t2, t4);
                Ok(())
            }
            _ => bail!("unrecognized command: {:?}", command),
        }
    }

    /// Freeze the declared reactions at the run temperature and build every
    /// derived table: Arrhenius rates, the same-z index, a clean event
    /// arena, and the initial propensity of every owned site.
    pub fn setup(&mut self, temperature: f64) -> FailResult<()> {
        self.events.reset();
        self.same_z = SameZTable::build(self.lattice.positions());
        self.rates = RateTable::compute(&self.reactions, temperature)?;
        self.temperature = temperature;
        self.counts = Counters::zeroed(&self.reactions);
        self.log_rate_table();

        for i in 0..self.lattice.num_sites() {
            if let Some(isite) = self.lattice.site_index(i) {
                let total = self.site_propensity(i);
                self.propensity[isite] = total;
            }
        }
        Ok(())
    }

    /// Rebuild site `i`'s candidate-event list and return its total
    /// propensity.  The total includes the ever-present null event, so it is
    /// at least [`NULL_PROPENSITY`].
    pub fn site_propensity(&mut self, i: usize) -> f64 {
        self.events.clear(i);
        let mut proball = 0.0;

        let lattice = &self.lattice;
        let element = &self.element;
        let coord = &self.coord;
        let events = &mut self.events;
        let phase = self.pulse.phase();

        let ci = coord[i];
        let nn_i = lattice.num_neighbors(i);
        let phys_ok_i = (ci.phys() as usize) <= nn_i;

        // class I: single site
        for (m, (r, &rate)) in self.reactions.single.iter().zip(&self.rates.single).enumerate() {
            if rate == 0.0 {
                continue;
            }
            if element[i] == r.input
                && r.req_coord.matches(ci.packed())
                && r.gate.admits(phase)
                && phys_ok_i
            {
                events.add(i, EventKind::Single { which: m }, rate);
                proball += rate;
            }
        }

        // class II: second-shell partner.  The same partner is typically
        // reachable through several intermediates; only the first route
        // yields an event.
        let seen = &mut self.seen_pairs;
        seen.clear();
        for &j in lattice.neighbors(i) {
            for &k in lattice.neighbors(j) {
                if k == i {
                    continue;
                }
                let ck = coord[k];
                for (m, (r, &rate)) in
                    self.reactions.second_shell.iter().zip(&self.rates.second_shell).enumerate()
                {
                    if rate == 0.0 {
                        continue;
                    }
                    if element[i] == r.inputs[0]
                        && element[k] == r.inputs[1]
                        && r.gate.admits(phase)
                        && r.req_coord[0].matches(ci.packed())
                        && r.req_coord[1].matches(ck.packed())
                        && phys_ok_i
                        && (ck.phys() as usize) < lattice.num_neighbors(k)
                    {
                        if seen.iter().any(|&pair| pair == (k, m)) {
                            continue;
                        }
                        seen.push((k, m));
                        events.add(i, EventKind::SecondShell { which: m, partner: k }, rate);
                        proball += rate;
                    }
                }
            }
        }

        // class III: first-shell partner
        for &j in lattice.neighbors(i) {
            let cj = coord[j];
            for (m, (r, &rate)) in
                self.reactions.first_shell.iter().zip(&self.rates.first_shell).enumerate()
            {
                if rate == 0.0 {
                    continue;
                }
                if element[i] == r.inputs[0]
                    && element[j] == r.inputs[1]
                    && r.req_coord[0].matches(ci.packed())
                    && r.req_coord[1].matches(cj.packed())
                    && r.gate.admits(phase)
                    && phys_ok_i
                    && (cj.phys() as usize) < lattice.num_neighbors(j)
                {
                    events.add(i, EventKind::FirstShell { which: m, partner: j }, rate);
                    proball += rate;
                }
            }
        }

        // class IV: same-z-plane partner
        for &g in self.same_z.neighbors(i) {
            let cg = coord[g];
            for (m, (r, &rate)) in
                self.reactions.same_plane.iter().zip(&self.rates.same_plane).enumerate()
            {
                if rate == 0.0 {
                    continue;
                }
                if element[i] == r.inputs[0]
                    && element[g] == r.inputs[1]
                    && r.req_coord[0].matches(ci.packed())
                    && r.req_coord[1].matches(cg.packed())
                    && r.gate.admits(phase)
                    && phys_ok_i
                    && (cg.phys() as usize) < lattice.num_neighbors(g)
                {
                    events.add(i, EventKind::SamePlane { which: m, partner: g }, rate);
                    proball += rate;
                }
            }
        }

        // the null event keeps every site selectable
        events.add(i, EventKind::Null, NULL_PROPENSITY);
        proball + NULL_PROPENSITY
    }

    /// Choose and perform one event at owned site `i`.
    ///
    /// `time` is the solver's current simulated time; it drives the pulse
    /// phase.  After the transition, every owned site within
    /// [`REFRESH_HOPS`] hops has its coordination recounted and its
    /// propensity rebuilt, and the solver is told which slots changed.
    pub fn site_event(
        &mut self,
        i: usize,
        rng: &mut dyn Uniform,
        time: f64,
        solver: &mut dyn Solver,
    ) {
        let isite = self
            .lattice
            .site_index(i)
            .expect("site_event called for an unowned site");
        let threshold = rng.uniform() * self.propensity[isite];

        let mut chosen = None;
        let mut proball = 0.0;
        for event in self.events.iter(i) {
            proball += event.propensity;
            if proball >= threshold {
                chosen = Some(event);
                break;
            }
        }
        let event = chosen.expect("event walk exhausted below the selection threshold");

        // Apply the transition.  Mask side effects are decided from the
        // pre/post species pair but applied only after the pulse update,
        // preserving the historical sequencing.
        let mut mask_put = None;
        let mut mask_remove = None;
        match event.kind {
            EventKind::Single { which } => {
                let old = self.element[i];
                let new = self.reactions.single[which].output;
                self.element[i] = new;
                self.counts.single[which] += 1;

                let shed_precursor = (old == Species::OHAlaX3 || old == Species::OHAlbX3)
                    && new == Species::OH;
                let shed_methyl = (old == Species::OAlaX2H2O || old == Species::OAlbX2H2O)
                    && (new == Species::OAlaXOH || new == Species::OAlbXOH);
                if shed_precursor || shed_methyl {
                    mask_remove = Some(i);
                }
            }
            EventKind::SecondShell { which, partner } => {
                let outputs = self.reactions.second_shell[which].outputs;
                self.element[i] = outputs[0];
                self.element[partner] = outputs[1];
                self.counts.second_shell[which] += 1;
            }
            EventKind::FirstShell { which, partner } => {
                let old = self.element[i];
                let outputs = self.reactions.first_shell[which].outputs;
                self.element[i] = outputs[0];
                self.element[partner] = outputs[1];
                self.counts.first_shell[which] += 1;

                let adsorbed = old == Species::OH
                    && (outputs[0] == Species::OHAlaX3 || outputs[0] == Species::OHAlbX3);
                if adsorbed {
                    mask_put = Some(i);
                }
            }
            EventKind::SamePlane { which, partner } => {
                let old_g = self.element[partner];
                let outputs = self.reactions.same_plane[which].outputs;
                self.element[i] = outputs[0];
                self.element[partner] = outputs[1];
                self.counts.same_plane[which] += 1;

                let shed = (old_g == Species::OAlaX2 || old_g == Species::OAlbX2)
                    && (outputs[1] == Species::OAlaX || outputs[1] == Species::OAlbX);
                if shed {
                    mask_remove = Some(partner);
                }
            }
            EventKind::Null => {}
        }

        self.pulse.advance(time);

        if let Some(site) = mask_remove {
            self.remove_mask(site);
            self.remove_mask_2(site);
        }
        if let Some(site) = mask_put {
            self.put_mask(site);
            self.put_mask_2(site);
        }

        // breadth-first propensity refresh around the fired site
        self.touched.clear();
        self.visited.begin();
        self.visited.insert(i);
        self.refresh_site(i);
        let mut frontier = vec![i];
        for _ in 0..REFRESH_HOPS {
            let mut next = vec![];
            for &s in &frontier {
                for &n in self.lattice.neighbors(s) {
                    if self.visited.insert(n) {
                        next.push(n);
                    }
                }
            }
            for &n in &next {
                self.refresh_site(n);
            }
            frontier = next;
        }

        solver.update(&self.touched, &self.propensity);
    }

    fn refresh_site(&mut self, s: usize) {
        if let Some(isite) = self.lattice.site_index(s) {
            self.count_coord(s);
            let total = self.site_propensity(s);
            self.propensity[isite] = total;
            self.touched.push(isite);
        }
    }

    /// Recount site `i`'s physical coordination: the number of non-vacant
    /// first-shell neighbors, written over a canonicalized mask decade.
    pub fn count_coord(&mut self, i: usize) {
        let occupied = self
            .lattice
            .neighbors(i)
            .iter()
            .filter(|&&n| self.element[n] != Species::Vacancy)
            .count();
        self.coord[i] = self.coord[i].canonical().with_phys(occupied as u8);
    }

    /// Mask the neighborhood of a freshly adsorbed bulky group: every
    /// second-shell site drops five mask decades.  First-shell sites are
    /// visited (and thereby shielded from the second-shell delta) but keep
    /// their value.
    pub fn put_mask(&mut self, i: usize) {
        self.shift_mask_shells(i, -5);
    }

    /// Undo one [`put_mask`](Model::put_mask); the walk order is identical,
    /// so the shifts cancel exactly.
    pub fn remove_mask(&mut self, i: usize) {
        self.shift_mask_shells(i, 5);
    }

    /// Mask the same-z-plane neighbors of `i` by one decade each.
    pub fn put_mask_2(&mut self, i: usize) {
        self.shift_mask_plane(i, -1);
    }

    /// Undo one [`put_mask_2`](Model::put_mask_2).
    pub fn remove_mask_2(&mut self, i: usize) {
        self.shift_mask_plane(i, 1);
    }

    fn shift_mask_shells(&mut self, i: usize, decades: i32) {
        self.visited.begin();
        self.visited.insert(i);
        for &j in self.lattice.neighbors(i) {
            if self.lattice.site_index(j).is_some() {
                // first shell: visited, but the mask delta is zero
                self.visited.insert(j);
            }
            for &k in self.lattice.neighbors(j) {
                if self.lattice.site_index(k).is_some() && self.visited.insert(k) {
                    self.coord[k].shift_mask(decades);
                }
            }
        }
    }

    fn shift_mask_plane(&mut self, i: usize, decades: i32) {
        self.visited.begin();
        self.visited.insert(i);
        for g in 0..self.same_z.neighbors(i).len() {
            let n = self.same_z.neighbors(i)[g];
            if self.lattice.site_index(n).is_some() && self.visited.insert(n) {
                self.coord[n].shift_mask(decades);
            }
        }
    }

    fn log_rate_table(&self) {
        let groups: [(char, &[f64]); 4] = [
            ('s', &self.rates.single[..]),
            ('d', &self.rates.second_shell[..]),
            ('v', &self.rates.first_shell[..]),
            ('f', &self.rates.same_plane[..]),
        ];
        info!("reaction rates at {} K", self.temperature);
        for &(prefix, rates) in &groups {
            if rates.is_empty() {
                continue;
            }
            let line = rates
                .iter()
                .enumerate()
                .map(|(m, rate)| format!("{}{}:{:.3e}", prefix, m + 1, rate))
                .join(" ");
            info!("  {}", line);
        }
    }

    /// Site energy is identically zero in this model; the host's energetics
    /// hooks expect the callable regardless.
    pub fn site_energy(&self, _i: usize) -> f64 {
        0.0
    }

    // ------------------------------------------------------------------
    // read-only views

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn element(&self, i: usize) -> Species {
        self.element[i]
    }

    pub fn elements(&self) -> &[Species] {
        &self.element
    }

    pub fn coord(&self, i: usize) -> Coord {
        self.coord[i]
    }

    /// The packed coordination counter, `10·mask + phys`.
    pub fn coord_packed(&self, i: usize) -> i32 {
        self.coord[i].packed()
    }

    pub fn reactions(&self) -> &ReactionSet {
        &self.reactions
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn counts(&self) -> &Counters {
        &self.counts
    }

    /// Live candidate events across all sites.
    pub fn nevents(&self) -> usize {
        self.events.len()
    }

    /// Candidate events of one site, most recently added first.
    pub fn site_events(&self, i: usize) -> EventIter<'_> {
        self.events.iter(i)
    }

    pub fn propensity(&self, isite: usize) -> f64 {
        self.propensity[isite]
    }

    pub fn propensities(&self) -> &[f64] {
        &self.propensity
    }

    pub fn phase(&self) -> Phase {
        self.pulse.phase()
    }

    pub fn pulse(&self) -> &PulseSchedule {
        &self.pulse
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Species counts over owned sites.
    pub fn species_histogram(&self) -> EnumMap<Species, i64> {
        let mut hist = EnumMap::default();
        for i in 0..self.lattice.num_sites() {
            if self.lattice.site_index(i).is_some() {
                hist[self.element[i]] += 1;
            }
        }
        hist
    }
}

fn parse_duration(s: &str) -> FailResult<f64> {
    match s.parse::<f64>() {
        Ok(t) => Ok(t),
        Err(_) => bail!("invalid time value: {:?}", s),
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    // A star lattice: center 0, first shell 1..=6, and six private leaves
    // per first-shell site.  43 sites, all initially vacant.
    fn star_lattice() -> (Lattice, Vec<Species>, Vec<i32>) {
        let mut xyz = vec![[0.0, 0.0, 0.0]];
        let mut neighbor: Vec<Vec<usize>> = vec![(1..=6).collect()];
        for m in 1..=6usize {
            // place the shells on distinct z planes so the same-z table
            // stays out of these tests
            xyz.push([m as f64, 0.0, 1.0]);
            let first_leaf = 7 + (m - 1) * 6;
            let mut shell = vec![0];
            shell.extend(first_leaf..first_leaf + 6);
            neighbor.push(shell);
        }
        for leaf in 0..36usize {
            let mid = 1 + leaf / 6;
            xyz.push([leaf as f64, 10.0, 2.0 + leaf as f64]);
            neighbor.push(vec![mid]);
        }
        let n = xyz.len();
        (
            Lattice::new(xyz, neighbor).unwrap(),
            vec![Species::Vacancy; n],
            vec![0; n],
        )
    }

    #[test]
    fn mask_round_trip_on_star() {
        let (lattice, element, coord) = star_lattice();
        let mut model = Model::new(lattice, element, coord).unwrap();

        model.put_mask(0);
        // first shell keeps its value, second shell drops 50
        for m in 1..=6 {
            assert_eq!(model.coord_packed(m), 0, "first-shell site {}", m);
        }
        for leaf in 7..43 {
            assert_eq!(model.coord_packed(leaf), -50, "leaf {}", leaf);
        }
        assert_eq!(model.coord_packed(0), 0);

        model.remove_mask(0);
        for site in 0..43 {
            assert_eq!(model.coord_packed(site), 0, "site {}", site);
        }
    }

    #[test]
    fn mask_walk_is_visit_guarded() {
        // two first-shell sites that are also adjacent to each other: the
        // one reached as somebody's second shell first takes the -50.
        let xyz = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 2.0],
        ];
        let neighbor = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        let lattice = Lattice::new(xyz, neighbor).unwrap();
        let mut model =
            Model::new(lattice, vec![Species::Vacancy; 3], vec![0; 3]).unwrap();

        model.put_mask(0);
        // site 1 is visited as first shell before site 2's walk reaches it;
        // site 2 is reached through site 1's second shell first.
        assert_eq!(model.coord_packed(1), 0);
        assert_eq!(model.coord_packed(2), -50);

        model.remove_mask(0);
        assert_eq!(model.coord_packed(1), 0);
        assert_eq!(model.coord_packed(2), 0);
    }

    #[test]
    fn plane_mask_round_trip() {
        // four coplanar sites, no adjacency
        let xyz = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 2.0, 0.0],
        ];
        let neighbor = vec![vec![], vec![], vec![], vec![]];
        let lattice = Lattice::new(xyz, neighbor).unwrap();
        let mut model =
            Model::new(lattice, vec![Species::Vacancy; 4], vec![0; 4]).unwrap();

        model.put_mask_2(0);
        assert_eq!(model.coord_packed(0), 0);
        for site in 1..4 {
            assert_eq!(model.coord_packed(site), -10, "site {}", site);
        }

        model.remove_mask_2(0);
        for site in 0..4 {
            assert_eq!(model.coord_packed(site), 0, "site {}", site);
        }
    }

    #[test]
    fn recount_tracks_occupied_neighbors() {
        let (lattice, mut element, coord) = star_lattice();
        element[1] = Species::O;
        element[2] = Species::OH;
        let mut model = Model::new(lattice, element, coord).unwrap();

        model.count_coord(0);
        assert_eq!(model.coord_packed(0), 2);
        assert_eq!(model.coord(0).phys(), 2);

        // site 0 is in site 1's first shell: the walk visits it but leaves
        // its value alone
        model.put_mask(1);
        assert_eq!(model.coord_packed(0), 2);

        // shift site 0 directly and recount: decade kept, units replaced
        model.coord[0].shift_mask(-5);
        model.count_coord(0);
        assert_eq!(model.coord_packed(0), -48);
    }

    #[test]
    fn histogram_counts_owned_sites() {
        let lattice = Lattice::with_site_map(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![vec![1], vec![0, 2], vec![1]],
            vec![0, 1, -1],
        )
        .unwrap();
        let element = vec![Species::OH, Species::OH, Species::OH];
        let model = Model::new(lattice, element, vec![0; 3]).unwrap();

        let hist = model.species_histogram();
        assert_eq!(hist[Species::OH], 2); // the ghost is not counted
        assert_eq!(hist[Species::Vacancy], 0);
    }

    #[test]
    fn rejects_corrupt_site_state() {
        let (lattice, element, mut coord) = star_lattice();
        coord[3] = 9;
        assert!(Model::new(lattice, element, coord).is_err());

        let (lattice, element, mut coord) = star_lattice();
        coord[3] = -2;
        assert!(Model::new(lattice, element, coord).is_err());

        let (lattice, element, coord) = star_lattice();
        let _ = coord;
        assert!(Model::new(lattice, element, vec![0; 2]).is_err());
    }
}
