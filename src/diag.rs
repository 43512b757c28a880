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

//! Diagnostic columns for the host's stats output.
//!
//! The host's `diag` command names a list of columns; each maps to a species
//! count, a per-reaction fire counter, an aggregate, or one of the derived
//! quantities (`QCM`, `OHG`, `XG`).  Column values are integers and the
//! output format is fixed-width, both inherited from the established output
//! files that downstream analysis scripts parse.

use std::fmt::Write;

use enum_map::EnumMap;

use crate::model::Model;
use crate::species::Species;
use crate::FailResult;

/// One requested diagnostic column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiagKey {
    /// Count of sites holding one species.
    Species(Species),
    /// Live candidate events in the arena.
    Events,
    /// Mass-weighted species sum, the simulated quartz-microbalance signal.
    Qcm,
    /// Total hydroxyl groups on the surface.
    Ohg,
    /// Total methyl ligands on the surface.
    Xg,
    Type1Total,
    Type2Total,
    Type3Total,
    Type4Total,
    AllEvents,
    /// Sites in the `Ala` aluminum family.
    AlaTotal,
    /// Sites in the `Alb` aluminum family.
    AlbTotal,
    /// Fire count of one class-I reaction (0-based; the label is 1-based).
    Single(usize),
    /// Fire count of one class-II reaction.
    SecondShell(usize),
    /// Fire count of one class-III reaction.
    FirstShell(usize),
    /// Fire count of one class-IV reaction.
    SamePlane(usize),
}

/// A validated diagnostic column list.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    keys: Vec<DiagKey>,
    labels: Vec<String>,
}

impl Diagnostics {
    /// Parse column names, validating reaction-counter labels against the
    /// declared reaction lists of `model`.
    pub fn new(model: &Model, names: &[&str]) -> FailResult<Diagnostics> {
        ensure!(!names.is_empty(), "diagnostic list cannot be empty");
        let keys = names
            .iter()
            .map(|&name| parse_key(model, name))
            .collect::<FailResult<Vec<_>>>()?;
        Ok(Diagnostics {
            keys,
            labels: names.iter().map(|&s| s.to_string()).collect(),
        })
    }

    pub fn keys(&self) -> &[DiagKey] {
        &self.keys
    }

    /// Evaluate every column against the model's current state.
    pub fn compute(&self, model: &Model) -> Vec<i64> {
        let hist = model.species_histogram();
        self.keys.iter().map(|&key| evaluate(model, &hist, key)).collect()
    }

    /// The fixed-width column header row.
    pub fn header(&self) -> String {
        let mut out = String::new();
        for label in &self.labels {
            write!(out, " {:>6} ", label).unwrap();
        }
        out
    }

    /// One fixed-width value row.
    pub fn line(&self, model: &Model) -> String {
        let mut out = String::new();
        for value in self.compute(model) {
            write!(out, " {:>6} ", value).unwrap();
        }
        out
    }
}

fn parse_key(model: &Model, name: &str) -> FailResult<DiagKey> {
    if let Ok(species) = Species::from_label(name) {
        return Ok(DiagKey::Species(species));
    }
    match name {
        "events" => return Ok(DiagKey::Events),
        "QCM" => return Ok(DiagKey::Qcm),
        "OHG" => return Ok(DiagKey::Ohg),
        "XG" => return Ok(DiagKey::Xg),
        "type1_total" => return Ok(DiagKey::Type1Total),
        "type2_total" => return Ok(DiagKey::Type2Total),
        "type3_total" => return Ok(DiagKey::Type3Total),
        "type4_total" => return Ok(DiagKey::Type4Total),
        "all_events" => return Ok(DiagKey::AllEvents),
        "ala_total" => return Ok(DiagKey::AlaTotal),
        "alb_total" => return Ok(DiagKey::AlbTotal),
        _ => {}
    }

    // s<n>/d<n>/v<n>/f<n>: 1-based reaction counters
    let reactions = model.reactions();
    let counter = |count: usize| -> FailResult<usize> {
        let n: usize = match name[1..].parse() {
            Ok(n) => n,
            Err(_) => bail!("invalid diagnostic column: {:?}", name),
        };
        ensure!(
            1 <= n && n <= count,
            "diagnostic column {:?} is out of range (1..={})",
            name,
            count
        );
        Ok(n - 1)
    };
    match name.bytes().next() {
        Some(b'f') => Ok(DiagKey::SamePlane(counter(reactions.same_plane.len())?)),
        Some(b's') => Ok(DiagKey::Single(counter(reactions.single.len())?)),
        Some(b'd') => Ok(DiagKey::SecondShell(counter(reactions.second_shell.len())?)),
        Some(b'v') => Ok(DiagKey::FirstShell(counter(reactions.first_shell.len())?)),
        _ => bail!("invalid diagnostic column: {:?}", name),
    }
}

fn evaluate(model: &Model, hist: &EnumMap<Species, i64>, key: DiagKey) -> i64 {
    let weighted = |weight: fn(Species) -> i64| -> i64 {
        Species::ALL.iter().map(|&sp| hist[sp] * weight(sp)).sum()
    };
    let family = |member: fn(Species) -> bool| -> i64 {
        Species::ALL.iter().filter(|&&sp| member(sp)).map(|&sp| hist[sp]).sum()
    };
    let counts = model.counts();

    match key {
        DiagKey::Species(sp) => hist[sp],
        DiagKey::Events => model.nevents() as i64,
        DiagKey::Qcm => weighted(Species::molar_weight),
        DiagKey::Ohg => weighted(Species::hydroxyl_groups),
        DiagKey::Xg => weighted(Species::methyl_ligands),
        DiagKey::Type1Total => counts.single.iter().sum::<u64>() as i64,
        DiagKey::Type2Total => counts.second_shell.iter().sum::<u64>() as i64,
        DiagKey::Type3Total => counts.first_shell.iter().sum::<u64>() as i64,
        DiagKey::Type4Total => counts.same_plane.iter().sum::<u64>() as i64,
        DiagKey::AllEvents => counts.all_events() as i64,
        DiagKey::AlaTotal => family(Species::is_ala_family),
        DiagKey::AlbTotal => family(Species::is_alb_family),
        DiagKey::Single(m) => counts.single[m] as i64,
        DiagKey::SecondShell(m) => counts.second_shell[m] as i64,
        DiagKey::FirstShell(m) => counts.first_shell[m] as i64,
        DiagKey::SamePlane(m) => counts.same_plane[m] as i64,
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::lattice::Lattice;

    fn two_site_model() -> Model {
        let lattice = Lattice::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![vec![1], vec![0]],
        )
        .unwrap();
        let mut model = Model::new(
            lattice,
            vec![Species::OHAlaX3, Species::OAlbOH2],
            vec![0, 0],
        )
        .unwrap();
        model
            .input_app("event", &["1", "O", "OH", "1.0", "0", "0.0", "all", "0", "s1"])
            .unwrap();
        model.setup(300.0).unwrap();
        model
    }

    #[test]
    fn derived_quantities() {
        let model = two_site_model();
        let diag = Diagnostics::new(
            &model,
            &["OHAlaX3", "VAC", "QCM", "OHG", "XG", "ala_total", "alb_total"],
        )
        .unwrap();
        assert_eq!(diag.compute(&model), vec![1, 0, 89 + 77, 1 + 2, 3, 1, 1]);
    }

    #[test]
    fn counter_labels_are_one_based() {
        let model = two_site_model();
        let diag = Diagnostics::new(&model, &["s1", "events", "all_events"]).unwrap();
        assert_eq!(
            diag.keys(),
            &[DiagKey::Single(0), DiagKey::Events, DiagKey::AllEvents]
        );

        assert!(Diagnostics::new(&model, &["s2"]).is_err()); // only one declared
        assert!(Diagnostics::new(&model, &["d1"]).is_err()); // none declared
        assert!(Diagnostics::new(&model, &["s0"]).is_err());
        assert!(Diagnostics::new(&model, &["bogus"]).is_err());
        assert!(Diagnostics::new(&model, &[]).is_err());
    }

    #[test]
    fn fixed_width_rows() {
        let model = two_site_model();
        let diag = Diagnostics::new(&model, &["QCM", "VAC"]).unwrap();
        assert_eq!(diag.header(), "    QCM     VAC ");
        assert_eq!(diag.line(&model), "    166       0 ");
    }
}
