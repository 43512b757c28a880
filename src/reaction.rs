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

//! Declarative reaction catalog and the Arrhenius rate table.
//!
//! Reactions arrive as `event` commands before setup and are frozen
//! afterwards.  Four topological classes exist; within a class, a
//! reaction's position is its observable identity (the `s1../d1../v1../f1..`
//! labels of the diagnostics).

use crate::pulse::Phase;
use crate::species::Species;
use crate::FailResult;

/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV: f64 = 8.617333262e-5;

/// Coordination constraint of a reaction input.
///
/// Matches against the *packed* coordination counter, mask included; this is
/// how masking keeps a bulky adsorption from being declared admissible.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoordPattern {
    /// The literal `all`: no constraint.
    Any,
    Exact(i32),
}

impl CoordPattern {
    pub fn matches(self, packed: i32) -> bool {
        match self {
            CoordPattern::Any => true,
            CoordPattern::Exact(c) => packed == c,
        }
    }

    pub fn parse(s: &str) -> FailResult<CoordPattern> {
        if s == "all" || s == "ALL" {
            return Ok(CoordPattern::Any);
        }
        match s.parse::<i32>() {
            Ok(c) => Ok(CoordPattern::Exact(c)),
            Err(_) => bail!("invalid coord value in event command: {:?}", s),
        }
    }
}

/// Which pulse phases admit a reaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PulseGate {
    /// Declared as `0`: admissible in every phase.
    Always,
    During(Phase),
}

impl PulseGate {
    pub fn admits(self, phase: Phase) -> bool {
        match self {
            PulseGate::Always => true,
            PulseGate::During(p) => p == phase,
        }
    }

    pub fn parse(s: &str) -> FailResult<PulseGate> {
        let n: u32 = match s.parse() {
            Ok(n) => n,
            Err(_) => bail!("invalid press_on value in event command: {:?}", s),
        };
        if n == 0 {
            return Ok(PulseGate::Always);
        }
        match Phase::from_index(n) {
            Some(phase) => Ok(PulseGate::During(phase)),
            None => bail!("press_on must be 0..=3, got {}", n),
        }
    }
}

/// A single-site reaction (class I).
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SingleReaction {
    pub input: Species,
    pub output: Species,
    pub prefactor: f64,
    pub exponent: i32,
    /// Activation energy, eV.
    pub barrier: f64,
    pub req_coord: CoordPattern,
    pub gate: PulseGate,
}

/// A two-site reaction (classes II-IV; the class is carried by which
/// `ReactionSet` list the record lives in).
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairReaction {
    pub inputs: [Species; 2],
    pub outputs: [Species; 2],
    pub prefactor: f64,
    pub exponent: i32,
    /// Activation energy, eV.
    pub barrier: f64,
    pub req_coord: [CoordPattern; 2],
    pub gate: PulseGate,
}

impl SingleReaction {
    pub fn rate(&self, temperature: f64) -> f64 {
        arrhenius(self.prefactor, self.exponent, self.barrier, temperature)
    }
}

impl PairReaction {
    pub fn rate(&self, temperature: f64) -> f64 {
        arrhenius(self.prefactor, self.exponent, self.barrier, temperature)
    }
}

fn arrhenius(prefactor: f64, exponent: i32, barrier: f64, temperature: f64) -> f64 {
    prefactor * temperature.powi(exponent) * f64::exp(-barrier / (BOLTZMANN_EV * temperature))
}

/// All declared reactions, grouped by topological class.
#[derive(Debug, Clone, Default)]
pub struct ReactionSet {
    /// Class I: single site.
    pub single: Vec<SingleReaction>,
    /// Class II: site plus a second-shell partner.
    pub second_shell: Vec<PairReaction>,
    /// Class III: site plus a first-shell partner.
    pub first_shell: Vec<PairReaction>,
    /// Class IV: site plus a same-z-plane partner.
    pub same_plane: Vec<PairReaction>,
}

/// Rates precomputed at setup, parallel to the `ReactionSet` lists.
/// Temperature is fixed for a run, so these are constants.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    pub single: Vec<f64>,
    pub second_shell: Vec<f64>,
    pub first_shell: Vec<f64>,
    pub same_plane: Vec<f64>,
}

impl RateTable {
    /// Evaluate every declared reaction at the run temperature.
    ///
    /// A rate of exactly zero is legal but useless (the reaction can never
    /// fire); it is reported as a warning, once per offending reaction.
    pub fn compute(reactions: &ReactionSet, temperature: f64) -> FailResult<RateTable> {
        ensure!(temperature != 0.0, "temperature cannot be 0.0");

        let evaluate = |label: char, rates: Vec<f64>| {
            for (m, &rate) in rates.iter().enumerate() {
                if rate == 0.0 {
                    warn!(
                        "reaction {}{} has zero rate at {} K and will never fire",
                        label,
                        m + 1,
                        temperature
                    );
                }
            }
            rates
        };

        Ok(RateTable {
            single: evaluate(
                's',
                reactions.single.iter().map(|r| r.rate(temperature)).collect(),
            ),
            second_shell: evaluate(
                'd',
                reactions.second_shell.iter().map(|r| r.rate(temperature)).collect(),
            ),
            first_shell: evaluate(
                'v',
                reactions.first_shell.iter().map(|r| r.rate(temperature)).collect(),
            ),
            same_plane: evaluate(
                'f',
                reactions.same_plane.iter().map(|r| r.rate(temperature)).collect(),
            ),
        })
    }
}

/// A parsed `event` command.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDecl {
    Single(SingleReaction),
    SecondShell(PairReaction),
    FirstShell(PairReaction),
    SamePlane(PairReaction),
}

/// Parse the arguments of an `event` command.
///
/// Single-site events take 9 arguments, pair events 12; the final argument
/// is a free-form label (the generated decks carry `s1`, `d3`, ... there)
/// and is ignored.
pub fn parse_event(args: &[&str]) -> FailResult<EventDecl> {
    ensure!(!args.is_empty(), "illegal event command: missing style");
    let style: u32 = match args[0].parse() {
        Ok(n) => n,
        Err(_) => bail!("illegal event style: {:?}", args[0]),
    };

    match style {
        1 => {
            ensure!(
                args.len() == 9,
                "event style 1 takes 9 arguments, got {}",
                args.len()
            );
            Ok(EventDecl::Single(SingleReaction {
                input: args[1].parse::<Species>()?,
                output: args[2].parse::<Species>()?,
                prefactor: parse_f64(args[3])?,
                exponent: parse_i32(args[4])?,
                barrier: parse_f64(args[5])?,
                req_coord: CoordPattern::parse(args[6])?,
                gate: PulseGate::parse(args[7])?,
            }))
        }
        2 | 3 | 4 => {
            ensure!(
                args.len() == 12,
                "event style {} takes 12 arguments, got {}",
                style,
                args.len()
            );
            let reaction = PairReaction {
                inputs: [args[1].parse::<Species>()?, args[3].parse::<Species>()?],
                outputs: [args[2].parse::<Species>()?, args[4].parse::<Species>()?],
                prefactor: parse_f64(args[5])?,
                exponent: parse_i32(args[6])?,
                barrier: parse_f64(args[7])?,
                req_coord: [
                    CoordPattern::parse(args[8])?,
                    CoordPattern::parse(args[9])?,
                ],
                gate: PulseGate::parse(args[10])?,
            };
            Ok(match style {
                2 => EventDecl::SecondShell(reaction),
                3 => EventDecl::FirstShell(reaction),
                _ => EventDecl::SamePlane(reaction),
            })
        }
        _ => bail!("illegal event style: {}", style),
    }
}

fn parse_f64(s: &str) -> FailResult<f64> {
    match s.parse() {
        Ok(x) => Ok(x),
        Err(_) => bail!("invalid number in event command: {:?}", s),
    }
}

fn parse_i32(s: &str) -> FailResult<i32> {
    match s.parse() {
        Ok(x) => Ok(x),
        Err(_) => bail!("invalid integer in event command: {:?}", s),
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn arrhenius_rates() {
        let r = SingleReaction {
            input: Species::O,
            output: Species::OH,
            prefactor: 1.0,
            exponent: 0,
            barrier: 0.0,
            req_coord: CoordPattern::Any,
            gate: PulseGate::Always,
        };
        assert_eq!(r.rate(300.0), 1.0);

        let r = SingleReaction { prefactor: 2.0, exponent: 1, barrier: 0.0, ..r };
        assert_eq!(r.rate(300.0), 600.0);

        // kT at 300 K is about 25.85 meV; one barrier of exactly kT
        let kt = BOLTZMANN_EV * 300.0;
        let r = SingleReaction { prefactor: 1.0, exponent: 0, barrier: kt, ..r };
        assert!((r.rate(300.0) - f64::exp(-1.0)).abs() < 1e-15);
    }

    #[test]
    fn rate_table_rejects_zero_temperature() {
        let reactions = ReactionSet::default();
        assert!(RateTable::compute(&reactions, 0.0).is_err());
        assert!(RateTable::compute(&reactions, 300.0).is_ok());
    }

    #[test]
    fn coord_patterns() {
        assert_eq!(CoordPattern::parse("all").unwrap(), CoordPattern::Any);
        assert_eq!(CoordPattern::parse("ALL").unwrap(), CoordPattern::Any);
        assert_eq!(CoordPattern::parse("-48").unwrap(), CoordPattern::Exact(-48));
        assert!(CoordPattern::parse("All").is_err());
        assert!(CoordPattern::parse("2.5").is_err());

        assert!(CoordPattern::Any.matches(-999));
        assert!(CoordPattern::Exact(2).matches(2));
        assert!(!CoordPattern::Exact(2).matches(-48));
    }

    #[test]
    fn pulse_gates() {
        assert_eq!(PulseGate::parse("0").unwrap(), PulseGate::Always);
        assert_eq!(
            PulseGate::parse("2").unwrap(),
            PulseGate::During(Phase::Oxidizer)
        );
        assert!(PulseGate::parse("4").is_err());
        assert!(PulseGate::parse("-1").is_err());

        assert!(PulseGate::Always.admits(Phase::Purge));
        assert!(PulseGate::During(Phase::Precursor).admits(Phase::Precursor));
        assert!(!PulseGate::During(Phase::Precursor).admits(Phase::Purge));
    }

    #[test]
    fn event_parsing() {
        let decl = parse_event(&["1", "O", "OH", "1.0", "0", "0.0", "all", "0", "s1"]).unwrap();
        match decl {
            EventDecl::Single(r) => {
                assert_eq!(r.input, Species::O);
                assert_eq!(r.output, Species::OH);
                assert_eq!(r.req_coord, CoordPattern::Any);
                assert_eq!(r.gate, PulseGate::Always);
            }
            other => panic!("wrong class: {:?}", other),
        }

        let decl = parse_event(&[
            "3", "OH", "OHAlaX3", "VAC", "VAC", "5e3", "0", "0.52", "2", "all", "1", "v1",
        ])
        .unwrap();
        match decl {
            EventDecl::FirstShell(r) => {
                assert_eq!(r.inputs, [Species::OH, Species::Vacancy]);
                assert_eq!(r.outputs, [Species::OHAlaX3, Species::Vacancy]);
                assert_eq!(r.req_coord, [CoordPattern::Exact(2), CoordPattern::Any]);
                assert_eq!(r.gate, PulseGate::During(Phase::Precursor));
            }
            other => panic!("wrong class: {:?}", other),
        }

        // arity is enforced exactly
        assert!(parse_event(&["1", "O", "OH", "1.0", "0", "0.0", "all", "0"]).is_err());
        assert!(parse_event(&["5", "O", "OH", "1.0", "0", "0.0", "all", "0", "x"]).is_err());
        assert!(parse_event(&["1", "Bogus", "OH", "1.0", "0", "0.0", "all", "0", "s1"]).is_err());
    }
}
