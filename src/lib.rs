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

//! Lattice kinetic Monte Carlo engine for atomic layer deposition of a
//! trimethylaluminum precursor followed by an oxidizer.
//!
//! The crate is a plug-in for a host KMC framework.  The host owns the
//! lattice loader, the stochastic-time solver, the random number source,
//! the input-file tokenizer and process exit; the engine owns per-site
//! chemical state, event enumeration and execution, steric masking, and
//! the ALD pulse clock.  See the `host` module for the seams.

#![deny(unused_must_use)]

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;
#[cfg(feature = "serde")]
#[macro_use] extern crate serde;

pub mod coordination;
pub mod diag;
pub mod events;
pub mod geometry;
pub mod host;
pub mod lattice;
pub mod model;
pub mod pulse;
pub mod reaction;
pub mod species;
mod util;

pub use crate::coordination::Coord;
pub use crate::diag::{DiagKey, Diagnostics};
pub use crate::events::{Event, EventKind, DELTAEVENT, NULL_PROPENSITY};
pub use crate::host::{RngUniform, Solver, Uniform};
pub use crate::lattice::Lattice;
pub use crate::model::{Counters, Model};
pub use crate::pulse::{Phase, PulseSchedule};
pub use crate::reaction::{
    CoordPattern, EventDecl, PairReaction, PulseGate, RateTable, ReactionSet,
    SingleReaction, BOLTZMANN_EV,
};
pub use crate::species::Species;

pub type FailResult<T> = Result<T, failure::Error>;
