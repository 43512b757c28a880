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

//! The closed catalog of surface species.
//!
//! Species names follow the surface-chemistry bookkeeping of the TMA/oxidizer
//! process: `X` is a methyl ligand, `Ala`/`Alb` are the two crystallographically
//! distinct aluminum sites, and a leading `O`/`OH` names the anchoring group.
//! Declaration parsing and diagnostics both go through the tables here, so
//! there is exactly one source of truth for the string spellings and the
//! per-species weights.

use std::collections::HashMap;
use std::fmt;
use std::str;
use failure::Backtrace;

/// One of the 26 chemical identities a lattice site can hold.
///
/// `Vacancy` is a legal site value (an empty lattice position), not an error
/// state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, enum_map::Enum)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Species {
    Vacancy,
    O,
    OH,
    Ala,
    OHAlaX3,
    OAlaX2,
    OAlaX2H2O,
    OAlaXOH,
    OAlaX,
    OAlaOH,
    OAlaOH2,
    AlaOH,
    AlaOH2,
    Alb,
    OHAlbX3,
    OAlbX2,
    OAlbX2H2O,
    OAlbXOH,
    OAlbX,
    OAlbOH,
    OAlbOH2,
    AlbOH,
    AlbOH2,
    OAla,
    OAlb,
    H2O,
}

#[derive(Debug, Fail)]
#[fail(display = "unknown species name: {:?}", text)]
pub struct SpeciesParseError {
    text: String,
    backtrace: Backtrace,
}

impl SpeciesParseError {
    fn new(s: &str) -> Self {
        SpeciesParseError {
            text: s.to_string(),
            backtrace: Backtrace::new(),
        }
    }
}

impl Species {
    /// Every species, in declaration order.
    pub const ALL: [Species; 26] = [
        Species::Vacancy,
        Species::O,
        Species::OH,
        Species::Ala,
        Species::OHAlaX3,
        Species::OAlaX2,
        Species::OAlaX2H2O,
        Species::OAlaXOH,
        Species::OAlaX,
        Species::OAlaOH,
        Species::OAlaOH2,
        Species::AlaOH,
        Species::AlaOH2,
        Species::Alb,
        Species::OHAlbX3,
        Species::OAlbX2,
        Species::OAlbX2H2O,
        Species::OAlbXOH,
        Species::OAlbX,
        Species::OAlbOH,
        Species::OAlbOH2,
        Species::AlbOH,
        Species::AlbOH2,
        Species::OAla,
        Species::OAlb,
        Species::H2O,
    ];

    /// The spelling used in declaration files and diagnostic headers.
    ///
    /// Note that `Vacancy` is spelled `VAC`.
    pub fn label(self) -> &'static str {
        match self {
            Species::Vacancy => "VAC",
            Species::O => "O",
            Species::OH => "OH",
            Species::Ala => "Ala",
            Species::OHAlaX3 => "OHAlaX3",
            Species::OAlaX2 => "OAlaX2",
            Species::OAlaX2H2O => "OAlaX2H2O",
            Species::OAlaXOH => "OAlaXOH",
            Species::OAlaX => "OAlaX",
            Species::OAlaOH => "OAlaOH",
            Species::OAlaOH2 => "OAlaOH2",
            Species::AlaOH => "AlaOH",
            Species::AlaOH2 => "AlaOH2",
            Species::Alb => "Alb",
            Species::OHAlbX3 => "OHAlbX3",
            Species::OAlbX2 => "OAlbX2",
            Species::OAlbX2H2O => "OAlbX2H2O",
            Species::OAlbXOH => "OAlbXOH",
            Species::OAlbX => "OAlbX",
            Species::OAlbOH => "OAlbOH",
            Species::OAlbOH2 => "OAlbOH2",
            Species::AlbOH => "AlbOH",
            Species::AlbOH2 => "AlbOH2",
            Species::OAla => "OAla",
            Species::OAlb => "OAlb",
            Species::H2O => "H2O",
        }
    }

    pub fn from_label(s: &str) -> Result<Self, SpeciesParseError> {
        LABEL_TO_SPECIES
            .get(s)
            .cloned()
            .ok_or_else(|| SpeciesParseError::new(s))
    }

    /// Integer mass-like weight used by the `QCM` diagnostic.
    ///
    /// These values are part of the external output format and must not be
    /// "corrected"; they are reproduced from the reference weight table.
    pub fn molar_weight(self) -> i64 {
        match self {
            Species::Vacancy => 0,
            Species::O => 16,
            Species::OH => 17,
            Species::Ala | Species::Alb => 27,
            Species::OHAlaX3 | Species::OHAlbX3 => 89,
            Species::OAlaX2 | Species::OAlbX2 => 73,
            Species::OAlaX2H2O | Species::OAlbX2H2O => 91,
            Species::OAlaXOH | Species::OAlbXOH => 75,
            Species::OAlaX | Species::OAlbX => 58,
            Species::OAlaOH | Species::OAlbOH => 60,
            Species::OAlaOH2 | Species::OAlbOH2 => 77,
            Species::AlaOH | Species::AlbOH => 44,
            Species::AlaOH2 | Species::AlbOH2 => 61,
            Species::OAla | Species::OAlb => 43,
            Species::H2O => 18,
        }
    }

    /// Number of hydroxyl groups carried, for the `OHG` diagnostic.
    ///
    /// A coordinated water ligand (as in `OAlaX2H2O`) is not an OH group.
    pub fn hydroxyl_groups(self) -> i64 {
        match self {
            Species::OH
            | Species::OHAlaX3
            | Species::OAlaXOH
            | Species::OAlaOH
            | Species::AlaOH
            | Species::OHAlbX3
            | Species::OAlbXOH
            | Species::OAlbOH
            | Species::AlbOH => 1,
            Species::OAlaOH2 | Species::AlaOH2 | Species::OAlbOH2 | Species::AlbOH2 => 2,
            _ => 0,
        }
    }

    /// Number of methyl (`X`) ligands carried, for the `XG` diagnostic.
    pub fn methyl_ligands(self) -> i64 {
        match self {
            Species::OHAlaX3 | Species::OHAlbX3 => 3,
            Species::OAlaX2
            | Species::OAlaX2H2O
            | Species::OAlbX2
            | Species::OAlbX2H2O => 2,
            Species::OAlaXOH | Species::OAlaX | Species::OAlbXOH | Species::OAlbX => 1,
            _ => 0,
        }
    }

    /// True for every species containing an `Ala`-type aluminum.
    pub fn is_ala_family(self) -> bool {
        match self {
            Species::Ala
            | Species::OHAlaX3
            | Species::OAlaX2
            | Species::OAlaX2H2O
            | Species::OAlaXOH
            | Species::OAlaX
            | Species::OAlaOH
            | Species::OAlaOH2
            | Species::AlaOH
            | Species::AlaOH2
            | Species::OAla => true,
            _ => false,
        }
    }

    /// True for every species containing an `Alb`-type aluminum.
    pub fn is_alb_family(self) -> bool {
        match self {
            Species::Alb
            | Species::OHAlbX3
            | Species::OAlbX2
            | Species::OAlbX2H2O
            | Species::OAlbXOH
            | Species::OAlbX
            | Species::OAlbOH
            | Species::OAlbOH2
            | Species::AlbOH
            | Species::AlbOH2
            | Species::OAlb => true,
            _ => false,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.label(), f)
    }
}

impl str::FromStr for Species {
    type Err = SpeciesParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::from_label(s)
    }
}

lazy_static! {
    static ref LABEL_TO_SPECIES: HashMap<&'static str, Species> = {
        Species::ALL.iter().map(|&sp| (sp.label(), sp)).collect()
    };
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trip() {
        for &sp in &Species::ALL {
            assert_eq!(Species::from_label(sp.label()).unwrap(), sp);
        }
        assert_eq!(Species::from_label("VAC").unwrap(), Species::Vacancy);
        assert_eq!("OAlbX2H2O".parse::<Species>().unwrap(), Species::OAlbX2H2O);
        assert!(Species::from_label("Vacancy").is_err());
        assert!(Species::from_label("oh").is_err()); // names are case-sensitive
    }

    #[test]
    fn weight_tables() {
        // spot checks against the reference table
        assert_eq!(Species::Vacancy.molar_weight(), 0);
        assert_eq!(Species::OH.molar_weight(), 17);
        assert_eq!(Species::OHAlaX3.molar_weight(), 89);
        assert_eq!(Species::OAlbX2H2O.molar_weight(), 91);
        assert_eq!(Species::OAla.molar_weight(), 43);
        assert_eq!(Species::H2O.molar_weight(), 18);

        assert_eq!(Species::OAlaOH2.hydroxyl_groups(), 2);
        assert_eq!(Species::OAlaX2H2O.hydroxyl_groups(), 0);
        assert_eq!(Species::AlbOH.hydroxyl_groups(), 1);

        assert_eq!(Species::OHAlbX3.methyl_ligands(), 3);
        assert_eq!(Species::OAlaX2H2O.methyl_ligands(), 2);
        assert_eq!(Species::OAlaXOH.methyl_ligands(), 1);
        assert_eq!(Species::AlaOH2.methyl_ligands(), 0);
    }

    #[test]
    fn aluminum_families() {
        let ala = Species::ALL.iter().filter(|sp| sp.is_ala_family()).count();
        let alb = Species::ALL.iter().filter(|sp| sp.is_alb_family()).count();
        assert_eq!((ala, alb), (11, 11));
        assert!(!Species::O.is_ala_family());
        assert!(!Species::H2O.is_alb_family());
        // no species belongs to both families
        for &sp in &Species::ALL {
            assert!(!(sp.is_ala_family() && sp.is_alb_family()), "{}", sp);
        }
    }
}
