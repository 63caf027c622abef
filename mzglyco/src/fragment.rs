//! The fragment evidence that is used to score glycan placements

use std::{collections::HashSet, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::ModBox;

/// The kind of a backbone fragment ion
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[expect(non_camel_case_types)]
pub enum IonKind {
    /// a
    a,
    /// b
    b,
    /// c
    c,
    /// x
    x,
    /// y
    y,
    /// z and z·
    z,
}

impl IonKind {
    /// The peptide terminus contained in this ion
    pub const fn terminus(self) -> Terminus {
        match self {
            Self::a | Self::b | Self::c => Terminus::N,
            Self::x | Self::y | Self::z => Terminus::C,
        }
    }

    /// Check if this is an electron based fragment (c or z·), these keep labile glycans attached.
    pub const fn is_electron_based(self) -> bool {
        matches!(self, Self::c | Self::z)
    }
}

impl Display for IonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::a => "a",
                Self::b => "b",
                Self::c => "c",
                Self::x => "x",
                Self::y => "y",
                Self::z => "z",
            }
        )
    }
}

/// A peptide terminus
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Terminus {
    /// N terminus
    N,
    /// C terminus
    C,
}

/// A theoretical backbone fragment of the unmodified peptide.
///
/// The `cleavage` is the index of the first residue after the broken bond. So an N terminal
/// fragment with cleavage `k` holds residues `0..k` and a C terminal fragment with cleavage `k`
/// holds residues `k..`. Sites are residue indices in the same numbering.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
pub struct Fragment {
    /// The ion kind
    pub ion: IonKind,
    /// The index of the first residue after the broken bond
    pub cleavage: usize,
    /// The neutral mass of the fragment without any glycans, in Dalton
    pub neutral_mass: f64,
}

impl Fragment {
    /// Create a new fragment
    pub const fn new(ion: IonKind, cleavage: usize, neutral_mass: f64) -> Self {
        Self {
            ion,
            cleavage,
            neutral_mass,
        }
    }

    /// The terminus of this fragment
    pub const fn terminus(&self) -> Terminus {
        self.ion.terminus()
    }

    /// The bin of this fragment if it breaks the peptide between `sites[layer]` and the next site.
    /// The fragment then carries the glycans of the first `layer + 1` sites (`local`) if it is N terminal
    /// or all other glycans if it is C terminal. There is no local evidence for the last site.
    /// Only electron based fragments keep their glycans, all other ions give no evidence.
    pub fn local_bin(
        &self,
        sites: &[usize],
        layer: usize,
        local: &ModBox,
        total: &ModBox,
        bins_per_dalton: u32,
    ) -> Option<i64> {
        if !self.ion.is_electron_based() {
            return None;
        }
        let (site, next) = (*sites.get(layer)?, *sites.get(layer + 1)?);
        (site < self.cleavage && self.cleavage <= next).then(|| {
            let carried = match self.terminus() {
                Terminus::N => local.mass(),
                Terminus::C => total.mass() - local.mass(),
            };
            fragment_bin(self.neutral_mass + carried, bins_per_dalton)
        })
    }

    /// The bin of this fragment if it does not break the peptide between any two sites. The fragment
    /// then carries either no glycans or all glycans, independent of the distribution over the sites.
    /// Only electron based fragments are used.
    pub fn unlocalized_bin(&self, sites: &[usize], total: &ModBox, bins_per_dalton: u32) -> Option<i64> {
        if !self.ion.is_electron_based() {
            return None;
        }
        let (first, last) = (*sites.first()?, *sites.last()?);
        let carries_all = if self.cleavage <= first {
            self.terminus() == Terminus::C
        } else if self.cleavage > last {
            self.terminus() == Terminus::N
        } else {
            return None;
        };
        let carried = if carries_all { total.mass() } else { 0.0 };
        Some(fragment_bin(self.neutral_mass + carried, bins_per_dalton))
    }
}

/// Turn a neutral mass into the integer bin used for matching.
pub fn fragment_bin(mass: f64, bins_per_dalton: u32) -> i64 {
    (mass * f64::from(bins_per_dalton)).round() as i64
}

/// Turn all observed neutral masses into the set of bins used for matching.
pub fn observed_bins(masses: impl IntoIterator<Item = f64>, bins_per_dalton: u32) -> HashSet<i64> {
    masses
        .into_iter()
        .map(|mass| fragment_bin(mass, bins_per_dalton))
        .collect()
}

/// All distinct theoretical bins that give evidence for the glycans of the first `layer + 1` sites being `local`.
pub fn local_fragment_bins(
    fragments: &[Fragment],
    sites: &[usize],
    layer: usize,
    local: &ModBox,
    total: &ModBox,
    bins_per_dalton: u32,
) -> HashSet<i64> {
    fragments
        .iter()
        .filter_map(|fragment| fragment.local_bin(sites, layer, local, total, bins_per_dalton))
        .collect()
}

/// All distinct theoretical bins that match regardless of how the glycans are distributed.
pub fn unlocalized_fragment_bins(
    fragments: &[Fragment],
    sites: &[usize],
    total: &ModBox,
    bins_per_dalton: u32,
) -> HashSet<i64> {
    fragments
        .iter()
        .filter_map(|fragment| fragment.unlocalized_bin(sites, total, bins_per_dalton))
        .collect()
}
