//! Handle the monosaccharide units that glycan compositions are counted in

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The number of integer mass units per Dalton, all integer masses in this crate are in 1e-5 Da.
pub const MASS_SCALE: f64 = 1e5;

/// A monosaccharide (or small glycan adduct) that can be counted in a [`Composition`](crate::glycan::Composition).
/// The order of the variants is the order used in composition strings.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum MonoSaccharideKind {
    /// Hexose, symbol `H`
    Hex,
    /// N-acetylhexosamine, symbol `N`
    HexNAc,
    /// N-acetylneuraminic acid, symbol `A`
    NeuAc,
    /// N-glycolylneuraminic acid, symbol `G`
    NeuGc,
    /// Fucose, symbol `F`
    Fuc,
    /// Phosphate, symbol `P`
    Phospho,
    /// Sulfate, symbol `S`
    Sulfo,
    /// Sodium adduct, symbol `Y`
    Sodium,
    /// Acetyl, symbol `C`
    Acetyl,
    /// Xylose, symbol `X`
    Xylose,
    /// 2-keto-3-deoxynononic acid, symbol `K`
    Kdn,
}

impl MonoSaccharideKind {
    /// The number of monosaccharide kinds.
    pub const TOTAL_NUMBER: usize = 11;

    /// All kinds in composition order.
    pub const ALL: [Self; Self::TOTAL_NUMBER] = [
        Self::Hex,
        Self::HexNAc,
        Self::NeuAc,
        Self::NeuGc,
        Self::Fuc,
        Self::Phospho,
        Self::Sulfo,
        Self::Sodium,
        Self::Acetyl,
        Self::Xylose,
        Self::Kdn,
    ];

    /// The position of this kind in the composition count array.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The single character symbol used in structure and composition strings.
    pub const fn symbol(self) -> char {
        match self {
            Self::Hex => 'H',
            Self::HexNAc => 'N',
            Self::NeuAc => 'A',
            Self::NeuGc => 'G',
            Self::Fuc => 'F',
            Self::Phospho => 'P',
            Self::Sulfo => 'S',
            Self::Sodium => 'Y',
            Self::Acetyl => 'C',
            Self::Xylose => 'X',
            Self::Kdn => 'K',
        }
    }

    /// The name as used in Byonic style glycan databases, e.g. `HexNAc(2)Hex(5)`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hex => "Hex",
            Self::HexNAc => "HexNAc",
            Self::NeuAc => "NeuAc",
            Self::NeuGc => "NeuGc",
            Self::Fuc => "Fuc",
            Self::Phospho => "Phospho",
            Self::Sulfo => "Sulfo",
            Self::Sodium => "Na",
            Self::Acetyl => "Ac",
            Self::Xylose => "Xylose",
            Self::Kdn => "Kdn",
        }
    }

    /// The monoisotopic residue mass in 1e-5 Da.
    pub const fn integer_mass(self) -> i64 {
        match self {
            Self::Hex => 16205282,
            Self::HexNAc => 20307937,
            Self::NeuAc => 29109542,
            Self::NeuGc => 30709033,
            Self::Fuc => 14605791,
            Self::Phospho => 7996633,
            Self::Sulfo => 7995681,
            Self::Sodium => 2298977,
            Self::Acetyl => 4201056,
            Self::Xylose => 15005282,
            Self::Kdn => 25006897,
        }
    }

    /// The monoisotopic residue mass in Dalton.
    pub fn mass(self) -> f64 {
        self.integer_mass() as f64 / MASS_SCALE
    }

    /// Find the kind for a structure/composition symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.symbol() == symbol)
    }

    /// Find the kind for a Byonic name, ignoring casing.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl Display for MonoSaccharideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
