use std::{fmt::Display, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::fragment::IonKind;

/// The default range for the random mass shift of decoy glycan boxes, in 1e-5 Da (±30 Da).
pub const DEFAULT_DECOY_MASS_SHIFT: RangeInclusive<i64> = -3_000_000..=3_000_000;

/// The fragmentation method used to acquire a spectrum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Dissociation {
    /// Higher energy collisional dissociation
    #[default]
    HCD,
    /// Collision induced dissociation
    CID,
    /// Electron transfer dissociation
    ETD,
    /// Electron transfer and higher energy collisional dissociation
    EThcD,
    /// Any custom set of generated ions
    Custom(Vec<IonKind>),
}

impl Dissociation {
    /// Check if this method produces electron based c/z· fragments. Only these fragments retain
    /// the glycans on their sites, so only these spectra can localize glycans.
    pub fn contains_etd(&self) -> bool {
        match self {
            Self::HCD | Self::CID => false,
            Self::ETD | Self::EThcD => true,
            Self::Custom(ions) => ions.iter().any(|ion| ion.is_electron_based()),
        }
    }
}

impl Display for Dissociation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HCD => write!(f, "HCD"),
            Self::CID => write!(f, "CID"),
            Self::ETD => write!(f, "ETD"),
            Self::EThcD => write!(f, "EThcD"),
            Self::Custom(ions) => {
                write!(f, "Custom(")?;
                for ion in ions {
                    write!(f, "{ion}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// The parameters for building glycan boxes and localizing glycans.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LocalizationParameters {
    /// The resolution used to compare fragment masses, a neutral mass is turned into the integer
    /// bin `round(mass * fragment_bins_per_dalton)`.
    ///
    /// Default: 1000.
    pub fragment_bins_per_dalton: u32,
    /// The maximal number of glycans in a single glycan box, so on a single peptide.
    ///
    /// Default: 3.
    pub max_glycans_per_peptide: usize,
    /// Also build a mass shifted decoy box for every target glycan box.
    ///
    /// Default: false.
    pub build_decoys: bool,
    /// The range of the random mass shift of decoy glycan boxes, in 1e-5 Da.
    ///
    /// Default: [`DEFAULT_DECOY_MASS_SHIFT`].
    pub decoy_mass_shift: RangeInclusive<i64>,
    /// The dissociation method of the main spectrum.
    ///
    /// Default: [`Dissociation::HCD`].
    pub dissociation: Dissociation,
    /// The dissociation method of a child spectrum triggered from the main spectrum, if any.
    ///
    /// Default: None.
    pub child_dissociation: Option<Dissociation>,
    /// A single route is only reported as confidently localized if every site has at least
    /// this probability.
    ///
    /// Default: 0.75.
    pub site_probability_threshold: f64,
}

impl Default for LocalizationParameters {
    fn default() -> Self {
        Self {
            fragment_bins_per_dalton: 1000,
            max_glycans_per_peptide: 3,
            build_decoys: false,
            decoy_mass_shift: DEFAULT_DECOY_MASS_SHIFT,
            dissociation: Dissociation::HCD,
            child_dissociation: None,
            site_probability_threshold: 0.75,
        }
    }
}

impl LocalizationParameters {
    /// Set the dissociation method of the main spectrum
    #[must_use]
    pub fn dissociation(self, dissociation: Dissociation) -> Self {
        Self {
            dissociation,
            ..self
        }
    }

    /// Set the dissociation method of the child spectrum
    #[must_use]
    pub fn child_dissociation(self, dissociation: Option<Dissociation>) -> Self {
        Self {
            child_dissociation: dissociation,
            ..self
        }
    }

    /// Set the maximal number of glycans per peptide
    #[must_use]
    pub fn max_glycans_per_peptide(self, max: usize) -> Self {
        Self {
            max_glycans_per_peptide: max,
            ..self
        }
    }

    /// Turn on or off the building of decoy glycan boxes
    #[must_use]
    pub fn build_decoys(self, build_decoys: bool) -> Self {
        Self {
            build_decoys,
            ..self
        }
    }

    /// Check if either the main or the child spectrum was acquired with electron based fragmentation.
    pub fn contains_etd(&self) -> bool {
        self.dissociation.contains_etd()
            || self
                .child_dissociation
                .as_ref()
                .is_some_and(Dissociation::contains_etd)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn etd_detection() {
        assert!(!Dissociation::HCD.contains_etd());
        assert!(!Dissociation::CID.contains_etd());
        assert!(Dissociation::ETD.contains_etd());
        assert!(Dissociation::EThcD.contains_etd());
        assert!(Dissociation::Custom(vec![IonKind::b, IonKind::z]).contains_etd());
        assert!(!Dissociation::Custom(vec![IonKind::b, IonKind::y]).contains_etd());

        let parameters = LocalizationParameters::default();
        assert!(!parameters.contains_etd());
        let parameters = parameters.child_dissociation(Some(Dissociation::ETD));
        assert!(parameters.contains_etd());
    }

    #[test]
    fn serde_round_trip() {
        let parameters = LocalizationParameters::default()
            .dissociation(Dissociation::Custom(vec![IonKind::c, IonKind::z]))
            .build_decoys(true);
        let json = serde_json::to_string(&parameters).unwrap();
        let back: LocalizationParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parameters);
        assert_eq!(back.dissociation.to_string(), "Custom(cz)");
    }
}
