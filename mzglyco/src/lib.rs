#![doc = include_str!("../README.md")]

mod helper_functions;

pub mod fragment;
pub mod glycan;
mod glycan_box;
pub mod localization;
mod mod_box;
mod parameters;

pub use glycan_box::{GlycanBox, GlycanBoxes};
pub use localization::LocalizationGraph;
pub use mod_box::{ModBox, ModificationCatalog};
pub use parameters::{DEFAULT_DECOY_MASS_SHIFT, Dissociation, LocalizationParameters};

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::fragment::{Fragment, IonKind};
    pub use crate::glycan::{Composition, Glycan, GlycanCatalog, MonoSaccharideKind};
    pub use crate::localization::{
        GlycoSite, Localization, LocalizationCandidate, LocalizationGraph, LocalizationLevel,
        Route, ScanStatistics, SiteProbabilities, localize, localize_candidate, localize_spectra,
    };
    pub use crate::{Dissociation, GlycanBox, GlycanBoxes, LocalizationParameters, ModBox};
}

#[cfg(test)]
use tracing_subscriber as _;
