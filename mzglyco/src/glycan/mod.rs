//! Handle glycan compositions and the catalogs of glycans that can be localized

mod catalog;
mod composition;
mod monosaccharide;

pub use catalog::*;
pub use composition::*;
pub use monosaccharide::*;
