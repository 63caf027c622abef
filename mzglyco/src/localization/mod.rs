//! Localize glycans on the sites of a glycopeptide.
//!
//! For every glycan box a [`LocalizationGraph`] is filled with the fragment evidence, the best
//! routes through the graphs are the most likely placements. The routes of all kept graphs are
//! combined by [`localize`] into a [`Localization`] with a [`LocalizationLevel`] and, for electron
//! based fragmentation, [`SiteProbabilities`].

mod graph;
mod localize;
mod node;
mod probability;
mod route;
mod site;

pub use graph::*;
pub use localize::*;
pub use node::*;
pub use probability::*;
pub use route::*;
pub use site::*;
