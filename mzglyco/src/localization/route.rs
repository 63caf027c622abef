use std::{collections::HashSet, fmt::Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::localization::{LocalizationGraph, ScanStatistics};

/// One glycan placed on one site
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ModSitePair {
    /// The site position
    pub site: usize,
    /// The glycan id
    pub mod_id: usize,
    /// If there are matched fragments that directly support this placement
    pub confirmed: bool,
}

/// One full placement of all glycans of a box on the sites of a glycopeptide
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Route {
    box_id: usize,
    pairs: Vec<ModSitePair>,
    score: usize,
    weight: f64,
}

impl Route {
    /// The id of the glycan box that is placed
    pub const fn box_id(&self) -> usize {
        self.box_id
    }

    /// The placed glycans, in site order
    pub fn pairs(&self) -> &[ModSitePair] {
        &self.pairs
    }

    /// The summed local score along the path of this route
    pub const fn score(&self) -> usize {
        self.score
    }

    /// The reverse p-score weight, 1.0 for routes that were not weighted
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// The placement as (site, glycan id) pairs, two routes with the same signature place the same glycans on the same sites
    pub fn signature(&self) -> Vec<(usize, usize)> {
        self.pairs.iter().map(|p| (p.site, p.mod_id)).collect()
    }

    /// Find the pair for a site and glycan
    pub fn pair(&self, site: usize, mod_id: usize) -> Option<&ModSitePair> {
        self.pairs
            .iter()
            .find(|p| p.site == site && p.mod_id == mod_id)
    }
}

impl Display for Route {
    /// Written as `{@box[site-glycan,site-glycan]}`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{@{}[{}]}}",
            self.box_id,
            self.pairs
                .iter()
                .map(|p| format!("{}-{}", p.site, p.mod_id))
                .join(",")
        )
    }
}

/// Extracting the routes from a filled graph. Paths are given as the column for every layer.
///
/// The number of tied or feasible paths grows combinatorially with the number of sites and the
/// box size, the enumerating functions return all of them.
impl LocalizationGraph {
    /// Follow the first best predecessor from the terminal node back to the first layer.
    pub fn first_path(&self) -> Option<Vec<usize>> {
        let mut column = self.terminal()?.column;
        let mut path = vec![column];
        for layer in (1..self.sites().len()).rev() {
            column = *self.node(layer, column)?.best_sources.first()?;
            path.push(column);
        }
        path.reverse();
        Some(path)
    }

    /// All paths from the terminal node that reach the highest score.
    pub fn best_paths(&self) -> Vec<Vec<usize>> {
        self.paths(true)
    }

    /// All feasible paths from the terminal node, regardless of score.
    pub fn all_paths(&self) -> Vec<Vec<usize>> {
        self.paths(false)
    }

    fn paths(&self, best: bool) -> Vec<Vec<usize>> {
        let mut output = Vec::new();
        if let Some(terminal) = self.terminal() {
            let mut path = Vec::with_capacity(self.sites().len());
            self.trace(terminal.layer, terminal.column, best, &mut path, &mut output);
        }
        output
    }

    fn trace(
        &self,
        layer: usize,
        column: usize,
        best: bool,
        path: &mut Vec<usize>,
        output: &mut Vec<Vec<usize>>,
    ) {
        path.push(column);
        if layer == 0 {
            output.push(path.iter().rev().copied().collect());
        } else if let Some(node) = self.node(layer, column) {
            let sources = if best {
                &node.best_sources
            } else {
                &node.all_sources
            };
            for source in sources {
                self.trace(layer - 1, *source, best, path, output);
            }
        }
        path.pop();
    }

    /// Turn a path into a route. At every layer where the box grows the added glycan is placed on
    /// that site. A placement is confirmed if the evidence right before and right after the site
    /// supports it: for the first site only the evidence after it is needed, for the last site only the
    /// evidence before it. With a single site any matched fragment confirms it.
    /// # Panics
    /// If the path does not follow the transitions of this graph.
    pub fn route(&self, path: &[usize]) -> Route {
        let local = |layer: usize| self.node(layer, path[layer]).map_or(0, |n| n.local_score);
        let mut pairs = Vec::new();
        if let [column] = path {
            if let Some(id) = self.boxes()[*column].ids().first() {
                pairs.push(ModSitePair {
                    site: self.sites()[0],
                    mod_id: *id,
                    confirmed: self.total_score().unwrap_or_default() > 0,
                });
            }
        } else if let Some(first) = path.first() {
            if let Some(id) = self.boxes()[*first].ids().first() {
                pairs.push(ModSitePair {
                    site: self.sites()[0],
                    mod_id: *id,
                    confirmed: local(0) > 0,
                });
            }
            for layer in 1..path.len() {
                if path[layer] == path[layer - 1] {
                    continue;
                }
                let id = self.boxes()[path[layer]]
                    .difference(&self.boxes()[path[layer - 1]])
                    .and_then(|d| d.first().copied())
                    .unwrap_or_else(|| {
                        panic!(
                            "Column {} at layer {layer} does not grow column {} of the previous layer",
                            path[layer],
                            path[layer - 1]
                        )
                    });
                pairs.push(ModSitePair {
                    site: self.sites()[layer],
                    mod_id: id,
                    confirmed: local(layer - 1) > 0 && (local(layer) > 0 || layer + 1 == path.len()),
                });
            }
        }
        Route {
            box_id: self.box_id(),
            pairs,
            score: (0..path.len()).map(local).sum(),
            weight: 1.0,
        }
    }

    /// The route along the first best path, the fast path when only one placement is needed.
    pub fn first_route(&self) -> Option<Route> {
        self.first_path().map(|path| self.route(&path))
    }

    /// All distinct routes that reach the highest score.
    pub fn best_routes(&self) -> Vec<Route> {
        let mut seen = HashSet::new();
        self.best_paths()
            .iter()
            .map(|path| self.route(path))
            .filter(|route| seen.insert(route.signature()))
            .collect()
    }

    /// All distinct feasible routes, weighted with the reverse p-score of their number of matched
    /// fragments, including the unlocalized fragments.
    pub fn weighted_routes(&self, statistics: &ScanStatistics) -> Vec<Route> {
        let mut seen = HashSet::new();
        self.all_paths()
            .iter()
            .map(|path| {
                let mut route = self.route(path);
                route.weight =
                    statistics.reverse_p_score(route.score + self.unlocalized_score());
                route
            })
            .filter(|route| seen.insert(route.signature()))
            .collect()
    }
}
