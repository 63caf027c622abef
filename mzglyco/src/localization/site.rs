use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::localization::{LocalizationGraph, Route, SiteProbabilities};

/// The margin allowed below the site probability threshold. Probabilities are sums of ratios of
/// route weights, so an exact threshold like 3/4 can land one rounding step below it.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// How well the glycans of a glycopeptide could be placed
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub enum LocalizationLevel {
    /// A single route explains the spectrum and every placement is supported
    Level1,
    /// A single route explains the spectrum but not every placement is supported
    Level1b,
    /// Multiple routes, but at least one placement occurs in all of them
    Level2,
    /// Multiple routes without any common placement, or no localization was possible
    #[default]
    Level3,
}

impl Display for LocalizationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Level1 => "Level1",
                Self::Level1b => "Level1b",
                Self::Level2 => "Level2",
                Self::Level3 => "Level3",
            }
        )
    }
}

/// A glycan on a site as seen over all routes
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GlycoSite {
    /// The site position
    pub site: usize,
    /// The glycan id
    pub mod_id: usize,
    /// If this placement occurs in every route
    pub is_localized: bool,
}

impl GlycoSite {
    /// Collect all distinct placements over the routes, sorted on site and glycan, and classify
    /// the localization: a single route is [`LocalizationLevel::Level1`], multiple routes sharing at
    /// least one placement are [`LocalizationLevel::Level2`], anything else is [`LocalizationLevel::Level3`].
    pub fn from_routes(routes: &[Route]) -> (Vec<Self>, LocalizationLevel) {
        let mut seen: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for route in routes {
            for pair in route.pairs() {
                *seen.entry((pair.site, pair.mod_id)).or_default() += 1;
            }
        }
        let sites: Vec<Self> = seen
            .into_iter()
            .map(|((site, mod_id), count)| Self {
                site,
                mod_id,
                is_localized: count == routes.len(),
            })
            .collect();
        let level = match routes.len() {
            1 => LocalizationLevel::Level1,
            0 => LocalizationLevel::Level3,
            _ if sites.iter().any(|s| s.is_localized) => LocalizationLevel::Level2,
            _ => LocalizationLevel::Level3,
        };
        (sites, level)
    }
}

impl LocalizationLevel {
    /// A level 1 localization is only kept if every placement of the route has a probability of
    /// at least `threshold` (within [`PROBABILITY_TOLERANCE`]) and is confirmed by fragments. A single site without any matched
    /// fragments is never level 1. All other levels, or missing probabilities, are returned unchanged.
    #[must_use]
    pub fn downgrade(
        self,
        probabilities: Option<&SiteProbabilities>,
        graph: &LocalizationGraph,
        route: &Route,
        sites: &[GlycoSite],
        threshold: f64,
    ) -> Self {
        let Some(probabilities) = probabilities else {
            return self;
        };
        if self != Self::Level1 {
            return self;
        }
        if graph.sites().len() == 1 && graph.total_score().unwrap_or_default() == 0 {
            return Self::Level1b;
        }
        for site in sites {
            if probabilities
                .get(site.site, site.mod_id)
                .is_none_or(|p| !meets_threshold(p, threshold))
            {
                return Self::Level1b;
            }
            if !route
                .pair(site.site, site.mod_id)
                .is_some_and(|p| p.confirmed)
            {
                return Self::Level1b;
            }
        }
        self
    }
}

fn meets_threshold(probability: f64, threshold: f64) -> bool {
    probability >= threshold - PROBABILITY_TOLERANCE
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        GlycanBox,
        fragment::{Fragment, IonKind, observed_bins},
        glycan::{Composition, GlycanCatalog},
        localization::ScanStatistics,
    };

    fn catalog() -> GlycanCatalog {
        GlycanCatalog::from_compositions(
            ["N1", "H1N1"].map(|c| c.parse::<Composition>().unwrap()),
        )
    }

    #[test]
    fn levels() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![0, 1], &catalog);
        let graph =
            LocalizationGraph::build(vec![2, 5, 9], 0, &glycan_box, &HashSet::new(), &[], 1000);
        let routes = graph.best_routes();
        let (sites, level) = GlycoSite::from_routes(&routes);
        assert_eq!(level, LocalizationLevel::Level3);
        assert_eq!(sites.len(), 6);
        assert!(sites.iter().all(|s| !s.is_localized));

        let (sites, level) = GlycoSite::from_routes(&routes[..1]);
        assert_eq!(level, LocalizationLevel::Level1);
        assert!(sites.iter().all(|s| s.is_localized));

        let (sites, level) = GlycoSite::from_routes(&[]);
        assert_eq!(level, LocalizationLevel::Level3);
        assert!(sites.is_empty());
    }

    #[test]
    fn shared_placement() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![0, 1], &catalog);
        let n = catalog[0].mass();
        // Only the HexNAc on site 2 is supported, the other glycan can be on 5 or 9
        let fragments = [Fragment::new(IonKind::c, 3, 300.0)];
        let observed = observed_bins([300.0 + n], 1000);
        let graph =
            LocalizationGraph::build(vec![2, 5, 9], 0, &glycan_box, &observed, &fragments, 1000);
        let routes = graph.best_routes();
        assert_eq!(routes.len(), 2);
        let (sites, level) = GlycoSite::from_routes(&routes);
        assert_eq!(level, LocalizationLevel::Level2);
        assert_eq!(
            sites,
            vec![
                GlycoSite { site: 2, mod_id: 0, is_localized: true },
                GlycoSite { site: 5, mod_id: 1, is_localized: false },
                GlycoSite { site: 9, mod_id: 1, is_localized: false },
            ]
        );
    }

    #[test]
    fn downgrade() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![0, 1], &catalog);
        let n = catalog[0].mass();
        let fragments = [
            Fragment::new(IonKind::c, 3, 300.0),
            Fragment::new(IonKind::c, 7, 700.0),
        ];
        let observed = observed_bins([300.0 + n, 700.0 + n], 1000);
        let graph =
            LocalizationGraph::build(vec![2, 5, 9], 0, &glycan_box, &observed, &fragments, 1000);
        let routes = graph.best_routes();
        let (sites, level) = GlycoSite::from_routes(&routes);
        assert_eq!(level, LocalizationLevel::Level1);

        let statistics = ScanStatistics::new(0.01, 30);
        let probabilities = SiteProbabilities::from_routes(&graph.weighted_routes(&statistics));
        assert_eq!(
            level.downgrade(Some(&probabilities), &graph, &routes[0], &sites, 0.75),
            LocalizationLevel::Level1
        );
        assert_eq!(
            level.downgrade(Some(&probabilities), &graph, &routes[0], &sites, 1.01),
            LocalizationLevel::Level1b
        );
        assert_eq!(
            level.downgrade(None, &graph, &routes[0], &sites, 1.01),
            LocalizationLevel::Level1
        );
        assert_eq!(
            LocalizationLevel::Level2.downgrade(Some(&probabilities), &graph, &routes[0], &sites, 1.01),
            LocalizationLevel::Level2
        );
    }

    #[test]
    fn threshold_tolerance() {
        let three_quarters = (0.1 + 0.2 + 0.45) / (0.1 + 0.2 + 0.45 + 0.25);
        assert!(meets_threshold(0.749_999_999_999_999_9, 0.75));
        assert!(meets_threshold(three_quarters, 0.75));
        assert!(meets_threshold(0.75, 0.75));
        assert!(!meets_threshold(0.7499, 0.75));
        assert!(!meets_threshold(0.5, 0.75));
    }

    #[test]
    fn single_site_without_evidence() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![1], &catalog);
        let graph = LocalizationGraph::build(vec![4], 0, &glycan_box, &HashSet::new(), &[], 1000);
        let routes = graph.best_routes();
        let (sites, level) = GlycoSite::from_routes(&routes);
        assert_eq!(level, LocalizationLevel::Level1);
        let probabilities =
            SiteProbabilities::from_routes(&graph.weighted_routes(&ScanStatistics::new(0.01, 10)));
        assert!((probabilities.get(4, 1).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(
            level.downgrade(Some(&probabilities), &graph, &routes[0], &sites, 0.75),
            LocalizationLevel::Level1b
        );
    }
}
