use std::{collections::BTreeMap, fmt::Display};

use probability::distribution::{Binomial, Discrete};
use serde::{Deserialize, Serialize};

use crate::{fragment::Fragment, localization::Route};

/// The statistics of a spectrum used to weigh routes, modelled as the chance `p` that a random
/// theoretical fragment matches a peak out of `n` tried fragments.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ScanStatistics {
    /// The chance that a random fragment mass matches any peak
    pub p: f64,
    /// The number of theoretical fragments
    pub n: usize,
}

impl ScanStatistics {
    /// Create new statistics, `p` is clamped to `0.0..=1.0`
    pub fn new(p: f64, n: usize) -> Self {
        Self {
            p: p.clamp(0.0, 1.0),
            n,
        }
    }

    /// Estimate the match chance from the peak density: the number of peaks times the width of the
    /// tolerance window (at 1000 m/z) divided by the width of the m/z range of the spectrum. Only the
    /// electron based (c/z·) fragments are counted for `n`.
    pub fn from_peak_density(
        peak_count: usize,
        tolerance_window: f64,
        mz_range_width: f64,
        fragments: &[Fragment],
    ) -> Self {
        let p = if mz_range_width > 0.0 {
            peak_count as f64 * tolerance_window / mz_range_width
        } else {
            1.0
        };
        Self::new(
            p,
            fragments
                .iter()
                .filter(|f| f.ion.is_electron_based())
                .count(),
        )
    }

    /// The reverse of the binomial p-value of matching at least `k` fragments: `1 / P(X >= k)`.
    /// Higher is more surprising, so better supported. A zero tail probability is treated as the
    /// smallest positive number to keep the weight finite.
    pub fn reverse_p_score(&self, k: usize) -> f64 {
        let k = k.min(self.n);
        let tail = if k == 0 || self.p >= 1.0 {
            1.0
        } else if self.p <= 0.0 {
            0.0
        } else {
            let binomial = Binomial::new(self.n, self.p);
            (k..=self.n).map(|t| binomial.mass(t)).sum::<f64>().min(1.0)
        };
        1.0 / tail.max(f64::MIN_POSITIVE)
    }
}

/// The chance for each glycan on each site, based on the weights of all routes.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SiteProbabilities {
    sites: BTreeMap<usize, Vec<(usize, f64)>>,
}

impl SiteProbabilities {
    /// Sum the weights of all routes that place a glycan on a site and divide by the summed
    /// weight of all routes. Sites that no route uses are not present. If all weights are
    /// zero no probabilities can be given. The weights are scaled to the largest weight first,
    /// so routes with a vanishing tail probability do not overflow the sum.
    pub fn from_routes(routes: &[Route]) -> Self {
        let largest = routes.iter().map(Route::weight).fold(0.0, f64::max);
        if largest <= 0.0 || !largest.is_finite() {
            return Self::default();
        }
        let total: f64 = routes.iter().map(|r| r.weight() / largest).sum();
        let mut summed: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for route in routes {
            for pair in route.pairs() {
                *summed.entry((pair.site, pair.mod_id)).or_default() += route.weight() / largest;
            }
        }
        let mut sites: BTreeMap<usize, Vec<(usize, f64)>> = BTreeMap::new();
        for ((site, id), weight) in summed {
            sites.entry(site).or_default().push((id, weight / total));
        }
        Self { sites }
    }

    /// The probability of this glycan on this site
    pub fn get(&self, site: usize, mod_id: usize) -> Option<f64> {
        self.sites
            .get(&site)?
            .iter()
            .find(|(id, _)| *id == mod_id)
            .map(|(_, p)| *p)
    }

    /// All glycans with their probability on this site, sorted on glycan id
    pub fn site(&self, site: usize) -> &[(usize, f64)] {
        self.sites
            .get(&site)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over all sites in order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[(usize, f64)])> + '_ {
        self.sites.iter().map(|(site, p)| (*site, p.as_slice()))
    }

    /// Check if there are no probabilities
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Display for SiteProbabilities {
    /// Written as `{@site[glycan,probability][glycan,probability]}` for every site
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (site, probabilities) in self.iter() {
            write!(f, "{{@{site}")?;
            for (id, p) in probabilities {
                write!(f, "[{id},{p:.3}]")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        GlycanBox, LocalizationGraph,
        fragment::IonKind,
        glycan::{Composition, GlycanCatalog},
    };

    #[test]
    fn reverse_p_score() {
        let statistics = ScanStatistics::new(0.1, 10);
        assert!((statistics.reverse_p_score(0) - 1.0).abs() < 1e-12);
        let one = statistics.reverse_p_score(1);
        assert!((one - 1.0 / (1.0 - 0.9_f64.powi(10))).abs() < 1e-9);
        assert!(statistics.reverse_p_score(2) > one);
        assert_eq!(statistics.reverse_p_score(20), statistics.reverse_p_score(10));
        assert!(ScanStatistics::new(0.0, 10).reverse_p_score(3).is_finite());
        assert!((ScanStatistics::new(1.0, 10).reverse_p_score(3) - 1.0).abs() < 1e-12);
        assert!((ScanStatistics::new(0.5, 0).reverse_p_score(3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn peak_density() {
        let fragments = [
            Fragment::new(IonKind::c, 1, 100.0),
            Fragment::new(IonKind::b, 1, 90.0),
            Fragment::new(IonKind::z, 3, 300.0),
        ];
        let statistics = ScanStatistics::from_peak_density(100, 0.02, 2000.0, &fragments);
        assert!((statistics.p - 0.001).abs() < 1e-12);
        assert_eq!(statistics.n, 2);
        assert!((ScanStatistics::from_peak_density(100, 1.0, 0.0, &fragments).p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn interchangeable_sites() {
        let catalog = GlycanCatalog::from_compositions(["N1".parse::<Composition>().unwrap()]);
        let glycan_box = GlycanBox::target(vec![0], &catalog);
        let graph =
            LocalizationGraph::build(vec![3, 6], 0, &glycan_box, &HashSet::new(), &[], 1000);
        let routes = graph.weighted_routes(&ScanStatistics::new(0.01, 20));
        let probabilities = SiteProbabilities::from_routes(&routes);
        assert!((probabilities.get(3, 0).unwrap() - 0.5).abs() < 1e-12);
        assert!((probabilities.get(6, 0).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(probabilities.get(4, 0), None);
        assert_eq!(probabilities.to_string(), "{@3[0,0.500]}{@6[0,0.500]}");
    }

    #[test]
    fn probabilities_sum_per_route() {
        let catalog = GlycanCatalog::from_compositions(
            ["N1", "H1N1"].map(|c| c.parse::<Composition>().unwrap()),
        );
        let glycan_box = GlycanBox::target(vec![0, 1], &catalog);
        let n = catalog[0].mass();
        let fragments = [Fragment::new(IonKind::c, 3, 300.0)];
        let observed = crate::fragment::observed_bins([300.0 + n], 1000);
        let graph =
            LocalizationGraph::build(vec![2, 5, 9], 0, &glycan_box, &observed, &fragments, 1000);
        let probabilities =
            SiteProbabilities::from_routes(&graph.weighted_routes(&ScanStatistics::new(0.05, 12)));
        // Every route places both glycans, so the probabilities over all sites add up to 2
        let sum: f64 = probabilities
            .iter()
            .flat_map(|(_, p)| p.iter().map(|(_, p)| *p))
            .sum();
        assert!((sum - 2.0).abs() < 1e-9);
        assert!(probabilities.get(2, 0).unwrap() > probabilities.get(2, 1).unwrap());
        for (_, site) in probabilities.iter() {
            assert!(site.iter().all(|(_, p)| (0.0..=1.0).contains(p)));
        }
        assert!(SiteProbabilities::from_routes(&[]).is_empty());
    }

    #[test]
    fn vanishing_tails() {
        let catalog = GlycanCatalog::from_compositions(["N1".parse::<Composition>().unwrap()]);
        let glycan_box = GlycanBox::target(vec![0], &catalog);
        let n = catalog[0].mass();
        let sites = vec![3, 6, 9, 12, 15];
        // Every gap has a c ion observed both with and without the glycan, so every route matches 4
        let fragments = [5, 8, 11, 14]
            .map(|cleavage| Fragment::new(IonKind::c, cleavage, 100.0 * cleavage as f64));
        let observed = crate::fragment::observed_bins(
            fragments
                .iter()
                .flat_map(|f| [f.neutral_mass, f.neutral_mass + n]),
            1000,
        );
        let graph = LocalizationGraph::build(sites.clone(), 0, &glycan_box, &observed, &fragments, 1000);
        let statistics = ScanStatistics::new(1e-300, 10);
        let routes = graph.weighted_routes(&statistics);
        assert_eq!(routes.len(), 5);
        assert!(routes.iter().all(|r| r.score() == 4));
        assert!(routes.iter().map(Route::weight).sum::<f64>().is_infinite());
        let probabilities = SiteProbabilities::from_routes(&routes);
        for site in sites {
            assert!((probabilities.get(site, 0).unwrap() - 0.2).abs() < 1e-12);
        }
    }
}
