use std::{
    ops::RangeInclusive,
    sync::atomic::{AtomicBool, Ordering},
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    GlycanBoxes, LocalizationParameters,
    fragment::{Fragment, observed_bins},
    glycan::GlycanCatalog,
    localization::{
        GlycoSite, LocalizationGraph, LocalizationLevel, Route, ScanStatistics, SiteProbabilities,
    },
};

/// The number of routes written out in [`Localization::routes_string`].
pub const MAX_REPORTED_ROUTES: usize = 10;

/// The placement of the glycans on one glycopeptide spectrum match
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Localization {
    level: LocalizationLevel,
    routes: Vec<Route>,
    sites: Vec<GlycoSite>,
    probabilities: Option<SiteProbabilities>,
}

impl Localization {
    /// The localization level
    pub const fn level(&self) -> LocalizationLevel {
        self.level
    }

    /// All best routes over all graphs
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All distinct placements over the routes
    pub fn sites(&self) -> &[GlycoSite] {
        &self.sites
    }

    /// The site specific probabilities, only available for electron based fragmentation
    pub const fn probabilities(&self) -> Option<&SiteProbabilities> {
        self.probabilities.as_ref()
    }

    /// The routes as `{@box[site-glycan,...]}`, if there are too many routes only the first are
    /// written followed by `... In Total:N Paths`.
    pub fn routes_string(&self) -> String {
        let mut output: String = self
            .routes
            .iter()
            .take(MAX_REPORTED_ROUTES)
            .map(ToString::to_string)
            .collect();
        if self.routes.len() > MAX_REPORTED_ROUTES {
            output += &format!("... In Total:{} Paths", self.routes.len());
        }
        output
    }

    /// The probabilities as `{@site[glycan,probability]...}`, empty if there are no probabilities
    pub fn probabilities_string(&self) -> String {
        self.probabilities
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// All placements that occur in every route as `[site,composition,probability]`, empty if there
    /// are no probabilities. The offset is added to every site, use it to get protein positions.
    /// # Panics
    /// If a placed glycan is not in the catalog.
    pub fn localized_glycans_string(&self, catalog: &GlycanCatalog, offset: usize) -> String {
        let Some(probabilities) = &self.probabilities else {
            return String::new();
        };
        self.sites
            .iter()
            .filter(|s| s.is_localized)
            .map(|s| {
                format!(
                    "[{},{},{:.3}]",
                    s.site + offset,
                    catalog
                        .get(s.mod_id)
                        .unwrap_or_else(|| {
                            panic!(
                                "Glycan {} is not in the glycan catalog of {} glycans",
                                s.mod_id,
                                catalog.len()
                            )
                        })
                        .composition(),
                    probabilities.get(s.site, s.mod_id).unwrap_or_default()
                )
            })
            .collect()
    }
}

/// Combine the filled graphs of all glycan boxes that were kept for one spectrum into a
/// localization. Graphs that cannot be placed are ignored, if no graph is left there is no localization.
///
/// Without electron based fragmentation the glycans cannot be localized, only the first route of
/// the first graph is given and the level is [`LocalizationLevel::Level3`] (or
/// [`LocalizationLevel::Level1b`] when a single graph has a single site). Otherwise all tied best
/// routes of all graphs are classified, the site probabilities are calculated from the weighted
/// routes of all graphs, and a level 1 localization is checked with [`LocalizationLevel::downgrade`].
#[tracing::instrument(level = "debug", skip_all, fields(graphs = graphs.len()))]
pub fn localize(
    graphs: &[LocalizationGraph],
    statistics: &ScanStatistics,
    parameters: &LocalizationParameters,
) -> Option<Localization> {
    let scorable: Vec<&LocalizationGraph> = graphs.iter().filter(|g| g.is_scorable()).collect();
    let first = *scorable.first()?;

    if !parameters.contains_etd() {
        let level = if scorable.len() == 1 && first.sites().len() == 1 {
            LocalizationLevel::Level1b
        } else {
            LocalizationLevel::Level3
        };
        let routes: Vec<Route> = first.first_route().into_iter().collect();
        let sites = routes
            .iter()
            .flat_map(Route::pairs)
            .map(|p| GlycoSite {
                site: p.site,
                mod_id: p.mod_id,
                is_localized: false,
            })
            .collect();
        tracing::debug!(%level, "No electron based fragmentation, glycans are not localized");
        return Some(Localization {
            level,
            routes,
            sites,
            probabilities: None,
        });
    }

    let routes: Vec<Route> = scorable.iter().flat_map(|g| g.best_routes()).collect();
    let (sites, level) = GlycoSite::from_routes(&routes);
    let weighted: Vec<Route> = scorable
        .iter()
        .flat_map(|g| g.weighted_routes(statistics))
        .collect();
    let probabilities = SiteProbabilities::from_routes(&weighted);
    let level = routes.first().map_or(level, |route| {
        level.downgrade(
            Some(&probabilities),
            first,
            route,
            &sites,
            parameters.site_probability_threshold,
        )
    });
    tracing::debug!(
        %level,
        routes = routes.len(),
        weighted = weighted.len(),
        "Localized glycans"
    );
    Some(Localization {
        level,
        routes,
        sites,
        probabilities: Some(probabilities),
    })
}

/// Everything needed to localize the glycans of one peptide in one spectrum
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LocalizationCandidate {
    /// The residue indices of the sites that can carry a glycan
    pub sites: Vec<usize>,
    /// The theoretical fragments of the peptide without glycans
    pub fragments: Vec<Fragment>,
    /// The observed neutral masses of the spectrum
    pub observed: Vec<f64>,
    /// The range of the total glycan mass that is allowed by the precursor, in Dalton
    pub glycan_mass: RangeInclusive<f64>,
    /// The statistics of the spectrum
    pub statistics: ScanStatistics,
}

/// Build the graphs for all glycan boxes in the mass range of the candidate and keep only the
/// best scoring graphs. Ties are kept if the best score is not zero, or if there is no electron
/// based fragmentation. Then localize the kept graphs.
#[tracing::instrument(level = "debug", skip_all, fields(sites = candidate.sites.len()))]
pub fn localize_candidate(
    candidate: &LocalizationCandidate,
    boxes: &GlycanBoxes,
    parameters: &LocalizationParameters,
) -> Option<Localization> {
    let observed = observed_bins(
        candidate.observed.iter().copied(),
        parameters.fragment_bins_per_dalton,
    );
    let keep_ties_without_score = !parameters.contains_etd();
    let mut best: Vec<LocalizationGraph> = Vec::new();
    let mut best_score = 0;
    for (id, glycan_box) in boxes.in_mass_range(
        *candidate.glycan_mass.start(),
        *candidate.glycan_mass.end(),
    ) {
        if glycan_box.number_of_mods() > candidate.sites.len() {
            tracing::debug!(
                box_id = id,
                glycans = glycan_box.number_of_mods(),
                "Skipped glycan box with more glycans than sites"
            );
            continue;
        }
        let graph = LocalizationGraph::build(
            candidate.sites.clone(),
            id,
            glycan_box,
            &observed,
            &candidate.fragments,
            parameters.fragment_bins_per_dalton,
        );
        let Some(score) = graph.total_score() else {
            tracing::debug!(box_id = id, "Skipped glycan box that cannot be placed on the sites");
            continue;
        };
        if best.is_empty() || score > best_score {
            best_score = score;
            best.clear();
            best.push(graph);
        } else if score == best_score && (keep_ties_without_score || best_score > 0) {
            best.push(graph);
        }
    }
    tracing::trace!(graphs = best.len(), best_score, "Selected glycan boxes");
    localize(&best, &candidate.statistics, parameters)
}

/// Localize all candidates in order. Once `stop` is set all remaining candidates give None.
pub fn localize_spectra(
    candidates: &[LocalizationCandidate],
    boxes: &GlycanBoxes,
    parameters: &LocalizationParameters,
    stop: &AtomicBool,
) -> Vec<Option<Localization>> {
    candidates
        .iter()
        .map(|candidate| {
            if stop.load(Ordering::Relaxed) {
                None
            } else {
                localize_candidate(candidate, boxes, parameters)
            }
        })
        .collect()
}

/// Localize all candidates in parallel, the output is in the same order as the candidates.
/// Once `stop` is set all candidates that did not start yet give None.
#[cfg(feature = "rayon")]
pub fn par_localize_spectra(
    candidates: &[LocalizationCandidate],
    boxes: &GlycanBoxes,
    parameters: &LocalizationParameters,
    stop: &AtomicBool,
) -> Vec<Option<Localization>> {
    candidates
        .par_iter()
        .map(|candidate| {
            if stop.load(Ordering::Relaxed) {
                None
            } else {
                localize_candidate(candidate, boxes, parameters)
            }
        })
        .collect()
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{Dissociation, GlycanBox, fragment::IonKind, glycan::Composition};

    fn catalog() -> GlycanCatalog {
        GlycanCatalog::from_compositions(
            ["N1", "H1N1"].map(|c| c.parse::<Composition>().unwrap()),
        )
    }

    fn etd() -> LocalizationParameters {
        LocalizationParameters::default().dissociation(Dissociation::ETD)
    }

    #[test]
    fn no_scorable_graphs() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![0, 1], &catalog);
        let graph =
            LocalizationGraph::build(vec![2], 0, &glycan_box, &HashSet::new(), &[], 1000);
        assert!(localize(&[graph], &ScanStatistics::new(0.01, 10), &etd()).is_none());
        assert!(localize(&[], &ScanStatistics::new(0.01, 10), &etd()).is_none());
    }

    #[test]
    fn hcd_only() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![0], &catalog);
        let graph =
            LocalizationGraph::build(vec![2], 0, &glycan_box, &HashSet::new(), &[], 1000);
        let statistics = ScanStatistics::new(0.01, 10);
        let parameters = LocalizationParameters::default();
        let localization = localize(&[graph.clone()], &statistics, &parameters).unwrap();
        assert_eq!(localization.level(), LocalizationLevel::Level1b);
        assert_eq!(localization.routes().len(), 1);
        assert!(localization.probabilities().is_none());
        assert_eq!(localization.probabilities_string(), "");

        let two_sites =
            LocalizationGraph::build(vec![2, 7], 0, &glycan_box, &HashSet::new(), &[], 1000);
        let localization = localize(&[two_sites], &statistics, &parameters).unwrap();
        assert_eq!(localization.level(), LocalizationLevel::Level3);
        assert_eq!(localization.routes().len(), 1);
        assert!(localization.sites().iter().all(|s| !s.is_localized));
    }

    #[test]
    fn routes_over_multiple_graphs() {
        let catalog = catalog();
        let a = GlycanBox::target(vec![0], &catalog);
        let b = GlycanBox::target(vec![1], &catalog);
        let graphs = [
            LocalizationGraph::build(vec![2], 0, &a, &HashSet::new(), &[], 1000),
            LocalizationGraph::build(vec![2], 1, &b, &HashSet::new(), &[], 1000),
        ];
        let localization = localize(&graphs, &ScanStatistics::new(0.01, 10), &etd()).unwrap();
        assert_eq!(localization.routes().len(), 2);
        assert_eq!(localization.level(), LocalizationLevel::Level3);
        assert_eq!(localization.routes_string(), "{@0[2-0]}{@1[2-1]}");
        let probabilities = localization.probabilities().unwrap();
        assert!((probabilities.get(2, 0).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(localization.probabilities_string(), "{@2[0,0.500][1,0.500]}");
    }

    #[test]
    fn many_routes_are_truncated() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![0], &catalog);
        let graph = LocalizationGraph::build(
            (0..12).collect(),
            4,
            &glycan_box,
            &HashSet::new(),
            &[],
            1000,
        );
        let localization = localize(&[graph], &ScanStatistics::new(0.01, 10), &etd()).unwrap();
        assert_eq!(localization.routes().len(), 12);
        let text = localization.routes_string();
        assert!(text.ends_with("... In Total:12 Paths"));
        assert_eq!(text.matches("{@4[").count(), MAX_REPORTED_ROUTES);
    }

    #[test_log::test]
    fn candidate_selects_the_best_box() {
        let catalog = catalog();
        let boxes = GlycanBoxes::targets(&catalog, 2);
        let n = catalog[0].mass();
        let hn = catalog[1].mass();
        let parameters = etd();
        // Supported placement: HexNAc on site 2 and HexHexNAc on site 9
        let candidate = LocalizationCandidate {
            sites: vec![2, 5, 9],
            fragments: vec![
                Fragment::new(IonKind::c, 3, 300.0),
                Fragment::new(IonKind::c, 7, 700.0),
                Fragment::new(IonKind::z, 9, 800.0),
            ],
            observed: vec![300.0 + n, 700.0 + n, 800.0 + hn],
            glycan_mass: (n + hn - 0.5)..=(n + hn + 0.5),
            statistics: ScanStatistics::new(0.01, 30),
        };
        let localization = localize_candidate(&candidate, &boxes, &parameters).unwrap();
        assert_eq!(localization.level(), LocalizationLevel::Level1);
        assert_eq!(localization.routes().len(), 1);
        assert_eq!(
            localization.routes()[0].signature(),
            vec![(2, 0), (9, 1)]
        );
        assert_eq!(
            localization.localized_glycans_string(&catalog, 0),
            format!(
                "[2,N1,{:.3}][9,H1N1,{:.3}]",
                localization.probabilities().unwrap().get(2, 0).unwrap(),
                localization.probabilities().unwrap().get(9, 1).unwrap()
            )
        );

        let stop = AtomicBool::new(false);
        let output = localize_spectra(
            &[candidate.clone(), candidate.clone()],
            &boxes,
            &parameters,
            &stop,
        );
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(Option::is_some));
        stop.store(true, Ordering::Relaxed);
        let output = localize_spectra(&[candidate], &boxes, &parameters, &stop);
        assert_eq!(output, vec![None]);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_matches_sequential() {
        let catalog = catalog();
        let boxes = GlycanBoxes::targets(&catalog, 2);
        let n = catalog[0].mass();
        let parameters = etd();
        let candidates = (1..6)
            .map(|i| LocalizationCandidate {
                sites: (0..=i).map(|s| s * 2).collect(),
                fragments: (1..12)
                    .map(|c| Fragment::new(IonKind::c, c, 100.0 * c as f64))
                    .collect(),
                observed: (1..12).map(|c| 100.0 * c as f64 + n).collect(),
                glycan_mass: (2.0 * n - 0.5)..=(2.0 * n + 0.5),
                statistics: ScanStatistics::new(0.01, 11),
            })
            .collect::<Vec<_>>();
        let stop = AtomicBool::new(false);
        assert_eq!(
            localize_spectra(&candidates, &boxes, &parameters, &stop),
            par_localize_spectra(&candidates, &boxes, &parameters, &stop)
        );
    }

    #[test]
    #[should_panic(expected = "Glycan 1 is not in the glycan catalog")]
    fn unknown_glycan() {
        let catalog = catalog();
        let glycan_box = GlycanBox::target(vec![1], &catalog);
        let graph =
            LocalizationGraph::build(vec![2], 0, &glycan_box, &HashSet::new(), &[], 1000);
        let localization = localize(&[graph], &ScanStatistics::new(0.01, 10), &etd()).unwrap();
        let smaller = GlycanCatalog::from_compositions(["N1".parse::<Composition>().unwrap()]);
        let _ = localization.localized_glycans_string(&smaller, 0);
    }
}
