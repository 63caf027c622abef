use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    GlycanBox, ModBox,
    fragment::{Fragment, local_fragment_bins, unlocalized_fragment_bins},
    localization::Node,
};

/// The site by box dynamic programming graph for one glycopeptide and one glycan box.
///
/// Layer `i` holds the candidate boxes for the glycans on the first `i + 1` sites, the columns are
/// the child boxes of the glycan box (empty box first) followed by the full box. A node only
/// exists if its box size is possible at that layer: at most one glycan per site so far, and
/// enough glycans that the remaining sites can still place the rest. Going from one layer to
/// the next a box can only stay the same or gain exactly one glycan. The only node in the last
/// layer that can be reached is the full box, which makes it the terminal node.
#[derive(Clone, Deserialize, PartialEq, Eq, Serialize)]
pub struct LocalizationGraph {
    sites: Vec<usize>,
    box_id: usize,
    boxes: Vec<ModBox>,
    /// `transitions[from][to]`, can box `to` follow box `from` in the next layer
    transitions: Vec<Vec<bool>>,
    nodes: Vec<Vec<Option<Node>>>,
    unlocalized_score: usize,
}

impl std::fmt::Debug for LocalizationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;
        let width = self
            .boxes
            .iter()
            .map(|b| b.to_string().len())
            .max()
            .unwrap_or_default()
            .max(7);
        write!(f, "{:>5} ", "site")?;
        for column in &self.boxes {
            write!(f, " {:^width$} ", column.to_string())?;
        }
        writeln!(f)?;
        for (layer, row) in self.nodes.iter().enumerate() {
            let mut line = String::new();
            for cell in row {
                match cell {
                    Some(node) => write!(
                        &mut line,
                        "⎡{:^width$}⎦",
                        format!("{}+{}", node.max_score - node.local_score, node.local_score)
                    )?,
                    None => write!(&mut line, " {:^width$} ", "·")?,
                }
            }
            writeln!(f, "{:>5} {line}", self.sites[layer])?;
        }
        writeln!(f, "unlocalized: {}", self.unlocalized_score)
    }
}

impl LocalizationGraph {
    /// Create an empty graph for the given sites and glycan box, use [`Self::localize`] to fill it.
    /// The sites are sorted and deduplicated.
    pub fn new(sites: Vec<usize>, box_id: usize, glycan_box: &GlycanBox) -> Self {
        Self::from_boxes(sites, box_id, glycan_box.localization_boxes())
    }

    /// Create an empty graph with the given columns, the last box has to be the full box and all
    /// others its distinct proper sub boxes, sorted on size. The sites are sorted and a site given
    /// more than once is only used once.
    pub fn from_boxes(mut sites: Vec<usize>, box_id: usize, boxes: Vec<ModBox>) -> Self {
        sites.sort_unstable();
        sites.dedup();
        let transitions = boxes
            .iter()
            .enumerate()
            .map(|(from_index, from)| {
                boxes
                    .iter()
                    .enumerate()
                    .map(|(to_index, to)| {
                        from_index <= to_index
                            && to.number_of_mods() <= from.number_of_mods() + 1
                            && (from.is_empty() || to.contains(from))
                    })
                    .collect()
            })
            .collect();
        Self {
            nodes: vec![vec![None; boxes.len()]; sites.len()],
            sites,
            box_id,
            boxes,
            transitions,
            unlocalized_score: 0,
        }
    }

    /// Create a graph and directly fill it, see [`Self::localize`].
    pub fn build(
        sites: Vec<usize>,
        box_id: usize,
        glycan_box: &GlycanBox,
        observed: &HashSet<i64>,
        fragments: &[Fragment],
        bins_per_dalton: u32,
    ) -> Self {
        let mut graph = Self::new(sites, box_id, glycan_box);
        graph.localize(observed, fragments, bins_per_dalton);
        graph
    }

    /// Fill the graph layer by layer. The local score of a node is the number of observed bins
    /// among the fragments that break between its site and the next site when the box of the
    /// node sits on the sites so far. The last layer has no local evidence. Running this again
    /// with the same input gives the same graph.
    #[tracing::instrument(level = "trace", skip_all, fields(box_id = self.box_id, sites = self.sites.len()))]
    pub fn localize(&mut self, observed: &HashSet<i64>, fragments: &[Fragment], bins_per_dalton: u32) {
        let total = self.total_box().clone();
        self.unlocalized_score = unlocalized_fragment_bins(fragments, &self.sites, &total, bins_per_dalton)
            .intersection(observed)
            .count();

        for layer in 0..self.sites.len() {
            for column in 0..self.boxes.len() {
                let node = if self.is_feasible(layer, column) {
                    self.calculate_node(layer, column, observed, fragments, &total, bins_per_dalton)
                } else {
                    None
                };
                self.nodes[layer][column] = node;
            }
        }
        tracing::trace!(
            terminal = ?self.terminal_score(),
            unlocalized = self.unlocalized_score,
            "Localized graph"
        );
    }

    fn calculate_node(
        &self,
        layer: usize,
        column: usize,
        observed: &HashSet<i64>,
        fragments: &[Fragment],
        total: &ModBox,
        bins_per_dalton: u32,
    ) -> Option<Node> {
        let local_score = if layer + 1 == self.sites.len() {
            0
        } else {
            local_fragment_bins(
                fragments,
                &self.sites,
                layer,
                &self.boxes[column],
                total,
                bins_per_dalton,
            )
            .intersection(observed)
            .count()
        };
        let mut node = Node::new(layer, column, local_score);
        if layer == 0 {
            return Some(node);
        }
        for from in 0..=column {
            if !self.transitions[from][column] {
                continue;
            }
            if let Some(previous) = &self.nodes[layer - 1][from] {
                node.add_source(from, previous.max_score);
            }
        }
        (!node.all_sources.is_empty()).then_some(node)
    }

    /// Check if the box in this column can be the box for the first `layer + 1` sites.
    fn is_feasible(&self, layer: usize, column: usize) -> bool {
        let size = self.boxes[column].number_of_mods();
        let remaining_sites = self.sites.len() - 1 - layer;
        size <= layer + 1 && size + remaining_sites >= self.total_box().number_of_mods()
    }

    /// The sorted site positions
    pub fn sites(&self) -> &[usize] {
        &self.sites
    }

    /// The id of the glycan box
    pub const fn box_id(&self) -> usize {
        self.box_id
    }

    /// The columns, the child boxes followed by the full box
    pub fn boxes(&self) -> &[ModBox] {
        &self.boxes
    }

    /// The full glycan box
    /// # Panics
    /// If the graph was created without any columns.
    pub fn total_box(&self) -> &ModBox {
        &self.boxes[self.boxes.len() - 1]
    }

    /// Get the node at this layer and column, if it is feasible
    pub fn node(&self, layer: usize, column: usize) -> Option<&Node> {
        self.nodes.get(layer)?.get(column)?.as_ref()
    }

    /// The terminal node, the full box in the last layer. If this does not exist the box cannot be placed on these sites.
    pub fn terminal(&self) -> Option<&Node> {
        self.node(self.sites.len().checked_sub(1)?, self.boxes.len().checked_sub(1)?)
    }

    /// Check if this box can be placed on these sites
    pub fn is_scorable(&self) -> bool {
        self.terminal().is_some()
    }

    /// The score of the best path, if this box can be placed on these sites
    pub fn terminal_score(&self) -> Option<usize> {
        self.terminal().map(|node| node.max_score)
    }

    /// The number of matched fragments that do not depend on the distribution of the glycans
    pub const fn unlocalized_score(&self) -> usize {
        self.unlocalized_score
    }

    /// The best path score plus the unlocalized score, if this box can be placed on these sites
    pub fn total_score(&self) -> Option<usize> {
        self.terminal_score()
            .map(|score| score + self.unlocalized_score)
    }
}
