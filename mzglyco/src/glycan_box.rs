use std::ops::Index;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    LocalizationParameters, ModBox, ModificationCatalog,
    glycan::{Composition, MASS_SCALE},
};

/// A multiset of glycans that together explain the glycan mass of a glycopeptide, with all its
/// proper sub boxes. Decoy boxes have a random mass shift on the full box.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct GlycanBox {
    mod_box: ModBox,
    target: bool,
    mass_shift: i64,
    children: Vec<ModBox>,
}

impl GlycanBox {
    /// Create a target box
    /// # Panics
    /// If any id is not in the catalog.
    pub fn target(ids: Vec<usize>, catalog: &impl ModificationCatalog) -> Self {
        let mod_box = ModBox::new(ids, catalog);
        Self {
            children: mod_box.child_boxes(catalog),
            mod_box,
            target: true,
            mass_shift: 0,
        }
    }

    /// Create a decoy box, the mass of the full box is moved by `mass_shift` (in 1e-5 Da), the
    /// child boxes keep their real mass.
    /// # Panics
    /// If any id is not in the catalog.
    pub fn decoy(ids: Vec<usize>, catalog: &impl ModificationCatalog, mass_shift: i64) -> Self {
        let mod_box = ModBox::new(ids, catalog);
        Self {
            children: mod_box.child_boxes(catalog),
            mod_box: mod_box.shifted(mass_shift),
            target: false,
            mass_shift,
        }
    }

    /// The full box, with the decoy mass shift applied
    pub const fn mod_box(&self) -> &ModBox {
        &self.mod_box
    }

    /// The sorted glycan ids
    pub fn ids(&self) -> &[usize] {
        self.mod_box.ids()
    }

    /// The number of glycans
    pub fn number_of_mods(&self) -> usize {
        self.mod_box.number_of_mods()
    }

    /// The summed composition of all glycans
    pub const fn composition(&self) -> &Composition {
        self.mod_box.composition()
    }

    /// If this is a target box
    pub const fn is_target(&self) -> bool {
        self.target
    }

    /// The mass used for searching in 1e-5 Da, this includes the decoy shift
    pub const fn integer_mass(&self) -> i64 {
        self.mod_box.integer_mass()
    }

    /// The mass used for searching in Dalton, this includes the decoy shift
    pub fn mass(&self) -> f64 {
        self.mod_box.mass()
    }

    /// The shifted mass in Dalton, if this is a decoy box
    pub fn decoy_mass(&self) -> Option<f64> {
        (!self.target).then(|| self.mass())
    }

    /// The mass shift in 1e-5 Da, zero for targets
    pub const fn mass_shift(&self) -> i64 {
        self.mass_shift
    }

    /// The mass of the glycans without decoy shift in Dalton
    pub fn unshifted_mass(&self) -> f64 {
        (self.mod_box.integer_mass() - self.mass_shift) as f64 / MASS_SCALE
    }

    /// All distinct proper sub boxes, the empty box first
    pub fn child_boxes(&self) -> &[ModBox] {
        &self.children
    }

    /// The boxes that make up the columns of a localization graph, the children followed by the full box
    pub fn localization_boxes(&self) -> Vec<ModBox> {
        self.children
            .iter()
            .cloned()
            .chain(std::iter::once(self.mod_box.clone()))
            .collect()
    }
}

/// All glycan boxes for a catalog, sorted on mass. The position in this list is the box id.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct GlycanBoxes {
    boxes: Vec<GlycanBox>,
}

impl GlycanBoxes {
    /// Build all boxes of 1 up to `max_glycans_per_peptide` glycans (combinations with repetition),
    /// adding a decoy for each target if requested. An empty catalog or a maximum of zero glycans
    /// gives only the empty target box.
    pub fn build<R: Rng + ?Sized>(
        catalog: &impl ModificationCatalog,
        parameters: &LocalizationParameters,
        rng: &mut R,
    ) -> Self {
        Self::enumerate(catalog, parameters.max_glycans_per_peptide, || {
            parameters.build_decoys.then(|| {
                if parameters.decoy_mass_shift.is_empty() {
                    *parameters.decoy_mass_shift.start()
                } else {
                    rng.random_range(parameters.decoy_mass_shift.clone())
                }
            })
        })
    }

    /// Build only the target boxes of 1 up to `max_glycans` glycans, or only the empty box if
    /// there are no glycans or `max_glycans` is zero.
    pub fn targets(catalog: &impl ModificationCatalog, max_glycans: usize) -> Self {
        Self::enumerate(catalog, max_glycans, || None)
    }

    fn enumerate(
        catalog: &impl ModificationCatalog,
        max_glycans: usize,
        mut decoy_shift: impl FnMut() -> Option<i64>,
    ) -> Self {
        if catalog.is_empty() || max_glycans == 0 {
            tracing::debug!(
                glycans = catalog.len(),
                max_glycans,
                "No glycans to combine, only the empty glycan box is built"
            );
            return Self {
                boxes: vec![GlycanBox::target(Vec::new(), catalog)],
            };
        }
        let mut boxes = Vec::new();
        for size in 1..=max_glycans {
            for ids in (0..catalog.len()).combinations_with_replacement(size) {
                if let Some(shift) = decoy_shift() {
                    boxes.push(GlycanBox::decoy(ids.clone(), catalog, shift));
                }
                boxes.push(GlycanBox::target(ids, catalog));
            }
        }
        boxes.sort_by_key(|b| OrderedFloat(b.mass()));
        tracing::debug!(
            boxes = boxes.len(),
            glycans = catalog.len(),
            max_glycans,
            "Built glycan boxes"
        );
        Self { boxes }
    }

    /// The number of boxes
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Check if there are no boxes
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Get a box by id
    pub fn get(&self, id: usize) -> Option<&GlycanBox> {
        self.boxes.get(id)
    }

    /// Iterate over all boxes in mass order, with their id
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &GlycanBox)> + '_ {
        self.boxes.iter().enumerate()
    }

    /// All boxes with a mass (in Dalton, including decoy shifts) within the inclusive range, with their id
    pub fn in_mass_range(&self, low: f64, high: f64) -> impl Iterator<Item = (usize, &GlycanBox)> + '_ {
        let start = self.boxes.partition_point(|b| b.mass() < low);
        let end = self.boxes.partition_point(|b| b.mass() <= high).max(start);
        self.boxes[start..end]
            .iter()
            .enumerate()
            .map(move |(index, b)| (start + index, b))
    }
}

impl Index<usize> for GlycanBoxes {
    type Output = GlycanBox;
    fn index(&self, index: usize) -> &Self::Output {
        &self.boxes[index]
    }
}
