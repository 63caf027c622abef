use std::{cmp::Ordering, collections::HashSet, fmt::Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::glycan::{Composition, MASS_SCALE};

/// Any ordered list of modifications that can be combined into boxes. The position in the list is
/// the modification id.
pub trait ModificationCatalog {
    /// The number of modifications
    fn len(&self) -> usize;

    /// Check if there are no modifications
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mass of one modification in 1e-5 Da
    fn integer_mass(&self, id: usize) -> i64;

    /// The monosaccharide composition of one modification
    fn composition(&self, id: usize) -> Composition;
}

/// A multiset of modification ids, with the summed composition and mass.
/// The ids are always kept sorted, so two boxes with the same multiset of ids are equal.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ModBox {
    ids: Vec<usize>,
    composition: Composition,
    integer_mass: i64,
}

impl ModBox {
    /// Create a box from the given ids.
    /// # Panics
    /// If any id is not in the catalog.
    pub fn new(mut ids: Vec<usize>, catalog: &impl ModificationCatalog) -> Self {
        ids.sort_unstable();
        Self {
            composition: ids.iter().map(|id| catalog.composition(*id)).sum(),
            integer_mass: ids.iter().map(|id| catalog.integer_mass(*id)).sum(),
            ids,
        }
    }

    /// The box without any modifications
    pub fn empty() -> Self {
        Self::default()
    }

    /// The sorted modification ids
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// The number of modifications in this box
    pub fn number_of_mods(&self) -> usize {
        self.ids.len()
    }

    /// Check if this box has no modifications
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The summed composition
    pub const fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The summed mass in 1e-5 Da
    pub const fn integer_mass(&self) -> i64 {
        self.integer_mass
    }

    /// The summed mass in Dalton
    pub fn mass(&self) -> f64 {
        self.integer_mass as f64 / MASS_SCALE
    }

    /// Move the mass of this box, used to build decoys
    pub(crate) const fn shifted(mut self, shift: i64) -> Self {
        self.integer_mass += shift;
        self
    }

    /// Check if the other box is a sub multiset of this box.
    pub fn contains(&self, other: &Self) -> bool {
        self.difference(other).is_some()
    }

    /// Remove all ids of the other box from this box (as multisets). Returns None if the other
    /// box has ids not present in this box.
    pub fn difference(&self, other: &Self) -> Option<Vec<usize>> {
        let mut output = Vec::with_capacity(self.ids.len().saturating_sub(other.ids.len()));
        let mut remove = other.ids.iter().peekable();
        for id in &self.ids {
            match remove.peek().map(|r| r.cmp(&id)) {
                Some(Ordering::Less) => return None,
                Some(Ordering::Equal) => {
                    remove.next();
                }
                Some(Ordering::Greater) | None => output.push(*id),
            }
        }
        remove.peek().is_none().then_some(output)
    }

    /// All distinct proper sub boxes of this box, ordered by size with the empty box first.
    /// Two children are the same if they have the same multiset of ids. The empty box has no children.
    pub fn child_boxes(&self, catalog: &impl ModificationCatalog) -> Vec<Self> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        let mut children = vec![Self::empty()];
        for size in 1..self.ids.len() {
            for positions in (0..self.ids.len()).combinations(size) {
                let ids = positions.iter().map(|p| self.ids[*p]).collect_vec();
                if seen.insert(ids.clone()) {
                    children.push(Self::new(ids, catalog));
                }
            }
        }
        children
    }
}

impl Display for ModBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.ids.iter().join(","))
    }
}
