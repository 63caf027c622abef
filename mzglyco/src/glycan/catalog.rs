use std::{
    fmt::Display,
    io::{BufRead, BufReader},
    ops::Index,
    path::Path,
};

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{
    ModificationCatalog,
    glycan::{Composition, MASS_SCALE},
    helper_functions::contains_ignore_case,
};

/// A single glycan that can be placed on a site
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Glycan {
    id: usize,
    composition: Composition,
    structure: Option<String>,
}

impl Glycan {
    /// Create a new glycan with only a known composition
    pub const fn new(id: usize, composition: Composition) -> Self {
        Self {
            id,
            composition,
            structure: None,
        }
    }

    /// Create a glycan from a structure, the composition is derived from the structure
    /// # Errors
    /// If the structure contains unknown monosaccharides.
    pub fn from_structure(
        id: usize,
        structure: &str,
        line_index: Option<u32>,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        Ok(Self {
            id,
            composition: Composition::from_structure(structure, line_index)?,
            structure: Some(structure.trim().to_string()),
        })
    }

    /// The index of this glycan in its catalog
    pub const fn id(&self) -> usize {
        self.id
    }

    /// The composition
    pub const fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The structure, if this glycan was loaded from a structure database
    pub fn structure(&self) -> Option<&str> {
        self.structure.as_deref()
    }

    /// The monoisotopic mass in 1e-5 Da
    pub fn integer_mass(&self) -> i64 {
        self.composition.integer_mass()
    }

    /// The monoisotopic mass in Dalton
    pub fn mass(&self) -> f64 {
        self.integer_mass() as f64 / MASS_SCALE
    }
}

impl Display for Glycan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.structure {
            Some(structure) => write!(f, "{structure}"),
            None => write!(f, "{}", self.composition),
        }
    }
}

/// The ordered list of all glycans that can be placed, the position in the list is the glycan id.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct GlycanCatalog {
    glycans: Vec<Glycan>,
}

impl GlycanCatalog {
    /// Create a catalog with the given compositions, ids are assigned in order.
    pub fn from_compositions(compositions: impl IntoIterator<Item = Composition>) -> Self {
        Self {
            glycans: compositions
                .into_iter()
                .enumerate()
                .map(|(id, composition)| Glycan::new(id, composition))
                .collect(),
        }
    }

    /// Parse a glycan database from a string, see [`Self::parse_reader`] for the supported formats.
    /// # Errors
    /// If any line is not a valid glycan.
    pub fn parse(text: &str) -> Result<Self, BoxedError<'static, BasicKind>> {
        Self::parse_reader(text.as_bytes(), None)
    }

    /// Parse a glycan database file
    /// # Errors
    /// If the file could not be opened or any line is not a valid glycan.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, BoxedError<'static, BasicKind>> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|_| {
            BoxedError::new(
                BasicKind::Error,
                "Failed reading glycan database",
                "Error occurred while opening the file",
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        Self::parse_reader(BufReader::new(file), Some(path))
    }

    /// Parse a glycan database from a reader. If the first line mentions `HexNAc` (in any casing) the database
    /// is a Byonic style composition list where only the first tab separated column is used,
    /// like `HexNAc(2)Hex(5) % 1216.42286`. Otherwise every line is either a structure, like
    /// `(N(N(H(H)(H))))`, or a kind string, like `H3N2`. Empty lines and lines starting with `#` are skipped.
    /// # Errors
    /// If the reader fails or any line is not a valid glycan.
    pub fn parse_reader(
        reader: impl BufRead,
        path: Option<&Path>,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        let mut glycans = Vec::new();
        let mut byonic_format = None;
        for (line_index, line) in reader.lines().enumerate() {
            let line = line.map_err(|_| {
                BoxedError::new(
                    BasicKind::Error,
                    "Failed reading glycan database",
                    format!("Error occurred while reading line {}", line_index + 1),
                    path.map_or_else(Context::none, |p| {
                        Context::default().source(p.to_string_lossy()).to_owned()
                    }),
                )
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let byonic =
                *byonic_format.get_or_insert_with(|| contains_ignore_case(trimmed, "HexNAc"));
            let id = glycans.len();
            let glycan = if byonic {
                let column = trimmed.split('\t').next().unwrap_or_default();
                Glycan::new(id, Composition::byonic(column, Some(line_index as u32))?)
            } else if trimmed.starts_with('(') {
                Glycan::from_structure(id, trimmed, Some(line_index as u32))?
            } else {
                Glycan::new(
                    id,
                    Composition::from_kind_string(trimmed, Some(line_index as u32))?,
                )
            };
            glycans.push(glycan);
        }
        tracing::debug!(
            glycans = glycans.len(),
            byonic = byonic_format.unwrap_or_default(),
            "Loaded glycan database"
        );
        Ok(Self { glycans })
    }

    /// The number of glycans
    pub fn len(&self) -> usize {
        self.glycans.len()
    }

    /// Check if there are no glycans
    pub fn is_empty(&self) -> bool {
        self.glycans.is_empty()
    }

    /// Get a glycan by id
    pub fn get(&self, id: usize) -> Option<&Glycan> {
        self.glycans.get(id)
    }

    /// Iterate over all glycans in id order
    pub fn iter(&self) -> std::slice::Iter<'_, Glycan> {
        self.glycans.iter()
    }
}

impl Index<usize> for GlycanCatalog {
    type Output = Glycan;
    fn index(&self, index: usize) -> &Self::Output {
        &self.glycans[index]
    }
}

impl<'a> IntoIterator for &'a GlycanCatalog {
    type Item = &'a Glycan;
    type IntoIter = std::slice::Iter<'a, Glycan>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl ModificationCatalog for GlycanCatalog {
    fn len(&self) -> usize {
        self.glycans.len()
    }

    fn integer_mass(&self, id: usize) -> i64 {
        self.glycans[id].integer_mass()
    }

    fn composition(&self, id: usize) -> Composition {
        self.glycans[id].composition
    }
}
