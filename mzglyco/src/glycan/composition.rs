use std::{borrow::Cow, fmt::Display, ops::Add, str::FromStr};

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{
    glycan::{MASS_SCALE, MonoSaccharideKind},
    helper_functions::{explain_number_error, next_count},
};

/// The number of each monosaccharide kind in a glycan (or a combination of glycans).
///
/// The textual kind string lists every non zero kind as its symbol followed by its count, in the
/// order of [`MonoSaccharideKind::ALL`], e.g. `H5N2` or `H5N4A1F1`. Parsing and printing a kind string
/// round trips.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Composition([u8; MonoSaccharideKind::TOTAL_NUMBER]);

impl Composition {
    /// A composition without any monosaccharides.
    pub const EMPTY: Self = Self([0; MonoSaccharideKind::TOTAL_NUMBER]);

    /// Create a composition from the counts in [`MonoSaccharideKind::ALL`] order.
    pub const fn new(counts: [u8; MonoSaccharideKind::TOTAL_NUMBER]) -> Self {
        Self(counts)
    }

    /// Create a composition from a list of monosaccharides with their counts, counts for the same kind are summed.
    /// Counts saturate at 255.
    pub fn from_counts(counts: impl IntoIterator<Item = (MonoSaccharideKind, u8)>) -> Self {
        let mut output = Self::EMPTY;
        for (kind, count) in counts {
            output.0[kind.index()] = output.0[kind.index()].saturating_add(count);
        }
        output
    }

    /// Count all monosaccharide symbols in a structure string like `(N(F)(N(H(H(N))(H(N)))))`.
    /// Brackets and whitespace are ignored.
    /// # Errors
    /// If the structure contains a character that is not a monosaccharide symbol, or if any kind occurs more than 255 times.
    pub fn from_structure(
        structure: &str,
        line_index: Option<u32>,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        let mut output = Self::EMPTY;
        for (index, c) in structure.char_indices() {
            if c == '(' || c == ')' || c.is_whitespace() {
                continue;
            }
            let kind = MonoSaccharideKind::from_symbol(c).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid glycan structure",
                    "This is not a known monosaccharide symbol, use one of H, N, A, G, F, P, S, Y, C, X, or K",
                    Context::line(line_index, structure, index, c.len_utf8()).to_owned(),
                )
            })?;
            output.0[kind.index()] = output.0[kind.index()].checked_add(1).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid glycan structure",
                    format!("There are more than 255 {kind} in this structure"),
                    Context::full_line(line_index.unwrap_or_default(), structure).to_owned(),
                )
            })?;
        }
        Ok(output)
    }

    /// Parse a Byonic style composition like `HexNAc(4)Hex(5)Fuc(1)`. Anything after the first space
    /// or `%` (normally the mass) is ignored.
    /// # Errors
    /// If a name is not a known monosaccharide, a count is missing or invalid, or the brackets do not line up.
    pub fn byonic(
        text: &str,
        line_index: Option<u32>,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        let end = text.find([' ', '%', '\t']).unwrap_or(text.len());
        let mut output = Self::EMPTY;
        let mut index = 0;
        while index < end {
            let open = text[index..end].find('(').map(|i| i + index).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid Byonic composition",
                    "Every monosaccharide should be followed by its count in brackets, like `Hex(5)`",
                    Context::line(line_index, text, index, end - index).to_owned(),
                )
            })?;
            let name = &text[index..open];
            let kind = MonoSaccharideKind::from_name(name).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid Byonic composition",
                    "This is not a known monosaccharide name",
                    Context::line(line_index, text, index, name.len()).to_owned(),
                )
            })?;
            let close = text[open..end].find(')').map(|i| i + open).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid Byonic composition",
                    "The count is not closed with a bracket",
                    Context::line(line_index, text, open, end - open).to_owned(),
                )
            })?;
            let count = text[open + 1..close].parse::<u8>().map_err(|error| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid Byonic composition",
                    format!("The monosaccharide count {}", explain_number_error(&error)),
                    Context::line(line_index, text, open + 1, close - open - 1).to_owned(),
                )
            })?;
            output.0[kind.index()] = output.0[kind.index()].saturating_add(count);
            index = close + 1;
        }
        Ok(output)
    }

    /// Write this composition as a Byonic composition, e.g. `Hex(5)HexNAc(2)`.
    pub fn byonic_name(&self) -> String {
        self.iter()
            .map(|(kind, count)| format!("{}({count})", kind.name()))
            .collect()
    }

    /// Get the count of one monosaccharide kind.
    pub const fn count(&self, kind: MonoSaccharideKind) -> u8 {
        self.0[kind.index()]
    }

    /// Get all counts in [`MonoSaccharideKind::ALL`] order.
    pub const fn counts(&self) -> &[u8; MonoSaccharideKind::TOTAL_NUMBER] {
        &self.0
    }

    /// Iterate over all kinds with a non zero count.
    pub fn iter(&self) -> impl Iterator<Item = (MonoSaccharideKind, u8)> + '_ {
        MonoSaccharideKind::ALL
            .into_iter()
            .zip(self.0)
            .filter(|(_, count)| *count != 0)
    }

    /// Check if this composition contains no monosaccharides.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|count| *count == 0)
    }

    /// The total number of monosaccharides.
    pub fn size(&self) -> usize {
        self.0.iter().map(|count| usize::from(*count)).sum()
    }

    /// The monoisotopic mass in 1e-5 Da.
    pub fn integer_mass(&self) -> i64 {
        self.iter()
            .map(|(kind, count)| kind.integer_mass() * i64::from(count))
            .sum()
    }

    /// The monoisotopic mass in Dalton.
    pub fn mass(&self) -> f64 {
        self.integer_mass() as f64 / MASS_SCALE
    }

    /// Add two compositions, returns None if any count would overflow.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let mut output = Self::EMPTY;
        for index in 0..MonoSaccharideKind::TOTAL_NUMBER {
            output.0[index] = self.0[index].checked_add(other.0[index])?;
        }
        Some(output)
    }

    /// Remove the other composition from this one, returns None if the other is not contained in this one.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let mut output = Self::EMPTY;
        for index in 0..MonoSaccharideKind::TOTAL_NUMBER {
            output.0[index] = self.0[index].checked_sub(other.0[index])?;
        }
        Some(output)
    }
}

impl Add for Composition {
    type Output = Self;
    /// Counts saturate at 255.
    fn add(self, rhs: Self) -> Self::Output {
        let mut output = self;
        for (count, other) in output.0.iter_mut().zip(rhs.0) {
            *count = count.saturating_add(other);
        }
        output
    }
}

impl std::iter::Sum for Composition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::EMPTY, Add::add)
    }
}

impl Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (kind, count) in self.iter() {
            write!(f, "{}{count}", kind.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Composition {
    type Err = BoxedError<'static, BasicKind>;
    /// Parse a kind string like `H5N4F1`, the empty string is the empty composition.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_kind_string(s, None)
    }
}

impl Composition {
    /// Parse a kind string like `H5N4F1`, the empty string is the empty composition.
    /// # Errors
    /// If a symbol is unknown or not followed by a valid count.
    pub fn from_kind_string(
        s: &str,
        line_index: Option<u32>,
    ) -> Result<Self, BoxedError<'static, BasicKind>> {
        let mut output = Self::EMPTY;
        let mut index = 0;
        while index < s.len() {
            let Some(c) = s[index..].chars().next() else {
                break;
            };
            let kind = MonoSaccharideKind::from_symbol(c).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid glycan composition",
                    "This is not a known monosaccharide symbol, use one of H, N, A, G, F, P, S, Y, C, X, or K",
                    Context::line(line_index, s, index, c.len_utf8()).to_owned(),
                )
            })?;
            index += c.len_utf8();
            let (length, count) = next_count(s, index).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid glycan composition",
                    "Every monosaccharide symbol should be followed by its count, like `H5`",
                    Context::line(line_index, s, index - c.len_utf8(), c.len_utf8()).to_owned(),
                )
            })?;
            let count = count.map_err(|error| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid glycan composition",
                    "The monosaccharide count is not valid",
                    Context::line_with_comment(
                        line_index,
                        s,
                        index,
                        length,
                        Some(Cow::Owned(format!(
                            "The count {}",
                            explain_number_error(&error)
                        ))),
                    )
                    .to_owned(),
                )
            })?;
            output.0[kind.index()] = output.0[kind.index()].saturating_add(count);
            index += length;
        }
        Ok(output)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn structure() {
        let composition =
            Composition::from_structure("(N(F)(N(H(H(N))(H(N)))))", None).unwrap();
        assert_eq!(composition.to_string(), "H3N4F1");
        assert_eq!(composition.size(), 8);
        assert!(Composition::from_structure("(N(Q))", Some(3)).is_err());
    }

    #[test]
    fn kind_string_round_trip() {
        for text in ["H5N2", "H5N4A1F1", "H3N4F1", "N1", "H12N2S1K2", ""] {
            let composition = text.parse::<Composition>().unwrap();
            assert_eq!(composition.to_string(), text);
        }
        let structure = Composition::from_structure("(N(N(H(H(H))(H(A)))))", None).unwrap();
        assert_eq!(
            structure.to_string().parse::<Composition>().unwrap(),
            structure
        );
    }

    #[test]
    fn invalid_kind_strings() {
        assert!("H".parse::<Composition>().is_err());
        assert!("H5Q1".parse::<Composition>().is_err());
        assert!("H300".parse::<Composition>().is_err());
    }

    #[test]
    fn byonic() {
        let composition = Composition::byonic("HexNAc(4)Hex(5)Fuc(1) % 1768.6395", None).unwrap();
        assert_eq!(composition.to_string(), "H5N4F1");
        assert_eq!(composition.byonic_name(), "Hex(5)HexNAc(4)Fuc(1)");
        assert!(Composition::byonic("HexNAc(4)Hexa(5)", None).is_err());
        assert!(Composition::byonic("HexNAc(4", None).is_err());
        assert!(Composition::byonic("HexNAc4", None).is_err());
    }

    #[test]
    fn arithmetic() {
        let a = "H5N2".parse::<Composition>().unwrap();
        let b = "H3N4F1".parse::<Composition>().unwrap();
        let sum = a + b;
        assert_eq!(sum.to_string(), "H8N6F1");
        assert_eq!(sum.checked_sub(&b), Some(a));
        assert_eq!(a.checked_sub(&b), None);
        assert_eq!(
            sum.integer_mass(),
            a.integer_mass() + b.integer_mass()
        );
        assert_eq!([a, b].into_iter().sum::<Composition>(), sum);
    }
}
