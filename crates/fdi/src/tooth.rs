//! FDI (ISO 3950) tooth notation.
//!
//! Dental charts identify teeth by the FDI World Dental Federation two-digit
//! scheme: the first digit is the quadrant, the second the tooth position
//! counted from the midline.
//!
//! ## Canonical code form
//! - Quadrants `1`-`4` are the permanent dentition (positions `1`-`8`),
//!   numbered clockwise from the patient's upper right: `11`-`18`, `21`-`28`,
//!   `31`-`38`, `41`-`48`.
//! - Quadrants `5`-`8` are the primary (deciduous) dentition (positions
//!   `1`-`5`): `51`-`55`, `61`-`65`, `71`-`75`, `81`-`85`.
//!
//! Examples: `11` upper right central incisor, `36` lower left first molar,
//! `55` upper right second primary molar.
//!
//! Notes:
//! - Codes are validated once at the boundary; a constructed [`ToothId`]
//!   is always a real tooth. Externally supplied identifiers (CLI/API/chart
//!   files) must go through [`ToothId::parse`] or [`ToothId::from_code`].
//! - Non-codes (`19`, `49`, `56`, `90`, ...) are rejected.

use crate::{FdiError, FdiResult};
use std::fmt;
use std::str::FromStr;

/// Which dentition a tooth belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dentition {
    /// Adult teeth (quadrants 1-4).
    Permanent,
    /// Deciduous teeth (quadrants 5-8).
    Primary,
}

impl Dentition {
    /// Returns the lowercase string representation of this dentition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Primary => "primary",
        }
    }
}

/// Which jaw a tooth sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    /// Upper jaw (quadrants 1, 2, 5, 6).
    Maxillary,
    /// Lower jaw (quadrants 3, 4, 7, 8).
    Mandibular,
}

impl Arch {
    /// Returns the lowercase string representation of this arch.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maxillary => "maxillary",
            Self::Mandibular => "mandibular",
        }
    }
}

/// A validated FDI two-digit tooth code.
///
/// The inner code is guaranteed to denote a real tooth, so quadrant and
/// position accessors never fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToothId(u8);

impl ToothId {
    /// Creates a `ToothId` from a numeric FDI code.
    ///
    /// # Errors
    ///
    /// Returns [`FdiError::InvalidInput`] if the code does not denote a
    /// tooth in either dentition.
    pub fn from_code(code: u8) -> FdiResult<Self> {
        let quadrant = code / 10;
        let position = code % 10;
        let valid = match quadrant {
            1..=4 => (1..=8).contains(&position),
            5..=8 => (1..=5).contains(&position),
            _ => false,
        };
        if !valid {
            return Err(FdiError::InvalidInput(format!(
                "not a valid FDI tooth code: {code}"
            )));
        }
        Ok(Self(code))
    }

    /// Parses a `ToothId` from text.
    ///
    /// The input is trimmed and must then be exactly two ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`FdiError::InvalidInput`] if the text is not a two-digit
    /// number or the number is not a valid FDI code.
    pub fn parse(input: &str) -> FdiResult<Self> {
        let trimmed = input.trim();
        if trimmed.len() != 2 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FdiError::InvalidInput(format!(
                "tooth code must be two digits, got: {input:?}"
            )));
        }
        let code: u8 = trimmed
            .parse()
            .map_err(|_| FdiError::InvalidInput(format!("tooth code out of range: {trimmed}")))?;
        Self::from_code(code)
    }

    /// Returns the raw two-digit FDI code.
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Returns the quadrant digit (1-8).
    pub fn quadrant(&self) -> u8 {
        self.0 / 10
    }

    /// Returns the position within the quadrant, counted from the midline.
    pub fn position(&self) -> u8 {
        self.0 % 10
    }

    /// Returns which dentition this tooth belongs to.
    pub fn dentition(&self) -> Dentition {
        if self.quadrant() <= 4 {
            Dentition::Permanent
        } else {
            Dentition::Primary
        }
    }

    /// Returns which jaw this tooth sits in.
    pub fn arch(&self) -> Arch {
        match self.quadrant() {
            1 | 2 | 5 | 6 => Arch::Maxillary,
            _ => Arch::Mandibular,
        }
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToothId {
    type Err = FdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
