//! The procedure catalog: the static registry of known procedure types.
//!
//! Every procedure on a tooth chart carries a type code (for example `CROWN`
//! or `EXTRACTION`). The catalog maps each known code to its display label
//! and its clinical category. Categories are the unit of conflict detection:
//! two simultaneously active procedures of the same category on one tooth are
//! not allowed.
//!
//! The catalog is a compiled-in table, not a configuration file. It is
//! process-wide, immutable, and safe for concurrent reads; the lookup index
//! is built lazily on first use and never changes afterwards.
//!
//! Notes:
//! - Absence of a code is signalled by `None`, never an error. Ledgers may
//!   legitimately contain codes written by older clients that no longer
//!   resolve; those records simply have no category.
//! - `EXTRACTION` and `SURGICAL_EXTRACTION` are the two codes that lock a
//!   tooth once completed (see [`locks_tooth`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Procedure type code for a simple extraction. Locks the tooth when completed.
pub const EXTRACTION: &str = "EXTRACTION";

/// Procedure type code for a surgical extraction. Locks the tooth when completed.
pub const SURGICAL_EXTRACTION: &str = "SURGICAL_EXTRACTION";

/// Clinical category of a procedure type.
///
/// Categories group procedure types coarsely for conflict detection: within
/// one tooth's ledger, at most one procedure per category may be active at a
/// time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcedureCategory {
    /// Observations and occurrences recorded against a tooth (consultations,
    /// radiographs, trauma).
    Events,
    /// Crowns, veneers, bridges and other fixed prosthetics.
    Prosthetic,
    /// Fillings, inlays, onlays and sealants.
    Restorative,
    /// Root canal and other pulp treatments.
    Endodontic,
    /// Extractions and other oral surgery.
    Surgical,
    /// Implant placement and implant-borne restorations.
    Implant,
}

impl ProcedureCategory {
    /// Returns the canonical uppercase token for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "EVENTS",
            Self::Prosthetic => "PROSTHETIC",
            Self::Restorative => "RESTORATIVE",
            Self::Endodontic => "ENDODONTIC",
            Self::Surgical => "SURGICAL",
            Self::Implant => "IMPLANT",
        }
    }
}

impl fmt::Display for ProcedureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A procedure type code in canonical form (trimmed, uppercased).
///
/// Codes are carried as strings rather than a closed enum: a ledger may hold
/// codes that no longer resolve in the catalog, and those records must remain
/// readable. Construction is total; whether a code is *known* is answered by
/// [`lookup`] at validation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcedureCode(String);

impl ProcedureCode {
    /// Creates a canonical procedure code from loose input.
    ///
    /// The input is trimmed and uppercased; no further validation is applied.
    /// Unknown codes surface later as a failed catalog lookup.
    pub fn new(input: impl AsRef<str>) -> Self {
        Self(input.as_ref().trim().to_uppercase())
    }

    /// Returns the canonical code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcedureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProcedureCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ProcedureCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ProcedureCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ProcedureCode::new(&s))
    }
}

/// One entry in the procedure catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Canonical type code, unique within the catalog.
    pub code: &'static str,
    /// Human-readable display label.
    pub label: &'static str,
    /// Clinical category used for conflict detection.
    pub category: ProcedureCategory,
}

/// The compiled-in procedure catalog.
///
/// Grouped by category for readability; order within the table carries no
/// meaning.
static CATALOG: &[CatalogEntry] = &[
    // Events
    CatalogEntry {
        code: "CONSULTATION",
        label: "Consultation",
        category: ProcedureCategory::Events,
    },
    CatalogEntry {
        code: "XRAY",
        label: "Radiographic examination",
        category: ProcedureCategory::Events,
    },
    CatalogEntry {
        code: "FRACTURE",
        label: "Tooth fracture",
        category: ProcedureCategory::Events,
    },
    CatalogEntry {
        code: "TRAUMA",
        label: "Dental trauma",
        category: ProcedureCategory::Events,
    },
    CatalogEntry {
        code: "ERUPTION",
        label: "Tooth eruption",
        category: ProcedureCategory::Events,
    },
    // Restorative
    CatalogEntry {
        code: "FILLING",
        label: "Filling",
        category: ProcedureCategory::Restorative,
    },
    CatalogEntry {
        code: "COMPOSITE_FILLING",
        label: "Composite filling",
        category: ProcedureCategory::Restorative,
    },
    CatalogEntry {
        code: "AMALGAM_FILLING",
        label: "Amalgam filling",
        category: ProcedureCategory::Restorative,
    },
    CatalogEntry {
        code: "INLAY",
        label: "Inlay",
        category: ProcedureCategory::Restorative,
    },
    CatalogEntry {
        code: "ONLAY",
        label: "Onlay",
        category: ProcedureCategory::Restorative,
    },
    CatalogEntry {
        code: "SEALANT",
        label: "Fissure sealant",
        category: ProcedureCategory::Restorative,
    },
    // Prosthetic
    CatalogEntry {
        code: "CROWN",
        label: "Crown",
        category: ProcedureCategory::Prosthetic,
    },
    CatalogEntry {
        code: "TEMP_CROWN",
        label: "Temporary crown",
        category: ProcedureCategory::Prosthetic,
    },
    CatalogEntry {
        code: "VENEER",
        label: "Veneer",
        category: ProcedureCategory::Prosthetic,
    },
    CatalogEntry {
        code: "BRIDGE",
        label: "Bridge abutment",
        category: ProcedureCategory::Prosthetic,
    },
    CatalogEntry {
        code: "POST_AND_CORE",
        label: "Post and core",
        category: ProcedureCategory::Prosthetic,
    },
    // Endodontic
    CatalogEntry {
        code: "ROOT_CANAL",
        label: "Root canal treatment",
        category: ProcedureCategory::Endodontic,
    },
    CatalogEntry {
        code: "ROOT_CANAL_RETREATMENT",
        label: "Root canal retreatment",
        category: ProcedureCategory::Endodontic,
    },
    CatalogEntry {
        code: "PULPOTOMY",
        label: "Pulpotomy",
        category: ProcedureCategory::Endodontic,
    },
    CatalogEntry {
        code: "APICOECTOMY",
        label: "Apicoectomy",
        category: ProcedureCategory::Endodontic,
    },
    // Surgical
    CatalogEntry {
        code: EXTRACTION,
        label: "Extraction",
        category: ProcedureCategory::Surgical,
    },
    CatalogEntry {
        code: SURGICAL_EXTRACTION,
        label: "Surgical extraction",
        category: ProcedureCategory::Surgical,
    },
    CatalogEntry {
        code: "GINGIVECTOMY",
        label: "Gingivectomy",
        category: ProcedureCategory::Surgical,
    },
    CatalogEntry {
        code: "CROWN_LENGTHENING",
        label: "Crown lengthening",
        category: ProcedureCategory::Surgical,
    },
    // Implant
    CatalogEntry {
        code: "IMPLANT",
        label: "Implant placement",
        category: ProcedureCategory::Implant,
    },
    CatalogEntry {
        code: "IMPLANT_ABUTMENT",
        label: "Implant abutment",
        category: ProcedureCategory::Implant,
    },
    CatalogEntry {
        code: "IMPLANT_CROWN",
        label: "Implant crown",
        category: ProcedureCategory::Implant,
    },
];

static CATALOG_INDEX: LazyLock<HashMap<&'static str, &'static CatalogEntry>> =
    LazyLock::new(|| CATALOG.iter().map(|entry| (entry.code, entry)).collect());

/// Looks up a procedure code in the catalog.
///
/// Returns `None` for unknown codes. Because [`ProcedureCode`] is already
/// canonical, lookups are effectively case- and whitespace-insensitive with
/// respect to the original client input.
pub fn lookup(code: &ProcedureCode) -> Option<&'static CatalogEntry> {
    CATALOG_INDEX.get(code.as_str()).copied()
}

/// Returns the full catalog table, in display order.
pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Whether a completed procedure of this type locks the tooth permanently.
///
/// A tooth with a completed extraction in its history accepts no new
/// procedure entries, ever.
pub fn locks_tooth(code: &ProcedureCode) -> bool {
    code.as_str() == EXTRACTION || code.as_str() == SURGICAL_EXTRACTION
}
