//! Pure decision engine for tooth-level procedure upserts.
//!
//! [`validate_tooth_upsert`] is the one function in this workspace with real
//! clinical invariants behind it. Given the current ledger of a tooth and a
//! normalised proposed procedure, it decides accept or reject and nothing
//! else. It performs no I/O, holds no state, and never fails: every outcome,
//! including every rejection, is a typed [`UpsertDecision`] value.
//!
//! Responsibilities:
//! - Enforce the tooth lock: once a completed extraction is on the ledger,
//!   no new procedure may ever be added to that tooth
//! - Reject procedure types the catalog does not know
//! - Enforce at most one active procedure per clinical category per tooth
//! - Report the decision in a stable JSON-serialisable shape
//!
//! Notes:
//! - Checks run in a fixed order (lock, then type, then conflict), so a
//!   request failing several rules always reports the same reason.
//! - The engine is safe to call concurrently with distinct ledgers; the
//!   read-validate-write race for one tooth is fenced at the store layer
//!   (see the `store` and `upsert` modules), not here.

use crate::catalog::{ProcedureCategory, ProcedureCode};
use crate::ledger::ToothLedger;
use crate::procedure::{ProcedureStatus, ProposedProcedure};
use serde::ser::{Serialize, SerializeMap, Serializer};

// ============================================================================
// Decision types
// ============================================================================

/// Outcome of validating one proposed upsert against one tooth's ledger.
///
/// Serialises to the decision wire shape consumed by callers:
///
/// ```json
/// {"ok": true, "locked": false}
/// {"ok": false, "error": "tooth_locked", "locked": true}
/// {"ok": false, "error": "invalid_type", "procedure_type": "TELEPATHY"}
/// {"ok": false, "error": "active_conflict", "category": "PROSTHETIC"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpsertDecision {
    /// The write may proceed.
    ///
    /// `locked` is reported even on acceptance: an update to an existing
    /// record on a locked tooth is permitted, and callers use the flag to
    /// warn about such edits.
    Accepted {
        /// Whether the tooth is locked by a completed extraction.
        locked: bool,
    },

    /// The write must not proceed, for the carried reason.
    Rejected(UpsertRejection),
}

impl UpsertDecision {
    /// Returns `true` when the decision permits the write.
    pub fn is_accepted(&self) -> bool {
        matches!(self, UpsertDecision::Accepted { .. })
    }
}

/// Typed reason for refusing an upsert.
///
/// All reasons are business rules, not faults: the caller maps each to a
/// stable external error code and a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpsertRejection {
    /// The tooth's ledger contains a completed extraction and the proposed
    /// procedure identifier is not already present. The lock is permanent
    /// and is not overridable at this layer.
    ToothLocked,

    /// The proposed type does not resolve in the procedure catalog. Carries
    /// the canonical form of the offending code.
    InvalidType {
        /// The unrecognised type code, normalised.
        procedure_type: ProcedureCode,
    },

    /// Another record on this tooth is already active in the same clinical
    /// category. Carries the contested category so the caller can direct the
    /// user to the procedure that must be completed or cancelled first.
    ActiveConflict {
        /// The category already occupied by an active procedure.
        category: ProcedureCategory,
    },
}

impl UpsertRejection {
    /// Returns the stable wire tag for this rejection.
    ///
    /// These tags are an external contract; they never change spelling.
    pub fn code(&self) -> &'static str {
        match self {
            UpsertRejection::ToothLocked => "tooth_locked",
            UpsertRejection::InvalidType { .. } => "invalid_type",
            UpsertRejection::ActiveConflict { .. } => "active_conflict",
        }
    }
}

impl std::fmt::Display for UpsertRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertRejection::ToothLocked => {
                write!(f, "tooth is locked by a completed extraction")
            }
            UpsertRejection::InvalidType { procedure_type } => {
                write!(f, "unknown procedure type: {procedure_type}")
            }
            UpsertRejection::ActiveConflict { category } => {
                write!(f, "another {category} procedure is already active on this tooth")
            }
        }
    }
}

// Hand-written so the wire shape stays flat: `ok` plus the reason-specific
// fields at the top level, exactly as callers consume it.
impl Serialize for UpsertDecision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            UpsertDecision::Accepted { locked } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("ok", &true)?;
                map.serialize_entry("locked", locked)?;
                map.end()
            }
            UpsertDecision::Rejected(rejection) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("error", rejection.code())?;
                match rejection {
                    UpsertRejection::ToothLocked => {
                        map.serialize_entry("locked", &true)?;
                    }
                    UpsertRejection::InvalidType { procedure_type } => {
                        map.serialize_entry("procedure_type", procedure_type)?;
                    }
                    UpsertRejection::ActiveConflict { category } => {
                        map.serialize_entry("category", category)?;
                    }
                }
                map.end()
            }
        }
    }
}

// ============================================================================
// The decision function
// ============================================================================

/// Validate a proposed procedure upsert against one tooth's ledger.
///
/// The proposed record must already be normalised (canonical status and type,
/// category pre-resolved); see `normalize::normalize_input`. Checks are
/// applied in a fixed order, and the first failing rule decides the outcome:
///
/// 1. **Lock.** If the ledger contains a completed extraction and the
///    proposed identifier is new to this tooth, reject with
///    [`UpsertRejection::ToothLocked`]. Updates to records already present
///    are exempt, so history on an extracted tooth stays editable.
/// 2. **Type.** If the category is unresolved (the catalog does not know the
///    type), reject with [`UpsertRejection::InvalidType`].
/// 3. **Conflict.** If the proposed status is active and another record on
///    the ledger is active in the same category, reject with
///    [`UpsertRejection::ActiveConflict`]. The record never conflicts with
///    itself, so re-submitting an active procedure is always safe.
///
/// # Arguments
///
/// * `ledger` - The tooth's full current procedure history (may be empty).
/// * `incoming` - The normalised proposed procedure.
///
/// # Returns
///
/// An [`UpsertDecision`]; acceptance carries the tooth's lock flag so
/// callers can warn when an existing record is edited on a locked tooth.
pub fn validate_tooth_upsert(
    ledger: &ToothLedger,
    incoming: &ProposedProcedure,
) -> UpsertDecision {
    let locked = ledger.is_locked();
    let is_new = ledger.get(&incoming.id).is_none();

    if locked && is_new {
        return UpsertDecision::Rejected(UpsertRejection::ToothLocked);
    }

    let Some(category) = incoming.category else {
        return UpsertDecision::Rejected(UpsertRejection::InvalidType {
            procedure_type: incoming.procedure_type.clone(),
        });
    };

    if incoming.status == ProcedureStatus::Active
        && ledger.active_in_category(category, &incoming.id).is_some()
    {
        return UpsertDecision::Rejected(UpsertRejection::ActiveConflict { category });
    }

    UpsertDecision::Accepted { locked }
}
