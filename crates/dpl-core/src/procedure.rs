//! Procedure domain model.
//!
//! The ledger reasons about small, explicit domain structs: a canonical
//! status lifecycle, a loss-tolerant date value, the stored
//! [`ProcedureRecord`], and the two shapes a record passes through on its way
//! in ([`ProcedureInput`] raw from a client, [`ProposedProcedure`] after
//! normalisation with its category pre-resolved).
//!
//! Wire/serialisation concerns (the YAML chart shape, loose legacy field
//! values) live in the `fdi` crate; this module holds only what the
//! validation engine reasons about.

use crate::catalog::{self, ProcedureCategory, ProcedureCode};
use chrono::{DateTime, NaiveDate, Utc};
use dpl_types::ProcedureId;
use std::fmt;

/// Status lifecycle of a procedure record.
///
/// Records are never hard-deleted; removal is expressed as a transition to
/// [`Cancelled`](Self::Cancelled). Legacy spellings (`DONE`, `IN_PROGRESS`)
/// are accepted on input by the normalizer, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcedureStatus {
    /// Proposed but not yet started. The default for missing or
    /// unrecognised status input.
    #[default]
    Planned,
    /// Treatment in progress. At most one active procedure per category may
    /// exist on a tooth.
    Active,
    /// Treatment finished. A completed extraction locks the tooth.
    Completed,
    /// Abandoned; kept in the ledger for audit.
    Cancelled,
}

impl ProcedureStatus {
    /// Returns the canonical uppercase token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ProcedureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A procedure date in one of the two precisions clients supply.
///
/// Different callers record either a calendar day (`YYYY-MM-DD`) or an
/// absolute epoch-milliseconds timestamp; both are preserved as given rather
/// than coerced to one precision. Values that are neither are dropped by the
/// normalizer (`None`), never rejected: the date is a non-critical field and
/// precision loss is preferred over hard failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcedureDate {
    /// A calendar day with no time component.
    Day(NaiveDate),
    /// An absolute timestamp in epoch milliseconds.
    Epoch(i64),
}

impl ProcedureDate {
    /// Renders this date as the loose JSON value the chart wire carries:
    /// a `YYYY-MM-DD` string for days, a number for epoch timestamps.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Day(day) => serde_json::Value::String(day.to_string()),
            Self::Epoch(millis) => serde_json::Value::from(*millis),
        }
    }
}

impl fmt::Display for ProcedureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(day) => write!(f, "{day}"),
            Self::Epoch(millis) => write!(f, "{millis}"),
        }
    }
}

impl serde::Serialize for ProcedureDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Day(day) => serializer.serialize_str(&day.to_string()),
            Self::Epoch(millis) => serializer.serialize_i64(*millis),
        }
    }
}

/// One entry in a tooth's ledger.
///
/// The category is deliberately not a field: it is recomputed from
/// `procedure_type` via the catalog at validation time, so a catalog change
/// never leaves stale classifications in stored ledgers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcedureRecord {
    /// Identifier unique within the tooth's ledger. Re-submitting an existing
    /// identifier updates that record in place.
    pub id: ProcedureId,

    /// Canonical procedure type code. May no longer resolve in the catalog
    /// for records written by older clients.
    pub procedure_type: ProcedureCode,

    /// Canonical status.
    pub status: ProcedureStatus,

    /// Normalised date, when one was supplied and intelligible.
    pub date: Option<ProcedureDate>,

    /// Free-text clinical notes.
    pub notes: Option<String>,

    /// Opaque structured payload attached by the writing client. Carried
    /// through untouched.
    pub meta: Option<serde_json::Value>,

    /// Identifier of a prior record this one supersedes.
    pub replaces: Option<ProcedureId>,

    /// When this record was first accepted into the ledger. Preserved across
    /// in-place updates.
    pub created_at: DateTime<Utc>,
}

impl ProcedureRecord {
    /// Returns the clinical category of this record, recomputed from its
    /// type code. `None` when the code no longer resolves in the catalog.
    pub fn category(&self) -> Option<ProcedureCategory> {
        catalog::lookup(&self.procedure_type).map(|entry| entry.category)
    }
}

/// Raw intake shape for a proposed procedure, as received from a client.
///
/// Status, type and date are loose values exactly as the client sent them;
/// the normalizer owns their coercion. The identifier is already validated
/// because an empty identifier would make upsert semantics ambiguous at
/// every later step.
#[derive(Clone, Debug)]
pub struct ProcedureInput {
    /// Identifier chosen by the caller, unique within the tooth's ledger.
    pub id: ProcedureId,
    /// Raw procedure type token (any casing or surrounding whitespace).
    pub procedure_type: String,
    /// Raw status token; empty when omitted.
    pub status: String,
    /// Raw date value: a string, a number, or anything else a loose client
    /// sent. `None` when never set.
    pub date: Option<serde_json::Value>,
    /// Free-text clinical notes.
    pub notes: Option<String>,
    /// Opaque structured payload.
    pub meta: Option<serde_json::Value>,
    /// Identifier of a prior record this one supersedes.
    pub replaces: Option<ProcedureId>,
}

/// A proposed procedure after normalisation, ready for validation.
///
/// The category is pre-resolved from the type code; `None` means the code is
/// unknown to the catalog, which the validation engine reports as an
/// `invalid_type` rejection.
#[derive(Clone, Debug)]
pub struct ProposedProcedure {
    /// Identifier unique within the tooth's ledger.
    pub id: ProcedureId,
    /// Canonical procedure type code.
    pub procedure_type: ProcedureCode,
    /// Category resolved from the catalog, absent for unknown codes.
    pub category: Option<ProcedureCategory>,
    /// Canonical status.
    pub status: ProcedureStatus,
    /// Normalised date.
    pub date: Option<ProcedureDate>,
    /// Free-text clinical notes.
    pub notes: Option<String>,
    /// Opaque structured payload.
    pub meta: Option<serde_json::Value>,
    /// Identifier of a prior record this one supersedes.
    pub replaces: Option<ProcedureId>,
}
