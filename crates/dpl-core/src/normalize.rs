//! Input normalisation for loosely-typed procedure fields.
//!
//! Clients supply status, type and date values in whatever shape their era
//! of the API produced: mixed casing, legacy status spellings, calendar-day
//! strings, epoch numbers, or garbage. Every function here is **total** (it
//! never fails and never panics) and coerces such input into the canonical
//! domain values the validation engine requires. Malformed values degrade to
//! a defined default (`Planned` for status, `None` for dates) rather than
//! rejecting the request; the only normalisation outcome that later blocks a
//! write is an unknown type code, surfaced by [`category_for_type`] returning
//! `None`.

use crate::catalog::{self, ProcedureCategory, ProcedureCode};
use crate::procedure::{ProcedureDate, ProcedureInput, ProcedureStatus, ProposedProcedure};
use chrono::NaiveDate;

/// Normalises a raw status token.
///
/// The token is trimmed and uppercased, the legacy synonyms `DONE` and
/// `IN_PROGRESS` map to their canonical equivalents, and anything
/// unrecognised (including the empty string) maps to
/// [`ProcedureStatus::Planned`].
pub fn normalize_status(raw: &str) -> ProcedureStatus {
    match raw.trim().to_uppercase().as_str() {
        "ACTIVE" | "IN_PROGRESS" => ProcedureStatus::Active,
        "COMPLETED" | "DONE" => ProcedureStatus::Completed,
        "CANCELLED" => ProcedureStatus::Cancelled,
        _ => ProcedureStatus::Planned,
    }
}

/// Normalises a raw procedure type token into a canonical code.
///
/// Trim and uppercase only; no validation. Unknown codes surface later via
/// catalog lookup failing.
pub fn normalize_type(raw: &str) -> ProcedureCode {
    ProcedureCode::new(raw)
}

/// Normalises a loose date value.
///
/// Accepted shapes, in order:
/// - absent, JSON `null`, or an empty/whitespace string → `None`;
/// - a string of the exact shape `YYYY-MM-DD` naming a real calendar day →
///   [`ProcedureDate::Day`];
/// - otherwise, a value coercible to an integral number (an integer, an
///   integral float, or a string spelling one) → [`ProcedureDate::Epoch`];
/// - anything else → `None`.
///
/// Near-misses degrade rather than being repaired: an impossible day such
/// as `2024-02-30` and a fractional number such as `17.5` both yield
/// `None`, never a rounded or re-wrapped substitute. A persisted date
/// always names a real calendar day or a whole count of epoch
/// milliseconds.
pub fn normalize_date(raw: Option<&serde_json::Value>) -> Option<ProcedureDate> {
    match raw? {
        serde_json::Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Some(day) = parse_day(trimmed) {
                return Some(ProcedureDate::Day(day));
            }
            integral(trimmed).map(ProcedureDate::Epoch)
        }
        serde_json::Value::Number(number) => {
            if let Some(millis) = number.as_i64() {
                return Some(ProcedureDate::Epoch(millis));
            }
            // Whole milliseconds only; fractional values are not truncated
            // into a timestamp the client never wrote.
            number
                .as_f64()
                .filter(|value| value.is_finite() && value.fract() == 0.0)
                .map(|value| ProcedureDate::Epoch(value as i64))
        }
        _ => None,
    }
}

/// Resolves the clinical category for a type code.
///
/// Delegates to the catalog; `None` for unknown codes, which drives the
/// `invalid_type` rejection downstream.
pub fn category_for_type(code: &ProcedureCode) -> Option<ProcedureCategory> {
    catalog::lookup(code).map(|entry| entry.category)
}

/// Normalises a full raw intake into a validated-input shape.
///
/// Composes the field normalisers over [`ProcedureInput`] and pre-resolves
/// the category, producing the [`ProposedProcedure`] the validation engine
/// consumes.
pub fn normalize_input(input: ProcedureInput) -> ProposedProcedure {
    let procedure_type = normalize_type(&input.procedure_type);
    let category = category_for_type(&procedure_type);

    ProposedProcedure {
        id: input.id,
        status: normalize_status(&input.status),
        date: normalize_date(input.date.as_ref()),
        notes: input.notes,
        meta: input.meta,
        replaces: input.replaces,
        procedure_type,
        category,
    }
}

/// Parses a string of the exact shape `YYYY-MM-DD` into a calendar day.
///
/// The shape check keeps looser chrono formats (single-digit months, signed
/// years) out; the chrono parse then rejects impossible days such as
/// `2024-02-30`.
fn parse_day(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Coerces a trimmed string to an integral number, if it spells one.
fn integral(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        .map(|value| value as i64)
}
