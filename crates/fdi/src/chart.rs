//! Tooth chart wire models and translation helpers.
//!
//! This module provides both domain-level types and wire models for tooth
//! chart snapshots: the full procedure history of one tooth of one patient,
//! stored as a YAML file.
//!
//! Responsibilities:
//! - Define public domain-level types for external API use
//! - Define a strict wire model (`ChartWire`) for serialisation/deserialisation
//! - Provide translation helpers between domain primitives and the wire model
//! - Validate chart structure and enforce required fields
//!
//! Notes:
//! - Chart *structure* is strict: unknown keys, malformed or duplicate
//!   identifiers and invalid tooth codes are rejected with a path to the
//!   failing field.
//! - Procedure field *values* (`procedure_type`, `status`, `date`) are
//!   carried loosely as raw strings/JSON values; normalising them is the
//!   core normalizer's job, so legacy spellings such as `done` or
//!   `IN_PROGRESS` never make a chart unreadable.

use crate::tooth::ToothId;
use crate::FdiError;
use chrono::{DateTime, Utc};
use dpl_types::ProcedureId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for one tooth's chart snapshot.
///
/// This struct represents the persisted procedure history of a single tooth
/// in a format independent of the on-disk YAML shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartData {
    /// The patient this chart belongs to.
    pub patient_id: Uuid,

    /// The tooth this chart belongs to, in FDI notation.
    pub tooth: ToothId,

    /// Procedure entries in recorded order (oldest first).
    pub procedures: Vec<ChartProcedure>,
}

/// One procedure entry as stored in a chart file.
///
/// `procedure_type`, `status` and `date` are intentionally loose: they hold
/// whatever the writing client supplied, and the core normalizer coerces
/// them into canonical enumerations when the chart is loaded for validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartProcedure {
    /// Identifier unique within this tooth's chart.
    pub id: ProcedureId,

    /// Raw procedure type token (for example `CROWN`, `extraction`).
    pub procedure_type: String,

    /// Raw status token; empty when the writing client omitted it.
    pub status: String,

    /// Raw date value: a `YYYY-MM-DD` string, an epoch number, or anything
    /// else a loose client wrote. Absent when never set.
    pub date: Option<serde_json::Value>,

    /// Free-text clinical notes.
    pub notes: Option<String>,

    /// Opaque structured payload attached by the writing client.
    pub meta: Option<serde_json::Value>,

    /// Identifier of a prior entry this one supersedes.
    pub replaces: Option<ProcedureId>,

    /// When this entry was first accepted into the chart.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Public Chart operations
// ============================================================================

/// Chart snapshot operations.
///
/// This is a zero-sized type used for namespacing chart-related operations.
/// All methods are associated functions.
pub struct Chart;

impl Chart {
    /// Parse a tooth chart from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path"
    /// (e.g. `procedures[2].created_at`) to the failing field when the YAML
    /// does not match the wire schema.
    ///
    /// # Arguments
    ///
    /// * `yaml_text` - YAML text expected to represent a chart mapping.
    ///
    /// # Returns
    ///
    /// Returns a [`ChartData`] with domain-level fields extracted from the
    /// chart.
    ///
    /// # Errors
    ///
    /// Returns [`FdiError`] if:
    /// - the YAML does not represent a valid chart,
    /// - any field has an unexpected type,
    /// - any unknown keys are present (due to `#[serde(deny_unknown_fields)]`),
    /// - `patient_id` is not a valid UUID,
    /// - `tooth` is not a valid FDI code,
    /// - any procedure identifier is empty,
    /// - two procedure entries share a `procedure_id`.
    pub fn parse(yaml_text: &str) -> Result<ChartData, FdiError> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, ChartWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FdiError::Translation(format!(
                    "Chart schema mismatch at {path}: {source}"
                )));
            }
        };

        // Convert wire format to domain types
        wire_to_domain(wire)
    }

    /// Render a tooth chart as YAML text.
    ///
    /// This converts domain-level [`ChartData`] into wire format and
    /// serializes to YAML.
    ///
    /// # Arguments
    ///
    /// * `data` - Chart data containing all fields.
    ///
    /// # Returns
    ///
    /// Returns a YAML string representation of the chart.
    ///
    /// # Errors
    ///
    /// Returns [`FdiError`] if serialization fails.
    pub fn render(data: &ChartData) -> Result<String, FdiError> {
        let wire: ChartWire = domain_to_wire(data);
        serde_yaml::to_string(&wire)
            .map_err(|e| FdiError::Translation(format!("Failed to serialize chart: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a tooth chart for on-disk YAML.
///
/// This is the exact structure that will be serialized to/from YAML.
/// All fields use `#[serde(deny_unknown_fields)]` for strict validation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ChartWire {
    pub patient_id: String,
    pub tooth: String,
    #[serde(default)]
    pub procedures: Vec<ProcedureWire>,
}

/// Wire representation of one procedure entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ProcedureWire {
    pub procedure_id: String,
    pub procedure_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Convert wire format chart to domain types.
///
/// This performs validation and conversion of string identifiers to proper
/// types, and enforces that procedure identifiers are unique within the
/// chart.
fn wire_to_domain(wire: ChartWire) -> Result<ChartData, FdiError> {
    // Parse patient_id as UUID
    let patient_id = Uuid::parse_str(&wire.patient_id).map_err(|_| {
        FdiError::InvalidUuid(format!("Invalid UUID in patient_id: {}", wire.patient_id))
    })?;

    // Parse tooth as an FDI code
    let tooth = ToothId::parse(&wire.tooth)?;

    // Convert procedures, validating identifiers
    let mut procedures: Vec<ChartProcedure> = Vec::with_capacity(wire.procedures.len());
    for (idx, p) in wire.procedures.into_iter().enumerate() {
        let id = ProcedureId::new(&p.procedure_id).map_err(|_| {
            FdiError::Translation(format!("Empty procedure_id in procedures[{idx}]"))
        })?;

        // Identifiers key upserts; a chart never holds the same id twice.
        if procedures.iter().any(|prior| prior.id == id) {
            return Err(FdiError::Translation(format!(
                "Duplicate procedure_id {id} in procedures[{idx}]"
            )));
        }

        let replaces = match p.replaces {
            Some(raw) => Some(ProcedureId::new(&raw).map_err(|_| {
                FdiError::Translation(format!("Empty replaces id in procedures[{idx}]"))
            })?),
            None => None,
        };

        procedures.push(ChartProcedure {
            id,
            procedure_type: p.procedure_type,
            status: p.status.unwrap_or_default(),
            date: p.date,
            notes: p.notes,
            meta: p.meta,
            replaces,
            created_at: p.created_at,
        });
    }

    Ok(ChartData {
        patient_id,
        tooth,
        procedures,
    })
}

/// Convert domain types to wire format chart.
fn domain_to_wire(data: &ChartData) -> ChartWire {
    ChartWire {
        patient_id: data.patient_id.to_string(),
        tooth: data.tooth.to_string(),
        procedures: data
            .procedures
            .iter()
            .map(|p| ProcedureWire {
                procedure_id: p.id.to_string(),
                procedure_type: p.procedure_type.clone(),
                status: if p.status.is_empty() {
                    None
                } else {
                    Some(p.status.clone())
                },
                date: p.date.clone(),
                notes: p.notes.clone(),
                meta: p.meta.clone(),
                replaces: p.replaces.as_ref().map(|r| r.to_string()),
                created_at: p.created_at,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_sample_yaml() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "36"
procedures:
  - procedure_id: p1
    procedure_type: ROOT_CANAL
    status: done
    date: "2024-03-01"
    notes: "Obturated all three canals"
    created_at: "2024-03-01T10:15:00Z"
  - procedure_id: p2
    procedure_type: CROWN
    status: in_progress
    date: 1700000000000
    replaces: p1
    created_at: "2024-04-02T09:00:00Z"
"#;

        let chart = Chart::parse(input).expect("parse yaml");
        let output = Chart::render(&chart).expect("render chart");
        let reparsed = Chart::parse(&output).expect("reparse yaml");
        assert_eq!(chart, reparsed);
    }

    #[test]
    fn preserves_loose_values_verbatim() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "36"
procedures:
  - procedure_id: p1
    procedure_type: crown
    status: DONE
    date: 1700000000000
    created_at: "2024-03-01T10:15:00Z"
  - procedure_id: p2
    procedure_type: FILLING
    date: not-a-date
    created_at: "2024-03-01T10:20:00Z"
"#;

        let chart = Chart::parse(input).expect("parse yaml");
        assert_eq!(chart.procedures[0].procedure_type, "crown");
        assert_eq!(chart.procedures[0].status, "DONE");
        assert_eq!(
            chart.procedures[0].date,
            Some(serde_json::json!(1700000000000u64))
        );
        // Omitted status comes through as empty, garbage dates untouched.
        assert_eq!(chart.procedures[1].status, "");
        assert_eq!(chart.procedures[1].date, Some(serde_json::json!("not-a-date")));
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "36"
procedures: []
unexpected_key: should_fail
"#;

        let err = Chart::parse(input).expect_err("should reject unknown key");
        match err {
            FdiError::Translation(msg) => {
                assert!(msg.contains("unexpected_key"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn strict_validation_rejects_wrong_types() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "36"
procedures:
  - procedure_id: p1
    procedure_type: CROWN
    created_at: "not a timestamp"
"#;

        let err = Chart::parse(input).expect_err("should reject wrong type");
        match err {
            FdiError::Translation(msg) => {
                assert!(msg.contains("created_at"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_patient_id() {
        let input = r#"patient_id: "not-a-valid-uuid"
tooth: "36"
procedures: []
"#;

        let err = Chart::parse(input).expect_err("should reject invalid patient_id");
        match err {
            FdiError::InvalidUuid(msg) => {
                assert!(msg.contains("patient_id"));
            }
            other => panic!("expected InvalidUuid error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_tooth_code() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "99"
procedures: []
"#;

        let err = Chart::parse(input).expect_err("should reject invalid tooth code");
        assert!(matches!(err, FdiError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_procedure_id() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "36"
procedures:
  - procedure_id: "   "
    procedure_type: CROWN
    created_at: "2024-03-01T10:15:00Z"
"#;

        let err = Chart::parse(input).expect_err("should reject empty procedure_id");
        match err {
            FdiError::Translation(msg) => {
                assert!(msg.contains("procedures[0]"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_procedure_ids() {
        // The second id trims to the same value as the first.
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "36"
procedures:
  - procedure_id: p1
    procedure_type: ROOT_CANAL
    status: COMPLETED
    created_at: "2024-03-01T10:15:00Z"
  - procedure_id: " p1 "
    procedure_type: CROWN
    created_at: "2024-04-02T09:00:00Z"
"#;

        let err = Chart::parse(input).expect_err("should reject duplicate procedure_id");
        match err {
            FdiError::Translation(msg) => {
                assert!(msg.contains("Duplicate procedure_id p1"));
                assert!(msg.contains("procedures[1]"));
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_minimal_chart_without_procedures() {
        let input = r#"patient_id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
tooth: "11"
"#;

        let chart = Chart::parse(input).expect("should parse minimal chart");
        assert_eq!(
            chart.patient_id.to_string(),
            "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
        );
        assert_eq!(chart.tooth.code(), 11);
        assert!(chart.procedures.is_empty());
    }
}
