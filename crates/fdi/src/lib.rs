//! FDI wire/boundary support for the dental procedure ledger.
//!
//! This crate provides **tooth notation** and **format/translation helpers** for
//! on-disk tooth chart files:
//! - FDI (ISO 3950) two-digit tooth numbering ([`ToothId`])
//! - YAML chart snapshots (one file per tooth of one patient)
//!
//! This crate focuses on:
//! - FDI notation alignment (quadrant/position arithmetic, dentition rules)
//! - serialisation/deserialisation of chart snapshots
//! - translation between domain primitives and the wire structs
//!
//! Clinical meaning (catalog classification, status lifecycle, lock and
//! conflict rules) lives in `dpl-core`. Chart field *values* for procedure
//! type, status and date are deliberately carried loosely here: the core
//! normalizer owns their coercion, so a chart written by an older client is
//! readable without this crate rejecting it.

pub mod chart;
pub mod tooth;

// Re-export facades
pub use chart::Chart;

// Re-export public domain-level types
pub use chart::{ChartData, ChartProcedure};
pub use tooth::{Arch, Dentition, ToothId};

/// Errors returned by the `fdi` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FdiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

/// Type alias for Results that can fail with a [`FdiError`].
pub type FdiResult<T> = Result<T, FdiError>;
