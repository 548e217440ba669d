//! # DPL Core
//!
//! Core clinical logic for the dental procedure ledger.
//!
//! This crate contains the pure domain pieces and the service that drives them:
//! - Procedure catalog: static registry of type codes, labels and categories
//! - Normaliser: total coercion of loose client input into canonical values
//! - Tooth ledger: one tooth's validated procedure history
//! - Validation engine: pure accept/reject decisions with typed reasons
//! - Chart store and upsert service: versioned read-validate-write cycles
//!
//! **No transport concerns**: HTTP routing, authentication and UI rendering
//! belong to outer layers; this crate is consumed in-process. Chart file
//! parsing and tooth notation live in the `fdi` boundary crate.

pub mod catalog;
pub mod ledger;
pub mod normalize;
pub mod procedure;
pub mod store;
pub mod upsert;
pub mod validation;

// Re-export the decision surface
pub use validation::{validate_tooth_upsert, UpsertDecision, UpsertRejection};

// Re-export the domain vocabulary
pub use catalog::{CatalogEntry, ProcedureCategory, ProcedureCode};
pub use ledger::ToothLedger;
pub use procedure::{
    ProcedureDate, ProcedureInput, ProcedureRecord, ProcedureStatus, ProposedProcedure,
};

// Re-export the persistence boundary
pub use store::{
    ChartSnapshot, ChartStore, ChartVersion, MemoryChartStore, StoreError, StoreResult,
};
pub use upsert::{ChartService, UpsertError, UpsertReceipt, UpsertResult, MAX_COMMIT_ATTEMPTS};
