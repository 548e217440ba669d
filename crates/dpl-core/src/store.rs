//! Versioned chart storage boundary.
//!
//! The validation engine is pure; the race it cannot see is two callers
//! loading the same tooth's ledger, both validating successfully, and both
//! writing. This module fences that race with optimistic concurrency: every
//! load returns a version token, and a commit succeeds only when the chart
//! is still at the version the caller read. A refused commit means another
//! writer got there first and the whole read-validate-write cycle must be
//! repeated against the fresh ledger.
//!
//! Responsibilities:
//! - Define the [`ChartStore`] contract (versioned load, conditional commit)
//! - Provide [`MemoryChartStore`], the in-process reference implementation
//!
//! Notes:
//! - Versions are scoped per `(patient, tooth)` pair; charts of different
//!   teeth never contend with each other.
//! - A chart that has never been written loads as an empty ledger at
//!   [`ChartVersion::zero`], so first writes use the same conditional
//!   commit path as updates.

use crate::ledger::ToothLedger;
use fdi::ToothId;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// Version tokens and snapshots
// ============================================================================

/// Monotonic version token for one tooth's chart.
///
/// Starts at [`ChartVersion::zero`] for a chart that has never been written
/// and increments by one on every successful commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartVersion(u64);

impl ChartVersion {
    /// The version of a chart that has never been written.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// The version a successful commit at this version produces.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value, for logging and diagnostics.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChartVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One consistent read of a tooth's chart: the ledger plus the version it
/// was read at. Commits must present this version back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartSnapshot {
    /// The tooth's ledger as of `version`.
    pub ledger: ToothLedger,

    /// The version token to present on commit.
    pub version: ChartVersion,
}

// ============================================================================
// Store contract
// ============================================================================

/// Errors returned by chart stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The chart moved on since it was read; the caller must reload,
    /// revalidate and retry.
    #[error("chart version conflict: expected {expected}, found {found}")]
    VersionConflict {
        /// The version the caller read and presented.
        expected: ChartVersion,
        /// The version the store actually holds.
        found: ChartVersion,
    },

    /// The backing storage failed in a way unrelated to versioning.
    #[error("chart store backend error: {0}")]
    Backend(String),
}

/// Type alias for Results that can fail with a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Versioned storage for tooth charts.
///
/// Implementations must guarantee that for a given `(patient, tooth)` pair,
/// commits are atomic with respect to the version check: of two racing
/// commits presenting the same version, exactly one succeeds.
pub trait ChartStore {
    /// Loads the current snapshot of one tooth's chart.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - The patient the chart belongs to.
    /// * `tooth` - The tooth in FDI notation.
    ///
    /// # Returns
    ///
    /// The current [`ChartSnapshot`]; a chart never written before loads as
    /// an empty ledger at version zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the underlying storage fails.
    fn load(&self, patient_id: Uuid, tooth: ToothId) -> StoreResult<ChartSnapshot>;

    /// Commits a new ledger state, conditional on the version read.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - The patient the chart belongs to.
    /// * `tooth` - The tooth in FDI notation.
    /// * `expected` - The version from the snapshot this ledger was derived
    ///   from.
    /// * `ledger` - The full replacement ledger.
    ///
    /// # Returns
    ///
    /// The new version on success.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionConflict`] when the stored version no
    /// longer matches `expected`, or [`StoreError::Backend`] if the
    /// underlying storage fails.
    fn commit(
        &self,
        patient_id: Uuid,
        tooth: ToothId,
        expected: ChartVersion,
        ledger: ToothLedger,
    ) -> StoreResult<ChartVersion>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// In-process [`ChartStore`] backed by a map under a read-write lock.
///
/// The reference implementation: used by the CLI for single-shot runs and by
/// tests as the contention substrate. The write lock makes the
/// check-then-insert in [`ChartStore::commit`] atomic.
#[derive(Debug, Default)]
pub struct MemoryChartStore {
    charts: RwLock<HashMap<(Uuid, ToothId), (ChartVersion, ToothLedger)>>,
}

impl MemoryChartStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChartStore for MemoryChartStore {
    fn load(&self, patient_id: Uuid, tooth: ToothId) -> StoreResult<ChartSnapshot> {
        let charts = self
            .charts
            .read()
            .map_err(|_| StoreError::Backend("chart map lock poisoned".into()))?;

        Ok(match charts.get(&(patient_id, tooth)) {
            Some((version, ledger)) => ChartSnapshot {
                ledger: ledger.clone(),
                version: *version,
            },
            None => ChartSnapshot {
                ledger: ToothLedger::new(),
                version: ChartVersion::zero(),
            },
        })
    }

    fn commit(
        &self,
        patient_id: Uuid,
        tooth: ToothId,
        expected: ChartVersion,
        ledger: ToothLedger,
    ) -> StoreResult<ChartVersion> {
        let mut charts = self
            .charts
            .write()
            .map_err(|_| StoreError::Backend("chart map lock poisoned".into()))?;

        let found = charts
            .get(&(patient_id, tooth))
            .map(|(version, _)| *version)
            .unwrap_or(ChartVersion::zero());
        if found != expected {
            return Err(StoreError::VersionConflict { expected, found });
        }

        let version = found.next();
        charts.insert((patient_id, tooth), (version, ledger));
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProcedureCode;
    use crate::procedure::{ProcedureRecord, ProcedureStatus};
    use chrono::Utc;
    use dpl_types::ProcedureId;

    fn tooth(code: &str) -> ToothId {
        ToothId::parse(code).expect("valid tooth code")
    }

    fn ledger_with(id: &str) -> ToothLedger {
        ToothLedger::from_records(vec![ProcedureRecord {
            id: ProcedureId::new(id).expect("valid id"),
            procedure_type: ProcedureCode::new("FILLING"),
            status: ProcedureStatus::Planned,
            date: None,
            notes: None,
            meta: None,
            replaces: None,
            created_at: Utc::now(),
        }])
    }

    #[test]
    fn absent_chart_loads_as_empty_at_version_zero() {
        let store = MemoryChartStore::new();
        let snapshot = store
            .load(Uuid::new_v4(), tooth("36"))
            .expect("load absent chart");

        assert!(snapshot.ledger.is_empty());
        assert_eq!(snapshot.version, ChartVersion::zero());
    }

    #[test]
    fn first_commit_expects_version_zero() {
        let store = MemoryChartStore::new();
        let patient = Uuid::new_v4();

        let version = store
            .commit(patient, tooth("36"), ChartVersion::zero(), ledger_with("p1"))
            .expect("first commit");
        assert_eq!(version, ChartVersion::zero().next());

        let snapshot = store.load(patient, tooth("36")).expect("load after commit");
        assert_eq!(snapshot.version, version);
        assert_eq!(snapshot.ledger.len(), 1);
    }

    #[test]
    fn sequential_commits_bump_the_version() {
        let store = MemoryChartStore::new();
        let patient = Uuid::new_v4();

        let v1 = store
            .commit(patient, tooth("36"), ChartVersion::zero(), ledger_with("p1"))
            .expect("first commit");
        let v2 = store
            .commit(patient, tooth("36"), v1, ledger_with("p1"))
            .expect("second commit");

        assert_eq!(v1.value(), 1);
        assert_eq!(v2.value(), 2);
        assert_eq!(
            store.load(patient, tooth("36")).expect("load").version,
            v2
        );
    }

    #[test]
    fn stale_commit_is_refused_with_both_versions() {
        let store = MemoryChartStore::new();
        let patient = Uuid::new_v4();

        let v1 = store
            .commit(patient, tooth("36"), ChartVersion::zero(), ledger_with("p1"))
            .expect("seed commit");

        // A second writer still holding the pre-write snapshot.
        let err = store
            .commit(patient, tooth("36"), ChartVersion::zero(), ledger_with("p2"))
            .expect_err("stale commit must be refused");

        match err {
            StoreError::VersionConflict { expected, found } => {
                assert_eq!(expected, ChartVersion::zero());
                assert_eq!(found, v1);
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }

        // The refused write left the stored ledger untouched.
        let snapshot = store.load(patient, tooth("36")).expect("load");
        assert!(snapshot
            .ledger
            .get(&ProcedureId::new("p1").expect("valid id"))
            .is_some());
        assert!(snapshot
            .ledger
            .get(&ProcedureId::new("p2").expect("valid id"))
            .is_none());
    }

    #[test]
    fn first_commit_with_nonzero_expectation_is_refused() {
        let store = MemoryChartStore::new();

        let err = store
            .commit(
                Uuid::new_v4(),
                tooth("36"),
                ChartVersion::zero().next(),
                ledger_with("p1"),
            )
            .expect_err("absent chart is at version zero");
        assert!(matches!(
            err,
            StoreError::VersionConflict { found, .. } if found == ChartVersion::zero()
        ));
    }

    #[test]
    fn charts_are_isolated_per_patient_and_tooth() {
        let store = MemoryChartStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store
            .commit(alice, tooth("36"), ChartVersion::zero(), ledger_with("p1"))
            .expect("commit");

        // Same patient, different tooth.
        let other_tooth = store.load(alice, tooth("37")).expect("load");
        assert!(other_tooth.ledger.is_empty());
        assert_eq!(other_tooth.version, ChartVersion::zero());

        // Different patient, same tooth.
        let other_patient = store.load(bob, tooth("36")).expect("load");
        assert!(other_patient.ledger.is_empty());
    }
}
