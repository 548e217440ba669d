//! Read-validate-write service for procedure upserts.
//!
//! [`ChartService`] is the orchestration layer over the pure pieces: it
//! loads a tooth's chart from a [`ChartStore`], normalises the raw input,
//! asks the validation engine for a decision, and commits the updated ledger
//! conditionally on the version it read. A commit refused for a version
//! conflict means another writer won the race; the service repeats the whole
//! cycle against the fresh ledger, a bounded number of times, so a decision
//! is never applied to a ledger it was not computed from.
//!
//! Responsibilities:
//! - Drive the load → normalise → validate → commit cycle for one upsert
//! - Preserve record identity across updates (stable `created_at`)
//! - Retry version conflicts up to [`MAX_COMMIT_ATTEMPTS`] times
//! - Log rejections, locked-tooth edits and contention
//!
//! Notes:
//! - Rejections are terminal: a rejected upsert performs no write and no
//!   retry, since re-running an unchanged request against an unchanged
//!   ledger cannot change the decision.

use crate::normalize;
use crate::procedure::{ProcedureInput, ProcedureRecord};
use crate::store::{ChartStore, ChartVersion, StoreError};
use crate::validation::{self, UpsertDecision, UpsertRejection};
use chrono::Utc;
use fdi::ToothId;
use uuid::Uuid;

/// How many times one upsert will repeat its read-validate-write cycle
/// before giving up on a contended chart.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Errors returned by [`ChartService::upsert_procedure`].
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// The validation engine refused the write. Carries the typed reason;
    /// no state was modified.
    #[error("procedure upsert rejected: {0}")]
    Rejected(UpsertRejection),

    /// Every commit attempt lost its race against other writers.
    #[error("chart under contention: gave up after {attempts} attempts")]
    Contention {
        /// Number of full read-validate-write cycles attempted.
        attempts: u32,
    },

    /// The chart store failed for a reason other than versioning.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for Results that can fail with an [`UpsertError`].
pub type UpsertResult<T> = Result<T, UpsertError>;

/// Proof of a successful upsert.
#[derive(Clone, Debug)]
pub struct UpsertReceipt {
    /// The canonical record as committed.
    pub record: ProcedureRecord,

    /// The chart version the commit produced.
    pub version: ChartVersion,

    /// Whether the tooth was locked at commit time. `true` here means an
    /// existing record on an extracted tooth was edited.
    pub locked: bool,

    /// `true` when the record was newly inserted, `false` for an update.
    pub created: bool,
}

/// Upsert orchestration over a [`ChartStore`].
pub struct ChartService<S: ChartStore> {
    store: S,
}

impl<S: ChartStore> ChartService<S> {
    /// Creates a service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upserts one procedure into one tooth's chart.
    ///
    /// The raw input is normalised once; the read-validate-write cycle then
    /// runs until a commit lands, the engine rejects, or
    /// [`MAX_COMMIT_ATTEMPTS`] cycles have lost their race. An update keeps
    /// the existing record's `created_at` and its position in the ledger; an
    /// insert stamps the current time.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - The patient whose chart is being written.
    /// * `tooth` - The tooth in FDI notation.
    /// * `input` - The raw procedure fields as supplied by the client.
    ///
    /// # Returns
    ///
    /// An [`UpsertReceipt`] describing the committed record.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::Rejected`] when validation refuses the write,
    /// [`UpsertError::Contention`] when every attempt lost a version race,
    /// or [`UpsertError::Store`] when the store fails outright.
    pub fn upsert_procedure(
        &self,
        patient_id: Uuid,
        tooth: ToothId,
        input: ProcedureInput,
    ) -> UpsertResult<UpsertReceipt> {
        let proposed = normalize::normalize_input(input);

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let snapshot = self.store.load(patient_id, tooth)?;

            let locked = match validation::validate_tooth_upsert(&snapshot.ledger, &proposed) {
                UpsertDecision::Accepted { locked } => locked,
                UpsertDecision::Rejected(rejection) => {
                    tracing::warn!(
                        "upsert of procedure {} to tooth {} rejected: {}",
                        proposed.id,
                        tooth,
                        rejection
                    );
                    return Err(UpsertError::Rejected(rejection));
                }
            };

            let existing = snapshot.ledger.get(&proposed.id);
            let created = existing.is_none();
            let created_at = existing.map(|record| record.created_at).unwrap_or_else(Utc::now);

            if locked && !created {
                tracing::warn!(
                    "editing procedure {} on locked tooth {} of patient {}",
                    proposed.id,
                    tooth,
                    patient_id
                );
            }

            let record = ProcedureRecord {
                id: proposed.id.clone(),
                procedure_type: proposed.procedure_type.clone(),
                status: proposed.status,
                date: proposed.date,
                notes: proposed.notes.clone(),
                meta: proposed.meta.clone(),
                replaces: proposed.replaces.clone(),
                created_at,
            };

            let mut ledger = snapshot.ledger;
            ledger.apply_upsert(record.clone());

            match self.store.commit(patient_id, tooth, snapshot.version, ledger) {
                Ok(version) => {
                    tracing::debug!(
                        "committed procedure {} to tooth {} at version {}",
                        record.id,
                        tooth,
                        version
                    );
                    return Ok(UpsertReceipt {
                        record,
                        version,
                        locked,
                        created,
                    });
                }
                Err(StoreError::VersionConflict { found, .. }) => {
                    tracing::warn!(
                        "version conflict on tooth {} (attempt {} of {}): chart moved to {}",
                        tooth,
                        attempt,
                        MAX_COMMIT_ATTEMPTS,
                        found
                    );
                }
                Err(other) => return Err(UpsertError::Store(other)),
            }
        }

        Err(UpsertError::Contention {
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }
}
