//! In-memory ledger of one tooth's procedure history.
//!
//! A [`ToothLedger`] is the validated, canonical view of one tooth's chart:
//! every entry has been through the normaliser, so statuses and type codes
//! are canonical and dates are typed. The validation engine reads ledgers;
//! the upsert service mutates them; the chart translation helpers move them
//! to and from the loose on-disk representation.
//!
//! Responsibilities:
//! - Hold procedure records in recorded order (oldest first)
//! - Answer the state queries validation needs (lock state, active
//!   procedures per category, record lookup)
//! - Apply accepted upserts in place, preserving entry order
//! - Translate between ledgers and loose [`ChartData`] snapshots
//!
//! Notes:
//! - Lookups are linear scans. A single tooth accumulates at most tens of
//!   procedures over a patient's lifetime, so an index would cost more than
//!   it saves.

use crate::catalog::{self, ProcedureCategory};
use crate::normalize;
use crate::procedure::{ProcedureDate, ProcedureRecord, ProcedureStatus};
use dpl_types::ProcedureId;
use fdi::{ChartData, ChartProcedure, ToothId};
use uuid::Uuid;

/// The full procedure history of a single tooth, in canonical form.
///
/// Records are kept in recorded order (oldest first), and an upsert that
/// replaces an existing record keeps that record's position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToothLedger {
    records: Vec<ProcedureRecord>,
}

impl ToothLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger from records already in canonical form.
    ///
    /// Intended for callers that have normalised records themselves (tests,
    /// mostly); chart loads should go through [`ToothLedger::from_chart`].
    pub fn from_records(records: Vec<ProcedureRecord>) -> Self {
        Self { records }
    }

    /// Returns the records in recorded order (oldest first).
    pub fn records(&self) -> &[ProcedureRecord] {
        &self.records
    }

    /// Returns the number of records in the ledger.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by procedure identifier.
    pub fn get(&self, id: &ProcedureId) -> Option<&ProcedureRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// Reports whether this tooth is locked against new procedures.
    ///
    /// A tooth locks permanently once any completed procedure of a
    /// tooth-removing type (an extraction) is on its ledger: the tooth is no
    /// longer present, so nothing new can be done to it. Planned or cancelled
    /// extractions do not lock.
    pub fn is_locked(&self) -> bool {
        self.records.iter().any(|record| {
            record.status == ProcedureStatus::Completed
                && catalog::locks_tooth(&record.procedure_type)
        })
    }

    /// Finds an active procedure in the given category, ignoring `exclude`.
    ///
    /// Used by the conflict rule: at most one active procedure per clinical
    /// category per tooth. The record being upserted is excluded so that
    /// updating an active procedure never conflicts with itself.
    ///
    /// # Arguments
    ///
    /// * `category` - Clinical category to scan for.
    /// * `exclude` - Identifier of the record being upserted.
    ///
    /// # Returns
    ///
    /// The first conflicting active record, or `None` when the category is
    /// free.
    pub fn active_in_category(
        &self,
        category: ProcedureCategory,
        exclude: &ProcedureId,
    ) -> Option<&ProcedureRecord> {
        self.records.iter().find(|record| {
            &record.id != exclude
                && record.status == ProcedureStatus::Active
                && record.category() == Some(category)
        })
    }

    /// Applies an accepted upsert to the ledger.
    ///
    /// When a record with the same identifier exists it is replaced in
    /// place, keeping its position in history; otherwise the record is
    /// appended as the newest entry.
    pub fn apply_upsert(&mut self, record: ProcedureRecord) {
        match self.records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Builds a canonical ledger from a loose chart snapshot.
    ///
    /// Every entry's status, type and date pass through the normaliser, so a
    /// chart written by the loosest legacy client still yields a ledger the
    /// validation engine can reason about. Entry order is preserved.
    pub fn from_chart(chart: &ChartData) -> Self {
        let records = chart
            .procedures
            .iter()
            .map(|entry| ProcedureRecord {
                id: entry.id.clone(),
                procedure_type: normalize::normalize_type(&entry.procedure_type),
                status: normalize::normalize_status(&entry.status),
                date: normalize::normalize_date(entry.date.as_ref()),
                notes: entry.notes.clone(),
                meta: entry.meta.clone(),
                replaces: entry.replaces.clone(),
                created_at: entry.created_at,
            })
            .collect();

        Self { records }
    }

    /// Renders the ledger as a chart snapshot for the given patient/tooth.
    ///
    /// Canonical tokens are written out: status and type as their canonical
    /// spellings, dates in their typed wire shape. Loading the result back
    /// with [`ToothLedger::from_chart`] reproduces this ledger.
    pub fn to_chart(&self, patient_id: Uuid, tooth: ToothId) -> ChartData {
        let procedures = self
            .records
            .iter()
            .map(|record| ChartProcedure {
                id: record.id.clone(),
                procedure_type: record.procedure_type.as_str().to_string(),
                status: record.status.as_str().to_string(),
                date: record.date.as_ref().map(ProcedureDate::to_json_value),
                notes: record.notes.clone(),
                meta: record.meta.clone(),
                replaces: record.replaces.clone(),
                created_at: record.created_at,
            })
            .collect();

        ChartData {
            patient_id,
            tooth,
            procedures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProcedureCode;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, procedure_type: &str, status: ProcedureStatus) -> ProcedureRecord {
        ProcedureRecord {
            id: ProcedureId::new(id).expect("valid id"),
            procedure_type: ProcedureCode::new(procedure_type),
            status,
            date: None,
            notes: None,
            meta: None,
            replaces: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap(),
        }
    }

    fn pid(id: &str) -> ProcedureId {
        ProcedureId::new(id).expect("valid id")
    }

    #[test]
    fn empty_ledger_answers_queries_safely() {
        let ledger = ToothLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
        assert!(!ledger.is_locked());
        assert!(ledger.get(&pid("p1")).is_none());
        assert!(ledger
            .active_in_category(ProcedureCategory::Prosthetic, &pid("p1"))
            .is_none());
    }

    #[test]
    fn get_finds_records_by_identifier() {
        let ledger = ToothLedger::from_records(vec![
            record("p1", "FILLING", ProcedureStatus::Completed),
            record("p2", "CROWN", ProcedureStatus::Active),
        ]);

        let found = ledger.get(&pid("p2")).expect("record present");
        assert_eq!(found.procedure_type.as_str(), "CROWN");
        assert!(ledger.get(&pid("p3")).is_none());
    }

    #[test]
    fn completed_extraction_locks_the_tooth() {
        let ledger =
            ToothLedger::from_records(vec![record("p1", "EXTRACTION", ProcedureStatus::Completed)]);
        assert!(ledger.is_locked());

        let surgical = ToothLedger::from_records(vec![record(
            "p1",
            "SURGICAL_EXTRACTION",
            ProcedureStatus::Completed,
        )]);
        assert!(surgical.is_locked());
    }

    #[test]
    fn pending_extractions_and_other_procedures_do_not_lock() {
        let planned =
            ToothLedger::from_records(vec![record("p1", "EXTRACTION", ProcedureStatus::Planned)]);
        assert!(!planned.is_locked());

        let cancelled =
            ToothLedger::from_records(vec![record("p1", "EXTRACTION", ProcedureStatus::Cancelled)]);
        assert!(!cancelled.is_locked());

        let filled =
            ToothLedger::from_records(vec![record("p1", "FILLING", ProcedureStatus::Completed)]);
        assert!(!filled.is_locked());
    }

    #[test]
    fn active_in_category_matches_category_and_status() {
        let ledger = ToothLedger::from_records(vec![
            record("p1", "CROWN", ProcedureStatus::Active),
            record("p2", "FILLING", ProcedureStatus::Active),
            record("p3", "VENEER", ProcedureStatus::Completed),
        ]);

        let hit = ledger
            .active_in_category(ProcedureCategory::Prosthetic, &pid("px"))
            .expect("active crown found");
        assert_eq!(hit.id, pid("p1"));

        // Completed records in the category do not conflict.
        let endo = ledger.active_in_category(ProcedureCategory::Endodontic, &pid("px"));
        assert!(endo.is_none());
    }

    #[test]
    fn active_in_category_excludes_the_record_being_upserted() {
        let ledger =
            ToothLedger::from_records(vec![record("p1", "CROWN", ProcedureStatus::Active)]);

        assert!(ledger
            .active_in_category(ProcedureCategory::Prosthetic, &pid("p1"))
            .is_none());
        assert!(ledger
            .active_in_category(ProcedureCategory::Prosthetic, &pid("p2"))
            .is_some());
    }

    #[test]
    fn active_in_category_skips_uncategorised_records() {
        // A legacy record with a type the catalog no longer knows.
        let ledger =
            ToothLedger::from_records(vec![record("p1", "MYSTERY", ProcedureStatus::Active)]);

        for category in [
            ProcedureCategory::Events,
            ProcedureCategory::Prosthetic,
            ProcedureCategory::Restorative,
            ProcedureCategory::Endodontic,
            ProcedureCategory::Surgical,
            ProcedureCategory::Implant,
        ] {
            assert!(ledger.active_in_category(category, &pid("px")).is_none());
        }
    }

    #[test]
    fn upsert_appends_new_records() {
        let mut ledger = ToothLedger::new();
        ledger.apply_upsert(record("p1", "FILLING", ProcedureStatus::Planned));
        ledger.apply_upsert(record("p2", "CROWN", ProcedureStatus::Planned));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.records()[0].id, pid("p1"));
        assert_eq!(ledger.records()[1].id, pid("p2"));
    }

    #[test]
    fn upsert_replaces_in_place_preserving_position() {
        let mut ledger = ToothLedger::from_records(vec![
            record("p1", "FILLING", ProcedureStatus::Planned),
            record("p2", "CROWN", ProcedureStatus::Planned),
            record("p3", "XRAY", ProcedureStatus::Completed),
        ]);

        ledger.apply_upsert(record("p2", "CROWN", ProcedureStatus::Completed));

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.records()[1].id, pid("p2"));
        assert_eq!(ledger.records()[1].status, ProcedureStatus::Completed);
        assert_eq!(ledger.records()[2].id, pid("p3"));
    }

    #[test]
    fn from_chart_normalises_loose_values() {
        let chart = ChartData {
            patient_id: Uuid::new_v4(),
            tooth: ToothId::parse("36").expect("valid tooth"),
            procedures: vec![
                ChartProcedure {
                    id: pid("p1"),
                    procedure_type: "root_canal".into(),
                    status: "done".into(),
                    date: Some(serde_json::json!("2024-03-01")),
                    notes: Some("Obturated all three canals".into()),
                    meta: None,
                    replaces: None,
                    created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap(),
                },
                ChartProcedure {
                    id: pid("p2"),
                    procedure_type: "CROWN".into(),
                    status: String::new(),
                    date: Some(serde_json::json!("not-a-date")),
                    notes: None,
                    meta: None,
                    replaces: Some(pid("p1")),
                    created_at: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
                },
            ],
        };

        let ledger = ToothLedger::from_chart(&chart);
        assert_eq!(ledger.len(), 2);

        let first = &ledger.records()[0];
        assert_eq!(first.procedure_type.as_str(), "ROOT_CANAL");
        assert_eq!(first.status, ProcedureStatus::Completed);
        assert_eq!(
            first.date,
            Some(ProcedureDate::Day("2024-03-01".parse().expect("valid day")))
        );

        let second = &ledger.records()[1];
        assert_eq!(second.status, ProcedureStatus::Planned);
        assert_eq!(second.date, None);
        assert_eq!(second.replaces, Some(pid("p1")));
    }

    #[test]
    fn to_chart_writes_canonical_tokens() {
        let patient_id = Uuid::new_v4();
        let tooth = ToothId::parse("36").expect("valid tooth");

        let mut completed = record("p1", "ROOT_CANAL", ProcedureStatus::Completed);
        completed.date = Some(ProcedureDate::Epoch(1_700_000_000_000));
        let ledger = ToothLedger::from_records(vec![completed]);

        let chart = ledger.to_chart(patient_id, tooth);
        assert_eq!(chart.patient_id, patient_id);
        assert_eq!(chart.tooth, tooth);
        assert_eq!(chart.procedures[0].procedure_type, "ROOT_CANAL");
        assert_eq!(chart.procedures[0].status, "COMPLETED");
        assert_eq!(
            chart.procedures[0].date,
            Some(serde_json::json!(1_700_000_000_000i64))
        );

        // A canonical chart loads back into the identical ledger.
        assert_eq!(ToothLedger::from_chart(&chart), ledger);
    }
}
