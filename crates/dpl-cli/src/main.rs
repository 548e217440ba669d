//! Command-line tool for the dental procedure ledger.
//!
//! Operates on single-tooth chart files: initialise a chart, inspect its
//! state, dry-run a validation, or run a full upsert cycle and write the
//! updated chart back.

use clap::{Parser, Subcommand};
use dpl_core::{
    catalog, normalize, validate_tooth_upsert, ChartService, ChartStore, ChartVersion,
    MemoryChartStore, ProcedureInput, ToothLedger, UpsertDecision, UpsertError,
};
use dpl_types::ProcedureId;
use fdi::{Chart, ChartData, ToothId};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dpl")]
#[command(about = "Dental procedure ledger CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the procedure catalog
    Catalog,
    /// Write an empty chart file for one tooth
    Init {
        /// Path of the chart file to create
        #[arg(long)]
        chart: PathBuf,
        /// Patient UUID
        #[arg(long)]
        patient: String,
        /// Tooth in FDI notation (e.g. 36)
        #[arg(long)]
        tooth: String,
    },
    /// Show a chart's lock state and procedure summary
    Check {
        /// Path of the chart file
        #[arg(long)]
        chart: PathBuf,
    },
    /// Validate a proposed procedure against a chart without writing
    Validate {
        /// Path of the chart file
        #[arg(long)]
        chart: PathBuf,
        /// Procedure identifier (unique within the tooth)
        #[arg(long)]
        id: String,
        /// Procedure type code (e.g. CROWN)
        #[arg(long = "type")]
        procedure_type: String,
        /// Procedure status (defaults to PLANNED)
        #[arg(long)]
        status: Option<String>,
        /// Procedure date (YYYY-MM-DD or epoch milliseconds)
        #[arg(long)]
        date: Option<String>,
        /// Clinical notes
        #[arg(long)]
        notes: Option<String>,
        /// Identifier of a prior procedure this one supersedes
        #[arg(long)]
        replaces: Option<String>,
    },
    /// Upsert a procedure into a chart file
    Upsert {
        /// Path of the chart file
        #[arg(long)]
        chart: PathBuf,
        /// Procedure identifier (unique within the tooth)
        #[arg(long)]
        id: String,
        /// Procedure type code (e.g. CROWN)
        #[arg(long = "type")]
        procedure_type: String,
        /// Procedure status (defaults to PLANNED)
        #[arg(long)]
        status: Option<String>,
        /// Procedure date (YYYY-MM-DD or epoch milliseconds)
        #[arg(long)]
        date: Option<String>,
        /// Clinical notes
        #[arg(long)]
        notes: Option<String>,
        /// Identifier of a prior procedure this one supersedes
        #[arg(long)]
        replaces: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dpl_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Catalog) => {
            for entry in catalog::entries() {
                println!(
                    "{:<24} {:<12} {}",
                    entry.code,
                    entry.category.as_str(),
                    entry.label
                );
            }
        }
        Some(Commands::Init {
            chart,
            patient,
            tooth,
        }) => init_chart(&chart, &patient, &tooth)?,
        Some(Commands::Check { chart }) => check_chart(&chart)?,
        Some(Commands::Validate {
            chart,
            id,
            procedure_type,
            status,
            date,
            notes,
            replaces,
        }) => {
            let input = build_input(id, procedure_type, status, date, notes, replaces)?;
            validate_against_chart(&chart, input)?;
        }
        Some(Commands::Upsert {
            chart,
            id,
            procedure_type,
            status,
            date,
            notes,
            replaces,
        }) => {
            let input = build_input(id, procedure_type, status, date, notes, replaces)?;
            upsert_into_chart(&chart, input)?;
        }
        None => {
            println!("Use 'dpl --help' for commands");
        }
    }

    Ok(())
}

/// Assembles the loose intake shape from command-line fields.
///
/// Status, type and date are passed through raw; the core normaliser owns
/// their coercion. Only the identifiers are validated here, since an empty
/// identifier cannot name a record.
fn build_input(
    id: String,
    procedure_type: String,
    status: Option<String>,
    date: Option<String>,
    notes: Option<String>,
    replaces: Option<String>,
) -> anyhow::Result<ProcedureInput> {
    let replaces = match replaces {
        Some(raw) => Some(ProcedureId::new(raw)?),
        None => None,
    };

    Ok(ProcedureInput {
        id: ProcedureId::new(id)?,
        procedure_type,
        status: status.unwrap_or_default(),
        date: date.map(serde_json::Value::String),
        notes,
        meta: None,
        replaces,
    })
}

fn read_chart(path: &Path) -> anyhow::Result<ChartData> {
    let text = fs::read_to_string(path)?;
    Ok(Chart::parse(&text)?)
}

fn write_chart(path: &Path, data: &ChartData) -> anyhow::Result<()> {
    fs::write(path, Chart::render(data)?)?;
    Ok(())
}

fn init_chart(path: &Path, patient: &str, tooth: &str) -> anyhow::Result<()> {
    let data = ChartData {
        patient_id: Uuid::parse_str(patient)?,
        tooth: ToothId::parse(tooth)?,
        procedures: Vec::new(),
    };
    write_chart(path, &data)?;
    println!(
        "Initialised chart for tooth {} at {}",
        data.tooth,
        path.display()
    );
    Ok(())
}

fn check_chart(path: &Path) -> anyhow::Result<()> {
    let chart = read_chart(path)?;
    let ledger = ToothLedger::from_chart(&chart);

    println!("Patient: {}", chart.patient_id);
    println!("Tooth: {}", chart.tooth);
    println!("Locked: {}", if ledger.is_locked() { "yes" } else { "no" });

    if ledger.is_empty() {
        println!("No procedures recorded.");
    } else {
        for record in ledger.records() {
            let category = record.category().map(|c| c.as_str()).unwrap_or("UNKNOWN");
            let date = record
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into());
            println!(
                "ID: {}, Type: {}, Category: {}, Status: {}, Date: {}",
                record.id, record.procedure_type, category, record.status, date
            );
        }
    }

    Ok(())
}

fn validate_against_chart(path: &Path, input: ProcedureInput) -> anyhow::Result<()> {
    let chart = read_chart(path)?;
    let ledger = ToothLedger::from_chart(&chart);

    let decision = validate_tooth_upsert(&ledger, &normalize::normalize_input(input));
    println!("{}", serde_json::to_string(&decision)?);
    Ok(())
}

fn upsert_into_chart(path: &Path, input: ProcedureInput) -> anyhow::Result<()> {
    let chart = read_chart(path)?;
    let patient_id = chart.patient_id;
    let tooth = chart.tooth;

    // Seed a one-shot store with the chart file's current state.
    let store = MemoryChartStore::new();
    store.commit(
        patient_id,
        tooth,
        ChartVersion::zero(),
        ToothLedger::from_chart(&chart),
    )?;

    let service = ChartService::new(store);
    match service.upsert_procedure(patient_id, tooth, input) {
        Ok(receipt) => {
            let snapshot = service.store().load(patient_id, tooth)?;
            write_chart(path, &snapshot.ledger.to_chart(patient_id, tooth))?;

            let decision = UpsertDecision::Accepted {
                locked: receipt.locked,
            };
            println!("{}", serde_json::to_string(&decision)?);
            println!(
                "{} procedure {} on tooth {} (chart version {})",
                if receipt.created { "Inserted" } else { "Updated" },
                receipt.record.id,
                tooth,
                receipt.version
            );
        }
        Err(UpsertError::Rejected(rejection)) => {
            println!(
                "{}",
                serde_json::to_string(&UpsertDecision::Rejected(rejection))?
            );
        }
        Err(other) => return Err(other.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENT: &str = "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88";

    fn chart_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn init_writes_a_parseable_empty_chart() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = chart_path(&dir, "36.yaml");

        init_chart(&path, PATIENT, "36").expect("init chart");

        let chart = read_chart(&path).expect("read chart back");
        assert_eq!(chart.patient_id.to_string(), PATIENT);
        assert_eq!(chart.tooth.code(), 36);
        assert!(chart.procedures.is_empty());
    }

    #[test]
    fn upsert_writes_the_canonical_chart_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = chart_path(&dir, "36.yaml");
        init_chart(&path, PATIENT, "36").expect("init chart");

        let input = build_input(
            "p1".into(),
            " crown ".into(),
            Some("in_progress".into()),
            Some("2024-03-01".into()),
            Some("shade B1".into()),
            None,
        )
        .expect("build input");
        upsert_into_chart(&path, input).expect("upsert");

        let chart = read_chart(&path).expect("read chart back");
        assert_eq!(chart.procedures.len(), 1);
        assert_eq!(chart.procedures[0].procedure_type, "CROWN");
        assert_eq!(chart.procedures[0].status, "ACTIVE");
        assert_eq!(
            chart.procedures[0].date,
            Some(serde_json::json!("2024-03-01"))
        );
        assert_eq!(chart.procedures[0].notes.as_deref(), Some("shade B1"));
    }

    #[test]
    fn rejected_upsert_leaves_the_chart_file_untouched() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = chart_path(&dir, "48.yaml");
        init_chart(&path, PATIENT, "48").expect("init chart");

        let extraction = build_input(
            "p1".into(),
            "EXTRACTION".into(),
            Some("COMPLETED".into()),
            None,
            None,
            None,
        )
        .expect("build input");
        upsert_into_chart(&path, extraction).expect("seed extraction");
        let before = fs::read_to_string(&path).expect("read chart");

        // Locked tooth: the upsert is refused, which is not a process error.
        let crown = build_input("p2".into(), "CROWN".into(), None, None, None, None)
            .expect("build input");
        upsert_into_chart(&path, crown).expect("rejection is reported, not raised");

        let after = fs::read_to_string(&path).expect("read chart");
        assert_eq!(before, after);
    }
}
