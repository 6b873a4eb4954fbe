use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use veridoc::application::reconciler::{Reconciler, ReportFilter};
use veridoc::application::resolver::Resolver;
use veridoc::domain::payment::PaymentStatus;
use veridoc::domain::ports::{DocumentStore, PaymentStore, TranslatedStore, VerificationStore};
use veridoc::infrastructure::in_memory::{
    InMemoryDocumentStore, InMemoryPaymentLedger, InMemoryTranslatedStore,
    InMemoryVerificationStore,
};
use veridoc::interfaces::csv::row_writer::RowWriter;
use veridoc::interfaces::csv::table_reader::TableReader;

/// Offline order-ledger tooling: resolves a user's document states or emits a
/// reconciled financial report from CSV snapshots of the four record sets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding documents.csv, verifications.csv, translations.csv
    /// and payments.csv
    snapshot_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved document projection for one user
    Resolve {
        #[arg(long)]
        user: u64,
    },
    /// Print the reconciled financial report
    Report {
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        status: Option<PaymentStatus>,
        #[arg(long)]
        user: Option<u64>,
    },
}

fn load_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).into_diagnostic()?;
    let mut records = Vec::new();
    for result in TableReader::new(file).records() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => eprintln!("Error reading record from {}: {}", path.display(), e),
        }
    }
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let documents = InMemoryDocumentStore::new();
    let verifications = InMemoryVerificationStore::new();
    let translations = InMemoryTranslatedStore::new();
    let payments = InMemoryPaymentLedger::new();

    for doc in load_table(&cli.snapshot_dir.join("documents.csv"))? {
        documents.insert(doc).await.into_diagnostic()?;
    }
    for record in load_table(&cli.snapshot_dir.join("verifications.csv"))? {
        verifications.insert(record).await.into_diagnostic()?;
    }
    for record in load_table(&cli.snapshot_dir.join("translations.csv"))? {
        translations.insert(record).await.into_diagnostic()?;
    }
    for payment in load_table(&cli.snapshot_dir.join("payments.csv"))? {
        payments.insert(payment).await.into_diagnostic()?;
    }

    let stdout = io::stdout();
    match cli.command {
        Command::Resolve { user } => {
            let resolver = Resolver::new(
                Box::new(documents),
                Box::new(verifications),
                Box::new(translations),
                Box::new(payments),
            );
            let views = resolver.resolve_user_documents(user).await.into_diagnostic()?;
            RowWriter::new(stdout.lock())
                .write_rows(views)
                .into_diagnostic()?;
        }
        Command::Report {
            from,
            to,
            status,
            user,
        } => {
            let reconciler = Reconciler::new(
                Box::new(documents),
                Box::new(verifications),
                Box::new(translations),
                Box::new(payments),
            );
            let filter = ReportFilter {
                from,
                to,
                payment_status: status,
                user_id: user,
            };
            let rows = reconciler.reconcile(&filter).await.into_diagnostic()?;
            RowWriter::new(stdout.lock())
                .write_rows(rows)
                .into_diagnostic()?;
        }
    }

    Ok(())
}
