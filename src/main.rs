use clap::Parser;
use miette::{IntoDiagnostic, Result};
use negotiator::application::catalog::{ItemCatalog, ItemView};
use negotiator::application::engine::NegotiationEngine;
use negotiator::application::projection::{NegotiationProjection, ProposalView};
use negotiator::domain::party::UserId;
use negotiator::domain::ports::{
    Directory, DirectoryBox, ItemStore, ItemStoreBox, ProposalStore, ProposalStoreBox,
};
use negotiator::infrastructure::in_memory::{
    InMemoryDirectory, InMemoryItemStore, InMemoryProposalStore,
};
use negotiator::interfaces::csv::command_reader::CommandReader;
use negotiator::interfaces::csv::ledger_writer::LedgerWriter;
use negotiator::interfaces::fixture::Fixture;
use serde::Serialize;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON fixture with the parties, users and items to negotiate over
    fixture: PathBuf,

    /// Negotiation commands CSV file
    commands: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Print every shared negotiation as seen by this user instead of the
    /// payment ledger
    #[arg(long)]
    viewer: Option<u32>,
}

struct Services {
    engine: NegotiationEngine,
    projection: NegotiationProjection,
    catalog: ItemCatalog,
    directory: DirectoryBox,
    items: ItemStoreBox,
    proposals: ProposalStoreBox,
}

impl Services {
    fn new<D, I, P>(directory: D, items: I, proposals: P) -> Self
    where
        D: Directory + Clone + 'static,
        I: ItemStore + Clone + 'static,
        P: ProposalStore + Clone + 'static,
    {
        Self {
            engine: NegotiationEngine::new(
                Box::new(directory.clone()),
                Box::new(items.clone()),
                Box::new(proposals.clone()),
            ),
            projection: NegotiationProjection::new(
                Box::new(directory.clone()),
                Box::new(items.clone()),
                Box::new(proposals.clone()),
            ),
            catalog: ItemCatalog::new(Box::new(directory.clone()), Box::new(items.clone())),
            directory: Box::new(directory),
            items: Box::new(items),
            proposals: Box::new(proposals),
        }
    }

    fn in_memory() -> Self {
        Self::new(
            InMemoryDirectory::new(),
            InMemoryItemStore::new(),
            InMemoryProposalStore::new(),
        )
    }
}

#[derive(Serialize)]
struct Negotiation {
    item: ItemView,
    proposals: Vec<ProposalView>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_services(db_path: Option<PathBuf>) -> Result<Services> {
    use negotiator::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(&path).into_diagnostic()?;
            tracing::info!(path = %path.display(), "using RocksDB storage");
            Ok(Services::new(store.clone(), store.clone(), store))
        }
        None => Ok(Services::in_memory()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_services(db_path: Option<PathBuf>) -> Result<Services> {
    if db_path.is_some() {
        warn!(
            "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
        );
    }
    Ok(Services::in_memory())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("negotiator=info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let services = open_services(cli.db_path)?;

    let fixture = Fixture::from_reader(File::open(&cli.fixture).into_diagnostic()?)
        .into_diagnostic()?;
    fixture
        .load_into(services.directory.as_ref(), services.items.as_ref())
        .await
        .into_diagnostic()?;

    let file = File::open(&cli.commands).into_diagnostic()?;
    for (index, command) in CommandReader::new(file).commands().enumerate() {
        let line = index + 2;
        match command {
            Ok(command) => {
                let user = command.user();
                if let Err(e) = command.run(&services.engine).await {
                    warn!(line, user = %user, error = %e, "command rejected");
                }
            }
            Err(e) => warn!(line, error = %e, "Error reading command"),
        }
    }

    match cli.viewer {
        Some(viewer) => {
            let viewer = UserId(viewer);
            let mut negotiations = Vec::new();
            for item in services.catalog.party_items(viewer).await.into_diagnostic()? {
                if !item.is_shared {
                    continue;
                }
                let proposals = services
                    .projection
                    .negotiation_details(viewer, item.item_id)
                    .await
                    .into_diagnostic()?;
                negotiations.push(Negotiation { item, proposals });
            }
            let stdout = io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &negotiations).into_diagnostic()?;
            println!();
        }
        None => {
            let proposals = services.proposals.all().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = LedgerWriter::new(stdout.lock());
            writer.write_proposals(proposals).into_diagnostic()?;
        }
    }

    Ok(())
}
