mod cli;
mod commands;

use crate::cli::{Command, StorageBackendArg, CLI};
use crate::commands::App;
use clap::Parser;
use snip_generator::RandomGenerator;
use snip_shortener::ShortenerService;
use snip_storage::{FileStore, InMemoryStore, KeyValueStore, KvRecordStore};
use snip_telemetry::{LogJournal, TelemetryConfig};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let journal = LogJournal::new();
    snip_telemetry::init(
        &TelemetryConfig::builder()
            .format(config.log_format.into())
            .filter(config.log_filter.clone())
            .journal(journal.clone())
            .build(),
    )?;

    info!(
        storage_backend = %config.storage,
        data_dir = %config.data_dir.display(),
        "application started"
    );

    let kv: Arc<dyn KeyValueStore> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(InMemoryStore::new()),
        StorageBackendArg::File => Arc::new(FileStore::open(&config.data_dir).await?),
    };

    let service = ShortenerService::new(KvRecordStore::new(Arc::clone(&kv)), RandomGenerator::new());
    let app = App::new(Arc::new(service), Arc::clone(&kv), config.base_url);

    let outcome = match config.command {
        Command::Session => app.session().await,
        command => app.run(command).await.map(|output| print!("{output}")),
    };

    // the journal is flushed even when the command failed
    if let Err(e) = journal.persist(kv.as_ref()).await {
        warn!(error = %e, "failed to persist application logs");
    }

    outcome
}
