mod cli;
mod config;
mod layers;
mod shared;

use crate::cli::Args;
use crate::config::ServerConfig;
use crate::layers::audit::{audit_channel, JsonlStore, NullStore, RecordStore, Registrar};
use crate::layers::commands::ServerContext;
use crate::layers::control::SimulatedControl;
use crate::layers::service::{
    init_tracing, serve, spawn_status_watcher, Deadlines, Dispatcher, ServerTasks,
};
use crate::shared::entries::EntryList;
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _file_guard = init_tracing(&args.log_dir, args.log_to_stderr)?;

    let mut config = ServerConfig::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }

    let entries = Arc::new(EntryList::new(config.entries()));
    let control = Arc::new(SimulatedControl::new(
        config.control.transition(),
        config.clusters.iter().map(|cluster| cluster.simulated_state()),
    ));
    let store: Arc<dyn RecordStore> = if args.no_store {
        tracing::warn!(event = "store.disabled", "audit records will not be persisted");
        Arc::new(NullStore::default())
    } else {
        let store = JsonlStore::open(&config.store.dir)
            .await
            .with_context(|| format!("failed to open store {}", config.store.dir.display()))?;
        tracing::info!(event = "store.opened", dir = %store.dir().display());
        Arc::new(store)
    };

    // Request handling and the watcher stop first; the registrar only drains
    // once they are gone.
    let producers = CancellationToken::new();
    let registrar_stop = CancellationToken::new();
    let (audit, audit_rx) = audit_channel(config.audit_queue_capacity);
    let registrar = Registrar::new(Arc::clone(&store), audit_rx).spawn(registrar_stop.clone());

    let ctx = ServerContext {
        entries: Arc::clone(&entries),
        control,
        poll_interval: config.control.poll_interval(),
    };
    let dispatcher = Arc::new(Dispatcher::new(ctx, audit).context("failed to build registry")?);
    let deadlines = Deadlines {
        unary: config.deadlines.unary(),
        stream: config.deadlines.stream(),
    };

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(
        event = "server.listening",
        addr = %config.listen_addr,
        clusters = entries.len(),
    );

    let watcher = spawn_status_watcher(
        Arc::clone(&dispatcher),
        config.watch_interval(),
        deadlines.unary,
        producers.clone(),
    );
    let server = tokio::spawn(serve(listener, dispatcher, deadlines, producers.clone()));
    let tasks = ServerTasks {
        server,
        watcher,
        registrar,
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!(event = "server.shutdown");
    tasks
        .shutdown(producers, registrar_stop, store.as_ref())
        .await;
    Ok(())
}
