mod cli;
mod commands;
mod config;
mod dispatcher;
mod transport;

use anyhow::Context;
use clap::Parser;
use cli::Args;
use commands::ClientContext;
use config::ClientConfig;
use dispatcher::ClientDispatcher;
use protocol::Command;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use transport::TcpTransport;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    let path = match args.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = ClientConfig::load_or_create(&path)?;
    let command = Command::new(
        config.user.clone(),
        args.command.unwrap_or_default(),
        args.opts,
    );
    let transport = Arc::new(TcpTransport::new(
        config.addr(),
        Duration::from_secs(args.unary_timeout_secs),
        Duration::from_secs(args.stream_timeout_secs),
    ));
    let dispatcher = ClientDispatcher::new(ClientContext::new(config, path), transport, args.unary)
        .context("failed to build registry")?;

    match dispatcher.dispatch(&command).await {
        Ok(response) => {
            if !response.cmd_result.is_empty() {
                println!("{}", response.cmd_result);
            }
            if response.is_error() {
                eprintln!("{}", response.cmd_error);
            }
            println!(
                "Command completed in {}",
                humantime::format_duration(response.exec_time)
            );
            Ok(if response.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry().with(filter).with(layer).init();
}
