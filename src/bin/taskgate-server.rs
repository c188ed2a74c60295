// ABOUTME: Server binary for the taskgate OAuth 2.0 authorization server
// ABOUTME: Loads configuration, initializes logging and storage, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! # Taskgate Server Binary
//!
//! Issues authorization codes and signed bearer tokens for the task API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use taskgate::{
    config::ServerConfig, database::SqliteStore, logging, resources::ServerResources, server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "taskgate-server")]
#[command(about = "OAuth 2.0 authorization-code server issuing signed bearer tokens")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    info!("{}", config.summary());

    let store = SqliteStore::connect(&config.database.url)
        .await
        .context("Failed to open store")?;
    info!("Store initialized");

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(Arc::new(store), Arc::new(config)));

    if let Err(e) = server::run(resources, port).await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}
