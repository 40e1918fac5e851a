#![forbid(unsafe_code)]
//! VaultNexus API server
//!
//! Boots the marketplace from the configured database (falling back to
//! volatile storage when it cannot be opened) and serves the REST API with a
//! development in-memory ledger.

use std::sync::Arc;
use tracing::{info, warn};
use vault_nexus::api::{run_server, Node};
use vault_nexus::config::load_config;
use vault_nexus::persistence::{Database, InMemoryPersistence, Persistence};
use vault_nexus::settlement::InMemoryLedger;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    info!(
        api_port = config.network.api_port,
        database = %config.database.path,
        "starting VaultNexus server"
    );

    // Setup persistence
    let persistence_box: Box<dyn Persistence> = match Database::open(&config.database.path) {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!(
                "Failed to open DB at {}: {}. Falling back to in-memory persistence.",
                config.database.path, e
            );
            Box::new(InMemoryPersistence::new())
        }
    };
    let persistence = Arc::new(persistence_box);

    // Load or create the marketplace
    let marketplace = match persistence.load_marketplace() {
        Ok(market) => {
            info!(
                assets = market.count_registered_assets(),
                "marketplace restored"
            );
            market
        }
        Err(e) => {
            warn!("Failed to load marketplace: {}. Starting empty.", e);
            Default::default()
        }
    };

    let node = Arc::new(Node::new(
        marketplace,
        Box::new(InMemoryLedger::new()),
        Some(persistence),
        config.ledger.faucet_amount,
    ));

    run_server(node, config.network.api_port).await
}
