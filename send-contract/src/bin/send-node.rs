//! Send contract node binary
//!
//! Applies protobuf-encoded transactions from files to a RocksDB state
//! store: each one is admitted with CheckTx, then executed with DeliverTx.
//!
//! ```text
//! SEND_CONFIG=send.toml send-node tx1.bin tx2.bin
//! ```

use anyhow::Context;
use prost::Message as _;
use send_contract::{
    contract::{CheckRequest, DeliverRequest},
    metrics::Metrics,
    Config, Contract, Plugin, RocksStore, Transaction,
};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("SEND_CONFIG") {
        tracing::info!("Loading config from: {}", config_path);
        Config::from_file(&config_path)?
    } else {
        Config::from_env()?
    };

    tracing::info!("Starting {}", config.service_name);

    let store = RocksStore::open(&config)?;
    let mut contract = Contract::new(store);
    if config.metrics.enabled {
        contract = contract.with_metrics(Metrics::new()?);
    }

    let mut applied = 0usize;
    let mut rejected = 0usize;

    for path in std::env::args().skip(1) {
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path))?;
        let tx = Transaction::decode(bytes.as_slice())
            .with_context(|| format!("decoding transaction {}", path))?;

        let check = contract.check_tx(CheckRequest { tx: tx.clone() });
        if let Some(e) = check.error {
            tracing::warn!(path = %path, code = e.code(), "CheckTx rejected: {}", e);
            rejected += 1;
            continue;
        }

        let deliver = contract.deliver_tx(DeliverRequest { tx });
        match deliver.error {
            None => {
                tracing::info!(path = %path, signers = check.authorized_signers.len(), "Transaction applied");
                applied += 1;
            }
            Some(e) => {
                tracing::warn!(path = %path, code = e.code(), "DeliverTx failed: {}", e);
                rejected += 1;
            }
        }
    }

    tracing::info!(applied, rejected, "Done");

    if let Some(metrics) = contract.metrics() {
        print!("{}", metrics.render()?);
    }

    Ok(())
}
