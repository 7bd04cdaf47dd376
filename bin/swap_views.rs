//! # Swap Views
//!
//! Loads a JSON dump of raw swap state and prints one of the derived views.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin swap_views -- --state fixtures/sample_state.json sent
//! cargo run --bin swap_views -- --state fixtures/sample_state.json get O-1002
//! ```
//!
//! The state file holds four arrays: `swaps`, `assets`, `wallets`, `transactions`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use swap_state_sdk::{
    Asset, ClassifierError, Collection, EnrichedSwap, FnStatusClassifier, JoinedSwap,
    RawSnapshot, RawStateStore, Settings, Swap, SwapSelectors, Transaction, Wallet,
};

#[derive(Parser, Debug)]
#[command(name = "swap_views", about = "Print derived swap views from a raw state dump")]
struct Cli {
    /// JSON file with `swaps`, `assets`, `wallets` and `transactions` arrays
    #[arg(long)]
    state: PathBuf,

    /// Optional settings file (defaults to Config.toml + SWAP_STATE_* env)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    view: View,
}

#[derive(Subcommand, Debug)]
enum View {
    /// Dated enriched swaps, most recent first
    List,
    /// Swaps with a sent deposit or past the pending state, most recent first
    Sent,
    /// Order id -> sent transaction id
    Index,
    /// One swap by id or order id
    Get { id: String },
}

#[derive(Deserialize, Default)]
struct StateDump {
    #[serde(default)]
    swaps: Vec<Swap>,
    #[serde(default)]
    assets: Vec<Asset>,
    #[serde(default)]
    wallets: Vec<Wallet>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl StateDump {
    fn into_snapshot(self) -> RawSnapshot {
        RawSnapshot::new(
            Collection::from_records(self.swaps, |s: &Swap| s.id.clone()),
            Collection::from_records(self.assets, |a: &Asset| a.symbol.clone()),
            Collection::from_records(self.wallets, |w: &Wallet| w.id.clone()),
            Collection::from_records(self.transactions, |t: &Transaction| t.id.clone()),
        )
    }
}

/// Coarse status labels for display; real deployments plug in their own classifier.
fn demo_status(swap: &JoinedSwap) -> Result<String, ClassifierError> {
    let status = if swap.error.is_some() || swap.tx_signing_error.is_some() || swap.tx_sending_error.is_some() {
        "failed"
    } else if swap.order_status == "complete" {
        "complete"
    } else if swap.is_tx_sent() || swap.order_status == "processing" {
        "pending"
    } else {
        "created"
    };
    Ok(status.to_string())
}

fn demo_friendly_error(swap: &JoinedSwap) -> Result<Option<String>, ClassifierError> {
    Ok(swap
        .tx_signing_error
        .as_ref()
        .map(|e| format!("Failed to sign deposit: {}", e))
        .or_else(|| swap.tx_sending_error.as_ref().map(|e| format!("Failed to send deposit: {}", e)))
        .or_else(|| swap.error.clone()))
}

fn print_swap(swap: &EnrichedSwap) {
    let status = match swap.status.as_str() {
        "complete" => swap.status.as_str().green(),
        "failed" => swap.status.as_str().red(),
        _ => swap.status.as_str().yellow(),
    };
    let created = swap
        .created_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<12} {:<12} {:<10} {:<10} rate={} inverse={} wallet={} created={}",
        swap.id.as_str().bold(),
        swap.order_id,
        swap.pair,
        status,
        swap.rate,
        swap.inverse_rate.round_dp(8),
        swap.receive_wallet_id.as_deref().unwrap_or("-"),
        created,
    );
    if let Some(err) = &swap.friendly_error {
        println!("{:>14} {}", "", err.as_str().red());
    }
}

#[cfg(feature = "observability")]
fn init_observability(settings: &Settings) -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    let level: tracing::Level = settings
        .log
        .level
        .parse()
        .with_context(|| format!("invalid log level {}", settings.log.level))?;
    tracing_subscriber::fmt().json().with_max_level(level).init();
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install prometheus recorder")?;
    swap_state_sdk::metrics::describe_metrics();
    Ok(handle)
}

#[cfg(not(feature = "observability"))]
fn init_observability(settings: &Settings) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log.level.as_str()))
        .init();
    Ok(())
}

#[cfg(feature = "observability")]
fn report_metrics(handle: &metrics_exporter_prometheus::PrometheusHandle) {
    println!("{}", handle.render());
}

#[cfg(not(feature = "observability"))]
fn report_metrics(_: &()) {}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };

    let observability = init_observability(&settings)?;

    let raw = fs::read_to_string(&cli.state)
        .with_context(|| format!("failed to read state file {}", cli.state.display()))?;
    let dump: StateDump = serde_json::from_str(&raw).context("state file is not valid JSON")?;

    let snapshot = dump.into_snapshot();
    log::info!(
        "Loaded {} swaps, {} assets, {} wallets, {} transactions from {}",
        snapshot.swaps.len(),
        snapshot.assets.len(),
        snapshot.wallets.len(),
        snapshot.transactions.len(),
        cli.state.display()
    );
    let store = Arc::new(RawStateStore::new(snapshot));
    let classifier = FnStatusClassifier::new(demo_status, demo_friendly_error);
    let selectors = SwapSelectors::new(store, Arc::new(classifier), &settings);

    match cli.view {
        View::List => {
            for swap in selectors.get_all_enriched_list()?.iter() {
                print_swap(swap);
            }
        }
        View::Sent => {
            for swap in selectors.get_sent_orders_sorted()?.iter() {
                print_swap(swap);
            }
        }
        View::Index => {
            for (order_id, tx_id) in selectors.get_order_to_sent_tx_map()?.iter() {
                println!("{} -> {}", order_id.as_str().bold(), tx_id);
            }
        }
        View::Get { id } => match selectors.get_enriched_by_id(&id)? {
            Some(swap) => println!("{}", serde_json::to_string_pretty(&swap)?),
            None => println!("{} no swap with id or order id {}", "✗".red(), id),
        },
    }

    report_metrics(&observability);

    Ok(())
}
