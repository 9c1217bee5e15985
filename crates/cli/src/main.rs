//! Command-line entry point for the cross-venue arbitrage scanner (SPEC_FULL.md §6 "CLI
//! (collaborator)"). Runs a single scan and prints the ranked opportunity list, or starts the
//! realtime engine against a fixed set of pair subscriptions and streams opportunity events.
//!
//! Exit code is 0 on completion regardless of per-event fetch outcomes; non-zero only on
//! unrecoverable startup failure (missing/malformed configuration), per SPEC_FULL.md §6.

use anyhow::{Context, Result};
use arb_core::{ConfigLoader, ScannerConfig};
use arb_matching::AliasTable;
use arb_realtime::{EngineConfig, PairSubscription, RealtimeEngine, RealtimeEvent};
use arb_scanner::{Pipeline, PipelineConfig, Scanner};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use venue_kalshi::auth::{KalshiAuth, KalshiAuthConfig};
use venue_kalshi::websocket::WebSocketConfig as KWebSocketConfig;
use venue_kalshi::{KalshiClient, KalshiClientConfig};
use venue_polymarket::websocket::WebSocketConfig as PWebSocketConfig;
use venue_polymarket::{PolymarketClient, PolymarketClientConfig};

#[derive(Parser)]
#[command(name = "arb-scanner")]
#[command(about = "Cross-venue arbitrage scanner for Polymarket and Kalshi binary markets", long_about = None)]
struct Cli {
    /// Optional config profile, e.g. "production" loads `config/Scanner.production.toml`.
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scan and print the ranked opportunity list as JSON.
    Scan {
        /// Force a fresh scan even if a cached result would otherwise be served.
        #[arg(long)]
        force_refresh: bool,
    },
    /// Stream realtime opportunities for a fixed set of pair subscriptions.
    Realtime {
        /// Path to a JSON file of `PairSubscription` entries.
        #[arg(long)]
        pairs: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(profile),
        None => ConfigLoader::load(),
    }
    .context("failed to load scanner configuration")?;

    match cli.command {
        Commands::Scan { force_refresh } => run_scan(&config, force_refresh).await,
        Commands::Realtime { pairs } => run_realtime(&config, &pairs).await,
    }
}

async fn run_scan(config: &ScannerConfig, force_refresh: bool) -> Result<()> {
    tracing::info!("starting one-shot scan");

    let p_client = PolymarketClient::new(PolymarketClientConfig {
        gamma: venue_polymarket::GammaClientConfig::default().with_base_url(config.venues.p_gamma_url.clone()),
        clob: venue_polymarket::ClobClientConfig::default().with_base_url(config.venues.p_clob_url.clone()),
    });
    let k_client = KalshiClient::new(
        KalshiClientConfig::default()
            .with_base_url(config.venues.k_rest_url.clone())
            .with_retry_delays_ms(config.concurrency.k_retry_delays_ms.clone()),
    );

    let pipeline_config = PipelineConfig {
        yearly: Vec::new(),
        dynamic: Vec::new(),
        nba_fixtures: Vec::new(),
        catalog_days: config.catalog.days_ahead,
        sports_aliases: AliasTable::default_table(),
        min_profit_pct: config.thresholds.min_profit_pct,
        liquidity_top_n: config.concurrency.liquidity_top_n,
        k_max_concurrent: config.concurrency.k_max_concurrent,
        k_pagination_delay: Duration::from_millis(config.concurrency.k_pagination_delay_ms),
        nba_markets_page_size: 100,
        nba_markets_max_pages: 5,
    };

    let pipeline = Pipeline::new(p_client, k_client, pipeline_config);
    let scanner = Scanner::new(pipeline, Duration::from_secs(config.cache.ttl_secs));

    let result = scanner.scan(force_refresh).await;
    tracing::info!(events = result.events.len(), opportunities = result.opportunities.len(), "scan complete");

    let dtos = arb_scanner::project_all(&result.opportunities, result.scanned_at, config.thresholds.p_fee_pct, config.thresholds.k_fee_pct);
    println!("{}", serde_json::to_string_pretty(&dtos)?);

    Ok(())
}

async fn run_realtime(config: &ScannerConfig, pairs_path: &str) -> Result<()> {
    let raw = std::fs::read_to_string(pairs_path).with_context(|| format!("failed to read pair subscriptions from {pairs_path}"))?;
    let pairs: Vec<PairSubscription> = serde_json::from_str(&raw).context("pair subscriptions file is not valid JSON")?;

    tracing::info!(pairs = pairs.len(), "starting realtime engine");

    let kalshi_auth = Arc::new(KalshiAuth::from_env(KalshiAuthConfig::default()).context("failed to load Kalshi streaming credentials")?);

    let p_ws_config = PWebSocketConfig { url: config.venues.p_ws_url.clone(), ..PWebSocketConfig::default() };
    let k_ws_config = KWebSocketConfig {
        url: config.venues.k_ws_url.clone(),
        reconnect_delay: Duration::from_millis(config.realtime.reconnect_delay_ms),
        ..KWebSocketConfig::default()
    };
    let engine_config =
        EngineConfig { debounce: Duration::from_millis(config.realtime.debounce_ms), spread_change_threshold_pct: config.realtime.spread_change_threshold_pct };

    let (mut engine, mut events) = RealtimeEngine::connect(pairs, p_ws_config, k_ws_config, kalshi_auth, engine_config).await?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(RealtimeEvent::OpportunityOpened(opp)) => {
                        println!("{}", serde_json::to_string(&opp)?);
                    }
                    Some(RealtimeEvent::OpportunityClosed { pair_id }) => {
                        println!("{{\"closed\":\"{pair_id}\"}}");
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown requested, stopping realtime engine");
                break;
            }
        }
    }

    engine.stop().await;
    Ok(())
}
