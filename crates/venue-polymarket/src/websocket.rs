//! Streaming order-book client for the realtime engine (SPEC_FULL.md §4.8, component C8).
//!
//! Maintains an in-memory L2 book per subscribed asset (token) id and emits normalized
//! events over an `mpsc` channel. Combining the YES-token and NO-token streams into one
//! per-pair book is the realtime engine's job, not this client's — this client only owns
//! one market's worth of raw per-token state and its own reconnect loop.
//!
//! # Architecture
//!
//! ```text
//! PolymarketWebSocket::connect()
//!        │
//!        ├─► Spawns connection handler task
//!        │   └─► Processes messages, emits BookEvents
//!        │
//!        └─► Returns (handle, mpsc::Receiver<BookEvent>)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use venue_polymarket::websocket::{PolymarketWebSocket, WebSocketConfig, BookEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = WebSocketConfig::default();
//!     let asset_ids = vec!["tok_yes".to_string(), "tok_no".to_string()];
//!
//!     let (_ws, mut rx) = PolymarketWebSocket::connect(asset_ids, config).await.unwrap();
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             BookEvent::Snapshot { asset_id, book } => {
//!                 println!("snapshot for {asset_id}: best ask {:?}", book.best_ask());
//!             }
//!             _ => {}
//!         }
//!     }
//! }
//! ```
//!
//! # WebSocket message format
//!
//! Subscription: `{"assets_ids": [...], "type": "market"}`.
//! Book (snapshot): `{"event_type": "book", "asset_id": "...", "bids": [...], "asks": [...]}`.
//! Price change (delta): `{"event_type": "price_change", "price_changes": [{"asset_id",
//! "price", "size", "side"}]}`.

use crate::clob::{merge_ask_side, NormalizedOrderBook as MarketOrderBook};
use crate::error::PolymarketError;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Default WebSocket URL for Polymarket's market data channel.
pub const WS_URL: &str = "wss://ws-subscriptions-clob.polymarket.com/ws/market";

/// Side of a book update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// In-memory L2 state for one asset (token) id.
#[derive(Debug, Clone, Default)]
pub struct L2Book {
    /// Descending by price.
    pub bids: Vec<(f64, f64)>,
    /// Ascending by price.
    pub asks: Vec<(f64, f64)>,
}

impl L2Book {
    #[must_use]
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|&(p, _)| p)
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|&(p, _)| p)
    }

    fn apply_snapshot(&mut self, bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) {
        self.bids = bids;
        self.bids.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        self.asks = asks;
        self.asks.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    }

    fn apply_delta(&mut self, side: Side, price: f64, size: f64) {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels.retain(|&(p, _)| (p - price).abs() > 1e-9);
        if size > 0.0 {
            levels.push((price, size));
            match side {
                Side::Buy => levels.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal)),
                Side::Sell => levels.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)),
            }
        }
    }
}

/// Events emitted by the WebSocket client.
#[derive(Debug, Clone)]
pub enum BookEvent {
    /// Full order book snapshot received; replaces prior state for this asset.
    Snapshot { asset_id: String, book: L2Book },
    /// Incremental delta update to a single price level; mutates prior state.
    Delta { asset_id: String, side: Side, price: f64, size: f64 },
    /// WebSocket connection established; pending subscriptions were flushed.
    Connected,
    /// WebSocket connection lost; reconnection is scheduled per [`WebSocketConfig`].
    Disconnected { reason: String },
}

/// Configuration for the WebSocket client.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    pub url: String,
    /// Fixed delay before reconnecting after a disconnect (SPEC_FULL.md §4.8: no backoff).
    pub reconnect_delay: Duration,
    /// Keep-alive ping interval.
    pub ping_interval: Duration,
    pub channel_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: WS_URL.to_string(),
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(10),
            channel_buffer_size: 1000,
        }
    }
}

/// WebSocket connection handle exposing in-memory book state and shutdown control.
#[derive(Clone)]
pub struct PolymarketWebSocket {
    books: Arc<RwLock<HashMap<String, L2Book>>>,
    shutdown_tx: mpsc::Sender<()>,
    asset_ids: Arc<Vec<String>>,
}

impl PolymarketWebSocket {
    /// Connects and subscribes to the given asset ids, spawning the connection loop.
    ///
    /// # Errors
    /// Never returns an error on its own; reconnects happen inside the background task. The
    /// `Result` shape is kept for API symmetry with venue-kalshi's streaming client.
    pub async fn connect(
        asset_ids: Vec<String>,
        config: WebSocketConfig,
    ) -> Result<(Self, mpsc::Receiver<BookEvent>), PolymarketError> {
        let (event_tx, event_rx) = mpsc::channel(config.channel_buffer_size);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let books: Arc<RwLock<HashMap<String, L2Book>>> = Arc::new(RwLock::new(HashMap::new()));
        {
            let mut guard = books.write();
            for id in &asset_ids {
                guard.insert(id.clone(), L2Book::default());
            }
        }

        let asset_ids_arc = Arc::new(asset_ids.clone());
        let books_clone = Arc::clone(&books);
        tokio::spawn(run_connection_loop(config, asset_ids, books_clone, event_tx, shutdown_rx));

        Ok((Self { books, shutdown_tx, asset_ids: asset_ids_arc }, event_rx))
    }

    #[must_use]
    pub fn get_book(&self, asset_id: &str) -> Option<L2Book> {
        self.books.read().get(asset_id).cloned()
    }

    /// Merges the YES and NO tokens' live ladders into the same market-level shape the
    /// REST CLOB client returns (SPEC_FULL.md §4.1/§4.2), for use by the realtime evaluator.
    #[must_use]
    pub fn get_market_book(&self, yes_id: &str, no_id: &str) -> Option<MarketOrderBook> {
        let guard = self.books.read();
        let yes_book = guard.get(yes_id)?;
        let no_book = guard.get(no_id)?;
        let yes_asks = merge_ask_side(&yes_book.asks, &no_book.bids);
        let no_asks = merge_ask_side(&no_book.asks, &yes_book.bids);
        Some(MarketOrderBook {
            yes_id: yes_id.to_string(),
            no_id: no_id.to_string(),
            yes_asks,
            no_asks,
            updated_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn asset_ids(&self) -> &[String] {
        &self.asset_ids
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[derive(Debug, Serialize)]
struct SubscriptionMessage<'a> {
    assets_ids: &'a [String],
    #[serde(rename = "type")]
    msg_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct WsMessage {
    event_type: String,
    #[serde(flatten)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct BookMessage {
    asset_id: String,
    #[serde(default)]
    bids: Vec<RawLevel>,
    #[serde(default)]
    asks: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct PriceChange {
    asset_id: String,
    price: String,
    size: String,
    side: String,
}

#[derive(Debug, Deserialize)]
struct PriceChangeMessage {
    #[serde(default)]
    price_changes: Vec<PriceChange>,
}

fn parse_probability(s: &str) -> f64 {
    let normalized = if let Some(rest) = s.strip_prefix('.') { format!("0{rest}") } else { s.to_string() };
    normalized.parse().unwrap_or(0.0)
}

fn parse_levels(raw: &[RawLevel]) -> Vec<(f64, f64)> {
    raw.iter()
        .filter_map(|l| {
            let price = parse_probability(&l.price);
            let size = parse_probability(&l.size);
            if size > 0.0 {
                Some((price, size))
            } else {
                None
            }
        })
        .collect()
}

fn parse_side(s: &str) -> Side {
    match s.to_uppercase().as_str() {
        "SELL" | "S" => Side::Sell,
        _ => Side::Buy,
    }
}

async fn run_connection_loop(
    config: WebSocketConfig,
    asset_ids: Vec<String>,
    books: Arc<RwLock<HashMap<String, L2Book>>>,
    event_tx: mpsc::Sender<BookEvent>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        if shutdown_rx.try_recv().is_ok() {
            info!("polymarket websocket shutdown requested");
            break;
        }

        info!(url = %config.url, "connecting to polymarket websocket");

        match connect_and_run(&config, &asset_ids, &books, &event_tx, &mut shutdown_rx).await {
            Ok(()) => {
                info!("polymarket websocket closed cleanly");
                break;
            }
            Err(e) => {
                error!(error = %e, "polymarket websocket connection failed");
                let _ = event_tx.send(BookEvent::Disconnected { reason: e.to_string() }).await;
                sleep(config.reconnect_delay).await;
            }
        }
    }
}

async fn connect_and_run(
    config: &WebSocketConfig,
    asset_ids: &[String],
    books: &Arc<RwLock<HashMap<String, L2Book>>>,
    event_tx: &mpsc::Sender<BookEvent>,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<(), PolymarketError> {
    let (ws_stream, _response) = connect_async(&config.url).await?;
    info!("polymarket websocket connected");

    let (mut write, mut read) = ws_stream.split();

    let sub_msg = SubscriptionMessage { assets_ids: asset_ids, msg_type: "market" };
    let sub_json = serde_json::to_string(&sub_msg)?;
    debug!(message = %sub_json, "sending subscription");
    write.send(Message::Text(sub_json)).await?;

    let _ = event_tx.send(BookEvent::Connected).await;

    let mut ping_interval = tokio::time::interval(config.ping_interval);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("shutdown signal received, closing polymarket websocket");
                let _ = write.close().await;
                return Ok(());
            }
            _ = ping_interval.tick() => {
                debug!("sending ping");
                write.send(Message::Ping(vec![])).await?;
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = process_message(&text, books, event_tx).await {
                            warn!(error = %e, "failed to process polymarket message");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        return Err(PolymarketError::WebSocket(
                            frame.map(|f| f.reason.to_string()).unwrap_or_else(|| "connection closed".to_string()),
                        ));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        if let Ok(text) = String::from_utf8(data) {
                            if let Err(e) = process_message(&text, books, event_tx).await {
                                warn!(error = %e, "failed to process polymarket binary message");
                            }
                        }
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => return Err(PolymarketError::from(e)),
                    None => return Err(PolymarketError::WebSocket("stream ended".to_string())),
                }
            }
        }
    }
}

async fn process_message(
    text: &str,
    books: &Arc<RwLock<HashMap<String, L2Book>>>,
    event_tx: &mpsc::Sender<BookEvent>,
) -> Result<(), PolymarketError> {
    let messages: Vec<WsMessage> =
        if text.trim().starts_with('[') { serde_json::from_str(text)? } else { vec![serde_json::from_str(text)?] };

    for msg in messages {
        match msg.event_type.as_str() {
            "book" => {
                let book_msg: BookMessage = serde_json::from_value(msg.data)?;
                handle_snapshot(&book_msg, books, event_tx).await;
            }
            "price_change" => {
                let change_msg: PriceChangeMessage = serde_json::from_value(msg.data)?;
                for change in &change_msg.price_changes {
                    handle_delta(change, books, event_tx).await;
                }
            }
            other => debug!(event_type = %other, "ignoring unhandled polymarket event type"),
        }
    }
    Ok(())
}

async fn handle_snapshot(msg: &BookMessage, books: &Arc<RwLock<HashMap<String, L2Book>>>, event_tx: &mpsc::Sender<BookEvent>) {
    let bids = parse_levels(&msg.bids);
    let asks = parse_levels(&msg.asks);

    let book = {
        let mut guard = books.write();
        let book = guard.entry(msg.asset_id.clone()).or_default();
        book.apply_snapshot(bids, asks);
        book.clone()
    };

    let _ = event_tx.send(BookEvent::Snapshot { asset_id: msg.asset_id.clone(), book }).await;
}

async fn handle_delta(change: &PriceChange, books: &Arc<RwLock<HashMap<String, L2Book>>>, event_tx: &mpsc::Sender<BookEvent>) {
    let price = parse_probability(&change.price);
    let size = parse_probability(&change.size);
    let side = parse_side(&change.side);

    {
        let mut guard = books.write();
        guard.entry(change.asset_id.clone()).or_default().apply_delta(side, price, size);
    }

    let _ = event_tx.send(BookEvent::Delta { asset_id: change.asset_id.clone(), side, price, size }).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probability_handles_leading_dot() {
        assert!((parse_probability(".48") - 0.48).abs() < 1e-9);
        assert!((parse_probability("0.48") - 0.48).abs() < 1e-9);
    }

    #[test]
    fn test_l2book_snapshot_sorts_each_side() {
        let mut book = L2Book::default();
        book.apply_snapshot(vec![(0.40, 10.0), (0.45, 5.0)], vec![(0.55, 20.0), (0.52, 15.0)]);
        assert_eq!(book.best_bid(), Some(0.45));
        assert_eq!(book.best_ask(), Some(0.52));
    }

    #[test]
    fn test_l2book_delta_removes_zero_size_level() {
        let mut book = L2Book::default();
        book.apply_snapshot(vec![], vec![(0.52, 15.0), (0.55, 20.0)]);
        book.apply_delta(Side::Sell, 0.52, 0.0);
        assert_eq!(book.best_ask(), Some(0.55));
    }

    #[test]
    fn test_l2book_delta_upserts_level() {
        let mut book = L2Book::default();
        book.apply_snapshot(vec![], vec![(0.55, 20.0)]);
        book.apply_delta(Side::Sell, 0.52, 10.0);
        assert_eq!(book.best_ask(), Some(0.52));
    }

    #[test]
    fn test_parse_side_defaults_to_buy() {
        assert_eq!(parse_side("BUY"), Side::Buy);
        assert_eq!(parse_side("SELL"), Side::Sell);
        assert_eq!(parse_side("unknown"), Side::Buy);
    }

    #[tokio::test]
    async fn test_get_market_book_merges_direct_asks_and_inverted_complement_bids() {
        let books: Arc<RwLock<HashMap<String, L2Book>>> = Arc::new(RwLock::new(HashMap::new()));
        {
            let mut guard = books.write();
            let mut yes_book = L2Book::default();
            yes_book.apply_snapshot(vec![(0.40, 50.0)], vec![(0.52, 100.0)]);
            guard.insert("yes_tok".to_string(), yes_book);

            let mut no_book = L2Book::default();
            no_book.apply_snapshot(vec![(0.46, 30.0)], vec![(0.55, 80.0)]);
            guard.insert("no_tok".to_string(), no_book);
        }
        let (shutdown_tx, _shutdown_rx) = mpsc::channel(1);
        let ws = PolymarketWebSocket { books, shutdown_tx, asset_ids: Arc::new(vec!["yes_tok".to_string(), "no_tok".to_string()]) };

        let book = ws.get_market_book("yes_tok", "no_tok").unwrap();
        // yes_asks: direct 0.52 plus no's inverted bid (1 - 0.46 = 0.54).
        assert_eq!(book.best_yes_ask(), Some(0.52));
        assert!(book.yes_asks.iter().any(|l| (l.price - 0.54).abs() < 1e-9));
        // no_asks: direct 0.55 plus yes's inverted bid (1 - 0.40 = 0.60).
        assert_eq!(book.best_no_ask(), Some(0.55));
        assert!(book.no_asks.iter().any(|l| (l.price - 0.60).abs() < 1e-9));
    }
}
