//! Streaming order-book client for the realtime engine (SPEC_FULL.md §4.8, component C8).
//!
//! Kalshi's streaming API delivers raw bid ladders (`yes` and `no`, in cents) rather than
//! asks, so this client maintains the two bid ladders per ticker and derives the normalized
//! ask-side [`NormalizedOrderBook`] on every update via the same inversion identity used by
//! the REST client in `client.rs`: a bid of `X` on one side is an ask of `1-X` on the other.
//! Unlike Polymarket's client (`venue-polymarket::websocket`), the subscribe handshake is
//! RSA-PSS signed and the keep-alive is transport-level ping/pong only — no periodic
//! application ping is sent.
//!
//! # WebSocket message format
//!
//! Subscribe: `{"id":1,"cmd":"subscribe","params":{"channels":["orderbook_delta"],
//! "market_tickers":[...]}}`.
//! Snapshot: `{"type":"orderbook_snapshot","msg":{"market_ticker":"...","yes":[[price,qty],
//! ...],"no":[[price,qty],...]}}`.
//! Delta: `{"type":"orderbook_delta","msg":{"market_ticker":"...","price":P,"delta":D,
//! "side":"yes"|"no"}}` where `delta` is a *relative* change applied to the quantity
//! resting at `price` on `side`.

use crate::auth::KalshiAuth;
use crate::error::KalshiError;
use crate::types::{NormalizedOrderBook, PriceLevel};
use arb_core::price::p_from_cents;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use http::Request;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Default WebSocket URL for Kalshi's market data channel.
pub const WS_URL: &str = "wss://api.elections.kalshi.com/trade-api/ws/v2";

/// In-memory bid-ladder state for one ticker: cents price → quantity, both sides.
#[derive(Debug, Clone, Default)]
struct RawLadders {
    yes_bids: BTreeMap<i64, i64>,
    no_bids: BTreeMap<i64, i64>,
}

impl RawLadders {
    fn apply_snapshot(&mut self, yes: Vec<(i64, i64)>, no: Vec<(i64, i64)>) {
        self.yes_bids = yes.into_iter().filter(|&(_, q)| q > 0).collect();
        self.no_bids = no.into_iter().filter(|&(_, q)| q > 0).collect();
    }

    fn apply_delta(&mut self, side: BookSide, price: i64, delta: i64) {
        let ladder = match side {
            BookSide::Yes => &mut self.yes_bids,
            BookSide::No => &mut self.no_bids,
        };
        let entry = ladder.entry(price).or_insert(0);
        *entry += delta;
        if *entry <= 0 {
            ladder.remove(&price);
        }
    }

    /// Derives the normalized ask-side book via bid inversion (SPEC_FULL.md §4.1/§4.2).
    fn to_normalized(&self, ticker: &str) -> NormalizedOrderBook {
        NormalizedOrderBook {
            ticker: ticker.to_string(),
            yes_asks: invert_bid_ladder(&self.no_bids),
            no_asks: invert_bid_ladder(&self.yes_bids),
            updated_at: Utc::now(),
        }
    }
}

fn invert_bid_ladder(bids: &BTreeMap<i64, i64>) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = bids
        .iter()
        .map(|(&cents, &qty)| PriceLevel { price: 1.0 - p_from_cents(cents as f64), size: qty as f64 })
        .collect();
    levels.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
    levels
}

/// Which raw bid ladder a delta applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookSide {
    Yes,
    No,
}

impl BookSide {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

/// Events emitted by the WebSocket client.
#[derive(Debug, Clone)]
pub enum BookEvent {
    /// Full order book snapshot received; replaces prior state for this ticker.
    Snapshot { ticker: String, book: NormalizedOrderBook },
    /// Incremental update applied; the book reflects the post-delta state.
    Updated { ticker: String, book: NormalizedOrderBook },
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
    pub channel_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self { url: WS_URL.to_string(), reconnect_delay: Duration::from_secs(5), channel_buffer_size: 1000 }
    }
}

/// WebSocket connection handle exposing in-memory book state and shutdown control.
#[derive(Clone)]
pub struct KalshiWebSocket {
    books: Arc<RwLock<HashMap<String, RawLadders>>>,
    shutdown_tx: mpsc::Sender<()>,
    tickers: Arc<Vec<String>>,
}

impl KalshiWebSocket {
    /// Connects, authenticates the handshake, and subscribes to `orderbook_delta` for the
    /// given tickers, spawning the connection loop.
    ///
    /// # Errors
    /// Returns an error only if the initial handshake request cannot be built (the signing
    /// key is invalid or unreadable); reconnects after that happen inside the background
    /// task and never surface here.
    pub async fn connect(
        tickers: Vec<String>,
        config: WebSocketConfig,
        auth: Arc<KalshiAuth>,
    ) -> Result<(Self, mpsc::Receiver<BookEvent>), KalshiError> {
        let (event_tx, event_rx) = mpsc::channel(config.channel_buffer_size);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let books: Arc<RwLock<HashMap<String, RawLadders>>> = Arc::new(RwLock::new(HashMap::new()));
        {
            let mut guard = books.write();
            for ticker in &tickers {
                guard.insert(ticker.clone(), RawLadders::default());
            }
        }

        let tickers_arc = Arc::new(tickers.clone());
        let books_clone = Arc::clone(&books);
        tokio::spawn(run_connection_loop(config, tickers, books_clone, auth, event_tx, shutdown_rx));

        Ok((Self { books, shutdown_tx, tickers: tickers_arc }, event_rx))
    }

    #[must_use]
    pub fn get_book(&self, ticker: &str) -> Option<NormalizedOrderBook> {
        self.books.read().get(ticker).map(|l| l.to_normalized(ticker))
    }

    #[must_use]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[derive(Debug, Serialize)]
struct SubscribeParams<'a> {
    channels: [&'static str; 1],
    market_tickers: &'a [String],
}

#[derive(Debug, Serialize)]
struct SubscribeCommand<'a> {
    id: u64,
    cmd: &'static str,
    params: SubscribeParams<'a>,
}

#[derive(Debug, Deserialize)]
struct WsEnvelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    msg: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SnapshotMsg {
    market_ticker: String,
    #[serde(default)]
    yes: Vec<(i64, i64)>,
    #[serde(default)]
    no: Vec<(i64, i64)>,
}

#[derive(Debug, Deserialize)]
struct DeltaMsg {
    market_ticker: String,
    price: i64,
    delta: i64,
    side: String,
}

fn build_handshake_request(url: &str, auth: &KalshiAuth) -> Result<Request<()>, KalshiError> {
    let headers = auth.sign_request("GET", "/trade-api/ws/v2", "")?;
    let mut request = url
        .into_client_request()
        .map_err(|e| KalshiError::Authentication(format!("failed to build handshake request: {e}")))?;
    for (name, value) in headers.as_tuples() {
        request.headers_mut().insert(
            http::HeaderName::from_static(match name {
                "KALSHI-ACCESS-KEY" => "kalshi-access-key",
                "KALSHI-ACCESS-SIGNATURE" => "kalshi-access-signature",
                _ => "kalshi-access-timestamp",
            }),
            http::HeaderValue::from_str(value)
                .map_err(|e| KalshiError::Authentication(format!("invalid header value: {e}")))?,
        );
    }
    Ok(request)
}

async fn run_connection_loop(
    config: WebSocketConfig,
    tickers: Vec<String>,
    books: Arc<RwLock<HashMap<String, RawLadders>>>,
    auth: Arc<KalshiAuth>,
    event_tx: mpsc::Sender<BookEvent>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        if shutdown_rx.try_recv().is_ok() {
            info!("kalshi websocket shutdown requested");
            break;
        }

        info!(url = %config.url, "connecting to kalshi websocket");

        match connect_and_run(&config, &tickers, &books, &auth, &event_tx, &mut shutdown_rx).await {
            Ok(()) => {
                info!("kalshi websocket closed cleanly");
                break;
            }
            Err(e) => {
                error!(error = %e, "kalshi websocket connection failed");
                let _ = event_tx.send(BookEvent::Disconnected { reason: e.to_string() }).await;
                sleep(config.reconnect_delay).await;
            }
        }
    }
}

async fn connect_and_run(
    config: &WebSocketConfig,
    tickers: &[String],
    books: &Arc<RwLock<HashMap<String, RawLadders>>>,
    auth: &Arc<KalshiAuth>,
    event_tx: &mpsc::Sender<BookEvent>,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<(), KalshiError> {
    let request = build_handshake_request(&config.url, auth)?;
    let (ws_stream, _response) =
        connect_async(request).await.map_err(|e| KalshiError::Network(format!("websocket connect failed: {e}")))?;
    info!("kalshi websocket connected");

    let (mut write, mut read) = ws_stream.split();

    let sub = SubscribeCommand { id: 1, cmd: "subscribe", params: SubscribeParams { channels: ["orderbook_delta"], market_tickers: tickers } };
    let sub_json = serde_json::to_string(&sub).map_err(|e| KalshiError::Serialization(e.to_string()))?;
    debug!(message = %sub_json, "sending subscription");
    write.send(Message::Text(sub_json)).await.map_err(|e| KalshiError::Network(e.to_string()))?;

    let _ = event_tx.send(BookEvent::Connected).await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("shutdown signal received, closing kalshi websocket");
                let _ = write.close().await;
                return Ok(());
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = process_message(&text, books, event_tx).await {
                            warn!(error = %e, "failed to process kalshi message");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await.map_err(|e| KalshiError::Network(e.to_string()))?;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        return Err(KalshiError::Network(
                            frame.map(|f| f.reason.to_string()).unwrap_or_else(|| "connection closed".to_string()),
                        ));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        if let Ok(text) = String::from_utf8(data) {
                            if let Err(e) = process_message(&text, books, event_tx).await {
                                warn!(error = %e, "failed to process kalshi binary message");
                            }
                        }
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => return Err(KalshiError::Network(e.to_string())),
                    None => return Err(KalshiError::Network("stream ended".to_string())),
                }
            }
        }
    }
}

async fn process_message(
    text: &str,
    books: &Arc<RwLock<HashMap<String, RawLadders>>>,
    event_tx: &mpsc::Sender<BookEvent>,
) -> Result<(), KalshiError> {
    let envelope: WsEnvelope = serde_json::from_str(text).map_err(|e| KalshiError::Serialization(e.to_string()))?;

    match envelope.msg_type.as_str() {
        "orderbook_snapshot" => {
            let snap: SnapshotMsg = serde_json::from_value(envelope.msg).map_err(|e| KalshiError::Serialization(e.to_string()))?;
            let book = {
                let mut guard = books.write();
                let ladders = guard.entry(snap.market_ticker.clone()).or_default();
                ladders.apply_snapshot(snap.yes, snap.no);
                ladders.to_normalized(&snap.market_ticker)
            };
            let _ = event_tx.send(BookEvent::Snapshot { ticker: snap.market_ticker, book }).await;
        }
        "orderbook_delta" => {
            let delta: DeltaMsg = serde_json::from_value(envelope.msg).map_err(|e| KalshiError::Serialization(e.to_string()))?;
            let Some(side) = BookSide::parse(&delta.side) else {
                warn!(side = %delta.side, "ignoring kalshi delta with unknown side");
                return Ok(());
            };
            let book = {
                let mut guard = books.write();
                let ladders = guard.entry(delta.market_ticker.clone()).or_default();
                ladders.apply_delta(side, delta.price, delta.delta);
                ladders.to_normalized(&delta.market_ticker)
            };
            let _ = event_tx.send(BookEvent::Updated { ticker: delta.market_ticker, book }).await;
        }
        other => debug!(event_type = %other, "ignoring unhandled kalshi event type"),
    }
    Ok(())
}
