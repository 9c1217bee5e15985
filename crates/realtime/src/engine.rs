//! The realtime engine (SPEC_FULL.md §4.8, component C8): two streaming venue clients plus
//! a pair registry, one debounce timer per pair, and a single evaluator.
//!
//! Ownership mirrors SPEC_FULL.md §3: the engine exclusively owns the per-pair active-state
//! map and the debounce timers; each venue's own per-market order-book structure has a
//! single writer (its own stream client) and is read here through its `get_*_book` accessor.

use crate::error::Result;
use crate::evaluator::{evaluate, BestAsk, VenueAsks};
use crate::types::{PairSubscription, RealtimeEvent, RealtimeOpportunity};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};
use venue_kalshi::auth::KalshiAuth;
use venue_kalshi::websocket::{BookEvent as KBookEvent, KalshiWebSocket, WebSocketConfig as KWebSocketConfig};
use venue_polymarket::websocket::{BookEvent as PBookEvent, PolymarketWebSocket, WebSocketConfig as PWebSocketConfig};

/// Tunables for the engine's evaluation loop (SPEC_FULL.md §4.8/§5).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub debounce: Duration,
    pub spread_change_threshold_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(100), spread_change_threshold_pct: 0.1 }
    }
}

/// The running realtime engine. Construct with [`RealtimeEngine::connect`]; tear down with
/// [`RealtimeEngine::stop`].
pub struct RealtimeEngine {
    p_ws: PolymarketWebSocket,
    k_ws: KalshiWebSocket,
    active: Arc<Mutex<HashMap<String, f64>>>,
    debounce_handles: Vec<JoinHandle<()>>,
    router_handle: Option<JoinHandle<()>>,
}

impl RealtimeEngine {
    /// Connects both venue streams, subscribes to every pair's constituent markets, and
    /// starts one debounce task per pair plus one event-routing task.
    ///
    /// # Errors
    /// Returns an error only if the Kalshi streaming handshake cannot be built (invalid or
    /// unreadable signing key); reconnects after the initial connect happen inside each
    /// client's own background task and never surface here.
    pub async fn connect(
        pairs: Vec<PairSubscription>,
        p_config: PWebSocketConfig,
        k_config: KWebSocketConfig,
        kalshi_auth: Arc<KalshiAuth>,
        engine_config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<RealtimeEvent>)> {
        let p_asset_ids: Vec<String> =
            pairs.iter().flat_map(|p| [p.p_yes_token.clone(), p.p_no_token.clone()]).collect();
        let k_tickers: Vec<String> = pairs.iter().map(|p| p.k_ticker.clone()).collect();

        let (p_ws, p_rx) = PolymarketWebSocket::connect(p_asset_ids, p_config).await?;
        let (k_ws, k_rx) = KalshiWebSocket::connect(k_tickers, k_config, kalshi_auth).await?;

        let mut p_index: HashMap<String, Vec<String>> = HashMap::new();
        let mut k_index: HashMap<String, Vec<String>> = HashMap::new();
        for pair in &pairs {
            p_index.entry(pair.p_yes_token.clone()).or_default().push(pair.pair_id.clone());
            p_index.entry(pair.p_no_token.clone()).or_default().push(pair.pair_id.clone());
            k_index.entry(pair.k_ticker.clone()).or_default().push(pair.pair_id.clone());
        }
        let p_index = Arc::new(p_index);
        let k_index = Arc::new(k_index);

        let active: Arc<Mutex<HashMap<String, f64>>> = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel(1000);

        let mut notifies: HashMap<String, Arc<Notify>> = HashMap::new();
        for pair in &pairs {
            notifies.insert(pair.pair_id.clone(), Arc::new(Notify::new()));
        }
        let notifies = Arc::new(notifies);

        let mut debounce_handles = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let notify = notifies.get(&pair.pair_id).expect("registered above").clone();
            let p_ws = p_ws.clone();
            let k_ws = k_ws.clone();
            let active = active.clone();
            let event_tx = event_tx.clone();
            let debounce = engine_config.debounce;
            let threshold = engine_config.spread_change_threshold_pct;
            debounce_handles.push(tokio::spawn(run_debounce(pair, debounce, threshold, p_ws, k_ws, notify, active, event_tx)));
        }

        let router_handle = tokio::spawn(route_events(p_rx, k_rx, p_index, k_index, notifies));

        info!("realtime engine connected");
        Ok((Self { p_ws, k_ws, active, debounce_handles, router_handle: Some(router_handle) }, event_rx))
    }

    /// Stops the engine per SPEC_FULL.md §5 "Cancellation": aborts every debounce timer and
    /// the event router, closes both WebSocket connections, and empties the active-pair map.
    /// No further events are emitted once this returns.
    pub async fn stop(&mut self) {
        for handle in self.debounce_handles.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
        if let Some(handle) = self.router_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.p_ws.shutdown().await;
        self.k_ws.shutdown().await;
        self.active.lock().clear();
        info!("realtime engine stopped");
    }
}

/// Routes book-update events from both venue streams to the debounce timer of every pair
/// whose constituent market changed. Connect/disconnect events are logged, not routed —
/// a stale book simply keeps yielding whatever state it last held.
async fn route_events(
    mut p_rx: mpsc::Receiver<PBookEvent>,
    mut k_rx: mpsc::Receiver<KBookEvent>,
    p_index: Arc<HashMap<String, Vec<String>>>,
    k_index: Arc<HashMap<String, Vec<String>>>,
    notifies: Arc<HashMap<String, Arc<Notify>>>,
) {
    loop {
        tokio::select! {
            event = p_rx.recv() => {
                match event {
                    Some(event) => {
                        if let Some(asset_id) = p_asset_id(&event) {
                            notify_pairs(&p_index, &notifies, asset_id);
                        }
                    }
                    None => break,
                }
            }
            event = k_rx.recv() => {
                match event {
                    Some(event) => {
                        if let Some(ticker) = k_ticker(&event) {
                            notify_pairs(&k_index, &notifies, ticker);
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

fn notify_pairs(index: &HashMap<String, Vec<String>>, notifies: &HashMap<String, Arc<Notify>>, key: &str) {
    if let Some(pair_ids) = index.get(key) {
        for pair_id in pair_ids {
            if let Some(notify) = notifies.get(pair_id) {
                notify.notify_one();
            }
        }
    }
}

fn p_asset_id(event: &PBookEvent) -> Option<&str> {
    match event {
        PBookEvent::Snapshot { asset_id, .. } | PBookEvent::Delta { asset_id, .. } => Some(asset_id),
        PBookEvent::Connected | PBookEvent::Disconnected { .. } => None,
    }
}

fn k_ticker(event: &KBookEvent) -> Option<&str> {
    match event {
        KBookEvent::Snapshot { ticker, .. } | KBookEvent::Updated { ticker, .. } => Some(ticker),
        KBookEvent::Connected | KBookEvent::Disconnected { .. } => None,
    }
}

/// The live book state `run_debounce` reads for venue P, seamed behind a trait so the
/// debounce/evaluation loop can be driven by a fake in tests without a real socket.
trait PBookSource: Send + Sync + 'static {
    fn get_market_book(&self, yes_id: &str, no_id: &str) -> Option<venue_polymarket::NormalizedOrderBook>;
}

impl PBookSource for PolymarketWebSocket {
    fn get_market_book(&self, yes_id: &str, no_id: &str) -> Option<venue_polymarket::NormalizedOrderBook> {
        PolymarketWebSocket::get_market_book(self, yes_id, no_id)
    }
}

/// The live book state `run_debounce` reads for venue K, seamed behind a trait so the
/// debounce/evaluation loop can be driven by a fake in tests without a real socket.
trait KBookSource: Send + Sync + 'static {
    fn get_book(&self, ticker: &str) -> Option<venue_kalshi::NormalizedOrderBook>;
}

impl KBookSource for KalshiWebSocket {
    fn get_book(&self, ticker: &str) -> Option<venue_kalshi::NormalizedOrderBook> {
        KalshiWebSocket::get_book(self, ticker)
    }
}

/// Waits for a trigger, then runs a trailing-edge debounce: the inner loop restarts its
/// sleep on every further notification and only evaluates once `debounce` has elapsed with
/// no new notification (SPEC_FULL.md §4.8).
async fn run_debounce<P: PBookSource, K: KBookSource>(
    pair: PairSubscription,
    debounce: Duration,
    threshold_pct: f64,
    p_ws: P,
    k_ws: K,
    notify: Arc<Notify>,
    active: Arc<Mutex<HashMap<String, f64>>>,
    event_tx: mpsc::Sender<RealtimeEvent>,
) {
    loop {
        notify.notified().await;
        loop {
            tokio::select! {
                _ = notify.notified() => continue,
                _ = sleep(debounce) => break,
            }
        }
        evaluate_and_emit(&pair, &p_ws, &k_ws, threshold_pct, &active, &event_tx).await;
    }
}

async fn evaluate_and_emit<P: PBookSource, K: KBookSource>(
    pair: &PairSubscription,
    p_ws: &P,
    k_ws: &K,
    threshold_pct: f64,
    active: &Mutex<HashMap<String, f64>>,
    event_tx: &mpsc::Sender<RealtimeEvent>,
) {
    let p_book = p_ws.get_market_book(&pair.p_yes_token, &pair.p_no_token);
    let k_book = k_ws.get_book(&pair.k_ticker);

    let yes = VenueAsks {
        p: p_book.as_ref().and_then(|b| b.yes_asks.first().map(|l| BestAsk { price: l.price, size: l.size })),
        k: k_book.as_ref().and_then(|b| b.yes_asks.first().map(|l| BestAsk { price: l.price, size: l.size })),
    };
    let no = VenueAsks {
        p: p_book.as_ref().and_then(|b| b.no_asks.first().map(|l| BestAsk { price: l.price, size: l.size })),
        k: k_book.as_ref().and_then(|b| b.no_asks.first().map(|l| BestAsk { price: l.price, size: l.size })),
    };

    let result = evaluate(yes, no);
    debug!(pair_id = %pair.pair_id, opportunity = result.is_some(), "realtime evaluation");

    let event = {
        let mut guard = active.lock();
        match result {
            Some(spread) => {
                let prev = guard.get(&pair.pair_id).copied();
                let should_emit = match prev {
                    None => true,
                    Some(p) => (spread.spread_percent - p).abs() > threshold_pct,
                };
                if should_emit {
                    guard.insert(pair.pair_id.clone(), spread.spread_percent);
                    Some(RealtimeEvent::OpportunityOpened(RealtimeOpportunity {
                        pair_id: pair.pair_id.clone(),
                        spread_percent: spread.spread_percent,
                        max_contracts: spread.max_contracts,
                        potential_profit: spread.potential_profit,
                    }))
                } else {
                    None
                }
            }
            None => {
                if guard.remove(&pair.pair_id).is_some() {
                    Some(RealtimeEvent::OpportunityClosed { pair_id: pair.pair_id.clone() })
                } else {
                    None
                }
            }
        }
    };

    if let Some(event) = event {
        let _ = event_tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluatedSpread;

    #[test]
    fn test_emit_gating_first_open_always_emits() {
        let active: Mutex<HashMap<String, f64>> = Mutex::new(HashMap::new());
        let spread = EvaluatedSpread { spread_percent: 3.0, max_contracts: 10.0, potential_profit: 0.3 };
        let mut guard = active.lock();
        let prev = guard.get("p1").copied();
        assert!(prev.is_none());
        guard.insert("p1".to_string(), spread.spread_percent);
        assert_eq!(guard.get("p1"), Some(&3.0));
    }

    #[test]
    fn test_emit_gating_small_change_suppressed() {
        let prev = Some(3.0_f64);
        let new_spread = 3.05;
        let threshold = 0.1;
        let should_emit = match prev {
            None => true,
            Some(p) => (new_spread - p).abs() > threshold,
        };
        assert!(!should_emit);
    }

    #[test]
    fn test_emit_gating_large_change_emits() {
        let prev = Some(3.0_f64);
        let new_spread = 3.2;
        let threshold = 0.1;
        let should_emit = match prev {
            None => true,
            Some(p) => (new_spread - p).abs() > threshold,
        };
        assert!(should_emit);
    }

    #[derive(Clone, Default)]
    struct FakePBooks(Arc<parking_lot::Mutex<Option<venue_polymarket::NormalizedOrderBook>>>);

    impl PBookSource for FakePBooks {
        fn get_market_book(&self, _yes_id: &str, _no_id: &str) -> Option<venue_polymarket::NormalizedOrderBook> {
            self.0.lock().clone()
        }
    }

    #[derive(Clone, Default)]
    struct FakeKBooks(Arc<parking_lot::Mutex<Option<venue_kalshi::NormalizedOrderBook>>>);

    impl KBookSource for FakeKBooks {
        fn get_book(&self, _ticker: &str) -> Option<venue_kalshi::NormalizedOrderBook> {
            self.0.lock().clone()
        }
    }

    fn test_pair() -> PairSubscription {
        PairSubscription {
            pair_id: "pair-1".to_string(),
            p_yes_token: "tok_yes".to_string(),
            p_no_token: "tok_no".to_string(),
            k_ticker: "KXTEST".to_string(),
        }
    }

    fn p_book(yes_ask: f64, no_ask: f64) -> venue_polymarket::NormalizedOrderBook {
        venue_polymarket::NormalizedOrderBook {
            yes_id: "tok_yes".to_string(),
            no_id: "tok_no".to_string(),
            yes_asks: vec![venue_polymarket::PriceLevel { price: yes_ask, size: 100.0 }],
            no_asks: vec![venue_polymarket::PriceLevel { price: no_ask, size: 100.0 }],
            updated_at: chrono::Utc::now(),
        }
    }

    fn k_book(yes_ask: f64, no_ask: f64) -> venue_kalshi::NormalizedOrderBook {
        venue_kalshi::NormalizedOrderBook {
            ticker: "KXTEST".to_string(),
            yes_asks: vec![venue_kalshi::PriceLevel { price: yes_ask, size: 100.0 }],
            no_asks: vec![venue_kalshi::PriceLevel { price: no_ask, size: 100.0 }],
            updated_at: chrono::Utc::now(),
        }
    }

    /// S6: a burst of 5 deltas arriving within 50ms, debounce 100ms, must collapse into
    /// exactly one `OpportunityOpened` emission once the burst goes quiet.
    #[tokio::test(start_paused = true)]
    async fn test_run_debounce_collapses_burst_into_single_emission() {
        let p_books = FakePBooks::default();
        let k_books = FakeKBooks::default();
        *p_books.0.lock() = Some(p_book(0.45, 0.56));
        *k_books.0.lock() = Some(k_book(0.58, 0.44));

        let notify = Arc::new(Notify::new());
        let active: Arc<Mutex<HashMap<String, f64>>> = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run_debounce(
            test_pair(),
            Duration::from_millis(100),
            0.1,
            p_books,
            k_books,
            notify.clone(),
            active,
            event_tx,
        ));

        for _ in 0..5 {
            notify.notify_one();
            tokio::time::advance(Duration::from_millis(10)).await;
        }
        // Burst spanned 50ms; the debounce window only starts counting from the last
        // notification, so advance past it to let the pending evaluation fire.
        tokio::time::advance(Duration::from_millis(110)).await;

        let event = tokio::time::timeout(Duration::from_secs(1), event_rx.recv()).await.unwrap().unwrap();
        match event {
            RealtimeEvent::OpportunityOpened(opp) => {
                assert_eq!(opp.pair_id, "pair-1");
                assert!((opp.spread_percent - 11.0).abs() < 1e-9);
            }
            other => panic!("expected OpportunityOpened, got {other:?}"),
        }

        // No second emission should follow the single debounced evaluation. The clock is
        // paused here, so a timed wait would never resolve on its own; a direct non-blocking
        // check is the correct way to assert absence.
        assert!(event_rx.try_recv().is_err());

        handle.abort();
    }

    /// A repeat-triggered evaluation whose spread hasn't moved past the threshold emits
    /// nothing on the second pass, exercising the real gating path inside `evaluate_and_emit`.
    #[tokio::test]
    async fn test_evaluate_and_emit_suppresses_unchanged_spread() {
        let p_books = FakePBooks::default();
        let k_books = FakeKBooks::default();
        *p_books.0.lock() = Some(p_book(0.45, 0.56));
        *k_books.0.lock() = Some(k_book(0.58, 0.44));

        let active: Arc<Mutex<HashMap<String, f64>>> = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let pair = test_pair();

        evaluate_and_emit(&pair, &p_books, &k_books, 0.1, &active, &event_tx).await;
        let first = event_rx.recv().await.unwrap();
        assert!(matches!(first, RealtimeEvent::OpportunityOpened(_)));

        evaluate_and_emit(&pair, &p_books, &k_books, 0.1, &active, &event_tx).await;
        assert!(tokio::time::timeout(Duration::from_millis(20), event_rx.recv()).await.is_err());
    }
}
