//! Scan orchestrator (SPEC_FULL.md §4.7/§5, component C7).
//!
//! Owns the scan-result cache and the in-flight-scan handle exclusively (SPEC_FULL.md §3
//! "Ownership"). The actual fetch/match/calculate/analyze pipeline is supplied by a
//! [`ScanExecutor`] implementation (see `pipeline.rs`) so this module stays pure state-machine
//! logic, independent of any venue client.

use crate::types::ScanResult;
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Runs one full scan. Implemented by `pipeline::Pipeline` in this crate; kept as a trait so
/// the state machine in [`Scanner`] can be exercised in tests without real venue clients.
#[async_trait]
pub trait ScanExecutor: Send + Sync {
    async fn perform_scan(&self) -> ScanResult;
}

type SharedScan = Shared<BoxFuture<'static, Arc<ScanResult>>>;

/// The single process-wide scanner value. Construct once; there is no teardown beyond drop
/// (SPEC_FULL.md §8 "Global state").
pub struct Scanner<E: ScanExecutor + 'static> {
    executor: Arc<E>,
    ttl: Duration,
    cache: Mutex<Option<(Arc<ScanResult>, Instant)>>,
    inflight: Mutex<Option<SharedScan>>,
}

impl<E: ScanExecutor + 'static> Scanner<E> {
    #[must_use]
    pub fn new(executor: E, ttl: Duration) -> Self {
        Self { executor: Arc::new(executor), ttl, cache: Mutex::new(None), inflight: Mutex::new(None) }
    }

    /// Returns a scan result per the state machine in SPEC_FULL.md §4.7:
    /// fresh cache and no force-refresh ⇒ cached; a scan already in progress ⇒ join it
    /// (even under `force_refresh`, per §5's single-flight rule); otherwise run a new scan.
    pub async fn scan(&self, force_refresh: bool) -> Arc<ScanResult> {
        if let Some(inflight) = self.inflight.lock().await.clone() {
            debug!("joining in-flight scan");
            return inflight.await;
        }

        if !force_refresh {
            let cache = self.cache.lock().await;
            if let Some((result, started_at)) = cache.as_ref() {
                if started_at.elapsed() < self.ttl {
                    return result.clone();
                }
            }
        }

        let mut inflight_guard = self.inflight.lock().await;
        if let Some(inflight) = inflight_guard.clone() {
            drop(inflight_guard);
            return inflight.await;
        }

        let executor = self.executor.clone();
        let shared: SharedScan = async move { Arc::new(executor.perform_scan().await) }.boxed().shared();
        *inflight_guard = Some(shared.clone());
        drop(inflight_guard);

        let result = shared.await;

        *self.cache.lock().await = Some((result.clone(), Instant::now()));
        *self.inflight.lock().await = None;

        result
    }
}
