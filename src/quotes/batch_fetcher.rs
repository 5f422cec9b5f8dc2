use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};

use super::client::QuoteClient;
use super::models::{Quote, Symbol};

/// Hard cap on concurrent upstream requests, whatever the configuration asks for
pub const MAX_WORKERS: usize = 5;

/// Slack on top of the per-symbol timeout before the whole batch is abandoned
const BATCH_DEADLINE_MARGIN: Duration = Duration::from_millis(100);

/// Successful quotes keyed by symbol; failed and timed-out symbols are absent
pub type BatchResult = HashMap<Symbol, Quote>;

/// Tuning for a single `fetch_all` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Requested concurrent workers; clamped to `1..=MAX_WORKERS` and the batch size
    pub max_workers: usize,

    /// Budget for a single symbol's fetch; the symbol is abandoned past it
    pub per_task_timeout: Duration,

    /// Pause each worker takes after every fetch to stay under the upstream rate limit
    pub inter_request_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_workers: 5,
            per_task_timeout: Duration::from_secs(15),
            inter_request_delay: Duration::from_millis(100),
        }
    }
}

impl FetchOptions {
    /// Number of workers spawned for `symbol_count` symbols
    pub fn worker_count(&self, symbol_count: usize) -> usize {
        self.max_workers.clamp(1, MAX_WORKERS).min(symbol_count)
    }

    /// Wall-time budget for a whole batch, measured from its start
    ///
    /// Symbols still queued or in flight when it runs out are dropped from the
    /// result, so a batch never outlives a single symbol's timeout by more than
    /// the margin.
    pub fn batch_deadline(&self) -> Duration {
        self.per_task_timeout.saturating_add(BATCH_DEADLINE_MARGIN)
    }
}

/// Fans a symbol list out to a bounded pool of workers draining a shared queue
///
/// Partial failure is not an error: the result simply omits symbols that had no
/// valid quote or did not finish within their timeout. Result order is completion
/// order and carries no relation to the input order.
#[derive(Clone)]
pub struct BatchFetcher {
    client: Arc<dyn QuoteClient>,
}

impl BatchFetcher {
    pub fn new(client: Arc<dyn QuoteClient>) -> Self {
        Self { client }
    }

    /// Fetch quotes for every symbol, bounded by `options`
    pub async fn fetch_all(&self, symbols: &[Symbol], options: &FetchOptions) -> BatchResult {
        if symbols.is_empty() {
            return BatchResult::new();
        }

        let start = Instant::now();
        let worker_count = options.worker_count(symbols.len());
        let queue = Arc::new(Mutex::new(symbols.iter().cloned().collect::<VecDeque<_>>()));
        let results: Arc<DashMap<Symbol, Quote>> = Arc::new(DashMap::new());

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&self.client),
                Arc::clone(&queue),
                Arc::clone(&results),
                options.clone(),
            ));
        }

        let deadline = options.batch_deadline();
        let drained = timeout(deadline, async {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Quote worker terminated abnormally: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            workers.abort_all();
            while workers.join_next().await.is_some() {}

            let abandoned: Vec<Symbol> = queue.lock().drain(..).collect();
            tracing::warn!(
                "⏱️  Batch deadline of {:?} exceeded; {} symbols never started: {:?}",
                deadline,
                abandoned.len(),
                abandoned
            );
        }

        let batch: BatchResult = results
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        tracing::info!(
            "Fetched {}/{} quotes with {} workers in {} ms",
            batch.len(),
            symbols.len(),
            worker_count,
            start.elapsed().as_millis()
        );

        batch
    }
}

/// Worker loop: pop a symbol, fetch it under its own timeout, pause, repeat
async fn run_worker(
    worker_id: usize,
    client: Arc<dyn QuoteClient>,
    queue: Arc<Mutex<VecDeque<Symbol>>>,
    results: Arc<DashMap<Symbol, Quote>>,
    options: FetchOptions,
) {
    loop {
        // Lock released before the fetch is awaited
        let next = queue.lock().pop_front();
        let Some(symbol) = next else {
            break;
        };

        match timeout(options.per_task_timeout, client.fetch_price(&symbol)).await {
            Ok(Some(quote)) => {
                results.insert(symbol, quote);
            }
            Ok(None) => {
                tracing::debug!("Worker {}: no valid quote for {}", worker_id, symbol);
            }
            Err(_) => {
                tracing::warn!(
                    "⏱️  Worker {}: fetching {} exceeded {:?}, abandoned",
                    worker_id,
                    symbol,
                    options.per_task_timeout
                );
            }
        }

        if !options.inter_request_delay.is_zero() {
            sleep(options.inter_request_delay).await;
        }
    }
}
