//! Periodic refresh of tracked tokens
//!
//! Each cycle re-runs the refresh query against the providers (bypassing the
//! cache), perturbs the results slightly and broadcasts every record to all
//! subscribers. Cycles run one at a time inside the loop task.

use dashmap::DashSet;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use tokenagg_core::{RefreshConfig, TokenRecord};

use crate::aggregator::TokenAggregator;

/// Slow subscribers drop updates once this many are queued
const UPDATE_CHANNEL_CAPACITY: usize = 1024;

/// Simulated market movement: scale the price by up to `±price_jitter` and
/// shift the 24h change by up to `±change_jitter` points
pub fn apply_jitter<R: Rng>(
    record: &mut TokenRecord,
    rng: &mut R,
    price_jitter: f64,
    change_jitter: f64,
) {
    let price_jitter = price_jitter.abs();
    let change_jitter = change_jitter.abs();

    record.price_sol *= 1.0 + rng.gen_range(-price_jitter..=price_jitter);
    record.price_change_24h += rng.gen_range(-change_jitter..=change_jitter);
}

pub struct RefreshLoop {
    aggregator: Arc<TokenAggregator>,
    config: RefreshConfig,
    tracked: DashSet<String>,
    updates: broadcast::Sender<TokenRecord>,
    handle: Mutex<Option<JoinHandle<()>>>,
    /// The cycle currently in flight, if any
    cycle: Mutex<Option<AbortHandle>>,
}

impl RefreshLoop {
    pub fn new(aggregator: Arc<TokenAggregator>, config: RefreshConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let tracked = config.seed_tracked.iter().cloned().collect();

        Self {
            aggregator,
            config,
            tracked,
            updates,
            handle: Mutex::new(None),
            cycle: Mutex::new(None),
        }
    }

    /// Receive every record broadcast from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TokenRecord> {
        self.updates.subscribe()
    }

    pub fn track(&self, address: &str) {
        if self.tracked.insert(address.to_string()) {
            debug!("Tracking {}", address);
        }
    }

    pub fn untrack(&self, address: &str) {
        self.tracked.remove(address);
    }

    /// Tracked entries, sorted
    pub fn tracked(&self) -> Vec<String> {
        let mut tracked: Vec<String> = self.tracked.iter().map(|e| e.key().clone()).collect();
        tracked.sort();
        tracked
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Start the periodic trigger. No-op if already running.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }

        info!(
            "Starting refresh loop every {:?} for query \"{}\"",
            self.config.interval(),
            self.config.query
        );

        let this = Arc::clone(self);
        *handle = Some(tokio::spawn(async move { this.run().await }));
    }

    /// Cancel the periodic trigger and any cycle still in flight, so nothing
    /// is broadcast after this returns. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            info!("Stopping refresh loop");
            handle.abort();
        }
        if let Some(cycle) = self.cycle.lock().take() {
            cycle.abort();
        }
    }

    async fn run(self: Arc<Self>) {
        let period = self.config.interval();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            // A panicking cycle must not end the loop
            let this = Arc::clone(&self);
            let cycle = tokio::spawn(async move { this.run_cycle().await });
            *self.cycle.lock() = Some(cycle.abort_handle());

            let result = cycle.await;
            self.cycle.lock().take();

            match result {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => debug!("Refresh cycle cancelled"),
                Err(e) => error!("Refresh cycle failed: {}", e),
            }
        }
    }

    /// One refresh pass; returns how many records were broadcast
    pub async fn run_cycle(&self) -> usize {
        if self.tracked.is_empty() {
            return 0;
        }

        let mut records = self.aggregator.search_tokens(&self.config.query, true).await;

        {
            let mut rng = rand::thread_rng();
            for record in &mut records {
                apply_jitter(
                    record,
                    &mut rng,
                    self.config.price_jitter,
                    self.config.change_jitter,
                );
            }
        }

        for record in &records {
            // no subscribers is not an error
            let _ = self.updates.send(record.clone());
        }

        if let Some(top) = records.first() {
            info!(
                "Broadcasted updates for {} tokens. Top token ({}): {:.6} SOL (simulated)",
                records.len(),
                top.symbol,
                top.price_sol
            );
        }

        records.len()
    }
}
