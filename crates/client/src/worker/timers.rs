//! Periodic background jobs: cache sweep and self-update polling.

use std::sync::Arc;
use std::time::Duration;

use mealsw_core::CacheDb;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::host::{Host, UpdateCheck};
use super::sweep::{EvictionPolicy, sweep};

/// Handles to the two recurring jobs. Neither fires immediately.
#[derive(Debug)]
pub struct Timers {
    sweep: JoinHandle<()>,
    update: JoinHandle<()>,
}

impl Timers {
    pub fn start(
        db: CacheDb, policy: EvictionPolicy, sweep_every: Duration, host: Arc<dyn Host>, update_every: Duration,
    ) -> Self {
        let sweep = tokio::spawn(sweep_loop(db, policy, sweep_every));
        let update = tokio::spawn(update_loop(host, update_every));
        Self { sweep, update }
    }

    pub fn stop(&self) {
        self.sweep.abort();
        self.update.abort();
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep_loop(db: CacheDb, policy: EvictionPolicy, every: Duration) {
    let mut ticks = interval_at(Instant::now() + every, every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        match sweep(&db, policy).await {
            Ok(report) => tracing::debug!(deleted = report.deleted(), "cache sweep finished"),
            Err(e) => tracing::warn!(error = %e, "cache sweep failed"),
        }
    }
}

async fn update_loop(host: Arc<dyn Host>, every: Duration) {
    let mut ticks = interval_at(Instant::now() + every, every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        match host.check_for_update().await {
            Ok(UpdateCheck::Changed) => tracing::info!("newer worker definition found"),
            Ok(UpdateCheck::Unchanged) => tracing::debug!("worker definition unchanged"),
            Err(e) => tracing::warn!(error = %e, "update check failed"),
        }
    }
}
