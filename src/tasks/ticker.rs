//! Periodic tick task with scoped cancellation

use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// A repeating callback on the tokio runtime. The callback receives the one
/// `now` sample taken for that tick. Dropping the ticker aborts the task, so a
/// ticker can never outlive the state it was started for.
#[derive(Debug)]
pub struct Ticker {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a ticker whose first tick lands one `period` after `anchor`
    pub fn spawn<F>(name: &'static str, anchor: Instant, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(Instant) + Send + 'static,
    {
        debug!("Starting {} ticker", name);

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(anchor + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                on_tick(Instant::now());
            }
        });

        Self { name, handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        debug!("Cancelling {} ticker", self.name);
        self.handle.abort();
    }
}
