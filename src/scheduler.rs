//! Cron-driven trigger that fires watch cycles until stopped.
//!
//! The trigger awaits each cycle before looking for the next tick, so at most one
//! cycle is in flight. Ticks that pass while a cycle is still running are skipped.
//! Each cycle runs in its own task; a panic there is logged and the trigger keeps going.

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for seconds.
pub fn normalize_cron(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

pub struct Trigger {
    schedule: Schedule,
}

impl Trigger {
    pub fn new(expression: &str) -> Result<Self> {
        let normalized = normalize_cron(expression);
        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| anyhow!("Invalid cron expression '{expression}': {e}"))?;
        Ok(Self { schedule })
    }

    /// Time until the next tick, or `None` if the schedule never fires again.
    pub fn until_next(&self) -> Option<Duration> {
        let now = Local::now();
        self.schedule
            .after(&now)
            .next()
            .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Spawns the trigger loop, calling `cycle` on every tick.
    pub fn start<F, Fut>(self, cycle: F) -> TriggerHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!("Trigger started");
            loop {
                let Some(delay) = self.until_next() else {
                    info!("Schedule has no upcoming ticks, trigger exiting");
                    break;
                };
                debug!(delay_ms = delay.as_millis() as u64, "Waiting for next tick");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stop_rx.changed() => break,
                }

                if let Err(e) = tokio::spawn(cycle()).await {
                    error!(error = %e, "Watch cycle aborted abnormally");
                }

                if *stop_rx.borrow() {
                    break;
                }
            }
            info!("Trigger stopped");
        });

        TriggerHandle { stop_tx, task }
    }
}

pub struct TriggerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TriggerHandle {
    /// Stops firing new cycles. A cycle already running is allowed to finish.
    pub async fn stop(self) -> Result<()> {
        // Receiver is gone only if the loop already exited
        let _ = self.stop_tx.send(true);
        self.task.await.context("Trigger task failed")
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
