//! One watch cycle: fetch the rate, run it through the gate, commit and notify.
//!
//! The state is committed with compare-and-set before the email goes out. A failed
//! send is logged and does not roll the state back, so the store may record a
//! notification whose email never arrived.

use crate::core::currency::{ExchangeRate, FetchError, RateSource};
use crate::core::gate::{self, AlertPolicy, Decision, SkipReason};
use crate::core::notify::{Notification, Notifier};
use crate::core::state::StateStore;
use chrono::{DateTime, TimeZone};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Skipped {
        rate: ExchangeRate,
        reason: SkipReason,
    },
    Notified {
        rate: ExchangeRate,
        sent_today: u32,
        delivered: bool,
    },
    /// Another writer changed the state between our read and our commit.
    Superseded { rate: ExchangeRate },
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Failed to fetch exchange rate: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification state unavailable: {0:#}")]
    State(anyhow::Error),
}

pub struct RateWatcher {
    source: Arc<dyn RateSource>,
    state: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    policy: AlertPolicy,
}

impl RateWatcher {
    pub fn new(
        source: Arc<dyn RateSource>,
        state: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        policy: AlertPolicy,
    ) -> Self {
        Self {
            source,
            state,
            notifier,
            policy,
        }
    }

    pub async fn run_cycle<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
    ) -> Result<CycleOutcome, CycleError> {
        let rate = self.source.fetch().await?;
        info!(
            "Conversion value for 1 {} to {} currently is {}",
            rate.base, rate.quote, rate.value
        );

        let current = self.state.load().await.map_err(CycleError::State)?;
        debug!(state = ?current, "Loaded notification state");

        let new_state = match gate::evaluate(&rate, &current, &self.policy, &now) {
            Decision::Skip(reason) => {
                debug!(?reason, "Not notifying");
                return Ok(CycleOutcome::Skipped { rate, reason });
            }
            Decision::Notify(new_state) => new_state,
        };

        let committed = self
            .state
            .compare_and_set(&current, &new_state)
            .await
            .map_err(CycleError::State)?;
        if !committed {
            warn!("Notification state changed during the cycle, leaving it to the other writer");
            return Ok(CycleOutcome::Superseded { rate });
        }

        let notification = Notification::for_rate(&rate);
        let delivered = match self.notifier.send(&notification).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to send notification");
                false
            }
        };

        Ok(CycleOutcome::Notified {
            rate,
            sent_today: new_state.notifications_sent_today,
            delivered,
        })
    }

    /// Runs a cycle and logs its result. Used by the trigger, which must keep firing
    /// whatever happens inside a cycle.
    pub async fn run_logged<Tz: TimeZone>(&self, now: DateTime<Tz>) {
        match self.run_cycle(now).await {
            Ok(CycleOutcome::Notified {
                rate,
                sent_today,
                delivered,
            }) => info!(rate = rate.value, sent_today, delivered, "Notification cycle completed"),
            Ok(CycleOutcome::Skipped { rate, reason }) => {
                info!(rate = rate.value, ?reason, "No notification this cycle")
            }
            Ok(CycleOutcome::Superseded { rate }) => {
                info!(rate = rate.value, "Cycle superseded by a concurrent update")
            }
            Err(e) => error!(error = %e, "Watch cycle failed"),
        }
    }
}
