//! Decides whether an observed rate is worth a notification.
//!
//! The gate is a pure function of the rate, the persisted [`NotificationState`], the
//! [`AlertPolicy`] and the current time. It never touches the store; on
//! [`Decision::Notify`] the caller is responsible for committing the returned state.
//!
//! A rate qualifies when it is at or above the threshold. After the first notification
//! a repeat needs the rate to have climbed at least `min_delta_to_renotify` above the
//! last notified rate, and no more than `max_emails_per_day` go out per calendar day.
//! The day boundary is the day-of-year in the caller's timezone, not a rolling 24h. The
//! year is not compared, so a notification made on the same day-of-year a year earlier
//! still counts as today.

use crate::core::currency::ExchangeRate;
use crate::core::state::NotificationState;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_DELTA_TO_RENOTIFY: f64 = 0.20;
pub const DEFAULT_MAX_EMAILS_PER_DAY: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    pub email_threshold: f64,
    #[serde(default = "default_max_emails_per_day")]
    pub max_emails_per_day: u32,
    #[serde(default = "default_min_delta_to_renotify")]
    pub min_delta_to_renotify: f64,
}

fn default_max_emails_per_day() -> u32 {
    DEFAULT_MAX_EMAILS_PER_DAY
}

fn default_min_delta_to_renotify() -> f64 {
    DEFAULT_MIN_DELTA_TO_RENOTIFY
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    BelowThreshold { threshold: f64 },
    BelowRenotifyDelta { last_notified: f64, required: f64 },
    DailyCapReached { sent_today: u32, cap: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Skip(SkipReason),
    Notify(NotificationState),
}

pub fn evaluate<Tz: TimeZone>(
    rate: &ExchangeRate,
    state: &NotificationState,
    policy: &AlertPolicy,
    now: &DateTime<Tz>,
) -> Decision {
    if rate.value < policy.email_threshold {
        return Decision::Skip(SkipReason::BelowThreshold {
            threshold: policy.email_threshold,
        });
    }

    if let Some(last_notified) = state.last_notified_rate {
        let required = last_notified + policy.min_delta_to_renotify;
        if rate.value < required {
            return Decision::Skip(SkipReason::BelowRenotifyDelta {
                last_notified,
                required,
            });
        }
    }

    let sent_today = sent_today(state, now);
    if sent_today >= policy.max_emails_per_day {
        return Decision::Skip(SkipReason::DailyCapReached {
            sent_today,
            cap: policy.max_emails_per_day,
        });
    }

    Decision::Notify(NotificationState {
        last_notified_rate: Some(rate.value),
        notifications_sent_today: sent_today + 1,
        last_notified_at: Some(now.with_timezone(&Utc)),
    })
}

/// Today's count, or 0 once the day-of-year of `now` differs from the last notification's.
pub fn sent_today<Tz: TimeZone>(state: &NotificationState, now: &DateTime<Tz>) -> u32 {
    match &state.last_notified_at {
        Some(last) if last.with_timezone(&now.timezone()).ordinal() == now.ordinal() => {
            state.notifications_sent_today
        }
        _ => 0,
    }
}
