use super::ui;
use crate::core::SkipReason;
use crate::watcher::{CycleOutcome, RateWatcher};
use anyhow::Result;
use chrono::Local;

/// Runs a single watch cycle right now and prints what happened.
pub async fn run(watcher: &RateWatcher) -> Result<()> {
    let pb = ui::new_spinner("Checking exchange rate...");
    let result = watcher.run_cycle(Local::now()).await;
    pb.finish_and_clear();

    let outcome = result?;
    println!("{}", describe(&outcome));
    Ok(())
}

pub fn describe(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Notified {
            rate,
            sent_today,
            delivered,
        } => {
            let headline = format!("1 {} = {} {}", rate.base, rate.value, rate.quote);
            let detail = if *delivered {
                ui::style_text(
                    &format!("Notification sent ({sent_today} today)"),
                    ui::StyleType::Good,
                )
            } else {
                ui::style_text(
                    &format!("Notification recorded ({sent_today} today) but the email failed"),
                    ui::StyleType::Error,
                )
            };
            format!("{}\n{detail}", ui::style_text(&headline, ui::StyleType::Title))
        }
        CycleOutcome::Skipped { rate, reason } => {
            let headline = format!("1 {} = {} {}", rate.base, rate.value, rate.quote);
            let detail = match reason {
                SkipReason::BelowThreshold { threshold } => {
                    format!("Below threshold of {threshold}, no notification")
                }
                SkipReason::BelowRenotifyDelta {
                    last_notified,
                    required,
                } => format!(
                    "Last notified at {last_notified}, needs {required:.4} to notify again"
                ),
                SkipReason::DailyCapReached { sent_today, cap } => {
                    format!("Daily limit reached ({sent_today}/{cap}), no notification")
                }
            };
            format!(
                "{}\n{}",
                ui::style_text(&headline, ui::StyleType::Title),
                ui::style_text(&detail, ui::StyleType::Subtle)
            )
        }
        CycleOutcome::Superseded { rate } => {
            let headline = format!("1 {} = {} {}", rate.base, rate.value, rate.quote);
            format!(
                "{}\n{}",
                ui::style_text(&headline, ui::StyleType::Title),
                ui::style_text(
                    "Another watcher updated the state first, no notification",
                    ui::StyleType::Warning
                )
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExchangeRate;

    fn rate() -> ExchangeRate {
        ExchangeRate {
            base: "USD".parse().unwrap(),
            quote: "INR".parse().unwrap(),
            value: 82.6,
        }
    }

    #[test]
    fn test_describe_outcomes() {
        let notified = describe(&CycleOutcome::Notified {
            rate: rate(),
            sent_today: 2,
            delivered: true,
        });
        assert!(notified.contains("1 USD = 82.6 INR"));
        assert!(notified.contains("Notification sent (2 today)"));

        let failed = describe(&CycleOutcome::Notified {
            rate: rate(),
            sent_today: 1,
            delivered: false,
        });
        assert!(failed.contains("but the email failed"));

        let skipped = describe(&CycleOutcome::Skipped {
            rate: rate(),
            reason: SkipReason::BelowRenotifyDelta {
                last_notified: 82.5,
                required: 82.7,
            },
        });
        assert!(skipped.contains("needs 82.7000 to notify again"));

        let capped = describe(&CycleOutcome::Skipped {
            rate: rate(),
            reason: SkipReason::DailyCapReached {
                sent_today: 5,
                cap: 5,
            },
        });
        assert!(capped.contains("Daily limit reached (5/5)"));
    }
}
