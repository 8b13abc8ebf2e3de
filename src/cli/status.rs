use super::ui;
use crate::core::config::AppConfig;
use crate::core::{NotificationState, StateStore, gate};
use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use comfy_table::Cell;

/// Prints the persisted notification state.
pub async fn run(state: &dyn StateStore, config: &AppConfig) -> Result<()> {
    let current = state.load().await?;
    println!("{}", render(&current, config, &Local::now()));
    Ok(())
}

pub fn render<Tz: TimeZone>(state: &NotificationState, config: &AppConfig, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let pair = format!("{} → {}", config.pair.from, config.pair.to);
    let mut output = format!(
        "Watching: {}\n\n",
        ui::style_text(&pair, ui::StyleType::Title)
    );

    if state.is_empty() {
        output.push_str(&ui::style_text(
            "No notification has been sent yet",
            ui::StyleType::Subtle,
        ));
        return output;
    }

    let last_at = state
        .last_notified_at
        .as_ref()
        .map(|at| at.with_timezone(&now.timezone()));
    let sent_today = gate::sent_today(state, now);
    let renotify_at = state
        .last_notified_rate
        .map(|rate| rate + config.alert.min_delta_to_renotify);

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Threshold"),
        ui::format_optional_cell(Some(config.alert.email_threshold), |v| format!("{v:.4}")),
    ]);
    table.add_row(vec![
        Cell::new("Last notified rate"),
        ui::format_optional_cell(state.last_notified_rate, |v| format!("{v:.4}")),
    ]);
    table.add_row(vec![
        Cell::new("Next notification at or above"),
        ui::format_optional_cell(renotify_at, |v| format!("{v:.4}")),
    ]);
    table.add_row(vec![
        Cell::new("Last notified at"),
        ui::format_optional_cell(last_at, |at| at.format("%Y-%m-%d %H:%M:%S %:z").to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Sent today"),
        ui::format_optional_cell(Some(sent_today), |n| {
            format!("{n}/{}", config.alert.max_emails_per_day)
        }),
    ]);
    output.push_str(&table.to_string());
    output
}
