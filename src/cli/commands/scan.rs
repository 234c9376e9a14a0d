use crate::cli::commands::open_registry;
use crate::config::Config;
use crate::core::scheduler::pending_reminders;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use crate::utils::time::{format_local, parse_offset};
use chrono::{Duration, Utc};

/// Handle the `scan` command: print what the next scan cycle would send.
/// Nothing is delivered and no list is modified.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let tz = parse_offset(&cfg.timezone)?;
    let registry = open_registry(cfg);

    let now = Utc::now();
    let due = pending_reminders(&registry, now, Duration::seconds(cfg.repeat_interval_secs));

    header(format!("Reminders due at {}", format_local(&now, &tz)));

    if due.is_empty() {
        info("No reminders to send.");
        return Ok(());
    }

    for (user_id, r) in &due {
        println!(
            "{:>12}  {:<20} #{:<5} {}  ({})",
            user_id,
            r.store,
            r.task_id,
            r.text,
            format_local(&r.due_at, &tz)
        );
    }
    println!();
    info(format!("{} reminder(s) would be sent.", due.len()));
    Ok(())
}
