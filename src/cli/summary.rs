use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use chrono::Local;
use clap::Parser;

use crate::{
    utils::{
        clock::{Clock, DefaultClock},
        percentage::{count_percentage, Percentage},
        time::{date_key, day_in},
    },
    watcher::storage::activity_log::ActivityStorage,
};

use super::{
    log_storage,
    output::aggregation::{build_calendar, ActivityCalendar},
    range::RangeArgs,
};

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(
        long,
        help = "Activity log to read. Defaults to activity.jsonl in the application directory"
    )]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    range: RangeArgs,
    #[arg(
        short = 'p',
        long = "percentage",
        help = "Filter projects to have at least specified percentage",
        default_value_t = Percentage::new_opt(1.).unwrap()
    )]
    min_percentage: Percentage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTotal {
    pub project: Arc<str>,
    pub count: u64,
    pub percentage: Percentage,
    pub active_days: usize,
}

/// Command to process `summary` command. Prints how events are split between projects in the same
/// range the graph would show.
pub async fn process_summary_command(
    SummaryCommand {
        log_file,
        range,
        min_percentage,
    }: SummaryCommand,
    application_path: &Path,
) -> Result<()> {
    let storage = log_storage(log_file, application_path);
    let clock = DefaultClock;

    let start = range.parse_start(clock.time().with_timezone(&Local))?;
    let contents = storage.read_all().await?;
    if contents.malformed_lines > 0 {
        eprintln!(
            "Skipped {} malformed lines in {}",
            contents.malformed_lines,
            storage.path().display()
        );
    }
    let calendar = build_calendar(contents.records, day_in(clock.time(), &Local), start, &Local);

    let (totals, total) = project_totals(&calendar, min_percentage);
    println!(
        "{} to {}\t{total} events",
        date_key(calendar.range.start()),
        date_key(calendar.range.end())
    );
    for entry in totals {
        println!(
            "{}%\t{}\t{}d\t{}",
            *entry.percentage as i32, entry.count, entry.active_days, entry.project
        );
    }
    Ok(())
}

/// Totals per project, most active first. Projects below `min_percentage` of all events are left
/// out. Also returns the number of all events.
pub fn project_totals(
    calendar: &ActivityCalendar,
    min_percentage: Percentage,
) -> (Vec<ProjectTotal>, u64) {
    let mut counts = BTreeMap::<&Arc<str>, (u64, usize)>::new();
    for day in &calendar.days {
        for (project, count) in &day.project_counts {
            let entry = counts.entry(project).or_default();
            entry.0 += count;
            entry.1 += 1;
        }
    }
    let total = calendar.total();

    let mut totals = counts
        .into_iter()
        .map(|(project, (count, active_days))| ProjectTotal {
            project: project.clone(),
            count,
            percentage: count_percentage(count, total),
            active_days,
        })
        .filter(|v| v.percentage >= min_percentage)
        .collect::<Vec<_>>();
    totals.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.project.cmp(&b.project)));

    (totals, total)
}
