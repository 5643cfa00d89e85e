use std::{collections::BTreeMap, sync::Arc};

use chrono::{Duration, NaiveDate, TimeZone};
use tracing::trace;

use crate::{
    utils::time::{day_in, month_start},
    watcher::storage::entities::ActivityRecordEntity,
};

use super::palette::ProjectRegistry;

/// Number of non-empty intensity levels. The busiest day of a range is always at this level.
pub const INTENSITY_LEVELS: u8 = 4;

/// How far back an empty log is shown.
const DEFAULT_LOOK_BACK_DAYS: i64 = 365;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DayRange {
    pub fn new_opt(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Range shown for a log whose records span `first..=last` days.
    ///
    /// Starts at the beginning of the month of the first record, or a year before today when
    /// there are none, unless `start` says otherwise. Ends today, or later if some record is dated
    /// in the future, so nothing in the log is hidden by a skewed clock.
    pub fn covering(
        span: Option<(NaiveDate, NaiveDate)>,
        today: NaiveDate,
        start: Option<NaiveDate>,
    ) -> Self {
        let end = span.map_or(today, |(_, last)| last.max(today));
        let start = start.unwrap_or_else(|| {
            let first = span.map_or(today - Duration::days(DEFAULT_LOOK_BACK_DAYS), |v| v.0);
            month_start(first)
        });
        Self {
            start: start.min(end),
            end,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |v| *v <= end)
    }
}

/// Summary of a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAggregate {
    pub date: NaiveDate,
    pub project_counts: BTreeMap<Arc<str>, u64>,
    pub total: u64,
    /// Project with the most events. Ties go to the name that sorts first.
    pub dominant_project: Option<Arc<str>>,
    /// 0 for days without activity, otherwise 1..=[INTENSITY_LEVELS].
    pub intensity: u8,
}

impl DayAggregate {
    fn new(date: NaiveDate, project_counts: BTreeMap<Arc<str>, u64>, max_total: u64) -> Self {
        let total = project_counts.values().sum();
        Self {
            date,
            total,
            dominant_project: dominant_project(&project_counts),
            intensity: intensity(total, max_total),
            project_counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Counts ordered from the most active project, ties by name.
    pub fn breakdown(&self) -> Vec<(&Arc<str>, u64)> {
        let mut breakdown = self
            .project_counts
            .iter()
            .map(|(k, v)| (k, *v))
            .collect::<Vec<_>>();
        breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        breakdown
    }
}

/// Arg-max by count. The map iterates in name order and only a strictly larger count replaces
/// the current pick, so the first name wins a tie.
fn dominant_project(project_counts: &BTreeMap<Arc<str>, u64>) -> Option<Arc<str>> {
    let mut best: Option<(&Arc<str>, u64)> = None;
    for (project, count) in project_counts {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((project, *count)),
        }
    }
    best.map(|(v, _)| v.clone())
}

/// Relative activity of a day. `ceil(levels * total / max_total)`, so it only grows with
/// `total` and the busiest day gets the highest level.
pub fn intensity(total: u64, max_total: u64) -> u8 {
    if total == 0 || max_total == 0 {
        return 0;
    }
    let level = (total * INTENSITY_LEVELS as u64).div_ceil(max_total);
    level.clamp(1, INTENSITY_LEVELS as u64) as u8
}

/// Everything the graph shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCalendar {
    pub range: DayRange,
    /// One entry for every day of the range, in order.
    pub days: Vec<DayAggregate>,
    pub projects: ProjectRegistry,
    pub max_total: u64,
}

impl ActivityCalendar {
    pub fn day(&self, date: NaiveDate) -> Option<&DayAggregate> {
        if !self.range.contains(date) {
            return None;
        }
        self.days.get((date - self.range.start()).num_days() as usize)
    }

    pub fn total(&self) -> u64 {
        self.days.iter().map(|v| v.total).sum()
    }
}

/// First and last day with records, as seen in `tz`.
pub fn record_span<Tz: TimeZone>(
    records: &[ActivityRecordEntity],
    tz: &Tz,
) -> Option<(NaiveDate, NaiveDate)> {
    records.iter().fold(None, |span, record| {
        let day = day_in(record.timestamp, tz);
        Some(match span {
            None => (day, day),
            Some((first, last)) => (first.min(day), last.max(day)),
        })
    })
}

/// Groups records into days of `range`. Records outside of the range are left out. Always
/// recomputed from scratch, the result depends only on the records, the range and `tz`.
pub fn aggregate<Tz: TimeZone>(
    records: impl IntoIterator<Item = ActivityRecordEntity>,
    range: DayRange,
    tz: &Tz,
) -> ActivityCalendar {
    let mut counts = BTreeMap::<NaiveDate, BTreeMap<Arc<str>, u64>>::new();
    for record in records {
        let day = day_in(record.timestamp, tz);
        if !range.contains(day) {
            trace!("Record outside of {range:?} {record:?}");
            continue;
        }
        *counts.entry(day).or_default().entry(record.project).or_default() += 1;
    }

    let max_total = counts
        .values()
        .map(|v| v.values().sum::<u64>())
        .max()
        .unwrap_or(0);

    let days = range
        .days()
        .map(|date| DayAggregate::new(date, counts.remove(&date).unwrap_or_default(), max_total))
        .collect::<Vec<_>>();

    let projects = ProjectRegistry::from_projects(
        days.iter()
            .flat_map(|v| v.project_counts.keys().cloned()),
    );

    ActivityCalendar {
        range,
        days,
        projects,
        max_total,
    }
}

/// Range selection plus aggregation, the way the graph and the summary see the log.
pub fn build_calendar<Tz: TimeZone>(
    records: Vec<ActivityRecordEntity>,
    today: NaiveDate,
    start: Option<NaiveDate>,
    tz: &Tz,
) -> ActivityCalendar {
    let range = DayRange::covering(record_span(&records, tz), today, start);
    aggregate(records, range, tz)
}
