use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::utils::time::{date_key, month_start, next_month_start};

use super::{
    aggregation::{ActivityCalendar, DayAggregate},
    palette::ProjectColor,
};

/// Layout of the graph, independent of the output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub months: Vec<MonthRow>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRow {
    /// For example `May 2024`.
    pub label: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Padding before the first shown day of a month.
    Spacer,
    Day(DayCell),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Color of the dominant project. None for days without activity.
    pub fill: Option<ProjectColor>,
    pub intensity: u8,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub project: Arc<str>,
    pub color: ProjectColor,
}

/// Lays the calendar out month by month. Every row starts on a Monday, so the columns of all
/// rows line up by weekday.
pub fn layout(calendar: &ActivityCalendar) -> CalendarGrid {
    let range = calendar.range;
    let mut months = vec![];
    let mut current = Some(month_start(range.start()));

    while let Some(first) = current.filter(|v| *v <= range.end()) {
        let mut cells = vec![Cell::Spacer; first.weekday().num_days_from_monday() as usize];
        for date in first.iter_days().take_while(|v| v.month() == first.month()) {
            if date > range.end() {
                break;
            }
            match calendar.day(date) {
                Some(day) => cells.push(Cell::Day(day_cell(calendar, day))),
                None => cells.push(Cell::Spacer),
            }
        }
        months.push(MonthRow {
            label: first.format("%b %Y").to_string(),
            cells,
        });
        current = next_month_start(first);
    }

    let legend = calendar
        .projects
        .iter()
        .map(|(project, color)| LegendEntry {
            project: project.clone(),
            color,
        })
        .collect();

    CalendarGrid { months, legend }
}

fn day_cell(calendar: &ActivityCalendar, day: &DayAggregate) -> DayCell {
    DayCell {
        date: day.date,
        fill: day
            .dominant_project
            .as_ref()
            .and_then(|v| calendar.projects.color_of(v)),
        intensity: day.intensity,
        tooltip: tooltip(day),
    }
}

/// `2024-05-01: alpha: 5, beta: 2`
pub fn tooltip(day: &DayAggregate) -> String {
    if day.is_empty() {
        return format!("{}: no activity", date_key(day.date));
    }
    let breakdown = day
        .breakdown()
        .into_iter()
        .map(|(project, count)| format!("{project}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: {breakdown}", date_key(day.date))
}
