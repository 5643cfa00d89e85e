use std::fmt::Write;

use crate::utils::time::date_key;

use super::{
    aggregation::ActivityCalendar,
    calendar::{CalendarGrid, Cell, DayCell},
    palette::EMPTY_COLOR,
};

/// Renders the graph as a standalone page. Nothing is loaded from the network, styles are inline.
pub fn render_html(calendar: &ActivityCalendar, grid: &CalendarGrid) -> String {
    let mut months_html = String::new();
    for month in &grid.months {
        let _ = write!(
            months_html,
            r#"<div class="month"><div class="label">{}</div><div class="cells">"#,
            html_escape(&month.label)
        );
        for cell in &month.cells {
            match cell {
                Cell::Spacer => months_html.push_str(r#"<div class="cell spacer"></div>"#),
                Cell::Day(day) => months_html.push_str(&day_html(day)),
            }
        }
        months_html.push_str("</div></div>\n");
    }

    let legend_html = if grid.legend.is_empty() {
        r#"<span class="empty">No activity recorded yet</span>"#.to_string()
    } else {
        grid.legend
            .iter()
            .map(|v| {
                format!(
                    r#"<span class="entry"><span class="swatch" style="background-color: {}"></span>{}</span>"#,
                    v.color,
                    html_escape(&v.project)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let subtitle = format!(
        "{} to {}, {} events across {} projects",
        date_key(calendar.range.start()),
        date_key(calendar.range.end()),
        calendar.total(),
        calendar.projects.len()
    );

    GRAPH_HTML
        .replace("<!-- EMPTY_COLOR -->", EMPTY_COLOR)
        .replace("<!-- SUBTITLE -->", &html_escape(&subtitle))
        .replace("<!-- MONTHS -->", &months_html)
        .replace("<!-- LEGEND -->", &legend_html)
}

fn day_html(day: &DayCell) -> String {
    match day.fill {
        Some(color) if day.intensity > 0 => format!(
            r#"<div class="cell level-{}" style="background-color: {color}" title="{}"></div>"#,
            day.intensity,
            html_escape(&day.tooltip)
        ),
        _ => format!(
            r#"<div class="cell none" title="{}"></div>"#,
            html_escape(&day.tooltip)
        ),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const GRAPH_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Development activity</title>
<style>
body { background: #0d1117; color: #c9d1d9; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem; }
h1 { font-size: 1.4rem; margin-bottom: 0.2rem; }
.subtitle { color: #8b949e; margin-bottom: 1.5rem; }
.month { display: flex; align-items: center; margin-bottom: 4px; }
.label { width: 6rem; font-size: 0.8rem; color: #8b949e; }
.cells { display: flex; gap: 3px; }
.cell { width: 12px; height: 12px; border-radius: 2px; }
.spacer { background: transparent; }
.none { background-color: <!-- EMPTY_COLOR -->; }
.level-1 { opacity: 0.4; }
.level-2 { opacity: 0.6; }
.level-3 { opacity: 0.8; }
.level-4 { opacity: 1.0; }
.legend { margin-top: 1.5rem; display: flex; flex-wrap: wrap; gap: 1rem; font-size: 0.85rem; }
.entry { display: inline-flex; align-items: center; gap: 0.4rem; }
.swatch { width: 12px; height: 12px; border-radius: 2px; display: inline-block; }
.empty { color: #8b949e; }
</style>
</head>
<body>
<h1>Development activity</h1>
<div class="subtitle"><!-- SUBTITLE --></div>
<div class="calendar">
<!-- MONTHS -->
</div>
<div class="legend">
<!-- LEGEND -->
</div>
</body>
</html>
"#;
