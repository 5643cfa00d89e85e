use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::Parser;
use tracing::info;

use crate::{
    utils::{
        clock::{Clock, DefaultClock},
        dir::GRAPH_FILENAME,
        time::day_in,
    },
    watcher::storage::activity_log::ActivityStorage,
};

use super::{
    log_storage,
    output::{aggregation::build_calendar, calendar::layout, html::render_html},
    process::open_in_browser,
    range::RangeArgs,
};

#[derive(Debug, Parser)]
pub struct GraphCommand {
    #[arg(long, help = "Activity log to read. Defaults to activity.jsonl in the application directory")]
    log_file: Option<PathBuf>,
    #[arg(
        short,
        long,
        help = "Where to write the page. Defaults to activity-graph.html in the application directory"
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Open the page in the default browser once written")]
    open: bool,
    #[command(flatten)]
    range: RangeArgs,
}

/// What a single graph generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphReport {
    pub output: PathBuf,
    pub total_events: u64,
    pub projects: usize,
    pub malformed_lines: usize,
}

/// Command to process `graph` command. Reads the whole log, renders the calendar and writes it
/// into a single html file.
pub async fn process_graph_command(
    GraphCommand {
        log_file,
        output,
        open,
        range,
    }: GraphCommand,
    application_path: &Path,
) -> Result<()> {
    let storage = log_storage(log_file, application_path);
    let output = output.unwrap_or_else(|| application_path.join(GRAPH_FILENAME));

    let report = generate_graph(&storage, &output, &range, &DefaultClock, &Local).await?;

    if report.malformed_lines > 0 {
        eprintln!(
            "Skipped {} malformed lines in {}",
            report.malformed_lines,
            storage.path().display()
        );
    }
    println!(
        "Wrote {} ({} events across {} projects)",
        report.output.display(),
        report.total_events,
        report.projects
    );

    if open {
        open_in_browser(&report.output)?;
    }
    Ok(())
}

/// Builds the page from scratch. Running it twice over the same log and day gives the same file.
pub async fn generate_graph<Tz: TimeZone>(
    storage: &impl ActivityStorage,
    output: &Path,
    range: &RangeArgs,
    clock: &impl Clock,
    tz: &Tz,
) -> Result<GraphReport>
where
    Tz::Offset: Copy,
{
    let now = clock.time().with_timezone(tz);
    let start = range.parse_start(now)?;

    let contents = storage.read_all().await?;
    let calendar = build_calendar(contents.records, day_in(clock.time(), tz), start, tz);
    let grid = layout(&calendar);
    let html = render_html(&calendar, &grid);

    tokio::fs::write(output, html)
        .await
        .with_context(|| format!("Failed to write graph to {output:?}"))?;
    info!("Graph for {:?} written to {output:?}", calendar.range);

    Ok(GraphReport {
        output: output.to_path_buf(),
        total_events: calendar.total(),
        projects: calendar.projects.len(),
        malformed_lines: contents.malformed_lines,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use clap::Parser;
    use tempfile::tempdir;

    use crate::{
        cli::output::palette::project_color,
        utils::{clock::MockClock, logging::TEST_LOGGING},
        watcher::storage::activity_log::ActivityLogImpl,
    };

    use super::{generate_graph, GraphCommand};

    const LOG: &str = concat!(
        r#"{"timestamp":"2024-05-01T09:00:00Z","project":"alpha","event_kind":"created"}"#,
        "\n",
        r#"{"timestamp":"2024-05-01T09:01:00Z","project":"alpha","event_kind":"modified"}"#,
        "\n",
        r#"{"timestamp":"2024-05-01T09:02:00Z","project":"alpha","event_kind":"modified"}"#,
        "\n",
        r#"{"timestamp":"2024-05-01T09:03:00Z","project":"alpha","event_kind":"modified"}"#,
        "\n",
        r#"{"timestamp":"2024-05-01T09:04:00Z","project":"alpha","event_kind":"moved"}"#,
        "\n",
        r#"{"timestamp":"2024-05-02T14:00:00Z","project":"beta","event_kind":"created"}"#,
        "\n",
        r#"{"timestamp":"2024-05-02T14:30:00Z","project":"beta","event_kind":"modified"}"#,
        "\n",
        "{\"timestamp\":\"2024-05-02T15:00:00Z\",\"proj",
    );

    fn clock() -> MockClock {
        let mut clock = MockClock::new();
        clock
            .expect_time()
            .returning(|| Utc.with_ymd_and_hms(2024, 5, 20, 18, 0, 0).unwrap());
        clock
    }

    fn command(args: &[&str]) -> GraphCommand {
        GraphCommand::try_parse_from(std::iter::once("graph").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_graph_end_to_end() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let log_path = dir.path().join("activity.jsonl");
        std::fs::File::create(&log_path)?.write_all(LOG.as_bytes())?;
        let output = dir.path().join("graph.html");
        let storage = ActivityLogImpl::new(log_path);
        let command = command(&[]);

        let report = generate_graph(&storage, &output, &command.range, &clock(), &Utc).await?;

        assert_eq!(report.total_events, 7);
        assert_eq!(report.projects, 2);
        assert_eq!(report.malformed_lines, 1);

        let html = std::fs::read_to_string(&output)?;
        let alpha = project_color("alpha");
        let beta = project_color("beta");
        assert_ne!(alpha, beta);
        assert!(html.contains(&format!(
            r#"class="cell level-4" style="background-color: {alpha}" title="2024-05-01: alpha: 5""#
        )));
        assert!(html.contains(&format!(
            r#"class="cell level-2" style="background-color: {beta}" title="2024-05-02: beta: 2""#
        )));
        assert!(html.contains(r#"title="2024-05-20: no activity""#));
        assert!(!html.contains("2024-05-21"));
        assert_eq!(html.matches(r#"class="swatch""#).count(), 2);
        assert!(html.find("</span>alpha").unwrap() < html.find("</span>beta").unwrap());

        generate_graph(&storage, &output, &command.range, &clock(), &Utc).await?;
        assert_eq!(std::fs::read_to_string(&output)?, html);
        Ok(())
    }

    #[tokio::test]
    async fn test_graph_with_start() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("activity.jsonl");
        std::fs::File::create(&log_path)?.write_all(LOG.as_bytes())?;
        let output = dir.path().join("graph.html");
        let storage = ActivityLogImpl::new(log_path);
        let command = command(&["--start", "02/05/2024"]);

        let report = generate_graph(&storage, &output, &command.range, &clock(), &Utc).await?;

        assert_eq!(report.total_events, 2);
        assert_eq!(report.projects, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_graph_for_missing_log() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("graph.html");
        let storage = ActivityLogImpl::new(dir.path().join("missing.jsonl"));

        let report = generate_graph(&storage, &output, &command(&[]).range, &clock(), &Utc).await?;

        assert_eq!(report.total_events, 0);
        let html = std::fs::read_to_string(&output)?;
        assert!(html.contains("No activity recorded yet"));
        assert!(html.contains("May 2023"));
        Ok(())
    }

    #[tokio::test]
    async fn test_graph_reports_output_path() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("missing").join("graph.html");
        let storage = ActivityLogImpl::new(dir.path().join("activity.jsonl"));

        let error = generate_graph(&storage, &output, &command(&[]).range, &clock(), &Utc)
            .await
            .unwrap_err();

        assert!(format!("{error:#}").contains("graph.html"));
        Ok(())
    }
}
