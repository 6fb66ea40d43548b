//! Text rendering and export of search results.
//!
//! Supports a fixed-width table, horizontal bar charts, per-camera status
//! badges, JSON logging and CSV export.

use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::crosstab::CrossTab;
use crate::model::{AggregateDataset, SourceState, SourceStatus, TableRow};

const UNSPECIFIED: &str = "unspecified";
const BAR: char = '█';

/// Logs the dataset as pretty-printed JSON.
pub fn print_json(dataset: &AggregateDataset) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(dataset)?);
    Ok(())
}

/// Column names of the CSV export, in [`TableRow`] field order.
const CSV_HEADER: [&str; 4] = ["camera_id", "vehicle_type_name", "direction_type_name", "count"];

/// Writes the table rows to a CSV file, replacing any existing file.
///
/// The header is always written, so an export with no rows is header-only.
pub fn write_csv(path: impl AsRef<Path>, rows: &[TableRow]) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV export");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() { UNSPECIFIED } else { value }
}

/// Joins lines, terminating each with a newline.
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn table_line(cells: [&str; 4], widths: &[usize; 4]) -> String {
    format!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {:>w3$}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    )
}

/// Renders rows as a fixed-width table. An empty slice renders a single
/// "No data" row under the header.
pub fn render_table(rows: &[TableRow]) -> String {
    let headers = ["Camera", "Vehicle type", "Direction", "Count"];

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|r| {
            [
                r.camera_id.to_string(),
                or_unspecified(&r.vehicle_type_name).to_string(),
                or_unspecified(&r.direction_type_name).to_string(),
                r.count.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    let mut lines = vec![table_line(headers, &widths), "-".repeat(rule_len)];

    if cells.is_empty() {
        lines.push("No data".to_string());
    }
    for row in &cells {
        lines.push(table_line(row.each_ref().map(String::as_str), &widths));
    }

    join_lines(lines)
}

/// Renders a horizontal bar chart: one group per category, one bar per
/// direction, scaled so the largest cell spans `width` characters.
///
/// Returns an empty string for an empty cross-tab.
pub fn render_bar_chart(title: &str, tab: &CrossTab, width: usize) -> String {
    if tab.is_empty() {
        return String::new();
    }

    let max = tab.max_cell();
    let label_width = tab
        .directions
        .iter()
        .map(|d| or_unspecified(d).chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = vec![title.to_string()];

    for (c, category) in tab.categories.iter().enumerate() {
        lines.push(or_unspecified(category).to_string());
        for (direction, series) in tab.series() {
            let value = series[c];
            let bar = bar(value, max, width);
            let gap = if bar.is_empty() { "" } else { " " };
            lines.push(format!(
                "  {:<label_width$}  {bar}{gap}{value}",
                or_unspecified(direction),
            ));
        }
    }

    join_lines(lines)
}

fn bar(value: u64, max: u64, width: usize) -> String {
    if value == 0 || max == 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * width as f64).round() as usize;
    BAR.to_string().repeat(len.max(1))
}

/// "Data from cameras: 1, 2 (2 total)" followed by one badge per camera.
pub fn render_status_line(statuses: &[SourceStatus]) -> String {
    let active: Vec<String> = statuses
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.source.to_string())
        .collect();

    let mut lines = Vec::new();
    if !active.is_empty() {
        lines.push(format!(
            "Data from cameras: {} ({} total)",
            active.join(", "),
            active.len()
        ));
    }

    let badges: Vec<String> = statuses
        .iter()
        .map(|s| format!("[{}: {}]", s.source, badge(&s.state)))
        .collect();
    if !badges.is_empty() {
        lines.push(badges.join(" "));
    }

    join_lines(lines)
}

/// Status badge text for a single camera panel.
pub fn badge(state: &SourceState) -> String {
    match state {
        SourceState::Active { records } => format!("Active, {records} records"),
        SourceState::NoData => "No Data".to_string(),
        SourceState::Unavailable { reason } => format!("Unavailable, {reason}"),
    }
}
