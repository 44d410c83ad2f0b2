//! Per-record summaries and their table rendering.

use std::path::PathBuf;

use chrono::NaiveTime;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use sleep_core::{Dataset, ReadStats};
use sleep_model::{Gender, SleepRecord};

/// One emitted record, reduced to what is printed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub id: String,
    pub start_time: NaiveTime,
    pub epochs: usize,
    pub epoch_seconds: u32,
    pub heartbeats: usize,
    /// Beats per minute.
    pub mean_heart_rate: Option<f64>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    pub weight: Option<f64>,
    pub activity_counts: Option<usize>,
}

impl From<&SleepRecord> for RecordSummary {
    fn from(record: &SleepRecord) -> Self {
        Self {
            id: record.id.clone(),
            start_time: record.recording_start_time,
            epochs: record.epoch_count(),
            epoch_seconds: record.sleep_stage_duration,
            heartbeats: record.heartbeat_times.len(),
            mean_heart_rate: record.mean_heart_rate(),
            gender: record.subject_data.gender,
            age: record.subject_data.age,
            weight: record.subject_data.weight,
            activity_counts: record.activity_counts.as_ref().map(Vec::len),
        }
    }
}

/// Result of one `read` run.
#[derive(Debug, Clone)]
pub struct ReadReport {
    pub dataset: Dataset,
    pub db_dir: PathBuf,
    pub records: Vec<RecordSummary>,
    pub stats: ReadStats,
}

impl ReadReport {
    /// True when a listed record had no subject data.
    pub fn has_integrity_violations(&self) -> bool {
        self.stats.integrity_violations > 0
    }
}

pub fn print_summary(report: &ReadReport) {
    println!("Dataset: {}", report.dataset);
    println!("Data: {}", report.db_dir.display());
    if !report.records.is_empty() {
        println!("{}", summary_table(&report.records));
    }
    println!("{}", stats_line(&report.stats));
}

/// Builds the summary table with a totals footer.
pub fn summary_table(rows: &[RecordSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Record"),
        header_cell("Start"),
        header_cell("Epochs"),
        header_cell("Heartbeats"),
        header_cell("Mean HR"),
        header_cell("Gender"),
        header_cell("Age"),
        header_cell("Weight"),
        header_cell("Activity"),
    ]);
    apply_table_style(&mut table);
    for index in [2, 3, 4, 6, 7, 8] {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(row.start_time.format("%H:%M:%S")),
            Cell::new(row.epochs),
            Cell::new(row.heartbeats),
            optional_cell(row.mean_heart_rate.map(|rate| format!("{rate:.1}"))),
            optional_cell(row.gender.map(|gender| gender.as_str())),
            optional_cell(row.age),
            optional_cell(row.weight.map(|weight| format!("{weight:.1}"))),
            optional_cell(row.activity_counts),
        ]);
    }

    let epochs: usize = rows.iter().map(|row| row.epochs).sum();
    let heartbeats: usize = rows.iter().map(|row| row.heartbeats).sum();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(epochs).add_attribute(Attribute::Bold),
        Cell::new(heartbeats).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    table
}

/// One-line account of what the reader did.
pub fn stats_line(stats: &ReadStats) -> String {
    let mut line = format!(
        "{} requested, {} emitted, {} skipped",
        stats.requested, stats.emitted, stats.skipped
    );
    if stats.integrity_violations > 0 {
        line.push_str(&format!(
            " ({} without subject data)",
            stats.integrity_violations
        ));
    }
    line
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn optional_cell<T: ToString>(value: Option<T>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
