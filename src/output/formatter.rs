//! Core formatting traits and implementations
//!
//! This module defines the console output interface and provides a plain
//! text implementation with table formatting.

use crate::{
    acquisition::RunReport,
    error::{AppError, Result},
    models::ResultTree,
};
use std::fmt::Write as _;
use std::time::Duration;

/// Main trait for console output
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format every leaf of `tree` with its group labels, values in `unit`
    fn format_results_table(&self, tree: &ResultTree, unit: &str) -> Result<String>;

    /// Format the success counters of a benchmark run
    fn format_run_summary(&self, report: &RunReport) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show table borders
    pub table_borders: bool,
    /// Maximum width of a label column
    pub max_label_width: usize,
    /// Decimal places of values
    pub precision: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            table_borders: true,
            max_label_width: 32,
            precision: 2,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub max_width: usize,
}

impl Column {
    pub fn new<S: Into<String>>(header: S, alignment: Alignment, max_width: usize) -> Self {
        Self {
            header: header.into(),
            alignment,
            max_width,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alignment {
    Left,
    Right,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// A rendered table, kept line by line so decorators can style parts of it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedTable {
    pub header: Option<String>,
    pub border: Option<String>,
    pub rows: Vec<String>,
}

impl RenderedTable {
    /// Join the lines, optionally restyling header and borders
    pub fn join_with(&self, header_style: impl Fn(&str) -> String, border_style: impl Fn(&str) -> String) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        let border = self.border.as_deref().map(&border_style);

        if let Some(header) = &self.header {
            lines.extend(border.clone());
            lines.push(header_style(header));
            lines.extend(border.clone());
        }
        lines.extend(self.rows.iter().cloned());
        lines.extend(border);
        lines.join("\n")
    }
}

impl std::fmt::Display for RenderedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.join_with(str::to_string, str::to_string))
    }
}

/// Lay out `rows` under `format`
pub fn create_table(format: &TableFormat, rows: &[RowData]) -> RenderedTable {
    let widths = calculate_column_widths(format, rows);
    let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();

    RenderedTable {
        header: (!format.columns.is_empty()).then(|| create_row(&headers, &widths, format)),
        border: format.show_borders.then(|| create_horizontal_border(&widths)),
        rows: rows.iter().map(|row| create_row(row, &widths, format)).collect(),
    }
}

fn calculate_column_widths(format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
    format
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let content = rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            content.max(column.header.chars().count()).min(column.max_width)
        })
        .collect()
}

fn create_row(data: &[String], widths: &[usize], format: &TableFormat) -> String {
    let mut row = String::new();
    if format.show_borders {
        row.push('|');
    }

    for ((cell, &width), column) in data.iter().zip(widths).zip(&format.columns) {
        let padded = align_text(cell, width, column.alignment);
        if format.show_borders {
            row.push(' ');
            row.push_str(&padded);
            row.push_str(" |");
        } else {
            row.push_str(&padded);
            row.push_str("  ");
        }
    }

    row.trim_end().to_string()
}

fn create_horizontal_border(widths: &[usize]) -> String {
    let mut border = String::from("+");
    for &width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Pad or truncate `text` to exactly `width` characters
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let length = text.chars().count();
    if length >= width {
        return text.chars().take(width).collect();
    }

    let padding = " ".repeat(width - length);
    match alignment {
        Alignment::Left => format!("{}{}", text, padding),
        Alignment::Right => format!("{}{}", padding, text),
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let minutes = (ms / 60_000.0) as u64;
        let seconds = (ms % 60_000.0) / 1000.0;
        format!("{}m{:.0}s", minutes, seconds)
    }
}

/// Rows of the results table: one per leaf, ancestors shown only where they change
pub fn results_rows(tree: &ResultTree, precision: usize) -> (usize, Vec<RowData>) {
    let leaves = tree.leaf_paths();
    let depth = leaves.iter().map(|(path, _)| path.len()).max().unwrap_or(0);
    let mut previous: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(leaves.len());

    for (path, value) in leaves {
        let mut row = Vec::with_capacity(depth + 1);
        let mut same_prefix = true;
        for (index, key) in path.iter().enumerate() {
            let is_leaf_key = index + 1 == path.len();
            same_prefix = same_prefix && previous.get(index) == Some(key);
            row.push(if same_prefix && !is_leaf_key { String::new() } else { key.clone() });
        }
        row.resize(depth, String::new());
        row.push(format!("{:.*}", precision, value));
        rows.push(row);
        previous = path;
    }

    (depth, rows)
}

/// Column layout of the results table for a tree `depth` levels deep
pub fn results_format(depth: usize, unit: &str, options: &FormattingOptions) -> TableFormat {
    let mut columns: Vec<Column> = (1..=depth)
        .map(|level| Column::new(format!("Level {}", level), Alignment::Left, options.max_label_width))
        .collect();
    let value_header = if unit.is_empty() {
        "Value".to_string()
    } else {
        format!("Value ({})", unit)
    };
    columns.push(Column::new(value_header, Alignment::Right, 24));

    TableFormat {
        columns,
        show_borders: options.table_borders,
    }
}

fn format_error_io(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);

        writeln!(output, "{}", border).map_err(format_error_io)?;
        writeln!(output, "  {}  ", title).map_err(format_error_io)?;
        write!(output, "{}", border).map_err(format_error_io)?;

        Ok(output)
    }

    fn format_results_table(&self, tree: &ResultTree, unit: &str) -> Result<String> {
        if tree.is_empty() {
            return Ok("No results".to_string());
        }

        let (depth, rows) = results_rows(tree, self.options.precision);
        let format = results_format(depth, unit, &self.options);
        Ok(create_table(&format, &rows).to_string())
    }

    fn format_run_summary(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Run Summary:").map_err(format_error_io)?;
        writeln!(output, "------------").map_err(format_error_io)?;
        writeln!(output, "Benchmark:   {}", report.kind).map_err(format_error_io)?;
        writeln!(output, "Succeeded:   {}", report.succeeded).map_err(format_error_io)?;
        writeln!(output, "Failed:      {}", report.failed).map_err(format_error_io)?;
        write!(output, "Duration:    {}", format_duration(report.elapsed)).map_err(format_error_io)?;
        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}
