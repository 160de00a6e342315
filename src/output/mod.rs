//! Output formatting and chart rendering
//!
//! Console output goes through an [`OutputFormatter`], colored or plain. The
//! grouped bar chart is written as SVG by [`chart::render_svg`].

pub mod chart;
mod colored;
mod formatter;

pub use chart::{render_svg, ChartOptions};
pub use colored::{ColorScheme, ColoredFormatter};
pub use formatter::{
    create_table, Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RenderedTable, RowData,
    TableFormat,
};

use crate::{
    acquisition::RunReport,
    error::Result,
    grouping::{group_levels, layout_coordinates, ChartLayout},
    models::ResultTree,
};
use std::path::Path;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            ..FormattingOptions::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false)
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Header, results table and, after an acquisition, the run summary
    pub fn display_results(&self, title: &str, tree: &ResultTree, unit: &str, report: Option<&RunReport>) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.formatter.format_header(title)?);
        output.push_str("\n\n");
        output.push_str(&self.formatter.format_results_table(tree, unit)?);

        if let Some(report) = report {
            output.push_str("\n\n");
            output.push_str(&self.formatter.format_run_summary(report)?);
        }

        Ok(output)
    }
}

/// Group `tree`, lay it out and write the chart to `path`
pub fn write_chart(tree: &ResultTree, options: &ChartOptions, path: &Path) -> Result<ChartLayout> {
    let grouped = group_levels(tree)?;
    let layout = layout_coordinates(&grouped);
    render_svg(&layout, options, path)?;
    Ok(layout)
}
