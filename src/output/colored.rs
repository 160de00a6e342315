//! Colored formatter implementation with terminal color support

use super::formatter::{
    create_table, format_duration, results_format, results_rows, FormattingOptions, OutputFormatter,
};
use crate::{acquisition::RunReport, error::Result, models::ResultTree};
use colored::*;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self { options, color_scheme }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    /// Color of a success rate in percent
    fn rate_color(&self, rate: f64) -> Color {
        if rate >= 99.95 {
            self.color_scheme.success
        } else if rate >= 80.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            self.colorize(&border, self.color_scheme.header),
            self.bold(title, self.color_scheme.header),
            self.colorize(&border, self.color_scheme.header)
        ))
    }

    fn format_results_table(&self, tree: &ResultTree, unit: &str) -> Result<String> {
        if tree.is_empty() {
            return Ok(self.colorize("No results", self.color_scheme.warning).to_string());
        }

        let (depth, rows) = results_rows(tree, self.options.precision);
        let table = create_table(&results_format(depth, unit, &self.options), &rows);
        Ok(table.join_with(
            |header| self.bold(header, self.color_scheme.info).to_string(),
            |border| self.colorize(border, self.color_scheme.border).to_string(),
        ))
    }

    fn format_run_summary(&self, report: &RunReport) -> Result<String> {
        let total = report.succeeded + report.failed;
        let rate = if total == 0 {
            0.0
        } else {
            report.succeeded as f64 * 100.0 / total as f64
        };

        let failed = report.failed.to_string();
        let failed = if report.failed > 0 {
            self.colorize(&failed, self.color_scheme.error)
        } else {
            self.colorize(&failed, self.color_scheme.success)
        };

        Ok(format!(
            "{}\n  Benchmark:  {}\n  Succeeded:  {}\n  Failed:     {}\n  Success:    {}\n  Duration:   {}",
            self.bold("📊 Run Summary", self.color_scheme.header),
            self.colorize(report.kind.as_str(), self.color_scheme.info),
            self.colorize(&report.succeeded.to_string(), self.color_scheme.success),
            failed,
            self.colorize(&format!("{:.1}%", rate), self.rate_color(rate)),
            format_duration(report.elapsed)
        ))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.bold("❌ Error:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.bold("⚠️  Warning:", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.bold("✅", self.color_scheme.success), message))
    }
}

impl ColoredFormatter {
    /// Check if colors are supported in the current environment
    pub fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map_or(true, |term| term != "dumb")
    }

    pub fn set_colors_enabled(&mut self, enabled: bool) {
        self.options.enable_color = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BenchKind;
    use std::time::Duration;

    fn uncolored() -> ColoredFormatter {
        let mut formatter = ColoredFormatter::new(FormattingOptions::default());
        formatter.set_colors_enabled(false);
        formatter
    }

    #[test]
    fn test_uncolored_table_matches_plain_layout() {
        let tree = ResultTree::from_json_str(r#"{"n4": {"n5": 1.0, "mi": 2.0}}"#).unwrap();
        let table = uncolored().format_results_table(&tree, "kbit/s").unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("Level 2"));
        assert!(!table.contains('\u{1b}'));
    }

    #[test]
    fn test_run_summary_success_rate() {
        let report = RunReport {
            kind: BenchKind::Messages,
            tree: ResultTree::new(),
            succeeded: 3,
            failed: 1,
            elapsed: Duration::from_millis(40),
        };
        let summary = uncolored().format_run_summary(&report).unwrap();
        assert!(summary.contains("messages"));
        assert!(summary.contains("75.0%"));
        assert!(summary.contains("40ms"));
    }

    #[test]
    fn test_rate_colors() {
        let formatter = uncolored();
        assert_eq!(formatter.rate_color(100.0), Color::Green);
        assert_eq!(formatter.rate_color(85.0), Color::Yellow);
        assert_eq!(formatter.rate_color(10.0), Color::Red);
    }

    #[test]
    fn test_messages_without_color() {
        let formatter = uncolored();
        assert!(formatter.format_error("boom").unwrap().ends_with("boom"));
        assert!(formatter.format_warning("careful").unwrap().contains("Warning"));
    }
}
