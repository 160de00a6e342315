//! Command-line interface module with topic help

pub mod help;

pub use help::HelpSystem;

use crate::models::BenchKind;
use crate::stats::{MessageMetric, StatKind};
use clap::Parser;
use std::path::PathBuf;

/// Device Benchmark - pairwise throughput, message-rate and token-ring measurements
#[derive(Parser, Debug, Clone)]
#[command(name = "devbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Device addresses, joined to --net-prefix
    #[arg(value_name = "DEVICE")]
    pub devices: Vec<String>,

    /// Prefix joined to every device address (e.g. "192.168.1.")
    #[arg(short = 'n', long)]
    pub net_prefix: Option<String>,

    /// Port of the benchmark service on every device
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Reuse cached raw reports when present
    #[arg(short, long)]
    pub cache: bool,

    /// Benchmark to run
    #[arg(short, long, value_enum)]
    pub kind: Option<BenchKind>,

    /// Directory holding raw reports
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Where the SVG chart is written
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the result tree as JSON
    #[arg(long, value_name = "FILE")]
    pub results_json: Option<PathBuf>,

    /// Replay a saved result tree instead of measuring
    #[arg(long, value_name = "FILE")]
    pub from_results: Option<PathBuf>,

    /// JSON device registry used instead of discovery
    #[arg(long, value_name = "FILE")]
    pub devices_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Skip the throw-away request before each throughput measurement
    #[arg(long)]
    pub no_warmup: bool,

    /// Transfers per throughput report
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Statistics plotted for throughput pairs (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub stats: Vec<StatKind>,

    /// Messages sent to every target in a message-rate step
    #[arg(short, long)]
    pub messages: Option<u32>,

    /// Message size in bytes
    #[arg(long)]
    pub message_size: Option<u32>,

    /// Metric plotted for message-rate steps
    #[arg(long, value_enum)]
    pub metric: Option<MessageMetric>,

    /// Token payload lengths in bytes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub token_payloads: Vec<u32>,

    /// Rounds per token run
    #[arg(long)]
    pub token_rounds: Option<u32>,

    /// Seconds between token result polls
    #[arg(long, value_name = "SECS")]
    pub token_poll: Option<u64>,

    /// Seconds to wait between token runs
    #[arg(long, value_name = "SECS")]
    pub token_cooldown: Option<u64>,

    /// Attempts per pair, 0 retries until the pair succeeds
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry in milliseconds
    #[arg(long, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Multiplier applied to the retry delay after each attempt
    #[arg(long)]
    pub retry_multiplier: Option<f64>,

    /// Upper bound for the retry delay in milliseconds
    #[arg(long, value_name = "MS")]
    pub retry_max_delay_ms: Option<u64>,

    /// Leave failed pairs out of the chart instead of aborting
    #[arg(long)]
    pub skip_failed: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Show help for specific topic (config, kinds, cache, examples)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.help_topic.is_none() && !self.has_device_source() {
            return Err(
                "Must specify device addresses, --devices-file or --from-results (or BENCH_DEVICES)".to_string(),
            );
        }

        Ok(())
    }

    /// Whether devices come from the command line or the environment
    pub fn has_device_source(&self) -> bool {
        !self.devices.is_empty()
            || self.devices_file.is_some()
            || self.from_results.is_some()
            || ["BENCH_DEVICES", "BENCH_DEVICES_FILE", "BENCH_FROM_RESULTS"]
                .iter()
                .any(|var| std::env::var(var).map_or(false, |v| !v.trim().is_empty()))
    }

    /// Check if help should be displayed for a specific topic
    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        match &self.help_topic {
            Some(topic) => help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    HelpSystem::TOPICS.join(", "),
                    help_system.display_main_help(use_colors)
                )
            }),
            None => help_system.display_main_help(use_colors),
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Configuration Summary:\n");
        if let Some(kind) = self.kind {
            summary.push_str(&format!("  Benchmark: {}\n", kind));
        }
        if !self.devices.is_empty() {
            let prefix = self.net_prefix.as_deref().unwrap_or("");
            let devices: Vec<String> = self.devices.iter().map(|d| format!("{}{}", prefix, d)).collect();
            summary.push_str(&format!("  Devices: {}\n", devices.join(", ")));
        }
        if let Some(ref path) = self.devices_file {
            summary.push_str(&format!("  Devices file: {}\n", path.display()));
        }
        if let Some(ref path) = self.from_results {
            summary.push_str(&format!("  Replaying: {}\n", path.display()));
        }
        if self.cache {
            summary.push_str("  Cache: enabled\n");
        }
        if self.skip_failed {
            summary.push_str("  Skip failed pairs: yes\n");
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

/// Parse a timeout in whole seconds
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 3600 {
                Err("Duration cannot exceed 3600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if std::env::var("TERM").map_or(false, |term| term == "dumb") {
        return false;
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["devbench", "-n", "192.168.1.", "100", "107"]);
        assert_eq!(cli.devices, vec!["100", "107"]);
        assert_eq!(cli.net_prefix.as_deref(), Some("192.168.1."));
        assert_eq!(cli.kind, None);
        assert!(!cli.cache);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "devbench",
            "--port", "9000",
            "--cache",
            "--kind", "messages",
            "--cache-dir", "reports",
            "--output", "out/plot.svg",
            "--results-json", "out/results.json",
            "--timeout", "30",
            "--no-warmup",
            "--iterations", "20",
            "--stats", "mean,max",
            "--messages", "80",
            "--message-size", "32",
            "--metric", "received_pct",
            "--token-payloads", "256,1024",
            "--token-rounds", "3",
            "--token-poll", "1",
            "--token-cooldown", "2",
            "--max-attempts", "4",
            "--retry-delay-ms", "100",
            "--retry-multiplier", "1.5",
            "--retry-max-delay-ms", "800",
            "--skip-failed",
            "--no-color",
            "--verbose",
            "--debug",
            "100",
        ]);

        assert_eq!(cli.port, Some(9000));
        assert!(cli.cache);
        assert_eq!(cli.kind, Some(BenchKind::Messages));
        assert_eq!(cli.cache_dir, Some(PathBuf::from("reports")));
        assert_eq!(cli.output, Some(PathBuf::from("out/plot.svg")));
        assert_eq!(cli.results_json, Some(PathBuf::from("out/results.json")));
        assert_eq!(cli.timeout, Some(30));
        assert!(cli.no_warmup);
        assert_eq!(cli.iterations, Some(20));
        assert_eq!(cli.stats, vec![StatKind::Mean, StatKind::Max]);
        assert_eq!(cli.messages, Some(80));
        assert_eq!(cli.message_size, Some(32));
        assert_eq!(cli.metric, Some(MessageMetric::ReceivedPct));
        assert_eq!(cli.token_payloads, vec![256, 1024]);
        assert_eq!(cli.token_rounds, Some(3));
        assert_eq!(cli.token_poll, Some(1));
        assert_eq!(cli.token_cooldown, Some(2));
        assert_eq!(cli.max_attempts, Some(4));
        assert_eq!(cli.retry_delay_ms, Some(100));
        assert_eq!(cli.retry_multiplier, Some(1.5));
        assert_eq!(cli.retry_max_delay_ms, Some(800));
        assert!(cli.skip_failed);
        assert!(cli.no_color);
        assert!(cli.verbose);
        assert!(cli.debug);
        assert_eq!(cli.devices, vec!["100"]);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Cli::try_parse_from(["devbench", "--kind", "latency", "100"]).is_err());
        assert!(Cli::try_parse_from(["devbench", "--stats", "median", "100"]).is_err());
    }

    #[test]
    fn test_conflicting_color_flags() {
        let cli = Cli::parse_from(["devbench", "--color", "--no-color", "100"]);
        assert!(cli.validate().unwrap_err().contains("--color"));
    }

    #[test]
    fn test_device_source_alternatives() {
        let cli = Cli::parse_from(["devbench", "--devices-file", "devices.json"]);
        assert!(cli.has_device_source());

        let cli = Cli::parse_from(["devbench", "--from-results", "results.json"]);
        assert!(cli.validate().is_ok());

        let cli = Cli::parse_from(["devbench", "--help-topic", "kinds"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("10").unwrap(), 10);
        assert_eq!(parse_duration("3600").unwrap(), 3600);

        assert!(parse_duration("0").is_err());
        assert!(parse_duration("3601").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("0x10").is_err());
    }

    #[test]
    fn test_use_colors_flags() {
        let cli = Cli::parse_from(["devbench", "--color", "100"]);
        assert!(cli.use_colors());

        let cli = Cli::parse_from(["devbench", "--no-color", "100"]);
        assert!(!cli.use_colors());
    }

    #[test]
    fn test_config_summary() {
        let cli = Cli::parse_from(["devbench", "--kind", "token", "--cache", "-n", "10.0.0.", "5", "6", "7"]);
        let summary = cli.get_config_summary();
        assert!(summary.contains("Benchmark: token"));
        assert!(summary.contains("Devices: 10.0.0.5, 10.0.0.6, 10.0.0.7"));
        assert!(summary.contains("Cache: enabled"));
    }

    #[test]
    fn test_help_display() {
        let cli = Cli::parse_from(["devbench", "--no-color", "--help-topic", "cache"]);
        assert!(cli.should_show_topic_help());
        assert!(cli.display_help().contains("CACHE"));

        let cli = Cli::parse_from(["devbench", "--no-color", "--help-topic", "nonsense"]);
        assert!(cli.display_help().starts_with("Unknown help topic: 'nonsense'"));
    }
}
