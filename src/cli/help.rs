//! Long-form help with usage examples, shown through `--help-topic`

use crate::config::env::EnvManager;
use colored::*;

/// Topic help for the CLI application
pub struct HelpSystem {
    platform: &'static str,
}

struct Example {
    command: &'static str,
    description: &'static str,
}

impl HelpSystem {
    pub const TOPICS: &'static [&'static str] = &["config", "env", "kinds", "cache", "examples"];

    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS,
        }
    }

    /// Overview of every topic
    pub fn display_main_help(&self, use_colors: bool) -> String {
        [
            self.format_header(use_colors),
            self.format_kinds_help(use_colors),
            self.format_examples_section(use_colors),
            self.format_configuration_help(use_colors),
            self.format_footer(use_colors),
        ]
        .join("\n")
    }

    /// Display quick help for specific topics
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" => Some(self.format_configuration_help(use_colors)),
            "env" | "environment" => Some(EnvManager::display_env_help()),
            "kinds" | "kind" | "benchmarks" => Some(self.format_kinds_help(use_colors)),
            "cache" => Some(self.format_cache_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            _ => None,
        }
    }

    fn heading(&self, text: &str, use_colors: bool) -> String {
        if use_colors {
            text.bright_green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Device Benchmark";
        let version = env!("CARGO_PKG_VERSION");

        if use_colors {
            format!(
                "{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!("{}\nVersion: {} | Platform: {}\n", title, version, self.platform)
        }
    }

    fn format_kinds_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n", self.heading("BENCHMARKS:", use_colors));
        help.push_str("  throughput  Every ordered (receiver, sender) pair; chart groups by receiver.\n");
        help.push_str("              --stats picks mean, min and/or max of the transfer rate.\n");
        help.push_str("  messages    Each device as master sending to 1..N-1 targets.\n");
        help.push_str("              --metric picks received_pct, avg_rtt_ms, connect_ms or receive_rate.\n");
        help.push_str("  token       Token ring over every device permutation, per payload length.\n");
        help.push_str("              Needs at least three devices; runs are polled until complete.\n");
        help
    }

    fn format_cache_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n", self.heading("CACHE:", use_colors));
        help.push_str("  Raw reports are saved under --cache-dir (default: csv) as\n");
        help.push_str("  {kind}-{receiver_mac}-{targets}[-{params}].csv\n\n");
        help.push_str("  With --cache a saved report is parsed instead of asking the device.\n");
        help.push_str("  Files never expire; delete them to measure again. Empty or\n");
        help.push_str("  incomplete reports are never written.\n");
        help
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            Example {
                command: "devbench -n 192.168.1. 100 107 112",
                description: "Throughput between three devices, plot to plot.svg",
            },
            Example {
                command: "devbench -c --stats mean,min,max -n 192.168.1. 100 107",
                description: "Reuse cached reports and plot three statistics per pair",
            },
            Example {
                command: "devbench --kind messages --messages 80 --metric received_pct 100 107 112",
                description: "Message-rate steps, plotting the share of messages received",
            },
            Example {
                command: "devbench --kind token --token-payloads 256,1024 100 107 112",
                description: "Token-ring round trips for two payload lengths",
            },
            Example {
                command: "devbench --max-attempts 5 --skip-failed --results-json out.json 100 107",
                description: "Bounded retries, skip unreachable pairs, keep the result tree",
            },
            Example {
                command: "devbench --from-results out.json -o replot.svg",
                description: "Re-plot a saved result tree without touching the devices",
            },
        ];

        let mut help = format!("{}\n", self.heading("EXAMPLES:", use_colors));
        for example in examples {
            if use_colors {
                help.push_str(&format!("  {}\n", example.command.bright_white()));
            } else {
                help.push_str(&format!("  {}\n", example.command));
            }
            help.push_str(&format!("      {}\n", example.description));
        }
        help
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n", self.heading("CONFIGURATION:", use_colors));
        help.push_str("  Settings are layered, later sources winning:\n");
        help.push_str("    1. Built-in defaults\n");
        help.push_str("    2. .env file in the working directory\n");
        help.push_str("    3. BENCH_* environment variables\n");
        help.push_str("    4. Command-line flags\n\n");
        help.push_str("  Run with --help-topic env for the list of variables.\n");
        help
    }

    fn format_footer(&self, use_colors: bool) -> String {
        let text = format!("Topics: {} (use --help-topic <TOPIC>)", Self::TOPICS.join(", "));
        if use_colors {
            format!("{}\n", text.dimmed())
        } else {
            format!("{}\n", text)
        }
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}
