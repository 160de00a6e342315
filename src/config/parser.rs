//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if !cli.devices.is_empty() {
            config.devices = cli.devices.clone();
        }
        if let Some(ref prefix) = cli.net_prefix {
            config.net_prefix = prefix.clone();
        }
        if let Some(ref path) = cli.devices_file {
            config.devices_file = Some(path.clone());
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(kind) = cli.kind {
            config.kind = kind;
        }
        if cli.cache {
            config.use_cache = true;
        }
        if let Some(ref dir) = cli.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(ref path) = cli.output {
            config.output_path = path.clone();
        }
        if let Some(ref path) = cli.results_json {
            config.results_json = Some(path.clone());
        }
        if let Some(ref path) = cli.from_results {
            config.from_results = Some(path.clone());
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_seconds = timeout;
        }
        if cli.no_warmup {
            config.warmup = false;
        }
        if let Some(iterations) = cli.iterations {
            config.iterations = Some(iterations);
        }
        if !cli.stats.is_empty() {
            config.stats = dedup(&cli.stats);
        }
        if let Some(count) = cli.messages {
            config.message_count = count;
        }
        if let Some(size) = cli.message_size {
            config.message_size = Some(size);
        }
        if let Some(metric) = cli.metric {
            config.message_metric = metric;
        }
        if !cli.token_payloads.is_empty() {
            config.token_payload_lengths = cli.token_payloads.clone();
        }
        if let Some(rounds) = cli.token_rounds {
            config.token_rounds = rounds;
        }
        if let Some(poll) = cli.token_poll {
            config.token_poll_interval_secs = poll;
        }
        if let Some(cooldown) = cli.token_cooldown {
            config.token_cooldown_secs = cooldown;
        }
        if let Some(attempts) = cli.max_attempts {
            config.max_attempts = attempts;
        }
        if let Some(delay) = cli.retry_delay_ms {
            config.retry_delay_ms = delay;
        }
        if let Some(multiplier) = cli.retry_multiplier {
            config.retry_multiplier = multiplier;
        }
        if let Some(delay) = cli.retry_max_delay_ms {
            config.retry_max_delay_ms = delay;
        }
        if cli.skip_failed {
            config.skip_failed = true;
        }

        if cli.color {
            config.enable_color = true;
        } else if cli.no_color {
            config.enable_color = false;
        }

        // CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            println!("Applied CLI overrides to configuration");
            println!(
                "Final config: kind={}, devices={}, cache={}, enable_color={}",
                config.kind,
                config.devices.len(),
                config.use_cache,
                config.enable_color
            );
        }
    }
}

/// Keep the first occurrence of every statistic
fn dedup<T: PartialEq + Copy>(items: &[T]) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(item) {
            unique.push(*item);
        }
    }
    unique
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Benchmark: {}", config.kind));
    if let Some(ref path) = config.from_results {
        summary.push(format!("Replaying: {}", path.display()));
    } else if let Some(ref path) = config.devices_file {
        summary.push(format!("Devices file: {}", path.display()));
    } else {
        summary.push(format!("Devices: {}", config.device_addresses().join(", ")));
    }
    summary.push(format!("Port: {}", config.port));
    summary.push(format!(
        "Cache: {} ({})",
        if config.use_cache { "enabled" } else { "disabled" },
        config.cache_dir.display()
    ));
    summary.push(format!("Chart: {}", config.output_path.display()));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!(
        "Retries: {} attempts, {}ms delay x{} (max {}ms)",
        if config.max_attempts == 0 {
            "unlimited".to_string()
        } else {
            config.max_attempts.to_string()
        },
        config.retry_delay_ms,
        config.retry_multiplier,
        config.retry_max_delay_ms
    ));
    summary.push(format!("Skip failed: {}", config.skip_failed));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::{clear_bench_env, IsolatedEnv};
    use crate::models::BenchKind;
    use crate::stats::{MessageMetric, StatKind};
    use clap::Parser;
    use std::env;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_survive_without_overrides() {
        let _env = IsolatedEnv::acquire();

        let config = load_config(Cli::parse_from(["devbench", "100"])).unwrap();
        assert_eq!(config.devices, vec!["100"]);
        assert_eq!(config.port, crate::defaults::DEFAULT_PORT);
        assert_eq!(config.kind, BenchKind::Throughput);
        assert!(config.warmup);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_cli_overrides() {
        let _env = IsolatedEnv::acquire();

        let cli = Cli::parse_from([
            "devbench",
            "-n", "10.0.0.",
            "--kind", "messages",
            "--cache",
            "--no-warmup",
            "--stats", "max,mean,max",
            "--metric", "connect_ms",
            "--no-color",
            "--verbose",
            "5",
            "6",
        ]);
        let config = ConfigParser::new(cli).parse().unwrap();

        assert_eq!(config.device_addresses(), vec!["10.0.0.5", "10.0.0.6"]);
        assert_eq!(config.kind, BenchKind::Messages);
        assert!(config.use_cache);
        assert!(!config.warmup);
        assert_eq!(config.stats, vec![StatKind::Max, StatKind::Mean]);
        assert_eq!(config.message_metric, MessageMetric::ConnectMs);
        assert!(!config.enable_color);
        assert!(config.verbose);
        assert!(!config.debug);
    }

    #[test]
    fn test_env_vars_fill_in_missing_flags() {
        let _env = IsolatedEnv::acquire();
        env::set_var("BENCH_DEVICES", "100, 107");
        env::set_var("BENCH_KIND", "token");
        env::set_var("BENCH_TOKEN_PAYLOADS", "128,256");
        env::set_var("BENCH_RETRY_MULTIPLIER", "1.5");

        let config = load_config(Cli::parse_from(["devbench"])).unwrap();
        clear_bench_env();

        assert_eq!(config.devices, vec!["100", "107"]);
        assert_eq!(config.kind, BenchKind::Token);
        assert_eq!(config.token_payload_lengths, vec![128, 256]);
        assert_eq!(config.retry_multiplier, 1.5);
    }

    #[test]
    fn test_cli_overrides_env_vars() {
        let _env = IsolatedEnv::acquire();
        env::set_var("BENCH_PORT", "9000");
        env::set_var("BENCH_CACHE_DIR", "from-env");

        let cli = Cli::parse_from(["devbench", "--port", "9100", "100"]);
        let config = load_config(cli).unwrap();
        clear_bench_env();

        assert_eq!(config.port, 9100);
        assert_eq!(config.cache_dir, PathBuf::from("from-env"));
    }

    #[test]
    fn test_invalid_env_value_fails() {
        let _env = IsolatedEnv::acquire();
        env::set_var("BENCH_PORT", "not-a-port");

        let result = load_config(Cli::parse_from(["devbench", "100"]));
        clear_bench_env();

        assert_eq!(result.unwrap_err().category(), "CONFIG");
    }

    #[test]
    fn test_invalid_override_rejected_by_validation() {
        let _env = IsolatedEnv::acquire();

        let cli = Cli::parse_from(["devbench", "--retry-multiplier", "0.5", "100"]);
        assert!(load_config(cli).is_err());
    }

    #[test]
    fn test_config_summary() {
        let config = Config {
            devices: vec!["5".to_string()],
            net_prefix: "10.0.0.".to_string(),
            ..Config::default()
        };
        let summary = display_config_summary(&config);

        assert!(summary.contains("Benchmark: throughput"));
        assert!(summary.contains("Devices: 10.0.0.5"));
        assert!(summary.contains("Retries: unlimited attempts"));
        assert!(summary.contains("Cache: disabled (csv)"));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
