//! Configuration data model and validation

use crate::error::{AppError, Result};
use crate::stats::{MessageMetric, StatKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which benchmark driver to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BenchKind {
    /// Pairwise throughput, receiver <- sender
    Throughput,
    /// Message rate from one master to a growing set of targets
    Messages,
    /// Token-ring round trips over every device permutation
    Token,
}

impl BenchKind {
    /// Name used in cache file keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Throughput => "throughput",
            Self::Messages => "messages",
            Self::Token => "token",
        }
    }

    /// Y-axis label for charts of this kind
    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Throughput => "Throughput (kbits / s)",
            Self::Messages => "Messages",
            Self::Token => "Round trip (ms)",
        }
    }
}

impl fmt::Display for BenchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenchKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "throughput" => Ok(Self::Throughput),
            "messages" => Ok(Self::Messages),
            "token" => Ok(Self::Token),
            other => Err(AppError::config(format!(
                "Unknown benchmark kind '{}' (expected throughput, messages or token)",
                other
            ))),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device addresses to discover, before the network prefix is applied
    #[serde(default)]
    pub devices: Vec<String>,

    /// Prefix prepended to every device address (e.g. "192.168.1.")
    #[serde(default)]
    pub net_prefix: String,

    /// JSON file with a pre-built device registry
    #[serde(default)]
    pub devices_file: Option<PathBuf>,

    /// Port of the benchmark HTTP service on every device
    #[serde(default = "default_port")]
    pub port: u16,

    /// Benchmark driver to run
    #[serde(default = "default_kind")]
    pub kind: BenchKind,

    /// Reuse cached raw reports when present
    #[serde(default)]
    pub use_cache: bool,

    /// Directory holding raw report files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Where the SVG chart is written
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Optional JSON dump of the result tree
    #[serde(default)]
    pub results_json: Option<PathBuf>,

    /// Replay a saved result tree instead of measuring
    #[serde(default)]
    pub from_results: Option<PathBuf>,

    /// Request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Issue one throw-away request before each throughput measurement
    #[serde(default = "default_warmup")]
    pub warmup: bool,

    /// Transfers per throughput report (device default when unset)
    #[serde(default)]
    pub iterations: Option<u32>,

    /// Statistics plotted for throughput pairs
    #[serde(default = "default_stats")]
    pub stats: Vec<StatKind>,

    /// Messages sent to each target in a message-rate step
    #[serde(default = "default_message_count")]
    pub message_count: u32,

    /// Message size in bytes (device default when unset)
    #[serde(default)]
    pub message_size: Option<u32>,

    /// Metric plotted for message-rate steps
    #[serde(default = "default_message_metric")]
    pub message_metric: MessageMetric,

    /// Payload lengths swept by the token benchmark
    #[serde(default = "default_token_payload_lengths")]
    pub token_payload_lengths: Vec<u32>,

    /// Rounds per token run
    #[serde(default = "default_token_rounds")]
    pub token_rounds: u32,

    /// Seconds between token result polls
    #[serde(default = "default_token_poll_interval_secs")]
    pub token_poll_interval_secs: u64,

    /// Seconds to wait between token runs
    #[serde(default = "default_token_cooldown_secs")]
    pub token_cooldown_secs: u64,

    /// Attempts per pair, 0 for unlimited
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Multiplier applied to the delay after each retry
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,

    /// Upper bound for the retry delay
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Leave failed pairs out instead of aborting the run
    #[serde(default)]
    pub skip_failed: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            net_prefix: String::new(),
            devices_file: None,
            port: default_port(),
            kind: default_kind(),
            use_cache: false,
            cache_dir: default_cache_dir(),
            output_path: default_output_path(),
            results_json: None,
            from_results: None,
            timeout_seconds: default_timeout_secs(),
            warmup: default_warmup(),
            iterations: None,
            stats: default_stats(),
            message_count: default_message_count(),
            message_size: None,
            message_metric: default_message_metric(),
            token_payload_lengths: default_token_payload_lengths(),
            token_rounds: default_token_rounds(),
            token_poll_interval_secs: default_token_poll_interval_secs(),
            token_cooldown_secs: default_token_cooldown_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_multiplier: default_retry_multiplier(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            skip_failed: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn token_poll_interval(&self) -> Duration {
        Duration::from_secs(self.token_poll_interval_secs)
    }

    pub fn token_cooldown(&self) -> Duration {
        Duration::from_secs(self.token_cooldown_secs)
    }

    /// Device addresses with the network prefix applied
    pub fn device_addresses(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|addr| format!("{}{}", self.net_prefix, addr))
            .collect()
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.from_results.is_none() && self.devices.is_empty() && self.devices_file.is_none() {
            return Err(AppError::config(
                "No devices configured: pass device addresses, a devices file or a results file to replay",
            ));
        }

        for addr in &self.devices {
            if addr.trim().is_empty() {
                return Err(AppError::config("Device address cannot be empty"));
            }
        }

        if self.port == 0 {
            return Err(AppError::config("Port must be greater than 0"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 3600 {
            return Err(AppError::config("Timeout cannot exceed 3600 seconds"));
        }

        if self.iterations == Some(0) {
            return Err(AppError::config("Iterations must be greater than 0"));
        }

        if self.stats.is_empty() {
            return Err(AppError::config("At least one statistic must be selected"));
        }

        if self.message_count == 0 {
            return Err(AppError::config("Message count must be greater than 0"));
        }

        if self.message_size == Some(0) {
            return Err(AppError::config("Message size must be greater than 0"));
        }

        if self.token_payload_lengths.is_empty() {
            return Err(AppError::config("At least one token payload length is required"));
        }

        if self.token_payload_lengths.contains(&0) {
            return Err(AppError::config("Token payload lengths must be greater than 0"));
        }

        if self.token_rounds == 0 {
            return Err(AppError::config("Token rounds must be greater than 0"));
        }

        if self.token_poll_interval_secs == 0 {
            return Err(AppError::config("Token poll interval must be greater than 0"));
        }

        if !self.retry_multiplier.is_finite() || self.retry_multiplier < 1.0 {
            return Err(AppError::config(format!(
                "Retry multiplier must be at least 1.0, got {}",
                self.retry_multiplier
            )));
        }

        if self.retry_max_delay_ms < self.retry_delay_ms {
            return Err(AppError::config(
                "Maximum retry delay cannot be smaller than the initial retry delay",
            ));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(devices) = std::env::var("BENCH_DEVICES") {
            self.devices = split_list(&devices);
        }

        if let Ok(prefix) = std::env::var("BENCH_NET_PREFIX") {
            self.net_prefix = prefix.trim().to_string();
        }

        if let Ok(path) = std::env::var("BENCH_DEVICES_FILE") {
            self.devices_file = non_empty_path(&path);
        }

        if let Ok(port) = std::env::var("BENCH_PORT") {
            self.port = parse_env("BENCH_PORT", &port)?;
        }

        if let Ok(kind) = std::env::var("BENCH_KIND") {
            self.kind = kind.parse()?;
        }

        if let Ok(use_cache) = std::env::var("BENCH_CACHE") {
            self.use_cache = parse_env("BENCH_CACHE", &use_cache)?;
        }

        if let Ok(dir) = std::env::var("BENCH_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir.trim());
        }

        if let Ok(path) = std::env::var("BENCH_OUTPUT") {
            self.output_path = PathBuf::from(path.trim());
        }

        if let Ok(path) = std::env::var("BENCH_RESULTS_JSON") {
            self.results_json = non_empty_path(&path);
        }

        if let Ok(path) = std::env::var("BENCH_FROM_RESULTS") {
            self.from_results = non_empty_path(&path);
        }

        if let Ok(timeout) = std::env::var("BENCH_TIMEOUT_SECONDS") {
            self.timeout_seconds = parse_env("BENCH_TIMEOUT_SECONDS", &timeout)?;
        }

        if let Ok(warmup) = std::env::var("BENCH_WARMUP") {
            self.warmup = parse_env("BENCH_WARMUP", &warmup)?;
        }

        if let Ok(iterations) = std::env::var("BENCH_ITERATIONS") {
            self.iterations = Some(parse_env("BENCH_ITERATIONS", &iterations)?);
        }

        if let Ok(stats) = std::env::var("BENCH_STATS") {
            self.stats = split_list(&stats)
                .iter()
                .map(|s| s.parse())
                .collect::<Result<Vec<StatKind>>>()?;
        }

        if let Ok(count) = std::env::var("BENCH_MESSAGE_COUNT") {
            self.message_count = parse_env("BENCH_MESSAGE_COUNT", &count)?;
        }

        if let Ok(size) = std::env::var("BENCH_MESSAGE_SIZE") {
            self.message_size = Some(parse_env("BENCH_MESSAGE_SIZE", &size)?);
        }

        if let Ok(metric) = std::env::var("BENCH_MESSAGE_METRIC") {
            self.message_metric = metric.parse()?;
        }

        if let Ok(lengths) = std::env::var("BENCH_TOKEN_PAYLOADS") {
            self.token_payload_lengths = split_list(&lengths)
                .iter()
                .map(|s| parse_env("BENCH_TOKEN_PAYLOADS", s))
                .collect::<Result<Vec<u32>>>()?;
        }

        if let Ok(rounds) = std::env::var("BENCH_TOKEN_ROUNDS") {
            self.token_rounds = parse_env("BENCH_TOKEN_ROUNDS", &rounds)?;
        }

        if let Ok(max_attempts) = std::env::var("BENCH_MAX_ATTEMPTS") {
            self.max_attempts = parse_env("BENCH_MAX_ATTEMPTS", &max_attempts)?;
        }

        if let Ok(delay) = std::env::var("BENCH_RETRY_DELAY_MS") {
            self.retry_delay_ms = parse_env("BENCH_RETRY_DELAY_MS", &delay)?;
        }

        if let Ok(multiplier) = std::env::var("BENCH_RETRY_MULTIPLIER") {
            self.retry_multiplier = parse_env("BENCH_RETRY_MULTIPLIER", &multiplier)?;
        }

        if let Ok(delay) = std::env::var("BENCH_RETRY_MAX_DELAY_MS") {
            self.retry_max_delay_ms = parse_env("BENCH_RETRY_MAX_DELAY_MS", &delay)?;
        }

        if let Ok(poll) = std::env::var("BENCH_TOKEN_POLL_SECS") {
            self.token_poll_interval_secs = parse_env("BENCH_TOKEN_POLL_SECS", &poll)?;
        }

        if let Ok(cooldown) = std::env::var("BENCH_TOKEN_COOLDOWN_SECS") {
            self.token_cooldown_secs = parse_env("BENCH_TOKEN_COOLDOWN_SECS", &cooldown)?;
        }

        if let Ok(skip) = std::env::var("BENCH_SKIP_FAILED") {
            self.skip_failed = parse_env("BENCH_SKIP_FAILED", &skip)?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = parse_env("ENABLE_COLOR", &enable_color)?;
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", name, value, e)))
}

// Default value functions for serde
fn default_port() -> u16 {
    crate::defaults::DEFAULT_PORT
}

fn default_kind() -> BenchKind {
    BenchKind::Throughput
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_CACHE_DIR)
}

fn default_output_path() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_OUTPUT_PATH)
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_warmup() -> bool {
    true
}

fn default_stats() -> Vec<StatKind> {
    vec![StatKind::Mean]
}

fn default_message_count() -> u32 {
    crate::defaults::DEFAULT_MESSAGE_COUNT
}

fn default_message_metric() -> MessageMetric {
    MessageMetric::ReceiveRate
}

fn default_token_payload_lengths() -> Vec<u32> {
    crate::defaults::DEFAULT_TOKEN_PAYLOAD_LENGTHS.to_vec()
}

fn default_token_rounds() -> u32 {
    crate::defaults::DEFAULT_TOKEN_ROUNDS
}

fn default_token_poll_interval_secs() -> u64 {
    crate::defaults::DEFAULT_TOKEN_POLL_INTERVAL.as_secs()
}

fn default_token_cooldown_secs() -> u64 {
    crate::defaults::DEFAULT_TOKEN_COOLDOWN.as_secs()
}

fn default_max_attempts() -> u32 {
    crate::defaults::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    crate::defaults::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_retry_multiplier() -> f64 {
    crate::defaults::DEFAULT_RETRY_MULTIPLIER
}

fn default_retry_max_delay_ms() -> u64 {
    crate::defaults::DEFAULT_RETRY_MAX_DELAY.as_millis() as u64
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
