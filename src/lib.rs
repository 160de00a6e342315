//! Device Benchmark
//!
//! Drives pairwise throughput, message-rate and token-ring measurements across
//! a fleet of devices that expose the benchmark HTTP service, aggregates the
//! results into a nested result tree and lays it out as a multi-level
//! grouped-bar chart.

pub mod acquisition;
pub mod app;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;

// Re-export commonly used types
pub use acquisition::{AcquisitionEngine, RetryPolicy};
pub use error::{AppError, Result};
pub use grouping::{group_levels, layout::layout_coordinates, ChartLayout, GroupedLevels};
pub use models::{BenchKind, Config, Device, DeviceRegistry, ResultNode, ResultTree};
pub use stats::{MessageStepStats, StatKind, Summary};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 38080;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_CACHE_DIR: &str = "csv";
    pub const DEFAULT_OUTPUT_PATH: &str = "plot.svg";
    pub const DEFAULT_MESSAGE_COUNT: u32 = 40;
    pub const DEFAULT_TOKEN_PAYLOAD_LENGTHS: &[u32] = &[256, 512, 1024, 2048, 4096];
    pub const DEFAULT_TOKEN_ROUNDS: u32 = 5;
    pub const DEFAULT_TOKEN_POLL_INTERVAL: Duration = Duration::from_secs(3);
    pub const DEFAULT_TOKEN_COOLDOWN: Duration = Duration::from_secs(10);
    /// Seconds allowed per (device, round) before a token run counts as failed
    pub const TOKEN_SECONDS_PER_DEVICE_ROUND: u64 = 5;
    /// 0 keeps retrying until the pair succeeds
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 0;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_RETRY_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
