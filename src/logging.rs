//! Structured logging for the device benchmark
//!
//! This module provides:
//! - Structured log entries with levels, fields and correlation IDs
//! - Console, JSON and compact output formats
//! - Acquisition logging (attempts, retries, cache traffic, pair outcomes)
//! - Network request and device discovery logging

use crate::error::{AppError, Result};
use crate::models::Config;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general progress information
    Info = 2,
    /// Warning level - failed attempts, skipped pairs
    Warn = 3,
    /// Error level - error events but the run can continue
    Error = 4,
    /// Fatal level - the run is aborted
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID tying together the attempts of one pair
    pub correlation_id: Option<String>,
    /// Structured fields, in the order they were added
    pub fields: Map<String, Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: Map<String, Value>,
}

/// Logger with configurable level, format and shared context
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger following the verbosity settings of the configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Start a correlated operation and return its ID
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.debug(&format!("Started: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.debug(&format!("Finished: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), Value::String(session_id.clone()));
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        // Progress goes to stdout, problems to stderr
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let fields_str: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: Map::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add a duration in milliseconds
    pub fn duration(self, key: &str, duration: Duration) -> Self {
        self.field(key, duration.as_secs_f64() * 1000.0)
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error", error.to_string())
            .field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for the acquisition engine: attempts, retries, cache and outcomes
pub struct AcquisitionLogger {
    logger: Logger,
}

impl AcquisitionLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ACQ".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log the start of one acquisition attempt
    pub async fn log_attempt(&self, operation: &str, attempt: u32, max_attempts: u32) {
        let bound = if max_attempts == 0 {
            "unlimited".to_string()
        } else {
            max_attempts.to_string()
        };

        self.logger
            .info(&format!("{} (attempt {}/{})", operation, attempt, bound))
            .field("operation", operation)
            .field("attempt", attempt)
            .field("max_attempts", max_attempts)
            .log()
            .await;
    }

    /// Log a failed attempt that will be retried after `delay`
    pub async fn log_retry(&self, operation: &str, attempt: u32, delay: Duration, reason: &str) {
        self.logger
            .warn(&format!(
                "{} failed ({}), retrying in {:.1}s",
                operation,
                reason,
                delay.as_secs_f64()
            ))
            .field("operation", operation)
            .field("attempt", attempt)
            .duration("next_delay_ms", delay)
            .field("reason", reason)
            .log()
            .await;
    }

    pub async fn log_cache_hit(&self, path: &Path, rows: usize) {
        self.logger
            .debug(&format!("Using cached report {}", path.display()))
            .field("path", path.display().to_string())
            .field("rows", rows)
            .field("cache", "hit")
            .log()
            .await;
    }

    pub async fn log_cache_miss(&self, path: &Path, reason: &str) {
        self.logger
            .debug(&format!("No usable cached report at {} ({})", path.display(), reason))
            .field("path", path.display().to_string())
            .field("cache", "miss")
            .field("reason", reason)
            .log()
            .await;
    }

    pub async fn log_cache_store(&self, path: &Path, bytes: usize) {
        self.logger
            .debug(&format!("Saved report to {}", path.display()))
            .field("path", path.display().to_string())
            .field("bytes", bytes)
            .log()
            .await;
    }

    /// Log a pair that produced a valid result
    pub async fn log_pair_complete(&self, operation: &str, value: f64, attempts: u32, elapsed: Duration) {
        self.logger
            .info(&format!("{} -> {:.2} after {} attempt(s)", operation, value, attempts))
            .field("operation", operation)
            .field("value", value)
            .field("attempts", attempts)
            .duration("elapsed_ms", elapsed)
            .log()
            .await;
    }

    /// Log a pair left out of the results
    pub async fn log_pair_skipped(&self, operation: &str, error: &AppError) {
        self.logger
            .warn(&format!("Skipping {}: {}", operation, error))
            .field("operation", operation)
            .error_info(error)
            .log()
            .await;
    }

    /// Log the totals of a benchmark run
    pub async fn log_run_summary(&self, kind: &str, succeeded: usize, failed: usize, elapsed: Duration) {
        let level = if failed == 0 { LogLevel::Info } else { LogLevel::Warn };
        self.logger
            .log(
                level,
                &format!(
                    "{} run finished: {} succeeded, {} failed in {:.1}s",
                    kind,
                    succeeded,
                    failed,
                    elapsed.as_secs_f64()
                ),
            )
            .field("kind", kind)
            .field("succeeded", succeeded)
            .field("failed", failed)
            .duration("elapsed_ms", elapsed)
            .log()
            .await;
    }
}

/// Specialized logger for network operations
pub struct NetworkLogger {
    logger: Logger,
}

impl NetworkLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("NET".to_string(), config),
        }
    }

    /// Log an HTTP request; `status_code` is `None` when the request never got an answer
    pub async fn log_http_request(&self, url: &str, method: &str, status_code: Option<u16>, duration_ms: f64) {
        let success = status_code.is_some_and(|code| (200..400).contains(&code));
        let level = if success { LogLevel::Debug } else { LogLevel::Warn };

        let message = format!(
            "{} {} -> {} in {:.1}ms",
            method,
            url,
            status_code.map_or("FAILED".to_string(), |c| c.to_string()),
            duration_ms
        );

        self.logger
            .log(level, &message)
            .field("url", url)
            .field("method", method)
            .field("status_code", status_code)
            .field("success", success)
            .field("duration_ms", duration_ms)
            .log()
            .await;
    }

    /// Log the outcome of asking a device for its identity
    pub async fn log_discovery(&self, address: &str, outcome: std::result::Result<(&str, &str), &AppError>) {
        match outcome {
            Ok((name, mac)) => {
                self.logger
                    .info(&format!("Found {} [{}] at {}", name, mac, address))
                    .field("address", address)
                    .field("name", name)
                    .field("mac", mac)
                    .log()
                    .await
            }
            Err(error) => {
                self.logger
                    .error(&format!("Discovery of {} failed: {}", address, error))
                    .field("address", address)
                    .error_info(error)
                    .log()
                    .await
            }
        }
    }
}

/// Hands out loggers sharing one session ID
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_acquisition_logger(&self) -> AcquisitionLogger {
        let acquisition = AcquisitionLogger::new(&self.config);
        acquisition.logger.set_session_id(self.session_id.clone()).await;
        acquisition
    }

    pub async fn create_network_logger(&self) -> NetworkLogger {
        let network = NetworkLogger::new(&self.config);
        network.logger.set_session_id(self.session_id.clone()).await;
        network
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Info-level logging with location information
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}
