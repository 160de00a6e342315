//! Error handling for the device benchmark

use thiserror::Error;

/// Custom error types for the device benchmark
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network connectivity errors (connection refused, unreachable device)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Device discovery errors
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Report cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// A raw report row is malformed or misses required fields
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// The result tree does not have the shape the grouping transform needs
    #[error("Schema error: {0}")]
    Schema(String),

    /// The retry policy gave up on an operation
    #[error("Retries exhausted: {operation} failed after {attempts} attempt(s)")]
    RetriesExhausted { operation: String, attempts: u32 },

    /// Chart rendering errors
    #[error("Render error: {0}")]
    Render(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new discovery error
    pub fn discovery<S: Into<String>>(message: S) -> Self {
        Self::Discovery(message.into())
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache(message.into())
    }

    /// Create a new data corruption error
    pub fn data_corruption<S: Into<String>>(message: S) -> Self {
        Self::DataCorruption(message.into())
    }

    /// Create a new schema error
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema(message.into())
    }

    /// Create a new retries-exhausted error
    pub fn retries_exhausted<S: Into<String>>(operation: S, attempts: u32) -> Self {
        Self::RetriesExhausted {
            operation: operation.into(),
            attempts,
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Discovery(_) => "DISCOVERY",
            Self::Cache(_) => "CACHE",
            Self::DataCorruption(_) => "DATA",
            Self::Schema(_) => "SCHEMA",
            Self::RetriesExhausted { .. } => "RETRY",
            Self::Render(_) => "RENDER",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is transient, i.e. the same request may succeed later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::HttpRequest(_) | Self::Timeout(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::Discovery(_) => false,
            Self::Cache(_) | Self::DataCorruption(_) | Self::Schema(_) => false,
            Self::RetriesExhausted { .. } | Self::Io(_) | Self::Render(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Network(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check that the device is on the same network and the benchmark app is running.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The device answered unexpectedly. Restart the benchmark service on the device.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the timeout value using --timeout; long transfers need more time.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the format of device addresses and numeric options.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration files.", msg)
            }
            Self::Discovery(msg) => {
                format!("Device discovery failed: {}\n\nSuggestion: Verify the device address and that /mac answers with a name and a MAC address.", msg)
            }
            Self::Cache(msg) => {
                format!("Report cache problem: {}\n\nSuggestion: Check the cache directory or run without --cache.", msg)
            }
            Self::DataCorruption(msg) => {
                format!("Corrupt report data: {}\n\nSuggestion: Delete the cached report for this pair and measure it again.", msg)
            }
            Self::Schema(msg) => {
                format!("Result tree has an unsupported shape: {}\n\nSuggestion: Every node must contain either only numbers or only nested objects, with equal depth.", msg)
            }
            Self::RetriesExhausted { operation, attempts } => {
                format!("Gave up on {} after {} attempt(s).\n\nSuggestion: Raise --max-attempts (0 retries forever) or use --skip-failed.", operation, attempts)
            }
            Self::Render(msg) => {
                format!("Chart rendering failed: {}\n\nSuggestion: Check that the output path is writable.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::HttpRequest(_) | Self::Discovery(_) => 2,
            Self::Timeout(_) | Self::RetriesExhausted { .. } => 3,
            Self::DataCorruption(_) | Self::Schema(_) => 4,
            Self::Io(_) | Self::Cache(_) | Self::Render(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::HttpRequest(_) | Self::Discovery(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) | Self::RetriesExhausted { .. } => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::DataCorruption(_) | Self::Schema(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Cache(_) | Self::Render(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            Self::network(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(_) => Self::io(error.to_string()),
            _ => Self::data_corruption(error.to_string()),
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for structured error logging and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }

    /// Get formatted error summary
    pub fn format_error_summary(&self, errors: &[AppError]) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        let mut summary = format!("Found {} error(s):", errors.len());

        // Group errors by category, keeping first-seen order
        let mut error_groups: Vec<(&'static str, Vec<&AppError>)> = Vec::new();
        for error in errors {
            match error_groups.iter_mut().find(|(category, _)| *category == error.category()) {
                Some((_, group)) => group.push(error),
                None => error_groups.push((error.category(), vec![error])),
            }
        }

        for (category, group_errors) in error_groups {
            summary.push_str(&format!("\n  {}: {} error(s)", category, group_errors.len()));
            if self.verbose {
                for error in group_errors {
                    summary.push_str(&format!("\n    - {}", error));
                }
            }
        }

        summary
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let network_error = AppError::network("Connection refused");
        assert_eq!(network_error.category(), "NETWORK");
        assert!(network_error.is_recoverable());
        assert_eq!(network_error.exit_code(), 2);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::config("Test configuration error");
        let display = error.to_string();
        assert!(display.contains("Configuration error"));
        assert!(display.contains("Test configuration error"));

        let exhausted = AppError::retries_exhausted("pair n4 <- n5", 3);
        assert_eq!(
            exhausted.to_string(),
            "Retries exhausted: pair n4 <- n5 failed after 3 attempt(s)"
        );
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::network("network"),
            AppError::http_request("http"),
            AppError::timeout("timeout"),
            AppError::validation("validation"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::discovery("discovery"),
            AppError::cache("cache"),
            AppError::data_corruption("data"),
            AppError::schema("schema"),
            AppError::retries_exhausted("op", 1),
            AppError::render("render"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "NETWORK", "HTTP", "TIMEOUT", "VALIDATION", "IO", "PARSE",
            "DISCOVERY", "CACHE", "DATA", "SCHEMA", "RETRY", "RENDER", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(AppError::network("test").is_recoverable());
        assert!(AppError::http_request("test").is_recoverable());
        assert!(AppError::timeout("test").is_recoverable());

        assert!(!AppError::data_corruption("test").is_recoverable());
        assert!(!AppError::schema("test").is_recoverable());
        assert!(!AppError::cache("test").is_recoverable());
        assert!(!AppError::retries_exhausted("test", 2).is_recoverable());
        assert!(!AppError::config("test").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::network("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::retries_exhausted("test", 1).exit_code(), 3);
        assert_eq!(AppError::data_corruption("test").exit_code(), 4);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::schema("mixed leaves and groups at R1");
        let message = error.user_friendly_message();
        assert!(message.contains("unsupported shape"));
        assert!(message.contains("Suggestion:"));
        assert!(message.contains("R1"));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");
    }

    #[test]
    fn test_csv_error_is_data_corruption() {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            #[allow(dead_code)]
            bytes: f64,
        }

        let mut reader = csv::Reader::from_reader("bytes\nnot-a-number\n".as_bytes());
        let csv_error = reader.deserialize::<Row>().next().unwrap().unwrap_err();
        let app_error: AppError = csv_error.into();
        assert_eq!(app_error.category(), "DATA");
        assert!(!app_error.is_recoverable());
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32> = Err(AppError::network("Connection failed"));
        let with_context = result.context("While measuring n4 <- n5");

        let error = with_context.unwrap_err();
        assert_eq!(error.category(), "INTERNAL");
        assert!(error.to_string().contains("While measuring n4 <- n5"));
    }

    #[test]
    fn test_error_summary_groups_by_category() {
        let reporter = ErrorReporter::new(false, true);
        let errors = vec![
            AppError::network("Error 1"),
            AppError::data_corruption("Error 2"),
            AppError::network("Error 3"),
        ];

        let summary = reporter.format_error_summary(&errors);
        assert!(summary.contains("Found 3 error(s)"));
        assert!(summary.contains("NETWORK: 2 error(s)"));
        assert!(summary.contains("DATA: 1 error(s)"));
        assert!(summary.contains("- Network error: Error 3"));
    }

    #[test]
    fn test_empty_error_summary() {
        let reporter = ErrorReporter::new(false, false);
        assert_eq!(reporter.format_error_summary(&[]), "No errors");
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::cache("Test error");
        let formatted_no_color = error.format_for_console(false);
        let formatted_color = error.format_for_console(true);

        assert_eq!(formatted_no_color, "[CACHE] Cache error: Test error");
        assert!(formatted_color.contains("CACHE"));
        assert!(formatted_color.contains("Test error"));
    }

    #[test]
    fn test_anyhow_integration() {
        let anyhow_error = anyhow::anyhow!("Test anyhow error");
        let app_error: AppError = anyhow_error.into();
        assert_eq!(app_error.category(), "INTERNAL");

        let app_error = AppError::config("Test config error");
        let anyhow_error = anyhow::anyhow!(app_error);
        assert!(anyhow_error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
        assert!(app_error.to_string().contains("Environment file error"));
    }
}
