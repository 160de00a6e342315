//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::BenchKind;
use crate::stats::{MessageMetric, StatKind};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                println!("Loaded configuration from .env file");
            }
        } else if debug {
            println!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# devbench configuration
#
# Values here act as defaults; command-line flags override them.

# Device addresses (comma-separated), joined to BENCH_NET_PREFIX
# BENCH_DEVICES=100,107,112
# BENCH_NET_PREFIX=192.168.1.

# JSON device registry used instead of discovery
# BENCH_DEVICES_FILE=devices.json

# Port of the benchmark service on every device
# BENCH_PORT=38080

# Benchmark to run: throughput, messages or token
# BENCH_KIND=throughput

# Reuse raw reports found in the cache directory
# BENCH_CACHE=false
# BENCH_CACHE_DIR=csv

# Chart and result-tree outputs
# BENCH_OUTPUT=plot.svg
# BENCH_RESULTS_JSON=results.json

# Replay a saved result tree instead of measuring
# BENCH_FROM_RESULTS=results.json

# Request timeout in seconds
# BENCH_TIMEOUT_SECONDS=60

# Throughput settings
# BENCH_WARMUP=true
# BENCH_ITERATIONS=20
# BENCH_STATS=mean,min,max

# Message-rate settings
# BENCH_MESSAGE_COUNT=40
# BENCH_MESSAGE_SIZE=20
# BENCH_MESSAGE_METRIC=receive_rate

# Token-ring settings
# BENCH_TOKEN_PAYLOADS=256,512,1024,2048,4096
# BENCH_TOKEN_ROUNDS=5
# BENCH_TOKEN_POLL_SECS=3
# BENCH_TOKEN_COOLDOWN_SECS=10

# Retry policy (0 attempts retries until the pair succeeds)
# BENCH_MAX_ATTEMPTS=0
# BENCH_RETRY_DELAY_MS=500
# BENCH_RETRY_MULTIPLIER=2.0
# BENCH_RETRY_MAX_DELAY_MS=10000
# BENCH_SKIP_FAILED=false

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "BENCH_DEVICES" => {
                if value.split(',').all(|addr| addr.trim().is_empty()) {
                    return Err(AppError::config("BENCH_DEVICES must list at least one address"));
                }
            }
            "BENCH_PORT" => {
                let port: u16 = parse_number(key, value)?;
                if port == 0 {
                    return Err(AppError::config("BENCH_PORT must be greater than 0"));
                }
            }
            "BENCH_KIND" => {
                value.parse::<BenchKind>()?;
            }
            "BENCH_CACHE" | "BENCH_WARMUP" | "BENCH_SKIP_FAILED" | "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "BENCH_TIMEOUT_SECONDS" => {
                let timeout: u64 = parse_number(key, value)?;
                if timeout == 0 || timeout > 3600 {
                    return Err(AppError::config(format!(
                        "BENCH_TIMEOUT_SECONDS must be between 1 and 3600, got: {}",
                        timeout
                    )));
                }
            }
            "BENCH_ITERATIONS" | "BENCH_MESSAGE_COUNT" | "BENCH_MESSAGE_SIZE" | "BENCH_TOKEN_ROUNDS"
            | "BENCH_TOKEN_POLL_SECS" => {
                let count: u64 = parse_number(key, value)?;
                if count == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "BENCH_MAX_ATTEMPTS" | "BENCH_RETRY_DELAY_MS" | "BENCH_RETRY_MAX_DELAY_MS"
            | "BENCH_TOKEN_COOLDOWN_SECS" => {
                parse_number::<u64>(key, value)?;
            }
            "BENCH_RETRY_MULTIPLIER" => {
                let multiplier: f64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if !multiplier.is_finite() || multiplier < 1.0 {
                    return Err(AppError::config(format!(
                        "BENCH_RETRY_MULTIPLIER must be at least 1.0, got: {}",
                        multiplier
                    )));
                }
            }
            "BENCH_STATS" => {
                for stat in value.split(',').filter(|s| !s.trim().is_empty()) {
                    stat.parse::<StatKind>()?;
                }
            }
            "BENCH_MESSAGE_METRIC" => {
                value.parse::<MessageMetric>()?;
            }
            "BENCH_TOKEN_PAYLOADS" => {
                for length in value.split(',').filter(|s| !s.trim().is_empty()) {
                    let length: u32 = parse_number(key, length.trim())?;
                    if length == 0 {
                        return Err(AppError::config("BENCH_TOKEN_PAYLOADS entries must be greater than 0"));
                    }
                }
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("BENCH_DEVICES", "Comma-separated device addresses", "100,107,112"),
            ("BENCH_NET_PREFIX", "Prefix joined to every device address", "192.168.1."),
            ("BENCH_DEVICES_FILE", "JSON device registry used instead of discovery", "devices.json"),
            ("BENCH_PORT", "Port of the benchmark service", "38080"),
            ("BENCH_KIND", "Benchmark to run (throughput, messages, token)", "throughput"),
            ("BENCH_CACHE", "Reuse cached raw reports", "false"),
            ("BENCH_CACHE_DIR", "Directory holding raw reports", "csv"),
            ("BENCH_OUTPUT", "SVG chart output path", "plot.svg"),
            ("BENCH_RESULTS_JSON", "Write the result tree as JSON", "results.json"),
            ("BENCH_FROM_RESULTS", "Replay a saved result tree", "results.json"),
            ("BENCH_TIMEOUT_SECONDS", "Request timeout in seconds (1-3600)", "60"),
            ("BENCH_WARMUP", "Send a throw-away throughput request first", "true"),
            ("BENCH_ITERATIONS", "Transfers per throughput report", "20"),
            ("BENCH_STATS", "Statistics plotted for throughput pairs", "mean,min,max"),
            ("BENCH_MESSAGE_COUNT", "Messages sent to every target", "40"),
            ("BENCH_MESSAGE_SIZE", "Message size in bytes", "20"),
            ("BENCH_MESSAGE_METRIC", "Metric plotted for message steps", "receive_rate"),
            ("BENCH_TOKEN_PAYLOADS", "Token payload lengths in bytes", "256,512,1024"),
            ("BENCH_TOKEN_ROUNDS", "Rounds per token run", "5"),
            ("BENCH_TOKEN_POLL_SECS", "Seconds between token result polls", "3"),
            ("BENCH_TOKEN_COOLDOWN_SECS", "Seconds between token runs", "10"),
            ("BENCH_MAX_ATTEMPTS", "Attempts per pair, 0 for unlimited", "0"),
            ("BENCH_RETRY_DELAY_MS", "Delay before the first retry", "500"),
            ("BENCH_RETRY_MULTIPLIER", "Backoff multiplier (>= 1.0)", "2.0"),
            ("BENCH_RETRY_MAX_DELAY_MS", "Upper bound for the retry delay", "10000"),
            ("BENCH_SKIP_FAILED", "Leave failed pairs out instead of aborting", "false"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Validate the entries of an env-style file, one warning per bad line
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let warnings = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                Self::validate_env_var(key.trim(), value)
                    .err()
                    .map(|e| format!("Line '{}': {}", line, e))
            })
            .collect();

        Ok(Some(warnings))
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();
        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", var)), "missing {}", var);
        }
    }

    #[test]
    fn test_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("# devbench configuration"));
    }

    #[test]
    fn test_validate_env_var_accepts_valid_values() {
        assert!(EnvManager::validate_env_var("BENCH_DEVICES", "100, 107").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_PORT", "38080").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_KIND", "token").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_CACHE", "true").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_STATS", "mean,max").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_MESSAGE_METRIC", "received_pct").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_TOKEN_PAYLOADS", "256, 512").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_MAX_ATTEMPTS", "0").is_ok());
        assert!(EnvManager::validate_env_var("BENCH_RETRY_MULTIPLIER", "1.5").is_ok());
        assert!(EnvManager::validate_env_var("UNKNOWN_VAR", "anything").is_ok());
    }

    #[test]
    fn test_validate_env_var_rejects_invalid_values() {
        assert!(EnvManager::validate_env_var("BENCH_DEVICES", " , ").is_err());
        assert!(EnvManager::validate_env_var("BENCH_PORT", "0").is_err());
        assert!(EnvManager::validate_env_var("BENCH_PORT", "70000").is_err());
        assert!(EnvManager::validate_env_var("BENCH_KIND", "latency").is_err());
        assert!(EnvManager::validate_env_var("BENCH_WARMUP", "yes").is_err());
        assert!(EnvManager::validate_env_var("BENCH_TIMEOUT_SECONDS", "0").is_err());
        assert!(EnvManager::validate_env_var("BENCH_TOKEN_ROUNDS", "0").is_err());
        assert!(EnvManager::validate_env_var("BENCH_STATS", "mean,median").is_err());
        assert!(EnvManager::validate_env_var("BENCH_TOKEN_PAYLOADS", "256,0").is_err());
        assert!(EnvManager::validate_env_var("BENCH_RETRY_MULTIPLIER", "0.5").is_err());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("BENCH_DEVICES"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "# comment\nBENCH_PORT=38080\nBENCH_KIND=latency\n\nBENCH_TOKEN_ROUNDS=0\n",
        )
        .unwrap();

        let warnings = EnvManager::check_env_file(temp_file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("BENCH_KIND=latency"));
        assert!(warnings[1].contains("BENCH_TOKEN_ROUNDS=0"));
    }

    #[test]
    fn test_check_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EnvManager::check_env_file(&dir.path().join(".env")).unwrap().is_none());
    }
}
