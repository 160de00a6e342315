//! Configuration validation utilities and rules

use crate::{error::Result, models::BenchKind, models::Config};
use colored::*;
use std::collections::HashSet;

/// Configuration validator producing non-fatal warnings on top of [`Config::validate`]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_devices(config));
        // Nothing is measured during a replay
        if config.from_results.is_none() {
            warnings.extend(Self::validate_retry_settings(config));
            warnings.extend(Self::validate_cache_settings(config));
            warnings.extend(Self::validate_timing(config));
        }
        warnings.extend(Self::validate_outputs(config));

        Ok(warnings)
    }

    fn validate_devices(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.from_results.is_some() {
            if !config.devices.is_empty() || config.devices_file.is_some() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    "Replaying saved results; device settings are ignored".to_string(),
                ));
            }
            return warnings;
        }

        let addresses = config.device_addresses();
        let mut seen = HashSet::new();
        for address in &addresses {
            if !seen.insert(address) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Device {} is listed more than once", address),
                ));
            }
        }

        let count = addresses.len();
        let minimum = match config.kind {
            BenchKind::Token => 3,
            BenchKind::Throughput | BenchKind::Messages => 2,
        };
        if config.devices_file.is_none() && count > 0 && count < minimum {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "The {} benchmark needs at least {} devices, {} configured",
                    config.kind, minimum, count
                ),
            ));
        }

        if config.kind == BenchKind::Throughput && count * count.saturating_sub(1) > 50 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("{} devices give {} ordered pairs to measure", count, count * (count - 1)),
            ));
        }

        warnings
    }

    fn validate_retry_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.max_attempts == 0 {
            if config.skip_failed {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    "Unlimited retries never give up on a pair, so skip-failed has no effect".to_string(),
                ));
            } else {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    "Pairs are retried until they succeed; set a max attempts value to bound the run".to_string(),
                ));
            }
        }

        if config.retry_delay_ms == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Retry delay of 0ms retries failing devices back to back".to_string(),
            ));
        }

        warnings
    }

    fn validate_cache_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if !config.use_cache {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Cache disabled; every measurement is repeated (reports are still saved to {})",
                    config.cache_dir.display()
                ),
            ));
        } else if !config.cache_dir.is_dir() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Cache directory {} does not exist yet; nothing will be reused",
                    config.cache_dir.display()
                ),
            ));
        }

        warnings
    }

    fn validate_timing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.timeout_seconds < 5 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s is shorter than most device measurements take",
                    config.timeout_seconds
                ),
            ));
        }

        if config.kind == BenchKind::Token {
            let shortest_deadline =
                crate::defaults::TOKEN_SECONDS_PER_DEVICE_ROUND * 3 * u64::from(config.token_rounds);
            if config.token_poll_interval_secs >= shortest_deadline {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "Token poll interval of {}s reaches the {}s deadline of a three-device ring",
                        config.token_poll_interval_secs, shortest_deadline
                    ),
                ));
            }
            if config.token_cooldown_secs == 0 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    "No cooldown between token runs".to_string(),
                ));
            }
        }

        warnings
    }

    fn validate_outputs(config: &Config) -> Vec<ValidationWarning> {
        let is_svg = config
            .output_path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("svg"));

        if is_svg {
            Vec::new()
        } else {
            vec![ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Chart output {} does not end in .svg; the file is written as SVG anyway",
                    config.output_path.display()
                ),
            )]
        }
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Blue,
            Self::Warning => Color::Yellow,
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", tag.color(self.level.color()).bold(), self.message)
        } else {
            format!("{} {}", tag, self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
