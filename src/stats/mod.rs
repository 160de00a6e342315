//! Reduction of raw report rows to summary statistics

use crate::error::{AppError, Result};
use crate::models::{MessageRow, ThroughputRow, TokenRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean, minimum and maximum of a non-empty sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize a sample set; `None` when there are no finite samples
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 || !sum.is_finite() {
            return None;
        }

        // Rounding in the sum can push the mean a hair outside [min, max]
        let mean = (sum / count as f64).clamp(min, max);
        Some(Self { mean, min, max })
    }

    /// Pick one statistic
    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Mean => self.mean,
            StatKind::Min => self.min,
            StatKind::Max => self.max,
        }
    }
}

/// Statistic plotted for a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Mean,
    Min,
    Max,
}

impl StatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(AppError::config(format!(
                "Unknown statistic '{}' (expected mean, min or max)",
                other
            ))),
        }
    }
}

/// Metric plotted for a message-rate step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MessageMetric {
    ReceivedPct,
    AvgRttMs,
    ConnectMs,
    ReceiveRate,
}

impl MessageMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReceivedPct => "received_pct",
            Self::AvgRttMs => "avg_rtt_ms",
            Self::ConnectMs => "connect_ms",
            Self::ReceiveRate => "receive_rate",
        }
    }

    /// Y-axis label for charts of this metric
    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::ReceivedPct => "Received (%)",
            Self::AvgRttMs => "Round trip (ms)",
            Self::ConnectMs => "Connect (ms)",
            Self::ReceiveRate => "Messages / s / target",
        }
    }
}

impl fmt::Display for MessageMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "received_pct" => Ok(Self::ReceivedPct),
            "avg_rtt_ms" => Ok(Self::AvgRttMs),
            "connect_ms" => Ok(Self::ConnectMs),
            "receive_rate" => Ok(Self::ReceiveRate),
            other => Err(AppError::config(format!(
                "Unknown message metric '{}' (expected received_pct, avg_rtt_ms, connect_ms or receive_rate)",
                other
            ))),
        }
    }
}

/// Statistics of one message-rate step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MessageStepStats {
    /// Share of the expected messages that arrived, truncated to a whole percent
    pub received_pct: u32,
    pub avg_rtt_ms: f64,
    pub connect_ms: f64,
    /// Messages per second per target
    pub receive_rate: f64,
}

impl MessageStepStats {
    pub fn get(&self, metric: MessageMetric) -> f64 {
        match metric {
            MessageMetric::ReceivedPct => f64::from(self.received_pct),
            MessageMetric::AvgRttMs => self.avg_rtt_ms,
            MessageMetric::ConnectMs => self.connect_ms,
            MessageMetric::ReceiveRate => self.receive_rate,
        }
    }
}

/// Transfer rate in kbit/s for `bytes` moved in `nanotime` nanoseconds
pub fn throughput_kbps(bytes: f64, nanotime: f64) -> f64 {
    (bytes * 8.0 / 1000.0) / (nanotime / 1e9)
}

/// Summarize a throughput report in kbit/s
pub fn summarize_throughput(rows: &[ThroughputRow]) -> Option<Summary> {
    Summary::from_values(rows.iter().map(ThroughputRow::kbps))
}

/// Reduce one message-rate report; `None` when no message arrived
pub fn message_step_stats(rows: &[MessageRow], message_count: u32, targets: usize) -> Option<MessageStepStats> {
    if rows.is_empty() || targets == 0 {
        return None;
    }

    let received = rows.len() as u64;
    let expected = u64::from(message_count) * targets as u64;
    let received_pct = if expected == 0 {
        0
    } else {
        u32::try_from(received * 100 / expected).unwrap_or(u32::MAX)
    };

    let count = rows.len() as f64;
    let avg_rtt_ms = rows.iter().map(|r| elapsed_ms(r.started, r.finished)).sum::<f64>() / count;
    let connect_ms = rows.iter().map(|r| elapsed_ms(r.started, r.received)).sum::<f64>() / count;

    let first_started = rows.iter().map(|r| r.started).min().unwrap_or_default();
    let last_finished = rows.iter().map(|r| r.finished).max().unwrap_or_default();
    let span_ms = elapsed_ms(first_started, last_finished).max(1.0);
    let receive_rate = count / (span_ms / 1000.0) / targets as f64;

    Some(MessageStepStats {
        received_pct,
        avg_rtt_ms,
        connect_ms,
        receive_rate,
    })
}

/// Summarize the hop times of a token run in milliseconds
pub fn summarize_token(rows: &[TokenRow]) -> Option<Summary> {
    Summary::from_values(rows.iter().map(|r| elapsed_ms(r.started, r.finished)))
}

/// Millisecond difference of two device timestamps, computed in f64 so
/// extreme values cannot overflow
fn elapsed_ms(from: i64, to: i64) -> f64 {
    to as f64 - from as f64
}
