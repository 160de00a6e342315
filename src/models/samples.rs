//! Raw report rows as served by the device benchmark service

use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One throughput transfer; `from`/`to` columns are not needed and ignored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputRow {
    pub bytes: f64,
    pub nanotime: f64,
}

impl ThroughputRow {
    /// Transfer rate in kbit/s
    pub fn kbps(&self) -> f64 {
        crate::stats::throughput_kbps(self.bytes, self.nanotime)
    }
}

/// One message delivery; timestamps are milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub message_size: Option<u64>,
    pub started: i64,
    pub received: i64,
    pub finished: i64,
}

/// One token hop; timestamps are milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRow {
    pub sender: String,
    pub receiver: String,
    pub payload_size: u64,
    pub num_rounds: u32,
    pub started: i64,
    pub connected: i64,
    pub received: i64,
    pub finished: i64,
    #[serde(default)]
    pub sleep: i64,
}

fn parse_rows<T: DeserializeOwned>(raw: &[u8], report: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(raw);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T>().enumerate() {
        let row = record.map_err(|e| {
            AppError::data_corruption(format!("{} report, row {}: {}", report, index + 1, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Parse a throughput report, rejecting rows that cannot yield a rate
pub fn parse_throughput(raw: &[u8]) -> Result<Vec<ThroughputRow>> {
    let rows: Vec<ThroughputRow> = parse_rows(raw, "throughput")?;
    for (index, row) in rows.iter().enumerate() {
        if !row.nanotime.is_finite() || row.nanotime <= 0.0 {
            return Err(AppError::data_corruption(format!(
                "throughput report, row {}: nanotime must be positive, got {}",
                index + 1,
                row.nanotime
            )));
        }
        if !row.bytes.is_finite() || row.bytes < 0.0 {
            return Err(AppError::data_corruption(format!(
                "throughput report, row {}: bytes must be non-negative, got {}",
                index + 1,
                row.bytes
            )));
        }
        let kbps = row.kbps();
        if !kbps.is_finite() {
            return Err(AppError::data_corruption(format!(
                "throughput report, row {}: {} bytes in {} ns is not a usable rate",
                index + 1,
                row.bytes,
                row.nanotime
            )));
        }
    }
    Ok(rows)
}

/// Parse a message-rate report
pub fn parse_messages(raw: &[u8]) -> Result<Vec<MessageRow>> {
    let rows: Vec<MessageRow> = parse_rows(raw, "messages")?;
    for (index, row) in rows.iter().enumerate() {
        if row.finished < row.started || row.received < row.started {
            return Err(AppError::data_corruption(format!(
                "messages report, row {}: timestamps out of order ({} / {} / {})",
                index + 1,
                row.started,
                row.received,
                row.finished
            )));
        }
    }
    Ok(rows)
}

/// Parse a token-ring report
pub fn parse_token(raw: &[u8]) -> Result<Vec<TokenRow>> {
    let rows: Vec<TokenRow> = parse_rows(raw, "token")?;
    for (index, row) in rows.iter().enumerate() {
        if row.finished < row.started {
            return Err(AppError::data_corruption(format!(
                "token report, row {}: finished {} before started {}",
                index + 1,
                row.finished,
                row.started
            )));
        }
    }
    Ok(rows)
}
