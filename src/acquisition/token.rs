//! Token-ring round-trip benchmark
//!
//! The master of a ring is asked to pass a token of a given payload length
//! around the other devices. Launching returns a run id; the report is polled
//! until it holds one row per device and round or the deadline passes.

use super::{require_devices, AcquisitionEngine, RunReport};
use crate::{
    cache::CacheKey,
    client::ReportRequest,
    error::{AppError, Result},
    models::{samples, BenchKind, Config, Device, DeviceRegistry, ResultTree},
    stats::{self, Summary},
};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Polling cadence and deadlines of token runs
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTiming {
    pub poll_interval: Duration,
    /// Pause after every run that went to the network
    pub cooldown: Duration,
    /// Deadline budget per device and round
    pub per_device_round: Duration,
}

impl TokenTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.token_poll_interval(),
            cooldown: config.token_cooldown(),
            per_device_round: Duration::from_secs(crate::defaults::TOKEN_SECONDS_PER_DEVICE_ROUND),
        }
    }

    /// Time a run of `devices` devices and `rounds` rounds may take
    pub fn deadline(&self, devices: usize, rounds: u32) -> Duration {
        let hops = (devices as u64).saturating_mul(u64::from(rounds));
        self.per_device_round
            .saturating_mul(u32::try_from(hops).unwrap_or(u32::MAX))
    }
}

/// `"a>b>c"` from the device names of a ring
pub fn ring_label(ring: &[Device]) -> String {
    ring.iter()
        .map(|d| d.name.as_str())
        .collect::<Vec<_>>()
        .join(">")
}

impl AcquisitionEngine {
    /// One token run around `ring`; `None` if the report did not fill up in time
    pub async fn fetch_token_run(
        &self,
        ring: &[Device],
        payload_length: u32,
        rounds: u32,
        use_cache: bool,
    ) -> Result<Option<Summary>> {
        let Some((master, others)) = ring.split_first() else {
            return Ok(None);
        };
        let key = CacheKey::token(ring, payload_length, rounds);
        let expected_rows = ring.len() * rounds as usize;

        if use_cache {
            if let Some(rows) = self.load_cached(&key, samples::parse_token).await? {
                if rows.len() >= expected_rows {
                    return Ok(stats::summarize_token(&rows));
                }
                self.logger
                    .log_cache_miss(&self.cache.path_for(&key), "cached token report is incomplete")
                    .await;
            }
        }

        let label = ring_label(ring);
        let launch = ReportRequest::token_launch(master, others, payload_length, rounds);
        let launch = &launch;
        let client = &self.client;
        let run_id = self
            .retry
            .run(&format!("launch token run {}", label), &self.logger, move |_| async move {
                let response = client.fetch(launch).await?;
                if !response.is_success() || response.is_pending() {
                    return Ok(None);
                }
                let run_id = response.text().trim().to_string();
                Ok::<_, AppError>((!run_id.is_empty()).then_some(run_id))
            })
            .await?
            .value;

        let results = ReportRequest::token_results(master, &run_id);
        let deadline = Instant::now() + self.token_timing.deadline(ring.len(), rounds);

        let outcome = loop {
            let now = Instant::now();
            if now >= deadline {
                self.logger
                    .logger()
                    .warn("Token run did not complete before its deadline")
                    .field("ring", &label)
                    .field("run_id", &run_id)
                    .field("expected_rows", expected_rows)
                    .log()
                    .await;
                break None;
            }
            sleep(self.token_timing.poll_interval.min(deadline - now)).await;

            let response = match self.client.fetch(&results).await {
                Ok(response) => response,
                Err(error) if error.is_recoverable() => continue,
                Err(error) => return Err(error),
            };
            if response.is_pending() || !response.is_success() {
                continue;
            }

            let rows = samples::parse_token(&response.body)?;
            if rows.len() >= expected_rows {
                self.store_report(&key, &response.body).await?;
                break stats::summarize_token(&rows);
            }

            self.logger
                .logger()
                .debug("Token report incomplete")
                .field("ring", &label)
                .field("rows", rows.len())
                .field("expected_rows", expected_rows)
                .log()
                .await;
        };

        sleep(self.token_timing.cooldown).await;
        Ok(outcome)
    }

    /// Every payload length around every ring: `"{payload} B" -> ring -> mean`
    pub async fn run_token(&self, registry: &DeviceRegistry) -> Result<RunReport> {
        // The device side needs at least two devices besides the master
        require_devices(registry, 3, BenchKind::Token)?;

        let started = Instant::now();
        let mut tree = ResultTree::new();
        let (mut succeeded, mut failed) = (0, 0);
        let rings = registry.permutations();
        let rounds = self.config.token_rounds;

        for &payload_length in &self.config.token_payload_lengths {
            for ring in &rings {
                let label = ring_label(ring);
                let operation = format!("token {} B around {}", payload_length, label);
                let run_started = Instant::now();

                match self
                    .fetch_token_run(ring, payload_length, rounds, self.config.use_cache)
                    .await
                {
                    Ok(Some(summary)) => {
                        tree.insert_path(&[format!("{} B", payload_length), label], summary.mean)?;
                        self.logger
                            .log_pair_complete(&operation, summary.mean, 1, run_started.elapsed())
                            .await;
                        succeeded += 1;
                    }
                    Ok(None) => failed += 1,
                    Err(error) => {
                        self.handle_failure(&operation, error).await?;
                        failed += 1;
                    }
                }
            }
        }

        self.finish(BenchKind::Token, tree, succeeded, failed, started).await
    }
}
