//! Acquisition engine: turns device reports into a result tree
//!
//! Pairs are measured strictly one after another. Every measurement goes
//! through the same steps: reuse a cached report when asked to, otherwise
//! request it from the device, validate the rows, persist the raw bytes and
//! reduce the rows to statistics. An empty or failed report is the "try
//! again" signal for the [`RetryPolicy`].

pub mod discovery;
pub mod retry;
pub mod token;

pub use discovery::discover;
pub use retry::{Acquired, RetryPolicy};
pub use token::TokenTiming;

use crate::{
    cache::{CacheKey, ReportCache},
    client::{DeviceClient, ReportRequest},
    error::{AppError, Result},
    logging::AcquisitionLogger,
    models::{samples, BenchKind, Config, Device, DeviceRegistry, ResultTree},
    stats::{self, MessageStepStats, Summary},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result tree of a benchmark run plus its success counters
#[derive(Debug, Clone)]
pub struct RunReport {
    pub kind: BenchKind,
    pub tree: ResultTree,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Drives measurements against the devices of a registry
pub struct AcquisitionEngine {
    client: Arc<dyn DeviceClient>,
    cache: ReportCache,
    config: Config,
    retry: RetryPolicy,
    token_timing: TokenTiming,
    logger: AcquisitionLogger,
}

impl AcquisitionEngine {
    /// Create an engine using the settings of `config`
    pub fn new(config: &Config, client: Arc<dyn DeviceClient>, logger: AcquisitionLogger) -> Self {
        Self {
            client,
            cache: ReportCache::new(config.cache_dir.clone()),
            config: config.clone(),
            retry: RetryPolicy::from_config(config),
            token_timing: TokenTiming::from_config(config),
            logger,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_token_timing(mut self, timing: TokenTiming) -> Self {
        self.token_timing = timing;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    /// Run the benchmark selected in the configuration
    pub async fn run(&self, registry: &DeviceRegistry) -> Result<RunReport> {
        match self.config.kind {
            BenchKind::Throughput => self.run_throughput(registry).await,
            BenchKind::Messages => self.run_message_rate(registry).await,
            BenchKind::Token => self.run_token(registry).await,
        }
    }

    /// Measure the throughput of `receiver` pulling from `sender` once.
    ///
    /// Returns `None` when the device could not be reached, answered with an
    /// error status or sent a report without rows.
    pub async fn fetch_pair_result(&self, receiver: &Device, sender: &Device, use_cache: bool) -> Result<Option<Summary>> {
        let key = CacheKey::throughput(receiver, sender, self.config.iterations);
        let request = ReportRequest::throughput(receiver, sender, self.config.iterations);

        let rows = self
            .fetch_rows(&key, &request, use_cache, self.config.warmup, samples::parse_throughput)
            .await?;
        Ok(rows.and_then(|rows| stats::summarize_throughput(&rows)))
    }

    /// Run one message-rate step of `master` against `targets`
    pub async fn fetch_message_rate_step(
        &self,
        master: &Device,
        targets: &[Device],
        message_count: u32,
        use_cache: bool,
    ) -> Result<Option<MessageStepStats>> {
        let size = self.config.message_size;
        let key = CacheKey::messages(master, targets, message_count, size);
        let request = ReportRequest::messages(master, targets, message_count, size);

        let rows = self
            .fetch_rows(&key, &request, use_cache, false, samples::parse_messages)
            .await?;
        Ok(rows.and_then(|rows| stats::message_step_stats(&rows, message_count, targets.len())))
    }

    /// Shared cache-or-network step. `Ok(None)` means no usable rows.
    async fn fetch_rows<R>(
        &self,
        key: &CacheKey,
        request: &ReportRequest,
        use_cache: bool,
        warmup: bool,
        parse: fn(&[u8]) -> Result<Vec<R>>,
    ) -> Result<Option<Vec<R>>> {
        if use_cache {
            if let Some(rows) = self.load_cached(key, parse).await? {
                return Ok(Some(rows));
            }
        }

        if warmup {
            // Outcome ignored, the request only wakes up the link
            let _ = self.client.fetch(request).await;
        }

        let response = match self.client.fetch(request).await {
            Ok(response) => response,
            Err(error) if error.is_recoverable() => return Ok(None),
            Err(error) => return Err(error),
        };

        if !response.is_success() || response.is_pending() || response.body.is_empty() {
            return Ok(None);
        }

        let rows = parse(&response.body)?;
        if rows.is_empty() {
            return Ok(None);
        }

        self.store_report(key, &response.body).await?;
        Ok(Some(rows))
    }

    /// Cached rows for `key`, `None` when missing or empty
    pub(crate) async fn load_cached<R>(&self, key: &CacheKey, parse: fn(&[u8]) -> Result<Vec<R>>) -> Result<Option<Vec<R>>> {
        let path = self.cache.path_for(key);
        let raw = match self.cache.load(key)? {
            Some(raw) => raw,
            None => {
                self.logger.log_cache_miss(&path, "not cached").await;
                return Ok(None);
            }
        };

        let rows = parse(&raw)?;
        if rows.is_empty() {
            self.logger.log_cache_miss(&path, "cached report has no rows").await;
            return Ok(None);
        }

        self.logger.log_cache_hit(&path, rows.len()).await;
        Ok(Some(rows))
    }

    pub(crate) async fn store_report(&self, key: &CacheKey, raw: &[u8]) -> Result<()> {
        let path = self.cache.store(key, raw)?;
        self.logger.log_cache_store(&path, raw.len()).await;
        Ok(())
    }

    /// Measure a pair until it yields a valid summary or the policy gives up
    pub async fn acquire_pair(&self, receiver: &Device, sender: &Device) -> Result<Acquired<Summary>> {
        let operation = format!("{} <- {}", receiver.name, sender.name);
        let use_cache = self.config.use_cache;
        self.retry
            .run(&operation, &self.logger, |_| self.fetch_pair_result(receiver, sender, use_cache))
            .await
    }

    /// Run a message-rate step until it yields statistics or the policy gives up
    pub async fn acquire_message_step(&self, master: &Device, targets: &[Device]) -> Result<Acquired<MessageStepStats>> {
        let operation = format!("{} -> {} target(s)", master.name, targets.len());
        let use_cache = self.config.use_cache;
        let count = self.config.message_count;
        self.retry
            .run(&operation, &self.logger, |_| {
                self.fetch_message_rate_step(master, targets, count, use_cache)
            })
            .await
    }

    /// Throughput of every ordered pair: `receiver -> sender [-> stat]`
    pub async fn run_throughput(&self, registry: &DeviceRegistry) -> Result<RunReport> {
        require_devices(registry, 2, BenchKind::Throughput)?;

        let started = Instant::now();
        let mut tree = ResultTree::new();
        let (mut succeeded, mut failed) = (0, 0);
        let selected = &self.config.stats;

        for receiver in registry {
            for sender in registry {
                if receiver == sender {
                    continue;
                }

                let operation = format!("{} <- {}", receiver.name, sender.name);
                let correlation_id = self.logger.logger().start_operation(&operation).await;
                let pair_started = Instant::now();
                let outcome = self.acquire_pair(receiver, sender).await;
                self.logger
                    .logger()
                    .end_operation(&correlation_id, &operation, outcome.is_ok())
                    .await;

                match outcome {
                    Ok(acquired) => {
                        let summary = acquired.value;
                        if let [only] = selected.as_slice() {
                            tree.insert_path(&[receiver.name.as_str(), sender.name.as_str()], summary.get(*only))?;
                        } else {
                            for stat in selected {
                                tree.insert_path(
                                    &[receiver.name.as_str(), sender.name.as_str(), stat.as_str()],
                                    summary.get(*stat),
                                )?;
                            }
                        }
                        self.logger
                            .log_pair_complete(&operation, summary.mean, acquired.attempts, pair_started.elapsed())
                            .await;
                        succeeded += 1;
                    }
                    Err(error) => {
                        self.handle_failure(&operation, error).await?;
                        failed += 1;
                    }
                }
            }
        }

        self.finish(BenchKind::Throughput, tree, succeeded, failed, started).await
    }

    /// Message rate of every master against a growing prefix of the other devices
    pub async fn run_message_rate(&self, registry: &DeviceRegistry) -> Result<RunReport> {
        require_devices(registry, 2, BenchKind::Messages)?;

        let started = Instant::now();
        let mut tree = ResultTree::new();
        let (mut succeeded, mut failed) = (0, 0);
        let metric = self.config.message_metric;

        for master in registry {
            let others: Vec<Device> = registry.iter().filter(|d| *d != master).cloned().collect();

            for step in 1..=others.len() {
                let targets = &others[..step];
                let operation = format!("{} -> {} target(s)", master.name, step);
                let step_started = Instant::now();

                match self.acquire_message_step(master, targets).await {
                    Ok(acquired) => {
                        let value = acquired.value.get(metric);
                        tree.insert_path(&[master.name.clone(), format!("{} targets", step)], value)?;
                        self.logger
                            .log_pair_complete(&operation, value, acquired.attempts, step_started.elapsed())
                            .await;
                        succeeded += 1;
                    }
                    Err(error) => {
                        self.handle_failure(&operation, error).await?;
                        failed += 1;
                    }
                }
            }
        }

        self.finish(BenchKind::Messages, tree, succeeded, failed, started).await
    }

    /// Skip the failed measurement when configured to, otherwise abort
    async fn handle_failure(&self, operation: &str, error: AppError) -> Result<()> {
        if self.config.skip_failed {
            self.logger.log_pair_skipped(operation, &error).await;
            Ok(())
        } else {
            Err(error)
        }
    }

    async fn finish(
        &self,
        kind: BenchKind,
        tree: ResultTree,
        succeeded: usize,
        failed: usize,
        started: Instant,
    ) -> Result<RunReport> {
        let elapsed = started.elapsed();
        self.logger
            .log_run_summary(kind.as_str(), succeeded, failed, elapsed)
            .await;

        Ok(RunReport {
            kind,
            tree,
            succeeded,
            failed,
            elapsed,
        })
    }
}

fn require_devices(registry: &DeviceRegistry, minimum: usize, kind: BenchKind) -> Result<()> {
    if registry.len() < minimum {
        return Err(AppError::validation(format!(
            "The {} benchmark needs at least {} devices, got {}",
            kind,
            minimum,
            registry.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::client::ReportResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Client answering from a queue of canned responses and recording requests
    #[derive(Default)]
    pub struct ScriptedClient {
        responses: Mutex<VecDeque<Result<ReportResponse>>>,
        requests: Mutex<Vec<ReportRequest>>,
    }

    impl ScriptedClient {
        pub fn new<I>(responses: I) -> Self
        where
            I: IntoIterator<Item = Result<ReportResponse>>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(body: &str) -> Result<ReportResponse> {
            Ok(ReportResponse {
                status: 200,
                body: body.as_bytes().to_vec(),
            })
        }

        pub fn status(status: u16) -> Result<ReportResponse> {
            Ok(ReportResponse { status, body: Vec::new() })
        }

        pub fn requests(&self) -> Vec<ReportRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeviceClient for ScriptedClient {
        async fn identify(&self, address: &str) -> Result<Device> {
            Err(AppError::discovery(format!("no identity scripted for {}", address)))
        }

        async fn fetch(&self, request: &ReportRequest) -> Result<ReportResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::network("script exhausted")))
        }
    }

    pub fn quiet_config(cache_dir: &std::path::Path) -> Config {
        Config {
            devices: vec!["1".to_string()],
            cache_dir: cache_dir.to_path_buf(),
            enable_color: false,
            warmup: false,
            ..Config::default()
        }
    }

    pub fn engine(config: &Config, client: Arc<ScriptedClient>) -> AcquisitionEngine {
        AcquisitionEngine::new(config, client, AcquisitionLogger::new(config))
            .with_retry_policy(RetryPolicy::fixed(0, Duration::from_millis(1)))
    }

    pub fn registry(count: usize) -> DeviceRegistry {
        let devices = [
            ("n4", "40:B0:FA:5F:26:8A"),
            ("n5", "BC:F5:AC:5C:50:87"),
            ("mi", "74:51:BA:46:90:A2"),
            ("n7", "50:46:5D:CC:65:4E"),
        ];
        DeviceRegistry::new(
            devices
                .iter()
                .take(count)
                .enumerate()
                .map(|(i, (name, mac))| Device::new(*name, format!("10.0.0.{}", i + 1), mac).unwrap())
                .collect(),
        )
        .unwrap()
    }
}
