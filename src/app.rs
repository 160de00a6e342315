//! Main application orchestration and execution

use crate::{
    acquisition::{discover, AcquisitionEngine, RunReport},
    client::{DeviceClient, HttpDeviceClient},
    error::{AppError, Result},
    grouping::ChartLayout,
    logging::{Logger, LoggerFactory},
    models::{BenchKind, Config, DeviceRegistry, ResultTree},
    output::{write_chart, ChartOptions, OutputCoordinator, OutputFormatterFactory},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a completed run produced
#[derive(Debug)]
pub struct AppOutcome {
    pub tree: ResultTree,
    /// `None` when a saved result tree was replayed
    pub report: Option<RunReport>,
    pub layout: ChartLayout,
    pub chart_path: PathBuf,
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    loggers: LoggerFactory,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            loggers: LoggerFactory::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Acquire (or replay) the result tree, print it and write the chart
    pub async fn run(&self) -> Result<AppOutcome> {
        let logger = self.loggers.create_logger("app").await;

        let (tree, report) = match &self.config.from_results {
            Some(path) => {
                crate::log_info!(logger, "Replaying results from {}", path.display());
                (ResultTree::from_json_file(path)?, None)
            }
            None => {
                let report = self.acquire(&logger).await?;
                (report.tree.clone(), Some(report))
            }
        };

        if let Some(path) = &self.config.results_json {
            ensure_parent_dir(path)?;
            tree.write_json_file(path)?;
            crate::log_info!(logger, "Wrote result tree to {}", path.display());
        }

        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_formatter(self.config.enable_color));
        let unit = self.unit_label();
        println!("{}", coordinator.display_results(self.title(), &tree, unit, report.as_ref())?);

        if tree.is_empty() {
            return Err(AppError::validation(
                "No measurements succeeded; there is nothing to plot",
            ));
        }

        let options = ChartOptions::new(self.title(), unit);
        let layout = write_chart(&tree, &options, &self.config.output_path)?;
        println!(
            "{}",
            coordinator
                .formatter()
                .format_success(&format!("Chart written to {}", self.config.output_path.display()))?
        );

        Ok(AppOutcome {
            tree,
            report,
            layout,
            chart_path: self.config.output_path.clone(),
        })
    }

    /// Build the registry and run the configured benchmark over HTTP
    async fn acquire(&self, logger: &Logger) -> Result<RunReport> {
        let client = Arc::new(HttpDeviceClient::with_settings(
            self.config.port,
            self.config.timeout(),
            self.loggers.create_network_logger().await,
        )?);

        let registry = self.load_registry(client.as_ref()).await?;
        crate::log_info!(
            logger,
            "Running {} benchmark over {} device(s)",
            self.config.kind,
            registry.len()
        );
        if self.config.verbose {
            for device in registry.iter() {
                println!("  {} {} ({})", device.name, device.ip, device.mac);
            }
        }

        let engine = AcquisitionEngine::new(&self.config, client, self.loggers.create_acquisition_logger().await);
        engine.run(&registry).await
    }

    /// Devices from the devices file, or discovered over HTTP
    pub async fn load_registry(&self, client: &dyn DeviceClient) -> Result<DeviceRegistry> {
        match &self.config.devices_file {
            Some(path) => DeviceRegistry::from_json_file(path),
            None => {
                let network = self.loggers.create_network_logger().await;
                discover(client, &self.config.device_addresses(), &network).await
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self.config.kind {
            BenchKind::Throughput => "Throughput",
            BenchKind::Messages => "Message rate",
            BenchKind::Token => "Token ring round trip",
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self.config.kind {
            BenchKind::Messages => self.config.message_metric.unit_label(),
            kind => kind.unit_label(),
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create directory {}: {}", parent.display(), e))),
        None => Ok(()),
    }
}
