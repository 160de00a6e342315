//! Device Benchmark - Main CLI Application
//!
//! Measures throughput, message rate or token-ring round trips across a set of
//! devices and plots the results as a grouped bar chart.

use clap::Parser;
use devbench::{
    app::App,
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return;
    }

    // The device-source check also looks at variables coming from .env
    if let Err(e) = EnvManager::load_env_file(cli.debug) {
        ErrorReporter::new(cli.use_colors(), cli.verbose).report_error(&e);
        process::exit(e.exit_code());
    }

    if let Err(message) = cli.validate() {
        let error = AppError::config(message);
        ErrorReporter::new(cli.use_colors(), cli.verbose).report_error(&error);
        process::exit(error.exit_code());
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);
    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        println!(
            "{} v{} ({}, built {} for {})",
            PKG_NAME,
            VERSION,
            env!("GIT_COMMIT"),
            env!("BUILD_TIME"),
            env!("TARGET_TRIPLE")
        );
        println!("Debug mode enabled");
        println!();
    }

    let config = load_config(cli)?;

    if config.debug {
        println!("Configuration Summary:");
        println!("{}", display_config_summary(&config));
        println!();
    }

    let warnings = validate_config(&config)?;
    if !warnings.is_empty() && (config.verbose || config.debug) {
        println!("Configuration Warnings:");
        for warning in &warnings {
            println!("  {}", warning.format(config.enable_color));
        }
        println!();
    }

    let outcome = App::new(config).run().await?;

    if let Some(report) = &outcome.report {
        if report.succeeded == 0 {
            return Err(AppError::validation(format!(
                "Every {} measurement failed",
                report.kind
            )));
        }
    }

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (devbench --help-topic env)");
            eprintln!("  - Pass device addresses, --devices-file or --from-results");
        }
        AppError::Discovery(_) => {
            eprintln!();
            eprintln!("Discovery troubleshooting:");
            eprintln!("  - Check that the benchmark service runs on every device");
            eprintln!("  - Verify --net-prefix and --port");
            eprintln!("  - Use --devices-file to skip discovery");
        }
        AppError::RetriesExhausted { .. } => {
            eprintln!();
            eprintln!("Retry help:");
            eprintln!("  - Raise --max-attempts, or pass 0 to retry until success");
            eprintln!("  - Add --skip-failed to leave unreachable pairs out of the chart");
        }
        AppError::Schema(_) => {
            eprintln!();
            eprintln!("Result tree help:");
            eprintln!("  - Every branch must hold either values or nested groups, not both");
            eprintln!("  - All leaves must sit at the same depth");
        }
        _ => {}
    }
}
