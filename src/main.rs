//! # Stepwise Perf - Main Entry Point
//!
//! Re-renders a persisted metrics export: loads `performance-metrics.json`,
//! replays the records into a fresh store, rebuilds the report with the
//! configured thresholds and prints the suite summary.
//!
//! ## Flow
//!
//! 1. **Parse arguments**: clap derive `Args` converted into `ReportConfig`
//! 2. **Initialize logging**: coloured console output, optional log file
//! 3. **Load the export** and replay it into a `MetricStore`
//! 4. **Build the report** with the configured `ClassifierPolicy`
//! 5. **Present**: summary box, optional scenario and step tables, optional
//!    widget JSON
//!
//! ## Exit Status
//!
//! Errors exit non-zero through `anyhow`. With `--fail-on-verdict`, a suite
//! verdict of FAILED also exits non-zero so CI jobs can gate on it.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use stepwise_perf::{
    build_report,
    cli::{Args, ReportConfig},
    export::MetricsExport,
    logging::{console_filter, ColorizedFormatter},
    render_scenario_table, render_step_table, render_suite_summary, Verdict, WidgetData,
};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The guard flushes the log file on drop and must outlive every log call.
    let _guard = init_logging(&args)?;

    info!("Starting Stepwise Perf v{}", stepwise_perf::VERSION);
    debug!("Configuration: {:?}", args);

    let config = ReportConfig::from(&args);
    let policy = config
        .policy()
        .context("Failed to load threshold configuration")?;

    let content = tokio::fs::read_to_string(&config.input)
        .await
        .with_context(|| format!("Failed to read metrics export {:?}", config.input))?;
    let export = MetricsExport::from_json_str(&content)
        .with_context(|| format!("Failed to parse metrics export {:?}", config.input))?;
    info!(
        "Loaded {} records from {:?}",
        export.total_metrics, config.input
    );

    let store = export.into_store();
    let report = build_report(&store, &policy);

    println!("{}", render_suite_summary(&report));
    if config.show_scenarios {
        println!("{}", render_scenario_table(&report));
    }
    if config.show_steps {
        println!("{}", render_step_table(&report));
    }

    let Some(verdict) = report.overall() else {
        warn!("No performance metrics collected");
        return Ok(());
    };

    let verdict_line = format!("Suite verdict: {} {}", verdict.symbol(), verdict);
    match verdict {
        Verdict::Pass => println!("{}", verdict_line.green().bold()),
        Verdict::Warn => println!("{}", verdict_line.yellow().bold()),
        Verdict::Fail => println!("{}", verdict_line.red().bold()),
    }

    if let (Some(dir), Some(widget)) = (&config.widget_dir, WidgetData::from_report(&report)) {
        widget
            .write_to_dir(dir)
            .with_context(|| format!("Failed to write widget data to {:?}", dir))?;
    }

    if config.fail_on_verdict && verdict == Verdict::Fail {
        bail!("Suite performance verdict is {}", verdict);
    }

    Ok(())
}

/// Console logging goes to stderr so the summary on stdout stays clean.
fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    let console = tracing_subscriber::fmt::layer()
        .event_format(ColorizedFormatter)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_filter(args.verbose))
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
