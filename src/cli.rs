use crate::classify::{ClassifierPolicy, FieldThresholds};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Stepwise Perf - Render and gate step-level page performance from a metrics export
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Metrics export to render
    #[clap(short = 'i', long, default_value = crate::defaults::EXPORT_FILE, help_heading = "Core Options")]
    pub input: PathBuf,

    /// JSON file overriding good/poor thresholds per metric
    #[clap(short = 't', long, help_heading = "Core Options")]
    pub thresholds: Option<PathBuf>,

    /// Passing metrics required for an overall PASSED verdict
    #[clap(long, default_value_t = crate::defaults::REQUIRED_PASSES, help_heading = "Core Options")]
    pub required_passes: usize,

    /// Directory to write performance-widget.json into
    #[clap(short = 'w', long)]
    pub widget_dir: Option<PathBuf>,

    /// Print the per-scenario table after the suite summary
    #[clap(short = 's', long, default_value_t = false)]
    pub scenarios: bool,

    /// Print step-wise details for every scenario
    #[clap(long, default_value_t = false)]
    pub steps: bool,

    /// Exit with a non-zero status when the suite verdict is FAILED
    #[clap(long, default_value_t = false)]
    pub fail_on_verdict: bool,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Also write logs to this file
    #[clap(long)]
    pub log_file: Option<PathBuf>,
}

/// Configuration for rendering a persisted run
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub thresholds_file: Option<PathBuf>,
    pub required_passes: usize,
    pub widget_dir: Option<PathBuf>,
    pub show_scenarios: bool,
    pub show_steps: bool,
    pub fail_on_verdict: bool,
}

impl ReportConfig {
    /// Build the classifier policy, loading threshold overrides if configured
    pub fn policy(&self) -> Result<ClassifierPolicy> {
        let thresholds = match &self.thresholds_file {
            Some(path) => FieldThresholds::from_json_file(path)?,
            None => FieldThresholds::default(),
        };
        Ok(ClassifierPolicy::new(thresholds, self.required_passes))
    }
}

impl From<&Args> for ReportConfig {
    fn from(args: &Args) -> Self {
        Self {
            input: args.input.clone(),
            thresholds_file: args.thresholds.clone(),
            required_passes: args.required_passes,
            widget_dir: args.widget_dir.clone(),
            show_scenarios: args.scenarios,
            show_steps: args.steps,
            fail_on_verdict: args.fail_on_verdict,
        }
    }
}
