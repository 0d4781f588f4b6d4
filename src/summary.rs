//! # Text and Widget Presenters
//!
//! Render a [`ReportModel`] for people and dashboards. Every output here is
//! derived from the same report model; none of them aggregate or classify
//! on their own.
//!
//! - [`render_suite_summary`]: boxed suite summary
//! - [`render_scenario_table`]: per-feature scenario table with step counts
//! - [`render_step_table`]: step-wise details for every scenario
//! - [`WidgetData`]: compact JSON document for a dashboard widget

use crate::classify::Verdict;
use crate::error::{PerfError, Result};
use crate::export::AverageValues;
use crate::record::TimingField;
use crate::report::{ClassifiedStats, ReportModel, SuiteReport};
use crate::utils::{
    create_progress_indicator, format_ms, format_percent, format_table_row,
    format_table_separator, pad_display, truncate,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

const BOX_WIDTH: usize = 66;
const NAME_WIDTH: usize = 28;
const STEP_WIDTH: usize = 20;

/// Message shown in place of a summary when nothing was collected
pub const NO_DATA_MESSAGE: &str = "No performance metrics collected";

fn box_line(out: &mut String, text: &str) {
    let _ = writeln!(out, "║ {} ║", pad_display(text, BOX_WIDTH - 2));
}

fn box_rule(out: &mut String, left: char, right: char) {
    let _ = writeln!(out, "{}{}{}", left, "═".repeat(BOX_WIDTH), right);
}

/// Render the suite summary box
pub fn render_suite_summary(report: &ReportModel) -> String {
    let suite = match report {
        ReportModel::NoData => return format!("{}\n", NO_DATA_MESSAGE),
        ReportModel::Collected(suite) => suite,
    };
    let stats = &suite.stats;

    let mut out = String::new();
    box_rule(&mut out, '╔', '╗');
    box_line(&mut out, "TEST SUITE PERFORMANCE SUMMARY");
    box_rule(&mut out, '╠', '╣');
    box_line(&mut out, &format!("Total Features:    {}", suite.total_features));
    box_line(&mut out, &format!("Total Scenarios:   {}", suite.total_scenarios));
    box_line(&mut out, &format!("Total Steps:       {}", stats.total_steps));
    box_line(&mut out, &format!("Cached Steps:      {}", stats.cached_steps));
    box_rule(&mut out, '╠', '╣');
    box_line(&mut out, "SUITE-WIDE AVERAGE METRICS");
    box_rule(&mut out, '╠', '╣');
    for field in &stats.fields {
        box_line(
            &mut out,
            &format!(
                "{} {:<12} {:>10}  {:<8} (good <= {}, poor <= {})",
                field.verdict.symbol(),
                field.field.label(),
                format_ms(field.mean),
                field.verdict.label(),
                field.good_threshold,
                field.poor_threshold,
            ),
        );
    }
    box_rule(&mut out, '╠', '╣');
    box_line(
        &mut out,
        &format!(
            "Cache Hit Rate:    {} {}",
            format_percent(stats.cache_hit_rate),
            create_progress_indicator(stats.cached_steps, stats.total_steps, 20)
        ),
    );
    box_line(
        &mut out,
        &format!(
            "Overall:           {} ({}/{} metrics within good threshold)",
            stats.overall,
            stats.passed_fields,
            stats.fields.len()
        ),
    );
    box_rule(&mut out, '╚', '╝');
    out
}

fn metric_cell(stats: &ClassifiedStats, field: TimingField) -> String {
    match stats.field(field) {
        Some(summary) => format!("{} {:.0}", summary.verdict.symbol(), summary.mean),
        None => "-".to_string(),
    }
}

/// Render one table per feature listing its scenarios
pub fn render_scenario_table(report: &ReportModel) -> String {
    let suite = match report {
        ReportModel::NoData => return format!("{}\n", NO_DATA_MESSAGE),
        ReportModel::Collected(suite) => suite,
    };

    let mut widths = vec![NAME_WIDTH, 5];
    widths.extend(std::iter::repeat(10).take(TimingField::COUNT));
    widths.push(9);

    let mut header: Vec<&str> = vec!["Scenario", "Steps"];
    header.extend(TimingField::ALL.iter().map(|f| f.label()));
    header.push("Status");

    let mut out = String::new();
    for feature in &suite.features {
        let _ = writeln!(
            out,
            "{} ({} scenarios, {} steps)",
            feature.name,
            feature.scenarios.len(),
            feature.step_count
        );
        let _ = writeln!(out, "{}", format_table_separator(&widths));
        let _ = writeln!(out, "{}", format_table_row(&header, &widths));
        let _ = writeln!(out, "{}", format_table_separator(&widths));

        for scenario in &feature.scenarios {
            let mut cells = vec![
                truncate(&scenario.name, NAME_WIDTH),
                scenario.steps.len().to_string(),
            ];
            cells.extend(
                TimingField::ALL
                    .iter()
                    .map(|&field| metric_cell(&scenario.stats, field)),
            );
            cells.push(scenario.stats.overall.label().to_string());

            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            let _ = writeln!(out, "{}", format_table_row(&cells, &widths));
        }
        let _ = writeln!(out, "{}", format_table_separator(&widths));
        let _ = writeln!(out);
    }
    out
}

/// Render the step-wise details of every scenario, grouped by feature
///
/// Each row shows the step's six timings with their verdict symbols and
/// whether the page came from cache.
pub fn render_step_table(report: &ReportModel) -> String {
    let suite = match report {
        ReportModel::NoData => return format!("{}\n", NO_DATA_MESSAGE),
        ReportModel::Collected(suite) => suite,
    };

    let mut widths = vec![3, STEP_WIDTH];
    widths.extend(std::iter::repeat(10).take(TimingField::COUNT));
    widths.push(6);

    let mut header: Vec<&str> = vec!["#", "Step"];
    header.extend(TimingField::ALL.iter().map(|f| f.label()));
    header.push("Cached");

    let mut out = String::new();
    for scenario in suite.scenarios() {
        let _ = writeln!(
            out,
            "{} / {} ({}, {} steps)",
            scenario.feature,
            scenario.name,
            scenario.stats.overall.label(),
            scenario.steps.len()
        );
        let _ = writeln!(out, "{}", format_table_separator(&widths));
        let _ = writeln!(out, "{}", format_table_row(&header, &widths));
        let _ = writeln!(out, "{}", format_table_separator(&widths));

        for step in &scenario.steps {
            let mut cells = vec![step.index.to_string(), truncate(&step.label, STEP_WIDTH)];
            cells.extend(
                step.values
                    .iter()
                    .map(|v| format!("{} {}", v.verdict.symbol(), v.value)),
            );
            cells.push(if step.from_cache { "yes" } else { "no" }.to_string());

            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            let _ = writeln!(out, "{}", format_table_row(&cells, &widths));
        }
        let _ = writeln!(out, "{}", format_table_separator(&widths));
        let _ = writeln!(out);
    }
    out
}

impl From<&ClassifiedStats> for AverageValues {
    fn from(stats: &ClassifiedStats) -> Self {
        let mean = |field| stats.mean(field).unwrap_or_default();
        Self {
            avg_page_load_time: mean(TimingField::PageLoad),
            avg_dom_ready_time: mean(TimingField::DomReady),
            avg_response_time: mean(TimingField::Response),
            avg_ttfb: mean(TimingField::TimeToFirstByte),
            avg_connect_time: mean(TimingField::Connect),
            avg_domain_lookup_time: mean(TimingField::DnsLookup),
            total_steps: stats.total_steps,
            cached_steps: stats.cached_steps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetStats {
    pub total_steps: usize,
    pub total_scenarios: usize,
}

/// Data document consumed by the dashboard performance widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
    pub name: String,
    pub averages: AverageValues,
    pub stats: WidgetStats,
    pub cache_hit_rate: f64,
    pub overall: Verdict,
}

impl WidgetData {
    pub fn from_suite(suite: &SuiteReport) -> Self {
        Self {
            name: crate::defaults::WIDGET_NAME.to_string(),
            averages: AverageValues::from(&suite.stats),
            stats: WidgetStats {
                total_steps: suite.stats.total_steps,
                total_scenarios: suite.total_scenarios,
            },
            cache_hit_rate: suite.stats.cache_hit_rate,
            overall: suite.stats.overall,
        }
    }

    /// Widget data for a report, `None` when nothing was collected
    pub fn from_report(report: &ReportModel) -> Option<Self> {
        report.suite().map(Self::from_suite)
    }

    /// Write `performance-widget.json` into `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|source| PerfError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(crate::defaults::WIDGET_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| PerfError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Widget data generated: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifierPolicy;
    use crate::record::{MetricRecord, StepTimings};
    use crate::report::build_report;
    use crate::store::MetricStore;

    fn report() -> ReportModel {
        let store = MetricStore::new();
        store.record(MetricRecord::new(
            "Step #1",
            "Login",
            "auth",
            StepTimings::page_load_only(1000),
            true,
        ));
        store.record(MetricRecord::new(
            "Step #2",
            "Login",
            "auth",
            StepTimings::page_load_only(3500),
            false,
        ));
        store.record(MetricRecord::new(
            "Step #1",
            "Search",
            "catalog",
            StepTimings::page_load_only(1200),
            false,
        ));
        build_report(&store, &ClassifierPolicy::default())
    }

    #[test]
    fn test_no_data_is_distinct_from_zero() {
        let text = render_suite_summary(&ReportModel::NoData);
        assert!(text.contains(NO_DATA_MESSAGE));
        assert!(!text.contains("0 ms"));

        assert!(render_scenario_table(&ReportModel::NoData).contains(NO_DATA_MESSAGE));
        assert!(render_step_table(&ReportModel::NoData).contains(NO_DATA_MESSAGE));
        assert!(WidgetData::from_report(&ReportModel::NoData).is_none());
    }

    #[test]
    fn test_suite_summary_contents() {
        let text = render_suite_summary(&report());

        assert!(text.contains("Total Scenarios:   2"));
        assert!(text.contains("Total Steps:       3"));
        assert!(text.contains("Cached Steps:      1"));
        assert!(text.contains("1900 ms"));
        assert!(text.contains("33.3%"));
        assert!(text.contains("Overall:           PASSED (6/6"));
    }

    #[test]
    fn test_scenario_table_lists_features() {
        let text = render_scenario_table(&report());

        assert!(text.contains("auth (1 scenarios, 2 steps)"));
        assert!(text.contains("catalog (1 scenarios, 1 steps)"));
        assert!(text.contains("| Login"));
        assert!(text.contains("⚡ 2250"));
    }

    #[test]
    fn test_step_table_lists_each_step() {
        let text = render_step_table(&report());

        assert!(text.contains("auth / Login (PASSED, 2 steps)"));
        assert!(text.contains("catalog / Search (PASSED, 1 steps)"));
        assert!(text.contains("| 1   | Step #1"));
        assert!(text.contains("| 2   | Step #2"));
        assert!(text.contains("❌ 3500"));
        assert!(text.contains("✅ 1000"));
        assert!(text.contains("| yes    |"));
    }

    #[test]
    fn test_table_rows_share_display_width() {
        use unicode_width::UnicodeWidthStr;

        for text in [render_scenario_table(&report()), render_step_table(&report())] {
            let widths: Vec<usize> = text
                .lines()
                .filter(|line| line.starts_with('|') || line.starts_with('+'))
                .map(UnicodeWidthStr::width)
                .collect();
            assert!(widths.windows(2).all(|w| w[0] == w[1]), "{}", text);
        }
    }

    #[test]
    fn test_widget_data() {
        let widget = WidgetData::from_report(&report()).unwrap();

        assert_eq!(widget.name, "performance");
        assert_eq!(widget.stats.total_steps, 3);
        assert_eq!(widget.stats.total_scenarios, 2);
        assert_eq!(widget.averages.avg_page_load_time, 1900.0);
        assert_eq!(widget.overall, Verdict::Pass);

        let dir = tempfile::tempdir().unwrap();
        widget.write_to_dir(dir.path()).unwrap();
        let written = std::fs::read_to_string(dir.path().join("performance-widget.json")).unwrap();
        assert!(written.contains("\"cacheHitRate\""));
    }
}
