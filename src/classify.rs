//! # Threshold Classification
//!
//! Maps a measured value to a [`Verdict`] using a good/poor threshold pair,
//! and reduces a set of per-field verdicts to a two-valued overall verdict
//! by majority.
//!
//! Boundary values belong to the better bucket: a value equal to the good
//! threshold passes, a value equal to the poor threshold warns. Pass/fail
//! gating in CI depends on this tie-break being exact.

use crate::error::{PerfError, Result};
use crate::record::TimingField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Classification of one measured value
///
/// Ordered best to worst, so `max()` over verdicts yields the worst one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    /// Status word used in rendered reports
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASSED",
            Verdict::Warn => "WARNING",
            Verdict::Fail => "FAILED",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Verdict::Pass => "✅",
            Verdict::Warn => "⚡",
            Verdict::Fail => "❌",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify `value` against a good/poor threshold pair
///
/// `good <= poor` is the caller's responsibility and is not checked.
pub fn classify(value: f64, good: f64, poor: f64) -> Verdict {
    if value <= good {
        Verdict::Pass
    } else if value <= poor {
        Verdict::Warn
    } else {
        Verdict::Fail
    }
}

/// Two-valued overall verdict using the default majority of
/// [`crate::defaults::REQUIRED_PASSES`]
pub fn overall_verdict(verdicts: &[Verdict]) -> Verdict {
    overall_verdict_with(verdicts, crate::defaults::REQUIRED_PASSES)
}

/// Two-valued overall verdict: `Pass` iff at least `required_passes`
/// entries are `Pass`
///
/// The count is absolute; it does not scale with `verdicts.len()`.
pub fn overall_verdict_with(verdicts: &[Verdict], required_passes: usize) -> Verdict {
    let passed = verdicts.iter().filter(|v| v.is_pass()).count();
    if passed >= required_passes {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// Good/poor threshold pair in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub good: f64,
    pub poor: f64,
}

impl Thresholds {
    pub const fn new(good: f64, poor: f64) -> Self {
        Self { good, poor }
    }

    pub fn classify(&self, value: f64) -> Verdict {
        classify(value, self.good, self.poor)
    }
}

/// Threshold pairs for every timing field
///
/// Deserializes from JSON with camelCase keys; missing fields keep their
/// defaults, so a file may override only the fields it cares about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldThresholds {
    pub page_load: Thresholds,
    pub dom_ready: Thresholds,
    pub response: Thresholds,
    pub time_to_first_byte: Thresholds,
    pub connect: Thresholds,
    pub dns_lookup: Thresholds,
}

impl FieldThresholds {
    pub fn get(&self, field: TimingField) -> Thresholds {
        match field {
            TimingField::PageLoad => self.page_load,
            TimingField::DomReady => self.dom_ready,
            TimingField::Response => self.response,
            TimingField::TimeToFirstByte => self.time_to_first_byte,
            TimingField::Connect => self.connect,
            TimingField::DnsLookup => self.dns_lookup,
        }
    }

    pub fn classify(&self, field: TimingField, value: f64) -> Verdict {
        self.get(field).classify(value)
    }

    /// Load threshold overrides from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PerfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for FieldThresholds {
    fn default() -> Self {
        use crate::defaults::thresholds::*;
        Self {
            page_load: PAGE_LOAD,
            dom_ready: DOM_READY,
            response: RESPONSE,
            time_to_first_byte: TTFB,
            connect: CONNECT,
            dns_lookup: DNS_LOOKUP,
        }
    }
}

/// Everything the report assembly needs to classify a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierPolicy {
    pub thresholds: FieldThresholds,
    pub required_passes: usize,
}

impl ClassifierPolicy {
    pub fn new(thresholds: FieldThresholds, required_passes: usize) -> Self {
        Self {
            thresholds,
            required_passes,
        }
    }

    pub fn classify(&self, field: TimingField, value: f64) -> Verdict {
        self.thresholds.classify(field, value)
    }

    pub fn overall(&self, verdicts: &[Verdict]) -> Verdict {
        overall_verdict_with(verdicts, self.required_passes)
    }
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self::new(
            FieldThresholds::default(),
            crate::defaults::REQUIRED_PASSES,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_boundaries_go_to_better_bucket() {
        assert_eq!(classify(2000.0, 2000.0, 3000.0), Verdict::Pass);
        assert_eq!(classify(2001.0, 2000.0, 3000.0), Verdict::Warn);
        assert_eq!(classify(3000.0, 2000.0, 3000.0), Verdict::Warn);
        assert_eq!(classify(3001.0, 2000.0, 3000.0), Verdict::Fail);
    }

    #[test]
    fn test_fractional_values_just_over_good_warn() {
        assert_eq!(classify(2000.5, 2000.0, 3000.0), Verdict::Warn);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let mut previous = Verdict::Pass;
        for value in (0..5000).step_by(7) {
            let verdict = classify(value as f64, 2000.0, 3000.0);
            assert!(verdict >= previous, "{} regressed at {}", verdict, value);
            previous = verdict;
        }
    }

    #[test]
    fn test_equal_thresholds_skip_warn() {
        assert_eq!(classify(100.0, 100.0, 100.0), Verdict::Pass);
        assert_eq!(classify(101.0, 100.0, 100.0), Verdict::Fail);
    }

    #[test]
    fn test_overall_majority() {
        use Verdict::*;
        assert_eq!(overall_verdict(&[Pass, Pass, Pass, Pass, Fail, Fail]), Pass);
        assert_eq!(overall_verdict(&[Pass, Pass, Pass, Fail, Fail, Fail]), Fail);
        assert_eq!(overall_verdict(&[Pass, Pass, Pass, Warn, Warn, Warn]), Fail);
    }

    #[test]
    fn test_overall_threshold_is_absolute() {
        use Verdict::*;
        assert_eq!(overall_verdict(&[Pass, Pass, Pass]), Fail);
        assert_eq!(overall_verdict(&[Pass; 8]), Pass);
        assert_eq!(overall_verdict(&[]), Fail);
        assert_eq!(overall_verdict_with(&[Pass, Fail], 1), Pass);
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = FieldThresholds::default();
        assert_eq!(thresholds.get(TimingField::PageLoad), Thresholds::new(2000.0, 3000.0));
        assert_eq!(thresholds.get(TimingField::DomReady), Thresholds::new(1500.0, 2500.0));
        assert_eq!(thresholds.get(TimingField::Response), Thresholds::new(800.0, 1200.0));
        assert_eq!(
            thresholds.get(TimingField::TimeToFirstByte),
            Thresholds::new(400.0, 600.0)
        );
        assert_eq!(thresholds.get(TimingField::Connect), Thresholds::new(200.0, 400.0));
        assert_eq!(thresholds.get(TimingField::DnsLookup), Thresholds::new(100.0, 200.0));
    }

    #[test]
    fn test_partial_threshold_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"pageLoad": {{"good": 1000, "poor": 1500}}}}"#).unwrap();

        let thresholds = FieldThresholds::from_json_file(file.path()).unwrap();
        assert_eq!(thresholds.page_load, Thresholds::new(1000.0, 1500.0));
        assert_eq!(thresholds.dns_lookup, Thresholds::new(100.0, 200.0));
    }

    #[test]
    fn test_missing_threshold_file_is_io_error() {
        let err = FieldThresholds::from_json_file(Path::new("/nonexistent/thresholds.json"))
            .unwrap_err();
        assert!(matches!(err, PerfError::Io { .. }));
    }
}
