//! # Utility Functions and Helper Module
//!
//! Small helpers shared by the store, the presenters and the binary.
//!
//! ## Key Functionality Categories
//!
//! - **Identifiers**: Run identifiers for stores and reports
//! - **Formatting**: Human-readable display of millisecond timings and rates
//! - **Display Helpers**: Table rows, separators and bar indicators for
//!   plain-text reports
//!
//! ## Usage Examples
//!
//! ```rust
//! use stepwise_perf::utils::*;
//!
//! assert_eq!(format_ms(1499.6), "1500 ms");
//! assert_eq!(format_percent(33.333), "33.3%");
//! assert_eq!(truncate("Checkout with saved card", 12), "Checkout ...");
//! ```

use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

/// Generate a unique identifier for a run
///
/// Creates a UUID v4 string used to tell apart stores, exports and log
/// lines of concurrent or consecutive runs.
///
/// ## Thread Safety
///
/// This function is thread-safe and can be called concurrently from multiple threads.
/// Each call is guaranteed to return a unique identifier.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a millisecond value rounded to whole milliseconds
///
/// Averages are floating point; reports show them rounded, the same way the
/// dashboards do.
pub fn format_ms(ms: f64) -> String {
    format!("{:.0} ms", ms)
}

/// Format a percentage with one decimal place
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Shorten text to at most `max_chars` characters, marking the cut with `...`
///
/// Counts characters rather than bytes so scenario names with non-ASCII
/// text are never split inside a code point.
///
/// ## Examples
///
/// ```rust
/// # use stepwise_perf::utils::truncate;
/// assert_eq!(truncate("Login", 10), "Login");
/// assert_eq!(truncate("Search results paging", 10), "Search ...");
/// ```
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

/// Left-align `text` in a field of `width` terminal columns
///
/// Pads by display width, so wide glyphs such as the verdict symbols take
/// the two columns a terminal gives them.
///
/// ```rust
/// # use stepwise_perf::utils::pad_display;
/// assert_eq!(pad_display("ab", 4), "ab  ");
/// assert_eq!(pad_display("✅ 1", 6), "✅ 1  ");
/// ```
pub fn pad_display(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

/// Format a table row with consistent column widths
///
/// Columns are left-aligned and padded to `widths` display columns; a
/// missing width falls back to 10.
///
/// ## Examples
///
/// ```rust
/// # use stepwise_perf::utils::{format_table_row, format_table_separator};
/// let widths = [8, 6];
/// assert_eq!(format_table_separator(&widths), "+----------+--------+");
/// assert_eq!(format_table_row(&["Login", "3"], &widths), "| Login    | 3      |");
/// ```
pub fn format_table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::from("|");
    for (i, column) in columns.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(10);
        row.push_str(&format!(" {} |", pad_display(column, width)));
    }
    row
}

/// Format a table separator
///
/// ```text
/// +----------------+-----------+
/// | Scenario       | Steps     |
/// +----------------+-----------+
/// ```
pub fn format_table_separator(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for &width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}

/// Create a bar indicator for a ratio
///
/// Used for the cache hit rate in text summaries.
///
/// ## Edge Cases
///
/// - **Zero Total**: Returns an empty bar
/// - **Overflow**: Caps at a full bar even if current > total
///
/// ```rust
/// # use stepwise_perf::utils::create_progress_indicator;
/// assert_eq!(create_progress_indicator(0, 4, 4), "░░░░");
/// assert_eq!(create_progress_indicator(2, 4, 4), "██░░");
/// assert_eq!(create_progress_indicator(0, 0, 4), "░░░░");
/// ```
pub fn create_progress_indicator(current: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }

    let progress = (current as f64 / total as f64).min(1.0);
    let filled = ((progress * width as f64) as usize).min(width);
    let empty = width - filled;

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
