//! Console log formatting for the `stepwise-perf` binary.
//!
//! Output is meant for people watching a CI log, so lines carry no
//! timestamps or targets. The whole line is coloured by level, and warnings
//! and errors keep a short prefix so they stay recognisable when colour is
//! disabled (`NO_COLOR`, redirected output).

use colored::*;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Event formatter that colours each line according to its level
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorizedFormatter;

impl ColorizedFormatter {
    fn prefix(level: &Level) -> &'static str {
        match *level {
            Level::WARN => "warning: ",
            Level::ERROR => "error: ",
            _ => "",
        }
    }
}

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Fields are buffered so the colour spans the full line.
        let level = event.metadata().level();
        let mut buffer = String::from(Self::prefix(level));
        ctx.format_fields(Writer::new(&mut buffer), event)?;

        let line = match *level {
            Level::INFO => buffer.normal(),
            Level::WARN => buffer.yellow(),
            Level::ERROR => buffer.red().bold(),
            Level::DEBUG => buffer.blue(),
            Level::TRACE => buffer.purple(),
        };

        writeln!(writer, "{}", line)
    }
}

/// Filter for console output
///
/// `RUST_LOG` wins when set. Otherwise the crate logs at `info`, or `debug`
/// with `--verbose`.
pub fn console_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "stepwise_perf=debug"
    } else {
        "stepwise_perf=info"
    }
}
