//! Logging setup.
//!
//! Uses the `log` facade with an `env_logger` backend. The level comes from,
//! in priority order:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Info is where the per-file progress lines live ("Removing duplicate",
//! "Processing file", "Watching directory"), so the default run is chatty
//! and `--quiet` leaves only errors.
//!
//! Debug builds prefix each line with a timestamp (and the module path at
//! `-v` and above). Release builds print level and message only.
//!
//! Records are written while the progress spinners are suspended, so a
//! line printed mid-phase never lands inside a spinner.
//!
//! ```rust,no_run
//! use linesweep::logging::init_logging;
//!
//! init_logging(1, false).ok();
//! log::debug!("visible with -v");
//! ```

use env_logger::{Builder, Logger};
use indicatif::MultiProgress;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::env;
use std::io::Write;

use crate::progress::shared_bars;

/// `env_logger` output routed around the progress spinners.
pub struct ProgressAwareLogger {
    inner: Logger,
    bars: MultiProgress,
}

impl ProgressAwareLogger {
    /// Wrap `inner` so it writes while `bars` are hidden.
    #[must_use]
    pub fn new(inner: Logger, bars: MultiProgress) -> Self {
        Self { inner, bars }
    }

    /// Most verbose level `inner` lets through.
    #[must_use]
    pub fn filter(&self) -> LevelFilter {
        self.inner.filter()
    }
}

impl Log for ProgressAwareLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.inner.matches(record) {
            self.bars.suspend(|| self.inner.log(record));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// # Errors
///
/// Fails if a logger is already installed for this process.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let mut builder = Builder::new();

    let from_env = env::var("RUST_LOG").ok();
    match from_env {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }

    configure_format(&mut builder, verbose);

    let logger = ProgressAwareLogger::new(builder.build(), shared_bars().clone());
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);

    match from_env {
        Some(spec) => log::debug!("Log filter from RUST_LOG: {}", spec),
        None => log::debug!("Log level: {:?}", max_level),
    }
    Ok(())
}

/// Level implied by `-v` count and `--quiet`; quiet wins.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::{ProgressBar, ProgressDrawTarget};
    use log::Level;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_logger(level: LevelFilter) -> (ProgressAwareLogger, Captured, MultiProgress) {
        let out = Captured::default();
        let inner = Builder::new()
            .filter_level(level)
            .format(|buf, record| writeln!(buf, "{} {}", record.level(), record.args()))
            .target(env_logger::Target::Pipe(Box::new(out.clone())))
            .build();
        let bars = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        (ProgressAwareLogger::new(inner, bars.clone()), out, bars)
    }

    #[test]
    fn test_log_while_spinner_active() {
        let (logger, out, bars) = captured_logger(LevelFilter::Info);
        let spinner = bars.add(ProgressBar::new_spinner());
        spinner.set_message("Removing duplicates");

        logger.log(
            &Record::builder()
                .args(format_args!("Removing duplicate: b.txt (duplicate of a.txt)"))
                .level(Level::Info)
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("hidden at info"))
                .level(Level::Debug)
                .build(),
        );

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "INFO Removing duplicate: b.txt (duplicate of a.txt)\n");
        assert!(!spinner.is_finished());
        assert_eq!(spinner.message(), "Removing duplicates");
    }

    #[test]
    fn test_logger_filter_follows_builder() {
        let (logger, _, _) = captured_logger(LevelFilter::Warn);
        assert_eq!(logger.filter(), LevelFilter::Warn);
        assert!(!logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));
    }

    #[test]
    fn test_determine_level_default() {
        assert_eq!(determine_level(0, false), LevelFilter::Info);
    }

    #[test]
    fn test_determine_level_verbose() {
        assert_eq!(determine_level(1, false), LevelFilter::Debug);
    }

    #[test]
    fn test_determine_level_trace() {
        assert_eq!(determine_level(2, false), LevelFilter::Trace);
        assert_eq!(determine_level(3, false), LevelFilter::Trace);
    }

    #[test]
    fn test_determine_level_quiet() {
        assert_eq!(determine_level(0, true), LevelFilter::Error);
    }

    #[test]
    fn test_determine_level_quiet_overrides_verbose() {
        assert_eq!(determine_level(2, true), LevelFilter::Error);
    }
}
