//! A minimal [`Log`] implementation for hosts without their own logger.
use std::fmt::Arguments;

use chrono::Local;
use log::{set_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: Logger = Logger;

/// Installs the [`Logger`] with the given maximum `level`.
///
/// # Errors
///
/// Returns a [`SetLoggerError`] if a logger was already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    set_logger(&LOGGER)?;
    set_max_level(level);
    Ok(())
}

#[derive(Copy, Clone, Debug)]
pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!(
            "{}",
            format_line(
                record.level(),
                record.file().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args()
            )
        );
    }

    fn flush(&self) {}
}

fn format_line(level: Level, file: &str, line: u32, args: &Arguments) -> String {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");

    let level = match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };

    format!("[{}] [{}:{}] [{}] {}", now, file, line, level, args)
}
