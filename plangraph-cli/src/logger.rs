//! `log` backend writing colored records to stderr.
use std::io::{self, Write};

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

pub struct TerminalLogger {
    level: LevelFilter,
    stderr: BufferWriter,
}

impl TerminalLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            stderr: BufferWriter::stderr(ColorChoice::Auto),
        }
    }

    /// Install as the global logger.
    pub fn install(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.level);
        log::set_boxed_logger(Box::new(self))
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Magenta,
    }
}

/// `<timestamp> <LEVEL> [<module>] <message>`
pub fn write_record(out: &mut impl WriteColor, record: &Record, timestamp: &str) -> io::Result<()> {
    let mut level = ColorSpec::new();
    level.set_fg(Some(level_color(record.level()))).set_bold(true);

    write!(out, "{} ", timestamp)?;
    out.set_color(&level)?;
    write!(out, "{:<5}", record.level())?;
    out.reset()?;
    writeln!(
        out,
        " [{}] {}",
        record.module_path().unwrap_or_else(|| record.target()),
        record.args()
    )
}

impl Log for TerminalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut buffer = self.stderr.buffer();
        let timestamp = Local::now().format("%H:%M:%S%.3f").to_string();
        // Nowhere to report a failing stderr.
        if write_record(&mut buffer, record, &timestamp).is_ok() {
            let _ = self.stderr.print(&buffer);
        }
    }

    fn flush(&self) {}
}
