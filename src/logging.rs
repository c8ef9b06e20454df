//! Injected logging.
//!
//! Components never reach for a global logger. They hold an `Rc<dyn Logger>`
//! handed to them at construction, so tests can swap in [`MemoryLogger`] and
//! assert on what was reported.

use std::cell::RefCell;

use log::Level;

pub const LOG_TARGET: &str = "glyphgrid";

pub trait Logger {
    fn log(&self, level: Level, message: &str);

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
}

/// Forwards to whatever `log` implementation the host installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{message}");
    }
}

/// Writes `[glyphgrid] LEVEL message` lines to stderr, dropping anything
/// less severe than `max_level`.
#[derive(Debug, Clone, Copy)]
pub struct StderrLogger {
    max_level: Level,
}

impl StderrLogger {
    pub fn new(max_level: Level) -> Self {
        Self { max_level }
    }

    pub fn from_verbosity(verbosity: u8) -> Self {
        let max_level = match verbosity {
            0 => Level::Warn,
            1 => Level::Info,
            2 => Level::Debug,
            _ => Level::Trace,
        };
        Self::new(max_level)
    }
}

impl Logger for StderrLogger {
    fn log(&self, level: Level, message: &str) {
        if level <= self.max_level {
            eprintln!("[glyphgrid] {level}: {message}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Captures every record in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: RefCell<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.borrow().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.level == level)
            .count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|record| record.level == level && record.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        self.records.borrow_mut().push(LogRecord {
            level,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use log::{Level, LevelFilter, Log, Metadata, Record};

    use super::{LogFacade, Logger, MemoryLogger, StderrLogger, LOG_TARGET};

    struct Capture(Mutex<Vec<(String, Level, String)>>);

    impl Log for Capture {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push((
                    record.target().to_owned(),
                    record.level(),
                    record.args().to_string(),
                ));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    #[test]
    fn facade_forwards_to_the_installed_logger() {
        log::set_logger(&CAPTURE).expect("no other logger installed");
        log::set_max_level(LevelFilter::Trace);

        LogFacade.warn("tile 3 out of bounds");
        LogFacade.debug("frame 9");

        let lines = CAPTURE.0.lock().expect("capture lock").clone();
        assert_eq!(
            lines,
            vec![
                (LOG_TARGET.to_owned(), Level::Warn, "tile 3 out of bounds".to_owned()),
                (LOG_TARGET.to_owned(), Level::Debug, "frame 9".to_owned()),
            ]
        );
    }

    #[test]
    fn memory_logger_captures_levels_and_messages() {
        let logger = MemoryLogger::new();
        logger.warn("tile 7 not found");
        logger.debug("frame 1");

        assert_eq!(logger.count(Level::Warn), 1);
        assert!(logger.contains(Level::Warn, "tile 7"));
        assert!(!logger.contains(Level::Error, "tile 7"));

        logger.clear();
        assert!(logger.records().is_empty());
    }

    #[test]
    fn verbosity_maps_to_increasing_levels() {
        assert_eq!(StderrLogger::from_verbosity(0).max_level, Level::Warn);
        assert_eq!(StderrLogger::from_verbosity(2).max_level, Level::Debug);
        assert_eq!(StderrLogger::from_verbosity(9).max_level, Level::Trace);
    }
}
