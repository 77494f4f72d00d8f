use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{Level, LevelFilter, Log, Metadata, Record};
use time::OffsetDateTime;
use time::macros::format_description;

pub struct Logger {
    pub write_to_stderr: bool,
    pub severity: Level,
    pub file: Option<Arc<Mutex<File>>>,
    pub enable_colors: bool,
}

impl Logger {
    /// Create a new logger; `file_path` enables the file sink
    pub fn new(
        file_path: Option<PathBuf>,
        severity: Option<Level>,
        write_to_stderr: bool,
        enable_colors: bool,
    ) -> Self {
        let file = file_path.and_then(|path| {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(f) => Some(Arc::new(Mutex::new(f))),
                Err(e) => {
                    eprintln!("Failed to open log file {:?}: {e}", path);
                    None
                }
            }
        });

        Logger {
            write_to_stderr,
            severity: severity.unwrap_or(Level::Info),
            file,
            enable_colors,
        }
    }

    fn get_timestamp() -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        OffsetDateTime::now_utc()
            .format(&format)
            .unwrap_or_else(|_| "----------- --:--:--".to_string())
    }

    fn get_color(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[36m",
            Level::Debug => "\x1b[35m",
            Level::Trace => "\x1b[37m",
        }
    }

    /// Level from `BOOKSHELF_LOG`, then `RUST_LOG`, defaulting to info
    pub fn level_from_env() -> Level {
        std::env::var("BOOKSHELF_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .and_then(|value| value.parse::<Level>().ok())
            .unwrap_or(Level::Info)
    }

    /// Initialize logger with environment variables
    pub fn init() -> Result<(), log::SetLoggerError> {
        let file_path = std::env::var_os("BOOKSHELF_LOG_FILE").map(PathBuf::from);
        let enable_colors = std::env::var_os("NO_COLOR").is_none();

        let logger = Logger::new(
            file_path,
            Some(Self::level_from_env()),
            true,
            enable_colors,
        );
        log::set_max_level(LevelFilter::Trace);
        log::set_logger(Box::leak(Box::new(logger)))?;
        Ok(())
    }

    fn format_line(&self, record: &Record, colored: bool) -> String {
        let timestamp = Self::get_timestamp();
        let level = record.level().as_str();
        if colored {
            let color = Self::get_color(record.level());
            format!("{color}[{timestamp}] {level:<5}\x1b[0m {}", record.args())
        } else {
            format!("[{timestamp}] {level:<5} {}", record.args())
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.severity
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if self.write_to_stderr {
            let line = self.format_line(record, self.enable_colors);
            let _ = writeln!(std::io::stderr(), "{line}");
        }

        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", self.format_line(record, false));
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                let _ = guard.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_respects_severity() {
        let logger = Logger::new(None, Some(Level::Warn), false, false);
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_writes_plain_lines_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("bookshelf.log");
        let logger = Logger::new(Some(path.clone()), Some(Level::Info), false, true);
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("served poetry/night"))
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("INFO  served poetry/night"));
        assert!(!written.contains("\x1b["));
    }

    #[test]
    fn test_unopenable_log_file_disables_file_sink() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let logger = Logger::new(Some(tmp.path().to_path_buf()), Some(Level::Info), false, false);
        assert!(logger.file.is_none());
        logger.log(&Record::builder().level(Level::Info).args(format_args!("still fine")).build());
    }
}
