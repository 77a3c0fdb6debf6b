use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

pub mod logger {
    use super::*;

    /// Appends every record to a log file and echoes it to stderr.
    pub struct FileLogger {
        level: LevelFilter,
        file: Mutex<File>,
    }

    impl FileLogger {
        pub fn open(path: &Path, level: LevelFilter) -> std::io::Result<Self> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file = OpenOptions::new()
                .write(true)
                .append(true)
                .create(true)
                .open(path)?;

            Ok(Self {
                level,
                file: Mutex::new(file),
            })
        }

        pub fn log_new_line(&self, line: &str) -> std::io::Result<()> {
            let mut file = self
                .file
                .lock()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

            writeln!(file, "{}", line)?;
            Ok(())
        }
    }

    pub fn format_line(level: Level, target: &str, message: &str) -> String {
        format!("[{} {}] {}", level, target, message)
    }

    impl Log for FileLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= self.level
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }

            let output = format_line(record.level(), record.target(), &record.args().to_string());

            if let Err(err) = self.log_new_line(&output) {
                eprintln!("failed to write log file: {}", err);
            }

            eprintln!("{}", output);
        }

        fn flush(&self) {
            if let Ok(mut file) = self.file.lock() {
                let _ = file.flush();
            }
        }
    }

    /// Install the file logger as the `log` backend.
    pub fn init(path: &Path, level: LevelFilter) -> std::io::Result<()> {
        let logger = FileLogger::open(path, level)?;

        log::set_boxed_logger(Box::new(logger))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        log::set_max_level(level);

        Ok(())
    }
}
