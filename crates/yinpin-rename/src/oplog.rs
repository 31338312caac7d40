//! Operator-facing rename log
//!
//! Plain text, one line per event, written before and during mutation so the
//! operator can review it. Discovery lines use the `文件: old -> new` and
//! `文件夹: old -> new` forms that [`crate::store::parse_rename_log`] reads back.

use crate::error::RenameResult;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct OperatorLog {
    writer: Option<BufWriter<File>>,
    lines: Vec<String>,
}

impl OperatorLog {
    /// Truncate `path` and log into it.
    pub fn create(path: &Path) -> RenameResult<Self> {
        let file = File::create(path)?;
        Ok(Self::with_file(file))
    }

    /// Append to `path`, creating it if needed.
    pub fn append(path: &Path) -> RenameResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_file(file))
    }

    /// Log that only keeps lines in memory
    pub fn in_memory() -> Self {
        Self {
            writer: None,
            lines: Vec::new(),
        }
    }

    fn with_file(file: File) -> Self {
        Self {
            writer: Some(BufWriter::new(file)),
            lines: Vec::new(),
        }
    }

    pub fn line(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.record(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = format!("warning: {}", message.into());
        tracing::warn!("{}", message);
        self.record(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = format!("error: {}", message.into());
        tracing::error!("{}", message);
        self.record(message);
    }

    /// Write a line to the file without echoing it to the terminal
    pub fn quiet(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{}", message);
        self.record(message);
    }

    fn record(&mut self, message: String) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writeln!(writer, "{}", message) {
                // memory only from here on
                tracing::error!("failed to write operator log: {}", e);
                self.writer = None;
            }
        }
        self.lines.push(message);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                tracing::error!("failed to flush operator log: {}", e);
            }
        }
    }
}

impl Drop for OperatorLog {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lines_written_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rename_log.txt");

        {
            let mut log = OperatorLog::create(&path).unwrap();
            log.line("文件: 店长.flac -> dianzhang.flac");
            log.warn("path does not exist: sound");
            assert_eq!(log.lines().len(), 2);
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "文件: 店长.flac -> dianzhang.flac\nwarning: path does not exist: sound\n"
        );
    }

    #[test]
    fn test_append_keeps_existing_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rename_log.txt");
        fs::write(&path, "first\n").unwrap();

        {
            let mut log = OperatorLog::append(&path).unwrap();
            log.line("second");
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_in_memory() {
        let mut log = OperatorLog::in_memory();
        log.error("boom");
        assert_eq!(log.lines(), ["error: boom".to_string()]);
    }
}
