//! # JSONL Output
//!
//! Extracted records are persisted one JSON object per line, UTF-8, without
//! ASCII escaping. Records are flushed as soon as they are written so a
//! partially processed document still leaves usable output behind.

use crate::types::QaRecord;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to open output file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write record: {0}")]
    Write(#[from] std::io::Error),
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for extracted records.
pub trait RecordSink {
    fn write_record(&mut self, record: &QaRecord) -> Result<(), OutputError>;
}

/// Collects records in memory.
impl RecordSink for Vec<QaRecord> {
    fn write_record(&mut self, record: &QaRecord) -> Result<(), OutputError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes records to a `.jsonl` file.
#[derive(Debug)]
pub struct JsonlWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonlWriter {
    /// Creates (or truncates) the file at `path`, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| OutputError::Open {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = File::create(&path).map_err(open_err)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl RecordSink for JsonlWriter {
    fn write_record(&mut self, record: &QaRecord) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str) -> QaRecord {
        QaRecord {
            question: question.to_string(),
            answer: "答".to_string(),
            source_text: "源".to_string(),
            topic: None,
            sliding_context: None,
        }
    }

    #[test]
    fn writes_one_unescaped_line_per_record() -> Result<(), OutputError> {
        let dir = tempfile::tempdir().map_err(OutputError::Write)?;
        let path = dir.path().join("nested").join("out.jsonl");

        let mut writer = JsonlWriter::create(&path)?;
        writer.write_record(&record("什么是投资？"))?;
        writer.write_record(&record("第二个问题"))?;
        assert_eq!(writer.written(), 2);

        let written = fs::read_to_string(&path)?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("什么是投资？"));
        assert!(!lines[0].contains("topic"));
        Ok(())
    }

    #[test]
    fn create_truncates_existing_files() -> Result<(), OutputError> {
        let dir = tempfile::tempdir().map_err(OutputError::Write)?;
        let path = dir.path().join("out.jsonl");
        fs::write(&path, "stale\n")?;

        let mut writer = JsonlWriter::create(&path)?;
        writer.write_record(&record("新问题"))?;
        let written = fs::read_to_string(&path)?;
        assert!(!written.contains("stale"));
        Ok(())
    }
}
