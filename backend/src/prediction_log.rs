use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const LOG_HEADER: [&str; 7] = [
    "ts_iso",
    "client_ip",
    "user_agent",
    "filename",
    "prediction",
    "confidence",
    "size_bytes",
];

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Failed to open prediction log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write prediction log: {0}")]
    Csv(#[from] csv::Error),
    #[error("Prediction log lock poisoned")]
    Poisoned,
}

/// One row of the prediction log. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts_iso: String,
    pub client_ip: String,
    pub user_agent: String,
    pub filename: String,
    pub prediction: String,
    pub confidence: String,
    pub size_bytes: u64,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        client_ip: String,
        user_agent: String,
        filename: String,
        prediction: String,
        confidence: f32,
        size_bytes: u64,
    ) -> Self {
        Self {
            ts_iso: timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            client_ip,
            user_agent,
            filename,
            prediction,
            confidence: format!("{:.6}", confidence),
            size_bytes,
        }
    }
}

/// Append-only sink for successful predictions.
pub trait PredictionLog: Send + Sync {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError>;
}

/// CSV file sink. The file is opened in append mode for every row and the
/// header is written only when the file is empty.
pub struct CsvPredictionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvPredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PredictionLog for CsvPredictionLog {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        // Held across the emptiness check so concurrent first writes
        // cannot both emit a header.
        let _guard = self.write_lock.lock().map_err(|_| LogError::Poisoned)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let is_new = file.metadata().map_err(|e| self.io_error(e))?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(LOG_HEADER)?;
        }
        writer.serialize(entry)?;
        writer.flush().map_err(|e| self.io_error(e))?;
        Ok(())
    }
}
