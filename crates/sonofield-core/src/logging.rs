//! Logging configuration
//!
//! Describes where and how verbosely the host should log. Installing the
//! subscriber is left to the binary; this module only owns the settings and
//! the log directory housekeeping.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::Level;

/// Log file extension used for rotation
const LOG_EXTENSION: &str = "log";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level: "trace", "debug", "info", "warn" or "error"
    pub level: String,
    /// Write human-readable logs to stderr
    pub console_output: bool,
    /// Write logs to a timestamped file in `log_path`
    pub file_output: bool,
    /// Directory for log files
    pub log_path: PathBuf,
    /// Keep at most this many log files
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_path: default_log_dir(),
            max_files: 10,
        }
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|mut p| {
            p.push("sonofield");
            p.push("logs");
            p
        })
        .unwrap_or_else(|| PathBuf::from("logs"))
}

impl LogConfig {
    /// Parse `level`, falling back to INFO for unknown names
    pub fn parse_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    /// Create the log directory if it is missing
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.log_path)
    }

    /// Path of the log file for a session started now
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.log_path.join(format!("sonofield_{}.{}", stamp, LOG_EXTENSION))
    }

    /// Delete the oldest `*.log` files so at most `max_files` remain.
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_path.is_dir() {
            return Ok(0);
        }

        let mut logs = Vec::new();
        for entry in fs::read_dir(&self.log_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            logs.push((modified, path));
        }

        if logs.len() <= self.max_files {
            return Ok(0);
        }

        // Newest first; ties broken by name so the order is stable
        logs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        let mut removed = 0;
        for (_, path) in logs.into_iter().skip(self.max_files) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}
