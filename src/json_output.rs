//! JSON output for machine consumers
//!
//! When the --json-progress flag is enabled, all progress and status
//! information is emitted as JSON lines to stdout, suppressing all other
//! output.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        completed: usize,
        total: usize,
        percent: f64,
    },
    /// File processing completed
    FileCompleted {
        input_path: String,
        output_path: String,
    },
    /// File processing failed
    FileFailed { input_path: String, error: String },
    /// Batch summary
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit a progress message
    pub fn progress(completed: usize, total: usize, percent: f64) {
        Self::Progress {
            completed,
            total,
            percent,
        }
        .emit();
    }

    /// Create and emit a file completed message
    pub fn file_completed(input_path: &Path, output_path: &Path) {
        Self::FileCompleted {
            input_path: input_path.display().to_string(),
            output_path: output_path.display().to_string(),
        }
        .emit();
    }

    /// Create and emit a file failed message
    pub fn file_failed(input_path: &Path, error: impl Into<String>) {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
        .emit();
    }

    /// Create and emit a summary message
    pub fn summary(total_files: usize, processed: usize, failed: usize, duration_secs: f64) {
        Self::Summary {
            total_files,
            processed,
            failed,
            duration_secs,
        }
        .emit();
    }
}
