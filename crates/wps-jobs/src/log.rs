//! `wps-log.csv`, one row per finished job.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, SubmissionFailure};
use crate::request::JobRequest;
use crate::state::JobExecutionState;

pub const JOB_LOG_FILE: &str = "wps-log.csv";

/// Status column value for a job that never got an execution id.
pub const SUBMISSION_FAILED: &str = "SUBMISSION-FAILED";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobLogRow {
    pub job_id: String,
    pub layer_name: String,
    pub filename_stub: String,
    pub status: String,
    pub download_attempts: u32,
    pub polls: u32,
    pub local_file_path: String,
    /// `;`-joined paths left by post-processing.
    pub output_files: String,
    pub submitted: String,
    pub ready: String,
    pub downloaded: String,
    pub extracted: String,
    pub ended: String,
    pub duration_minutes: String,
    pub error_message: String,
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

impl From<&JobExecutionState> for JobLogRow {
    fn from(state: &JobExecutionState) -> Self {
        let ts = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| t.to_rfc3339()).unwrap_or_default()
        };

        Self {
            job_id: state.job_id.clone(),
            layer_name: state.layer_name.clone(),
            filename_stub: state.filename_stub().to_string(),
            status: state.status.to_string(),
            download_attempts: state.download_attempt_count,
            polls: state.poll_count,
            local_file_path: state
                .local_file_path
                .as_deref()
                .map(display_path)
                .unwrap_or_default(),
            output_files: state
                .output_files
                .iter()
                .map(|p| display_path(p))
                .collect::<Vec<_>>()
                .join(";"),
            submitted: state.timestamps.submitted.to_rfc3339(),
            ready: ts(state.timestamps.ready),
            downloaded: ts(state.timestamps.downloaded),
            extracted: ts(state.timestamps.extracted),
            ended: ts(state.timestamps.ended),
            duration_minutes: state
                .duration_minutes()
                .map(|m| format!("{:.2}", m))
                .unwrap_or_default(),
            error_message: state.error_message.clone().unwrap_or_default(),
        }
    }
}

impl JobLogRow {
    /// Row for a request whose submission failed.
    pub fn submission_failed(request: &JobRequest, failure: &SubmissionFailure) -> Self {
        let stub = request
            .layer_name
            .rsplit(':')
            .next()
            .unwrap_or(&request.layer_name)
            .to_string();

        Self {
            job_id: String::new(),
            layer_name: request.layer_name.clone(),
            filename_stub: stub,
            status: SUBMISSION_FAILED.to_string(),
            download_attempts: 0,
            polls: 0,
            local_file_path: String::new(),
            output_files: String::new(),
            submitted: String::new(),
            ready: String::new(),
            downloaded: String::new(),
            extracted: String::new(),
            ended: String::new(),
            duration_minutes: String::new(),
            error_message: failure.to_string(),
        }
    }
}

/// Appends rows to `wps-log.csv`, writing the header only when the file is
/// created.
#[derive(Debug, Clone)]
pub struct JobLog {
    path: PathBuf,
}

impl JobLog {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(JOB_LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &JobLogRow) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let is_new = !self.path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}
