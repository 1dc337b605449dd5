//! The execution state of one WPS job.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of a job.
///
/// ```text
/// SUBMITTED -> OUTSTANDING (repeated polls) -> READY-TO-DOWNLOAD -> DOWNLOADING
///     -> DOWNLOAD-SUCCESSFUL -> LOCAL-POST-PROCESSING-SUCCESSFUL
///     -> DOWNLOAD-FAILED
/// polling -> WPS-FAILURE | WPS-GENERAL-ERROR | UNKNOWN-GENERAL-ERROR
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum JobStatus {
    Submitted,
    Outstanding,
    ReadyToDownload,
    Downloading,
    DownloadSuccessful,
    DownloadFailed,
    LocalPostProcessingSuccessful,
    /// The service reported `ProcessFailed`.
    WpsFailure,
    /// The service answered with an exception report or an unusable result.
    WpsGeneralError,
    /// The status request itself failed.
    UnknownGeneralError,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Outstanding => "OUTSTANDING",
            Self::ReadyToDownload => "READY-TO-DOWNLOAD",
            Self::Downloading => "DOWNLOADING",
            Self::DownloadSuccessful => "DOWNLOAD-SUCCESSFUL",
            Self::DownloadFailed => "DOWNLOAD-FAILED",
            Self::LocalPostProcessingSuccessful => "LOCAL-POST-PROCESSING-SUCCESSFUL",
            Self::WpsFailure => "WPS-FAILURE",
            Self::WpsGeneralError => "WPS-GENERAL-ERROR",
            Self::UnknownGeneralError => "UNKNOWN-GENERAL-ERROR",
        }
    }

    /// Whether polling stops in this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::Submitted | Self::Outstanding | Self::ReadyToDownload | Self::Downloading
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DownloadFailed | Self::WpsFailure | Self::WpsGeneralError | Self::UnknownGeneralError
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTimestamps {
    pub submitted: DateTime<Utc>,
    pub ready: Option<DateTime<Utc>>,
    pub downloaded: Option<DateTime<Utc>>,
    pub extracted: Option<DateTime<Utc>>,
    pub ended: Option<DateTime<Utc>>,
}

/// Mutable state of one job, owned by the runner driving it.
///
/// Once `continue_process` is false the status is terminal and no further
/// requests are made for the job.
#[derive(Debug, Clone, Serialize)]
pub struct JobExecutionState {
    pub job_id: String,
    pub layer_name: String,
    pub status: JobStatus,
    pub continue_process: bool,
    /// Output reference as published by the service, without credentials.
    pub download_url: Option<String>,
    pub mime_type: Option<String>,
    pub local_file_path: Option<PathBuf>,
    /// Files left in the output directory after post-processing.
    pub output_files: Vec<PathBuf>,
    pub download_attempt_count: u32,
    pub poll_count: u32,
    pub timestamps: JobTimestamps,
    pub error_message: Option<String>,
}

impl JobExecutionState {
    pub fn submitted(job_id: impl Into<String>, layer_name: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            layer_name: layer_name.into(),
            status: JobStatus::Submitted,
            continue_process: true,
            download_url: None,
            mime_type: None,
            local_file_path: None,
            output_files: Vec::new(),
            download_attempt_count: 0,
            poll_count: 0,
            timestamps: JobTimestamps {
                submitted: Utc::now(),
                ready: None,
                downloaded: None,
                extracted: None,
                ended: None,
            },
            error_message: None,
        }
    }

    /// Layer name without its workspace prefix (`geonode:S2A_x` -> `S2A_x`).
    pub fn filename_stub(&self) -> &str {
        self.layer_name.rsplit(':').next().unwrap_or(&self.layer_name)
    }

    /// Enter a terminal status and stop polling.
    pub fn finish(&mut self, status: JobStatus, error_message: Option<String>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.continue_process = false;
        self.timestamps.ended = Some(Utc::now());
        if let Some(message) = error_message {
            self.append_diagnostic(message);
        }
    }

    /// Attach a message without changing the status.
    pub fn append_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error_message = Some(match self.error_message.take() {
            Some(existing) => format!("{}; {}", existing, message),
            None => message,
        });
    }

    /// Time from submission to the end of the job, once it has ended.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.timestamps.ended.map(|ended| ended - self.timestamps.submitted)
    }

    pub fn duration_minutes(&self) -> Option<f64> {
        self.duration()
            .map(|d| d.num_milliseconds() as f64 / 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(JobStatus::DownloadSuccessful.as_str(), "DOWNLOAD-SUCCESSFUL");
        assert_eq!(
            serde_json::to_string(&JobStatus::LocalPostProcessingSuccessful).unwrap(),
            "\"LOCAL-POST-PROCESSING-SUCCESSFUL\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::ReadyToDownload).unwrap(),
            format!("\"{}\"", JobStatus::ReadyToDownload)
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Outstanding.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(JobStatus::DownloadSuccessful.is_terminal());
        assert!(JobStatus::UnknownGeneralError.is_terminal());
        assert!(!JobStatus::LocalPostProcessingSuccessful.is_error());
    }

    #[test]
    fn test_finish_stops_polling() {
        let mut state = JobExecutionState::submitted("123", "geonode:S2A_x");
        assert!(state.continue_process);
        assert_eq!(state.filename_stub(), "S2A_x");

        state.finish(JobStatus::WpsFailure, Some("boom".into()));
        assert!(!state.continue_process);
        assert_eq!(state.error_message.as_deref(), Some("boom"));
        assert!(state.duration().is_some());

        state.append_diagnostic("later");
        assert_eq!(state.error_message.as_deref(), Some("boom; later"));
    }
}
