//! Result download with bounded retry.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, instrument, warn};
use wps_protocol::kvp;

use crate::metrics;
use crate::runner::WpsJobRunner;
use crate::state::{JobExecutionState, JobStatus};

const DEFAULT_EXTENSION: &str = "bin";

/// File extension for a mime type: its subtype without parameters
/// (`application/zip; charset=binary` -> `zip`).
pub fn extension_for_mime(mime_type: Option<&str>) -> String {
    mime_type
        .and_then(|mime| mime.split(';').next())
        .and_then(|mime| mime.split_once('/'))
        .map(|(_, subtype)| subtype.trim().to_ascii_lowercase())
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

impl WpsJobRunner {
    /// Staging path `<output_dir>/<stub>-<job_id>/<stub>.<ext>`.
    pub fn staging_path(&self, state: &JobExecutionState) -> PathBuf {
        let stub = state.filename_stub();
        self.settings
            .output_dir
            .join(format!("{}-{}", stub, state.job_id))
            .join(format!("{}.{}", stub, extension_for_mime(state.mime_type.as_deref())))
    }

    /// Stream the job output to its staging path.
    ///
    /// Up to `max_download_attempts` independent attempts are made, with
    /// exponential backoff between them. The job ends in
    /// `DOWNLOAD-SUCCESSFUL` on the first success or `DOWNLOAD-FAILED`
    /// carrying the last attempt's error.
    #[instrument(skip_all, fields(job_id = %state.job_id))]
    pub async fn download(&self, state: &mut JobExecutionState) {
        let Some(href) = state.download_url.clone() else {
            state.finish(
                JobStatus::DownloadFailed,
                Some("no download reference for job".into()),
            );
            return;
        };
        let url = kvp::authenticated_href(&href, &self.connection.access_token);

        state.status = JobStatus::Downloading;
        let path = self.staging_path(state);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                state.finish(
                    JobStatus::DownloadFailed,
                    Some(format!("failed to create {}: {}", parent.display(), e)),
                );
                return;
            }
        }

        let max_attempts = self.settings.max_download_attempts.max(1);
        let mut delay = self.settings.download_retry_delay();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            state.download_attempt_count = attempt;
            metrics::record_download_attempt();

            match self
                .backend
                .download_to(&url, &path, Some(self.settings.download_timeout()))
                .await
            {
                Ok(bytes) => {
                    info!(
                        path = %path.display(),
                        bytes = bytes,
                        attempt = attempt,
                        "Download completed"
                    );
                    state.local_file_path = Some(path);
                    state.timestamps.downloaded = Some(Utc::now());
                    state.finish(JobStatus::DownloadSuccessful, None);
                    return;
                }
                Err(e) => {
                    last_error = self.connection.redact(&e.to_string());
                    // Attempts never resume a partial body
                    let _ = tokio::fs::remove_file(&path).await;

                    if attempt < max_attempts {
                        warn!(
                            error = %last_error,
                            attempt = attempt,
                            max_attempts = max_attempts,
                            delay_secs = delay.as_secs(),
                            "Download failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        delay = std::cmp::min(delay * 2, self.settings.max_download_retry_delay());
                    }
                }
            }
        }

        warn!(error = %last_error, attempts = max_attempts, "Download failed");
        state.finish(
            JobStatus::DownloadFailed,
            Some(format!(
                "download failed after {} attempts: {}",
                max_attempts, last_error
            )),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime(Some("application/zip")), "zip");
        assert_eq!(extension_for_mime(Some("image/tiff")), "tiff");
        assert_eq!(extension_for_mime(Some("application/zip; charset=binary")), "zip");
        assert_eq!(extension_for_mime(Some("garbage")), "bin");
        assert_eq!(extension_for_mime(None), "bin");
    }
}
