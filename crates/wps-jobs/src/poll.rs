//! One status poll, with the download inlined when the job has succeeded.

use chrono::Utc;
use eods_common::HttpRequest;
use tracing::{debug, info, instrument, warn};
use wps_protocol::{kvp, parse_execution_status, ExecutionStatus};

use crate::metrics;
use crate::runner::WpsJobRunner;
use crate::state::{JobExecutionState, JobStatus};

impl WpsJobRunner {
    /// Request `GetExecutionStatus` once and advance `state`.
    ///
    /// Never fails: a transport error, a non-2xx reply or an unreadable
    /// document ends the job in `UNKNOWN-GENERAL-ERROR`.
    #[instrument(skip_all, fields(job_id = %state.job_id))]
    pub async fn poll(&self, state: &mut JobExecutionState) {
        if !state.continue_process {
            return;
        }

        state.poll_count += 1;
        metrics::record_poll();

        let request = HttpRequest::get(self.connection.wps_url())
            .query_pairs(kvp::status_params(
                &self.connection.access_token,
                &state.job_id,
            ))
            .timeout(Some(self.settings.poll_timeout()));

        let status = match self.backend.send(request).await {
            Ok(reply) if reply.is_success() => parse_execution_status(&reply.text())
                .map_err(|e| format!("could not read status document: {}", e)),
            Ok(reply) => Err(format!("status request returned {}", reply.status)),
            Err(e) => Err(format!("status request failed: {}", e)),
        };

        match status {
            Ok(ExecutionStatus::Succeeded {
                reference: Some(reference),
            }) => {
                info!(poll = state.poll_count, "WPS job succeeded");
                state.download_url = Some(reference.href);
                state.mime_type = reference.mime_type;
                state.status = JobStatus::ReadyToDownload;
                state.timestamps.ready = Some(Utc::now());
                self.download(state).await;
            }
            Ok(ExecutionStatus::Succeeded { reference: None }) => {
                warn!("WPS job succeeded without an output reference");
                state.finish(
                    JobStatus::WpsGeneralError,
                    Some("process succeeded but published no output reference".into()),
                );
            }
            Ok(ExecutionStatus::Failed { message }) => {
                let message = self.connection.redact(&message);
                warn!(error = %message, "WPS job failed");
                state.finish(JobStatus::WpsFailure, Some(message));
            }
            Ok(ExecutionStatus::Exception { message }) => {
                let message = self.connection.redact(&message);
                warn!(error = %message, "WPS status request raised an exception report");
                state.finish(JobStatus::WpsGeneralError, Some(message));
            }
            Ok(ExecutionStatus::InProgress {
                phase,
                percent_completed,
            }) => {
                debug!(?phase, ?percent_completed, poll = state.poll_count, "WPS job outstanding");
                state.status = JobStatus::Outstanding;
            }
            Err(message) => {
                let message = self.connection.redact(&message);
                warn!(error = %message, "WPS status poll failed");
                state.finish(JobStatus::UnknownGeneralError, Some(message));
            }
        }
    }
}
