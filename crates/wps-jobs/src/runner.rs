//! Job orchestration: submit, poll until terminal, post-process.

use std::sync::Arc;

use eods_common::{Connection, HttpBackend};
use tracing::{error, info, instrument, warn};
use wps_protocol::PayloadRenderer;

use crate::error::{Result, SubmissionFailure};
use crate::log::{JobLog, JobLogRow};
use crate::metrics;
use crate::postprocess::post_process;
use crate::request::JobRequest;
use crate::settings::JobSettings;
use crate::state::{JobExecutionState, JobStatus};

/// Drives WPS jobs against one service, one job at a time.
pub struct WpsJobRunner {
    pub(crate) backend: Arc<dyn HttpBackend>,
    pub(crate) connection: Connection,
    pub(crate) renderer: Arc<dyn PayloadRenderer>,
    pub(crate) settings: JobSettings,
}

/// Result of one request in a batch.
#[derive(Debug)]
pub enum JobOutcome {
    Finished(JobExecutionState),
    NotSubmitted {
        layer_name: String,
        failure: SubmissionFailure,
    },
}

impl JobOutcome {
    pub fn layer_name(&self) -> &str {
        match self {
            Self::Finished(state) => &state.layer_name,
            Self::NotSubmitted { layer_name, .. } => layer_name,
        }
    }

    pub fn status(&self) -> Option<JobStatus> {
        match self {
            Self::Finished(state) => Some(state.status),
            Self::NotSubmitted { .. } => None,
        }
    }
}

impl WpsJobRunner {
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        connection: Connection,
        renderer: Arc<dyn PayloadRenderer>,
        settings: JobSettings,
    ) -> Self {
        Self {
            backend,
            connection,
            renderer,
            settings,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Run one job to a terminal status.
    ///
    /// A failed submission is returned as `Err`; every later failure is
    /// recorded in the returned state.
    #[instrument(skip_all, fields(layer = %request.layer_name))]
    pub async fn run_job(
        &self,
        request: &JobRequest,
    ) -> std::result::Result<JobExecutionState, SubmissionFailure> {
        let mut state = self.submit(request).await?;

        while state.continue_process {
            if state.poll_count >= self.settings.max_polls {
                warn!(polls = state.poll_count, "Giving up on outstanding WPS job");
                state.finish(
                    JobStatus::UnknownGeneralError,
                    Some(format!(
                        "job still outstanding after {} polls",
                        state.poll_count
                    )),
                );
                break;
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
            self.poll(&mut state).await;
        }

        if state.status == JobStatus::DownloadSuccessful {
            post_process(&mut state, &self.settings.output_dir);
        }

        metrics::record_finished(state.status);
        info!(
            job_id = %state.job_id,
            status = %state.status,
            duration_minutes = state.duration_minutes().unwrap_or_default(),
            "WPS job finished"
        );

        Ok(state)
    }

    /// Run `requests` one after another, appending each result to
    /// `wps-log.csv` in the output directory.
    ///
    /// Only a failure to write the log stops the batch.
    #[instrument(skip_all, fields(jobs = requests.len()))]
    pub async fn run_batch(&self, requests: &[JobRequest]) -> Result<Vec<JobOutcome>> {
        let log = JobLog::in_dir(&self.settings.output_dir);
        let mut outcomes = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            info!(
                job = index + 1,
                of = requests.len(),
                layer = %request.layer_name,
                "Starting WPS job"
            );

            let outcome = match self.run_job(request).await {
                Ok(state) => {
                    log.append(&JobLogRow::from(&state))?;
                    JobOutcome::Finished(state)
                }
                Err(failure) => {
                    error!(layer = %request.layer_name, error = %failure, "WPS job not submitted");
                    log.append(&JobLogRow::submission_failed(request, &failure))?;
                    JobOutcome::NotSubmitted {
                        layer_name: request.layer_name.clone(),
                        failure,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes
            .iter()
            .filter(|o| o.status() == Some(JobStatus::LocalPostProcessingSuccessful))
            .count();
        info!(
            total = outcomes.len(),
            succeeded = succeeded,
            log = %log.path().display(),
            "WPS batch finished"
        );

        Ok(outcomes)
    }
}
