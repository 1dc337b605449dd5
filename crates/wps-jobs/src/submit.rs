//! Job submission.

use eods_common::HttpRequest;
use tracing::{error, info, instrument};
use wps_protocol::{kvp, parse_submission, SubmissionResponse};

use crate::error::SubmissionFailure;
use crate::metrics;
use crate::request::JobRequest;
use crate::runner::WpsJobRunner;
use crate::state::JobExecutionState;

/// Longest excerpt of a response body kept in a failure.
const BODY_EXCERPT_LEN: usize = 500;

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

impl WpsJobRunner {
    /// Render the payload and POST it as an asynchronous `Execute`.
    ///
    /// Every failure is returned as a [`SubmissionFailure`] with the access
    /// token redacted, and logged.
    #[instrument(skip_all, fields(layer = %request.layer_name))]
    pub async fn submit(
        &self,
        request: &JobRequest,
    ) -> Result<JobExecutionState, SubmissionFailure> {
        let result = self.try_submit(request).await;
        match &result {
            Ok(state) => {
                metrics::record_submitted();
                info!(job_id = %state.job_id, "WPS job was successfully submitted");
            }
            Err(failure) => {
                metrics::record_submission_failure();
                error!(error = %failure, "WPS submission failed");
            }
        }
        result
    }

    async fn try_submit(
        &self,
        request: &JobRequest,
    ) -> Result<JobExecutionState, SubmissionFailure> {
        let payload = self
            .renderer
            .render(&request.template_id, &request.substitutions)?;

        let http_request = HttpRequest::post(self.connection.wps_url())
            .query_pairs(kvp::execute_params(&self.connection.access_token))
            .xml(payload)
            .timeout(Some(self.settings.submit_timeout()));

        let reply = self
            .backend
            .send(http_request)
            .await
            .map_err(|e| SubmissionFailure::Transport(self.connection.redact(&e.to_string())))?;

        let body = reply.text();
        if !reply.is_success() {
            return Err(SubmissionFailure::Status {
                status: reply.status,
                body: self.connection.redact(&excerpt(&body)),
            });
        }

        match parse_submission(&body) {
            SubmissionResponse::Accepted { execution_id } => {
                Ok(JobExecutionState::submitted(execution_id, &request.layer_name))
            }
            SubmissionResponse::Exception(text) => Err(SubmissionFailure::ServiceException(
                self.connection.redact(&excerpt(&text)),
            )),
            SubmissionResponse::MissingExecutionId => Err(SubmissionFailure::MissingExecutionId(
                self.connection.redact(&excerpt(&body)),
            )),
        }
    }
}
