//! Job counters.

use metrics::counter;

use crate::state::JobStatus;

pub fn record_submitted() {
    counter!("eods_wps_jobs_submitted_total").increment(1);
}

pub fn record_submission_failure() {
    counter!("eods_wps_submission_failures_total").increment(1);
}

pub fn record_poll() {
    counter!("eods_wps_polls_total").increment(1);
}

pub fn record_download_attempt() {
    counter!("eods_wps_download_attempts_total").increment(1);
}

pub fn record_finished(status: JobStatus) {
    counter!("eods_wps_jobs_finished_total", "status" => status.as_str()).increment(1);
}
