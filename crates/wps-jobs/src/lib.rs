//! Asynchronous WPS jobs against an EODS service.
//!
//! A [`WpsJobRunner`] takes a [`JobRequest`] through
//! submit -> poll -> download -> local post-processing, tracking progress in a
//! [`JobExecutionState`]. Jobs run strictly one after another;
//! [`WpsJobRunner::run_batch`] records each in `wps-log.csv`.

pub mod download;
pub mod error;
pub mod log;
pub mod metrics;
pub mod poll;
pub mod postprocess;
pub mod request;
pub mod runner;
pub mod settings;
pub mod state;
pub mod submit;

pub use download::extension_for_mime;
pub use error::{JobError, PostProcessError, Result, SubmissionFailure};
pub use log::{JobLog, JobLogRow, JOB_LOG_FILE, SUBMISSION_FAILED};
pub use postprocess::{is_archive, post_process};
pub use request::JobRequest;
pub use runner::{JobOutcome, WpsJobRunner};
pub use settings::JobSettings;
pub use state::{JobExecutionState, JobStatus, JobTimestamps};
