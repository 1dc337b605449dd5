//! The OGC WPS 1.0.0 subset spoken by the EODS processing service.
//!
//! This is not a general WPS implementation: it builds the KVP parameters
//! for `Execute` and `GetExecutionStatus`, recognises the submission and
//! status documents the service emits, and renders `Execute` payloads from
//! XML templates.

pub mod execute;
pub mod kvp;
pub mod status;
pub mod template;

pub use execute::{extract_execution_id, parse_submission, SubmissionResponse};
pub use status::{parse_execution_status, ExecutionStatus, OutputReference, ProcessPhase, WpsParseError};
pub use template::{BuiltinTemplates, FileTemplateRenderer, PayloadRenderer, TemplateError};
