//! `GetExecutionStatus` response parsing.
//!
//! Two document shapes are recognised: a `wps:ExecuteResponse` carrying one
//! `wps:Status` child, and a bare `ows:ExceptionReport`. Element names are
//! matched on their local part so prefix choices of the server don't matter.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WpsParseError {
    #[error("XML parsing error at position {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("unexpected status document root '{0}'")]
    UnexpectedRoot(String),

    #[error("status document carries no process status")]
    MissingStatus,

    #[error("empty status document")]
    Empty,
}

/// Where the service put the job output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputReference {
    pub href: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessPhase {
    Accepted,
    Started,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Succeeded { reference: Option<OutputReference> },
    Failed { message: String },
    InProgress {
        phase: ProcessPhase,
        percent_completed: Option<u8>,
    },
    /// Top-level `ows:ExceptionReport`.
    Exception { message: String },
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::InProgress { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Phase(ProcessPhase),
    Succeeded,
    Failed,
}

#[derive(Default)]
struct StatusScan {
    root: Option<String>,
    observed: Option<Observed>,
    percent_completed: Option<u8>,
    in_outputs: bool,
    in_exception_text: bool,
    in_status_text: bool,
    status_text: String,
    exception_texts: Vec<String>,
    reference: Option<OutputReference>,
}

impl StatusScan {
    fn open(&mut self, e: &BytesStart<'_>, has_children: bool) {
        let local = e.local_name();
        let name = String::from_utf8_lossy(local.as_ref()).into_owned();

        if self.root.is_none() {
            self.root = Some(name.clone());
        }

        match name.as_str() {
            "ProcessAccepted" => self.observe(Observed::Phase(ProcessPhase::Accepted), has_children),
            "ProcessPaused" => self.observe(Observed::Phase(ProcessPhase::Paused), has_children),
            "ProcessStarted" => {
                self.percent_completed = attribute(e, b"percentCompleted")
                    .and_then(|v| v.trim().parse::<u8>().ok());
                self.observe(Observed::Phase(ProcessPhase::Started), has_children);
            }
            "ProcessSucceeded" => self.observe(Observed::Succeeded, has_children),
            "ProcessFailed" => self.observe(Observed::Failed, has_children),
            "ProcessOutputs" => self.in_outputs = has_children,
            "ExceptionText" => self.in_exception_text = has_children,
            "Reference" if self.in_outputs && self.reference.is_none() => {
                if let Some(href) = attribute(e, b"href") {
                    self.reference = Some(OutputReference {
                        href,
                        mime_type: attribute(e, b"mimeType"),
                    });
                }
            }
            _ => {}
        }
    }

    fn observe(&mut self, observed: Observed, has_children: bool) {
        self.observed = Some(observed);
        self.in_status_text = has_children;
        self.status_text.clear();
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"ProcessOutputs" => self.in_outputs = false,
            b"ExceptionText" => self.in_exception_text = false,
            b"ProcessAccepted" | b"ProcessStarted" | b"ProcessPaused" | b"ProcessSucceeded"
            | b"ProcessFailed" => self.in_status_text = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_exception_text {
            self.exception_texts.push(text.trim().to_string());
        } else if self.in_status_text {
            self.status_text.push_str(text.trim());
        }
    }

    fn message(&self, fallback: &str) -> String {
        let texts: Vec<&str> = self
            .exception_texts
            .iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            texts.join("; ")
        } else if !self.status_text.is_empty() {
            self.status_text.clone()
        } else {
            fallback.to_string()
        }
    }

    fn finish(self) -> Result<ExecutionStatus, WpsParseError> {
        let root = self.root.clone().ok_or(WpsParseError::Empty)?;

        match root.as_str() {
            "ExceptionReport" => Ok(ExecutionStatus::Exception {
                message: self.message("service exception"),
            }),
            "ExecuteResponse" => match self.observed {
                Some(Observed::Succeeded) => Ok(ExecutionStatus::Succeeded {
                    reference: self.reference,
                }),
                Some(Observed::Failed) => Ok(ExecutionStatus::Failed {
                    message: self.message("process failed"),
                }),
                Some(Observed::Phase(phase)) => Ok(ExecutionStatus::InProgress {
                    phase,
                    percent_completed: self.percent_completed,
                }),
                None => Err(WpsParseError::MissingStatus),
            },
            _ => Err(WpsParseError::UnexpectedRoot(root)),
        }
    }
}

fn attribute(e: &BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name)
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

/// Parse a `GetExecutionStatus` response body.
pub fn parse_execution_status(xml: &str) -> Result<ExecutionStatus, WpsParseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut scan = StatusScan::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| WpsParseError::Xml {
                position: reader.buffer_position(),
                source,
            })?;

        match event {
            Event::Start(e) => scan.open(&e, true),
            Event::Empty(e) => scan.open(&e, false),
            Event::End(e) => scan.close(e.local_name().as_ref()),
            Event::Text(t) => {
                let text = t.unescape().map_err(|source| WpsParseError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                scan.text(&text);
            }
            Event::CData(t) => scan.text(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    scan.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_with_percent() {
        let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0">
            <wps:Status creationTime="2024-01-01T00:00:00Z">
              <wps:ProcessStarted percentCompleted="40">Running</wps:ProcessStarted>
            </wps:Status>
          </wps:ExecuteResponse>"#;
        assert_eq!(
            parse_execution_status(xml).unwrap(),
            ExecutionStatus::InProgress {
                phase: ProcessPhase::Started,
                percent_completed: Some(40)
            }
        );
    }

    #[test]
    fn test_empty_succeeded_element() {
        let xml = r#"<ExecuteResponse><Status><ProcessSucceeded/></Status></ExecuteResponse>"#;
        assert_eq!(
            parse_execution_status(xml).unwrap(),
            ExecutionStatus::Succeeded { reference: None }
        );
    }

    #[test]
    fn test_not_xml() {
        assert!(parse_execution_status("").is_err());
        assert!(matches!(
            parse_execution_status("<html><body>502</body></html>"),
            Err(WpsParseError::UnexpectedRoot(_))
        ));
    }

    #[test]
    fn test_terminal() {
        assert!(ExecutionStatus::Failed {
            message: String::new()
        }
        .is_terminal());
        assert!(!ExecutionStatus::InProgress {
            phase: ProcessPhase::Accepted,
            percent_completed: None
        }
        .is_terminal());
    }
}
