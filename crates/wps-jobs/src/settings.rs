//! Timing and retry settings for the job runner.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Settings for one [`WpsJobRunner`](crate::runner::WpsJobRunner).
#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    /// Downloads, extracted files and `wps-log.csv` land here.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Delay before each status request.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// A job still outstanding after this many polls is abandoned.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_max_download_attempts")]
    pub max_download_attempts: u32,
    /// Initial delay between download attempts (doubles each retry)
    #[serde(default = "default_download_retry_delay")]
    pub download_retry_delay_secs: u64,
    /// Maximum delay between download attempts
    #[serde(default = "default_max_download_retry_delay")]
    pub max_download_retry_delay_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval() -> u64 {
    15
}

fn default_max_polls() -> u32 {
    // One day at the default interval
    5760
}

fn default_poll_timeout() -> u64 {
    180
}

fn default_submit_timeout() -> u64 {
    300
}

fn default_download_timeout() -> u64 {
    3600
}

fn default_max_download_attempts() -> u32 {
    3
}

fn default_download_retry_delay() -> u64 {
    5
}

fn default_max_download_retry_delay() -> u64 {
    60
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            poll_interval_secs: default_poll_interval(),
            max_polls: default_max_polls(),
            poll_timeout_secs: default_poll_timeout(),
            submit_timeout_secs: default_submit_timeout(),
            download_timeout_secs: default_download_timeout(),
            max_download_attempts: default_max_download_attempts(),
            download_retry_delay_secs: default_download_retry_delay(),
            max_download_retry_delay_secs: default_max_download_retry_delay(),
        }
    }
}

impl JobSettings {
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn download_retry_delay(&self) -> Duration {
        Duration::from_secs(self.download_retry_delay_secs)
    }

    pub fn max_download_retry_delay(&self) -> Duration {
        Duration::from_secs(self.max_download_retry_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = JobSettings::default();
        assert_eq!(settings.poll_interval(), Duration::from_secs(15));
        assert_eq!(settings.max_download_attempts, 3);
        assert_eq!(settings.max_polls, 5760);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: JobSettings =
            serde_json::from_str(r#"{"output_dir": "/data/eods", "poll_interval_secs": 60}"#).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/data/eods"));
        assert_eq!(settings.poll_interval_secs, 60);
        assert_eq!(settings.download_timeout_secs, 3600);
    }
}
