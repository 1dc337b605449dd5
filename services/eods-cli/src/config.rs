//! Optional YAML configuration file.
//!
//! ```yaml
//! client:
//!   tls: verify
//!   connect_timeout_secs: 30
//! jobs:
//!   output_dir: ./outputs
//!   poll_interval_secs: 15
//!   max_download_attempts: 3
//! ```
//!
//! Every key is optional; command-line flags override the file.

use std::path::Path;

use anyhow::{Context, Result};
use eods_common::ClientSettings;
use serde::Deserialize;
use tracing::{debug, info};
use wps_jobs::JobSettings;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub client: ClientSettings,
    pub jobs: JobSettings,
}

impl FileConfig {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: FileConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eods_common::TlsPolicy;

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eods.yaml");
        std::fs::write(
            &path,
            "client:\n  tls: disabled\njobs:\n  poll_interval_secs: 2\n  output_dir: /tmp/eods\n",
        )
        .unwrap();

        let config = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.client.tls, TlsPolicy::Disabled);
        assert_eq!(config.client.connect_timeout_secs, 30);
        assert_eq!(config.jobs.poll_interval_secs, 2);
        assert_eq!(config.jobs.max_download_attempts, 3);
        assert_eq!(config.jobs.output_dir, std::path::PathBuf::from("/tmp/eods"));
    }

    #[test]
    fn test_no_file() {
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.client.tls, TlsPolicy::Verify);
        assert_eq!(config.jobs.poll_interval_secs, 15);
    }

    #[test]
    fn test_missing_file() {
        assert!(FileConfig::load(Some(Path::new("/nonexistent/eods.yaml"))).is_err());
    }
}
