//! HTTP client settings shared by every operation.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// How server certificates are checked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    /// Verify against the built-in roots.
    #[default]
    Verify,
    /// Accept any certificate.
    Disabled,
    /// Verify against the built-in roots plus a PEM bundle, for
    /// organisations that intercept TLS.
    CustomBundle(PathBuf),
}

impl TlsPolicy {
    /// Interpret a `--tls-verify` style value: `true`, `false` or a path.
    pub fn from_flag(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "true" | "yes" | "1" => TlsPolicy::Verify,
            "false" | "no" | "0" => TlsPolicy::Disabled,
            _ => TlsPolicy::CustomBundle(PathBuf::from(value.trim())),
        }
    }
}

/// Settings used to build an [`HttpBackend`](crate::http::HttpBackend).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub tls: TlsPolicy,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("eods-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            tls: TlsPolicy::default(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ClientSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_from_flag() {
        assert_eq!(TlsPolicy::from_flag("true"), TlsPolicy::Verify);
        assert_eq!(TlsPolicy::from_flag("False"), TlsPolicy::Disabled);
        assert_eq!(
            TlsPolicy::from_flag("certs/org.pem"),
            TlsPolicy::CustomBundle(PathBuf::from("certs/org.pem"))
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.tls, TlsPolicy::Verify);
        assert_eq!(settings.connect_timeout(), Duration::from_secs(30));
        assert!(settings.user_agent.starts_with("eods-client/"));
    }
}
